// tests/property/delivery_test.rs

//! Property-based tests for command delivery
//! Tests fan-out counts and queue overflow isolation

use crate::test_helpers::TestHub;
use bytes::Bytes;
use proptest::prelude::*;
use relayhub::core::commands::{Broadcast, ExecutionContext};
use relayhub::core::{Command, ConnectionRegistry, HubError};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_broadcast_reaches_all_but_sender(
        recipients in 1usize..=20,
        message in ".{0,200}",
        echo in any::<bool>(),
    ) {
        let registry = ConnectionRegistry::new(8, Duration::from_secs(30));
        let sender = "10.1.0.0:1".to_string();
        registry.create(&sender).unwrap();
        for i in 0..recipients {
            registry.create(&format!("10.1.0.{}:1", i + 1)).unwrap();
        }

        let command = Command::Broadcast(Broadcast { message, origin: sender });
        let ctx = ExecutionContext::new(&registry).with_echo_broadcast(echo);
        let delivery = command.execute(&ctx).unwrap();

        let expected = if echo { recipients + 1 } else { recipients };
        prop_assert_eq!(delivery.delivered, expected);
        prop_assert!(delivery.is_complete());
    }

    #[test]
    fn test_full_queue_drops_only_the_overflow(capacity in 1usize..=16, sent in 0usize..=40) {
        let registry = ConnectionRegistry::new(capacity, Duration::from_secs(30));
        let record = registry.create("10.2.0.1:1").unwrap();

        let mut dropped = 0;
        for i in 0..sent {
            match record.enqueue(Bytes::from(format!("payload-{i}"))) {
                Ok(()) => {}
                Err(HubError::RecipientUnavailable { reason, .. }) => {
                    prop_assert_eq!(reason.as_str(), "outbound queue full");
                    dropped += 1;
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        prop_assert_eq!(record.queued(), sent.min(capacity));
        prop_assert_eq!(dropped, sent.saturating_sub(capacity));
    }

    #[test]
    fn test_message_text_survives_end_to_end(message in "[ -~]{0,100}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let hub = TestHub::new();
            let alice = hub.connect("10.3.0.1:1");
            let mut bob = hub.connect("10.3.0.2:1");

            alice.broadcast(&message);

            let envelope = bob.next_envelope().await;
            assert_eq!(envelope["message"], message.as_str());
            assert_eq!(envelope["from"], "10.3.0.1:1");
        });
    }
}
