// tests/property/registry_test.rs

//! Property-based tests for the connection registry
//! Tests that arbitrary create/remove sequences keep addresses unique

use proptest::prelude::*;
use relayhub::core::{ConnectionRegistry, HubError};
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Create(u8),
    Remove(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8).prop_map(Op::Create),
        (0u8..8).prop_map(Op::Remove),
    ]
}

fn address(id: u8) -> String {
    format!("192.168.1.{id}:4000")
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 500,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_registry_matches_set_model(ops in prop::collection::vec(op_strategy(), 1..=100)) {
        let registry = ConnectionRegistry::new(4, Duration::from_secs(30));
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Create(id) => {
                    let addr = address(id);
                    let result = registry.create(&addr);
                    if model.insert(addr.clone()) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert_eq!(result.err(), Some(HubError::DuplicateAddress(addr)));
                    }
                }
                Op::Remove(id) => {
                    let addr = address(id);
                    prop_assert_eq!(registry.remove(&addr), model.remove(&addr));
                }
            }

            prop_assert_eq!(registry.len(), model.len());
            let listed: BTreeSet<String> = registry
                .list()
                .iter()
                .map(|record| record.address().to_string())
                .collect();
            prop_assert_eq!(&listed, &model);
        }
    }

    #[test]
    fn test_participants_are_sorted_and_unique(ids in prop::collection::vec(0u8..=255, 0..=50)) {
        let registry = ConnectionRegistry::new(4, Duration::from_secs(30));
        for id in &ids {
            let _ = registry.create(&address(*id));
        }

        let participants = registry.participants();
        let unique: BTreeSet<u8> = ids.iter().copied().collect();
        prop_assert_eq!(participants.len(), unique.len());
        for pair in participants.windows(2) {
            prop_assert!(pair[0].address < pair[1].address);
        }
    }

    #[test]
    fn test_removed_record_rejects_enqueue(id in 0u8..8) {
        let registry = ConnectionRegistry::new(4, Duration::from_secs(30));
        let record = registry.create(&address(id)).unwrap();
        registry.remove(&address(id));

        prop_assert!(record.is_closed());
        prop_assert!(record.enqueue(bytes::Bytes::from_static(b"late")).is_err());
    }
}
