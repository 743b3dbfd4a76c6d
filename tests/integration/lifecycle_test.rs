// tests/integration/lifecycle_test.rs

//! Integration tests for connection lifecycle
//! Tests: registration, teardown paths, liveness and shutdown

use super::test_helpers::TestHub;
use bytes::Bytes;
use relayhub::connection::{ConnectionHandler, TeardownReason};
use relayhub::core::HubError;
use relayhub::core::protocol::{ControlFrame, InboundFrame};
use relayhub::transport::memory::{Written, memory_pair};
use std::time::Duration;

const ALICE: &str = "10.0.0.1:5001";
const BOB: &str = "10.0.0.2:5002";

// ===== Registration =====

#[tokio::test]
async fn test_duplicate_address_is_rejected_and_existing_kept() {
    let hub = TestHub::new();
    let alice = hub.connect(ALICE);

    let err = ConnectionHandler::register(hub.state.clone(), ALICE)
        .err()
        .expect("second registration should fail");
    assert_eq!(err, HubError::DuplicateAddress(ALICE.to_string()));

    let live = hub.state.registry.find(ALICE).unwrap();
    assert!(std::sync::Arc::ptr_eq(&live, &alice.record));
}

#[tokio::test]
async fn test_unrun_handler_removes_its_record_on_drop() {
    let hub = TestHub::new();
    let handler = ConnectionHandler::register(hub.state.clone(), ALICE).unwrap();
    assert!(hub.state.registry.contains(ALICE));

    drop(handler);
    assert!(!hub.state.registry.contains(ALICE));
}

#[tokio::test]
async fn test_handler_without_outbound_queue_closes_transport() {
    let hub = TestHub::new();
    let handler = ConnectionHandler::register(hub.state.clone(), ALICE).unwrap();
    drop(handler.record().take_outbound_receiver());

    let (source, sink, mut peer) = memory_pair();
    assert_eq!(handler.run(source, sink).await, TeardownReason::QueueClosed);

    assert_eq!(peer.recv().await, Some(Written::Control(ControlFrame::Close)));
    assert_eq!(peer.recv().await, Some(Written::Closed));
    assert_eq!(peer.close_calls(), 1);
    assert!(!hub.state.registry.contains(ALICE));
}

// ===== Teardown =====

#[tokio::test]
async fn test_peer_close_tears_down_exactly_once() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);

    assert!(alice.peer.send(InboundFrame::Close));

    assert_eq!(alice.finish().await, TeardownReason::PeerClosed);
    assert!(!hub.state.registry.contains(ALICE));
    assert_eq!(alice.peer.close_calls(), 1);
    assert!(alice.record.is_closed());
}

#[tokio::test]
async fn test_read_failure_tears_down_connection() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);

    alice.peer.hang_up();

    match alice.finish().await {
        TeardownReason::ReadFailed(reason) => assert!(reason.contains("peer disconnected")),
        other => panic!("expected ReadFailed, got {other:?}"),
    }
    assert!(!hub.state.registry.contains(ALICE));
    assert_eq!(alice.peer.close_calls(), 1);
}

#[tokio::test]
async fn test_removal_from_registry_closes_connection() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);

    assert!(hub.state.registry.remove(ALICE));

    assert_eq!(alice.finish().await, TeardownReason::QueueClosed);
    assert_eq!(
        alice.peer.recv().await,
        Some(Written::Control(ControlFrame::Close))
    );
    assert_eq!(alice.peer.recv().await, Some(Written::Closed));
    assert_eq!(alice.peer.close_calls(), 1);
}

#[tokio::test]
async fn test_late_teardown_leaves_reconnected_address_alone() {
    let hub = TestHub::new();
    let mut old = hub.connect(ALICE);

    // The address is freed and reused before the old loops notice.
    assert!(hub.state.registry.remove(ALICE));
    let mut new = hub.connect(ALICE);

    assert_eq!(old.finish().await, TeardownReason::QueueClosed);

    let live = hub
        .state
        .registry
        .find(ALICE)
        .expect("reconnected address should stay registered");
    assert!(std::sync::Arc::ptr_eq(&live, &new.record));
    assert!(!new.record.is_closed());
    assert!(!new.task.is_finished());

    new.whoall();
    assert_eq!(new.next_envelope().await["action"], "whoall");
}

#[tokio::test]
async fn test_pending_payloads_are_flushed_before_close() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);

    alice.record.enqueue(Bytes::from_static(b"last words")).unwrap();
    assert!(hub.state.registry.remove(ALICE));

    assert_eq!(
        alice.peer.recv_data().await,
        Some(Bytes::from_static(b"last words"))
    );
    assert_eq!(alice.finish().await, TeardownReason::QueueClosed);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_writer_is_torn_down_after_write_timeout() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);
    let bob = hub.connect(BOB);

    alice.peer.stall_writes();
    bob.broadcast("into the void");

    match alice.finish().await {
        TeardownReason::WriteFailed(reason) => assert!(reason.contains("deadline exceeded")),
        other => panic!("expected WriteFailed, got {other:?}"),
    }
    assert!(!hub.state.registry.contains(ALICE));
    assert!(hub.state.registry.contains(BOB));
    assert_eq!(alice.peer.close_calls(), 1);
}

#[tokio::test]
async fn test_one_dead_client_does_not_disturb_others() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);
    let mut bob = hub.connect(BOB);
    let carol = hub.connect("10.0.0.3:5003");

    alice.peer.hang_up();
    alice.finish().await;

    carol.broadcast("still here");
    assert_eq!(bob.next_envelope().await["message"], "still here");
}

// ===== Liveness =====

#[tokio::test(start_paused = true)]
async fn test_silent_client_is_removed_after_liveness_timeout() {
    let hub = TestHub::new();
    let liveness = hub.state.config.hub.liveness_timeout;
    let mut silent = hub.connect(ALICE);
    let mut chatty = hub.connect(BOB);

    // Bob answers well within the timeout; Alice says nothing.
    let step = liveness / 3;
    for _ in 0..3 {
        tokio::time::sleep(step).await;
        assert!(chatty.peer.send_pong());
    }
    tokio::time::sleep(step / 2).await;

    assert_eq!(silent.finish().await, TeardownReason::LivenessTimeout);
    assert!(!hub.state.registry.contains(ALICE));
    assert!(hub.state.registry.contains(BOB));
    assert!(!chatty.task.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_dispatcher_sends_probes_on_interval() {
    let hub = TestHub::new();
    let probe = hub.state.config.hub.probe_interval;
    let mut alice = hub.connect(ALICE);

    tokio::time::sleep(probe + Duration::from_millis(10)).await;

    assert_eq!(
        alice.peer.recv().await,
        Some(Written::Control(ControlFrame::Ping))
    );
}

#[tokio::test(start_paused = true)]
async fn test_any_inbound_traffic_refreshes_liveness() {
    let hub = TestHub::new();
    let liveness = hub.state.config.hub.liveness_timeout;
    let alice = hub.connect(ALICE);

    tokio::time::sleep(liveness - Duration::from_secs(1)).await;
    alice.whoall();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(hub.state.registry.contains(ALICE));
    assert!(!alice.task.is_finished());
}

// ===== Shutdown =====

#[tokio::test]
async fn test_close_all_tears_down_every_connection() {
    let hub = TestHub::new();
    let mut alice = hub.connect(ALICE);
    let mut bob = hub.connect(BOB);

    assert_eq!(hub.state.close_all(), 2);

    assert_eq!(alice.finish().await, TeardownReason::QueueClosed);
    assert_eq!(bob.finish().await, TeardownReason::QueueClosed);
    assert!(hub.state.registry.is_empty());
}
