use beacon_client::{RelayClient, TransportError};
use beacon_core::PeerId;
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::TestRelay;

#[tokio::test]
async fn test_control_calls_return_the_room() {
    init_tracing();
    let relay = TestRelay::start().await;
    let alice = relay.client("r1", "alice");
    let bob = relay.client("r1", "bob");

    let created = alice.create().await.unwrap();
    assert_eq!(created.owner, PeerId::from("alice"));
    assert!(created.members.is_empty());

    let joined = bob.join().await.unwrap();
    assert_eq!(joined.members, vec![PeerId::from("bob")]);

    let left = bob.bye().await.unwrap();
    assert!(left.members.is_empty());
    assert!(!left.is_deleted());

    let closed = alice.bye().await.unwrap();
    assert!(closed.is_deleted());
}

#[tokio::test]
async fn test_rejections_carry_the_relay_message() {
    init_tracing();
    let relay = TestRelay::start().await;

    let err = relay.client("ghost", "bob").join().await.unwrap_err();
    match err {
        TransportError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "unknown room:ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_exchange_appends_and_fetches() {
    init_tracing();
    let relay = TestRelay::start().await;
    let alice = relay.client("r1", "alice");
    let bob = relay.client("r1", "bob");
    alice.create().await.unwrap();
    bob.join().await.unwrap();

    let boot = alice.exchange(None, 0).await.unwrap();
    assert_eq!(boot.last, 0);

    let sent = alice.exchange(Some(json!({"n": 1})), boot.last).await.unwrap();
    assert_eq!(sent.last, 1);

    let received = bob.exchange(None, 0).await.unwrap();
    assert_eq!(received.messages, vec![json!({"n": 1})]);
    assert_eq!(received.last, 1);
}

#[tokio::test]
async fn test_unreachable_relay_is_an_http_error() {
    init_tracing();
    let client = RelayClient::new("http://127.0.0.1:9/signal", "r1".into(), "alice".into());
    assert!(matches!(
        client.create().await,
        Err(TransportError::Http(_))
    ));
}
