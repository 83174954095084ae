use beacon_client::{NegotiationError, Negotiator, NegotiatorConfig, PeerEvent, TransportError};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{Mailbox, MockPeer, PeerCall, TestRelay, fast_transport};

fn config() -> NegotiatorConfig {
    NegotiatorConfig {
        transport: fast_transport(),
        ..NegotiatorConfig::default()
    }
}

#[tokio::test]
async fn test_join_failure_is_fatal() {
    init_tracing();
    let relay = TestRelay::start().await;
    let (peer, events, _handle) = MockPeer::new("sdp", vec![]);

    let result = Negotiator::new(relay.client("ghost", "bob"), peer, events, config())
        .open()
        .await;
    assert!(matches!(
        result,
        Err(NegotiationError::Join(TransportError::Rejected { status: 400, .. }))
    ));
}

#[tokio::test]
async fn test_peer_closing_before_channel_open_is_fatal() {
    init_tracing();
    let relay = TestRelay::start().await;
    let host = relay.client("r1", "host");
    host.create().await.unwrap();
    let mut mailbox = Mailbox::new(host);

    let (peer, events, mut handle) = MockPeer::new("sdp", vec![]);
    let opening = tokio::spawn(
        Negotiator::new(relay.client("r1", "guest"), peer, events, config()).open(),
    );

    tokio::time::timeout(Duration::from_secs(10), async {
        mailbox.next().await;
        assert!(handle.events.send(PeerEvent::Closed).await.is_ok());

        let result = opening.await.unwrap();
        assert!(matches!(result, Err(NegotiationError::PeerGone)));
        assert_eq!(handle.calls.recv().await, Some(PeerCall::Close));
    })
    .await
    .expect("negotiator never gave up");
}
