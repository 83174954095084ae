use beacon_client::{CandidatePolicy, Negotiator, NegotiatorConfig, PeerEvent, Role};
use beacon_core::PeerId;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::integration::init_tracing;
use crate::utils::{
    Mailbox, MockPeer, PeerCall, TestRelay, candidate, channel_pair, fast_transport,
};

fn config(role: Role) -> NegotiatorConfig {
    NegotiatorConfig {
        role,
        candidates: CandidatePolicy {
            skip_leading: 0,
            pacing: Duration::from_millis(1),
        },
        transport: fast_transport(),
    }
}

#[tokio::test]
async fn test_offerer_and_answerer_connect() {
    init_tracing();
    let relay = TestRelay::start().await;
    let watcher = relay.client("r1", "watcher");
    watcher.create().await.unwrap();
    let mut mailbox = Mailbox::new(watcher);

    let (alice_peer, alice_events, mut alice) = MockPeer::new("alice-offer", vec![candidate(1)]);
    let (bob_peer, bob_events, mut bob) = MockPeer::new("bob-answer", vec![candidate(2)]);

    tokio::time::timeout(Duration::from_secs(10), async {
        let alice_opening = tokio::spawn(
            Negotiator::new(
                relay.client("r1", "alice"),
                alice_peer,
                alice_events,
                config(Role::Offerer),
            )
            .open(),
        );

        // Bob must announce himself after Alice's first round trip, or Alice
        // would skip his request as backlog.
        let announced = mailbox.next().await;
        assert_eq!(announced.sender, PeerId::from("alice"));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let bob_opening = tokio::spawn(
            Negotiator::new(
                relay.client("r1", "bob"),
                bob_peer,
                bob_events,
                config(Role::Answerer),
            )
            .open(),
        );

        assert_eq!(alice.calls.recv().await, Some(PeerCall::CreateOffer));
        assert_eq!(
            bob.calls.recv().await,
            Some(PeerCall::CreateAnswer("alice-offer".into()))
        );
        assert_eq!(
            bob.calls.recv().await,
            Some(PeerCall::AddCandidate(candidate(1)))
        );
        assert_eq!(
            alice.calls.recv().await,
            Some(PeerCall::SetRemoteAnswer("bob-answer".into()))
        );
        assert_eq!(
            alice.calls.recv().await,
            Some(PeerCall::AddCandidate(candidate(2)))
        );

        let (alice_channel, bob_channel) = channel_pair();
        assert!(alice.events.send(PeerEvent::ChannelOpen(alice_channel)).await.is_ok());
        assert!(bob.events.send(PeerEvent::ChannelOpen(bob_channel)).await.is_ok());

        let mut alice_stream = alice_opening.await.unwrap().unwrap();
        let mut bob_stream = bob_opening.await.unwrap().unwrap();

        alice_stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        bob_stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        bob_stream.write_all(b"pong").await.unwrap();
        alice_stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
    })
    .await
    .expect("negotiation timed out");
}
