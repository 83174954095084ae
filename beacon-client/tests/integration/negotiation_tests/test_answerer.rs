use beacon_client::{CandidatePolicy, DataChannel, Negotiator, NegotiatorConfig, PeerEvent};
use beacon_core::{Candidate, Description, PeerId, Signal};
use bytes::Bytes;
use serde_json::json;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::integration::init_tracing;
use crate::utils::{
    Mailbox, MockPeer, PeerCall, TestRelay, candidate, channel_pair, fast_transport,
};

#[tokio::test]
async fn test_answerer_completes_against_a_scripted_host() {
    init_tracing();
    let relay = TestRelay::start().await;
    let host = relay.client("r1", "host");
    host.create().await.unwrap();
    let mut mailbox = Mailbox::new(host);

    let (peer, events, mut handle) =
        MockPeer::new("guest-answer", vec![candidate(1), candidate(2), candidate(3)]);
    let config = NegotiatorConfig {
        candidates: CandidatePolicy {
            skip_leading: 1,
            pacing: Duration::from_millis(1),
        },
        transport: fast_transport(),
        ..NegotiatorConfig::default()
    };
    let negotiator = Negotiator::new(relay.client("r1", "guest"), peer, events, config);
    let opening = tokio::spawn(negotiator.open());

    tokio::time::timeout(Duration::from_secs(10), async {
        let request = mailbox.next().await;
        assert_eq!(request.kind, "request");
        assert_eq!(request.sender, PeerId::from("guest"));
        assert!(request.to.is_broadcast());

        mailbox
            .post("guest", &Signal::Offer(Description::new("host-offer")))
            .await;
        assert_eq!(
            handle.calls.recv().await,
            Some(PeerCall::CreateAnswer("host-offer".into()))
        );

        let answer = mailbox.next().await;
        assert_eq!(answer.to, PeerId::from("host"));
        assert_eq!(
            answer.signal().unwrap(),
            Signal::Answer(Description::new("guest-answer"))
        );
        for expected in [candidate(2), candidate(3)] {
            let envelope = mailbox.next().await;
            assert_eq!(envelope.signal().unwrap(), Signal::Candidate(expected));
        }

        // Junk and a broken candidate are dropped without ending the session.
        mailbox
            .post_raw(json!({"type": "bogus", "sender": "host", "to": "guest", "value": {}}))
            .await;
        mailbox
            .post(
                "guest",
                &Signal::Candidate(Candidate {
                    candidate: String::new(),
                    sdp_m_line_index: 0,
                    sdp_mid: "0".into(),
                }),
            )
            .await;
        mailbox.post("guest", &Signal::Candidate(candidate(9))).await;
        assert_eq!(
            handle.calls.recv().await,
            Some(PeerCall::AddCandidate(candidate(9)))
        );

        let (ours, theirs) = channel_pair();
        assert!(handle.events.send(PeerEvent::ChannelOpen(ours)).await.is_ok());
        let mut stream = opening.await.unwrap().unwrap();

        stream.write_all(b"hello").await.unwrap();
        assert_eq!(theirs.recv().await, Some(Bytes::from_static(b"hello")));

        theirs.send(Bytes::from_static(b"hi")).await.unwrap();
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
    })
    .await
    .expect("negotiation timed out");

    // The guest left the room once connected.
    let observer = relay.client("r1", "observer").join().await.unwrap();
    assert_eq!(observer.members, vec![PeerId::from("observer")]);
}
