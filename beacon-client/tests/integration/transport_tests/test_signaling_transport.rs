use beacon_client::SignalingTransport;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::integration::init_tracing;
use crate::utils::{TestRelay, fast_transport};

fn collector() -> (beacon_client::Dispatch, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Box::new(move |message| {
            let _ = tx.send(message);
        }),
        rx,
    )
}

#[tokio::test]
async fn test_two_transports_exchange_in_order() {
    init_tracing();
    let relay = TestRelay::start().await;
    let alice = relay.client("r1", "alice");
    let bob = relay.client("r1", "bob");
    alice.create().await.unwrap();
    bob.join().await.unwrap();

    // Backlog written before either transport starts is never dispatched.
    alice.exchange(Some(json!("backlog")), 0).await.unwrap();

    let (alice_dispatch, mut alice_seen) = collector();
    let (bob_dispatch, mut bob_seen) = collector();
    let a = SignalingTransport::start(
        Arc::new(alice.clone()),
        alice.room().clone(),
        fast_transport(),
        alice_dispatch,
    );
    let b = SignalingTransport::start(
        Arc::new(bob.clone()),
        bob.room().clone(),
        fast_transport(),
        bob_dispatch,
    );

    tokio::time::timeout(Duration::from_secs(5), async {
        while a.cursor().is_none() || b.cursor().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("transports never bootstrapped");

    for n in 0..3 {
        a.send(json!({"n": n})).await;
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        for n in 0..3 {
            assert_eq!(bob_seen.recv().await.unwrap(), json!({"n": n}));
        }
        // The sender sees its own messages too; filtering is the caller's job.
        for n in 0..3 {
            assert_eq!(alice_seen.recv().await.unwrap(), json!({"n": n}));
        }
    })
    .await
    .expect("messages never arrived");

    a.shutdown().await;
    b.shutdown().await;
    assert_eq!(a.cursor(), Some(4));
}
