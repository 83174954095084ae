use crate::error::TransportError;
use crate::transport::{RelayApi, TransportConfig};
use beacon_core::{PollRequest, RoomId};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives every message fetched after the bootstrap round trip, in log
/// order, on the poller task. It must not block.
pub type Dispatch = Box<dyn Fn(Value) + Send + Sync>;

#[derive(Default)]
struct Cursor {
    last: AtomicU64,
    bootstrapped: AtomicBool,
}

impl Cursor {
    fn get(&self) -> Option<u64> {
        self.bootstrapped
            .load(Ordering::Acquire)
            .then(|| self.last.load(Ordering::Acquire))
    }

    fn advance(&self, last: u64) {
        self.last.fetch_max(last, Ordering::AcqRel);
        self.bootstrapped.store(true, Ordering::Release);
    }
}

/// Client half of the relay's ordered log: a single worker performing one
/// poll round trip at a time, each carrying at most one queued payload.
///
/// Delivery is lossy. A failed round trip is logged and its payload is gone.
pub struct SignalingTransport {
    outbound: mpsc::Sender<Value>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cursor: Arc<Cursor>,
}

impl SignalingTransport {
    pub fn start(
        relay: Arc<dyn RelayApi>,
        room: RoomId,
        config: TransportConfig,
        dispatch: Dispatch,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (stop_tx, stop_rx) = oneshot::channel();
        let cursor = Arc::new(Cursor::default());

        let worker = PollWorker {
            relay,
            room,
            config,
            dispatch,
            cursor: cursor.clone(),
        };
        let handle = tokio::spawn(worker.run(outbound_rx, stop_rx));

        Self {
            outbound,
            stop_tx: Mutex::new(Some(stop_tx)),
            worker: Mutex::new(Some(handle)),
            cursor,
        }
    }

    /// Queues a payload for the next round trip, waiting while the queue is
    /// full. Payloads queued after [`stop`](Self::stop) are never sent.
    pub async fn send(&self, payload: Value) {
        if self.outbound.send(payload).await.is_err() {
            debug!("Poller already stopped; payload will not be sent");
        }
    }

    /// Ends the loop once the in-flight round trip, if any, completes.
    pub fn stop(&self) {
        let stop_tx = self.stop_tx.lock().ok().and_then(|mut slot| slot.take());
        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }
    }

    /// Stops the loop and waits for the worker to exit.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.worker.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Last sequence consumed, or `None` before the bootstrap round trip.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.get()
    }
}

struct PollWorker {
    relay: Arc<dyn RelayApi>,
    room: RoomId,
    config: TransportConfig,
    dispatch: Dispatch,
    cursor: Arc<Cursor>,
}

impl PollWorker {
    async fn run(self, mut outbound: mpsc::Receiver<Value>, mut stop: oneshot::Receiver<()>) {
        info!("Poller started for room {}", self.room);
        let mut wait = self.config.initial_delay;

        loop {
            let payload = tokio::select! {
                biased;
                _ = &mut stop => break,
                queued = outbound.recv() => match queued {
                    Some(payload) => Some(payload),
                    None => break,
                },
                _ = tokio::time::sleep(wait) => None,
            };
            wait = self.config.poll_interval;

            if let Err(e) = self.round_trip(payload).await {
                warn!("Round trip on room {} failed: {}", self.room, e);
            }
        }

        info!("Poller stopped for room {}", self.room);
    }

    async fn round_trip(&self, message: Option<Value>) -> Result<(), TransportError> {
        let request = PollRequest {
            room: self.room.clone(),
            message,
            last: self.cursor.get().unwrap_or(0),
        };
        let response = self.relay.poll(&request).await?;

        if self.cursor.get().is_none() {
            debug!(
                "Cursor bootstrapped at {} on room {}, {} backlog message(s) skipped",
                response.last,
                self.room,
                response.messages.len()
            );
            self.cursor.advance(response.last);
            return Ok(());
        }

        for message in response.messages {
            (self.dispatch)(message);
        }
        self.cursor.advance(response.last);
        Ok(())
    }
}
