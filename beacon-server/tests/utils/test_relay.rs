use beacon_server::{MemoryStore, RetentionConfig, RoomStore, SignalingService};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Relay served on an ephemeral local port for the duration of a test.
pub struct TestRelay {
    pub base_url: String,
    pub store: MemoryStore,
    http: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestRelay {
    pub async fn start(base_path: &str) -> Self {
        let store = MemoryStore::new();
        let rooms = RoomStore::new(Arc::new(store.clone()), RetentionConfig::default());
        let app = SignalingService::new(rooms).router(base_path);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Relay crashed");
        });

        Self {
            base_url: format!("http://{}{}", addr, base_path.trim_end_matches('/')),
            store,
            http: reqwest::Client::new(),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POSTs `body` and returns the status with the decoded JSON response.
    pub async fn post(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed");
        let status = response.status();
        let json = response.json().await.expect("Response is not JSON");
        (status, json)
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> (StatusCode, Value) {
        let response = self
            .http
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Request failed");
        let status = response.status();
        let json = response.json().await.expect("Response is not JSON");
        (status, json)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
