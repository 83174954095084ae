use async_trait::async_trait;
use beacon_server::{KeyValueStore, ServerConfig, SignalingService, StoreError};
use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::integration::init_tracing;

/// Store whose backend is permanently unreachable.
struct UnreachableStore;

#[async_trait]
impl KeyValueStore for UnreachableStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Option<Duration>) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection refused".into()))
    }
}

#[tokio::test]
async fn test_store_failure_is_server_error() {
    init_tracing();
    let service = SignalingService::with_store(Arc::new(UnreachableStore), &ServerConfig::default());
    let app = service.router("");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/create", addr))
        .json(&json!({"room": "r1", "id": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "store failure");

    server.abort();
}
