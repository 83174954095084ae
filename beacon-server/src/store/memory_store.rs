use crate::error::StoreError;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

struct StoredValue {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process [`KeyValueStore`]. Expiry is checked on read; the sweeper only
/// reclaims memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired record and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_expired(now));
        before - self.entries.len()
    }

    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = store.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired records", purged);
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let now = Instant::now();
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if !entry.is_expired(now) {
            return Ok(Some(entry.value.clone()));
        }
        drop(entry);
        self.entries.remove_if(key, |_, v| v.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .insert(key.to_owned(), StoredValue { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
