use crate::config::ServerConfig;
use crate::room::RoomStore;
use crate::signaling::http_handler::{bye, create, health, join, poll};
use crate::store::{KeyValueStore, MemoryStore};
use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

/// Stateless HTTP façade over a [`RoomStore`]. Cheap to clone; every request
/// goes straight to the store.
#[derive(Clone)]
pub struct SignalingService {
    pub(crate) rooms: RoomStore,
}

impl SignalingService {
    pub fn new(rooms: RoomStore) -> Self {
        Self { rooms }
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, config: &ServerConfig) -> Self {
        Self::new(RoomStore::new(store, config.retention.clone()))
    }

    pub fn rooms(&self) -> &RoomStore {
        &self.rooms
    }

    /// Routes under `base_path`: `create`, `join`, `bye`, `health`, and the
    /// poll endpoint at the base itself.
    pub fn router(self, base_path: &str) -> Router {
        let base = normalize_base(base_path);

        let mut app = Router::new()
            .route(&format!("{}/create", base), post(create))
            .route(&format!("{}/join", base), post(join))
            .route(&format!("{}/bye", base), post(bye))
            .route(&format!("{}/health", base), get(health))
            .route(&format!("{}/", base), post(poll));
        if !base.is_empty() {
            app = app.route(&base, post(poll));
        }

        app.layer(cors_layer()).with_state(self)
    }
}

/// Reflects the caller's origin; pre-flight requests are answered by the
/// layer without reaching a handler.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn normalize_base(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Runs the relay on `listener` with an in-memory store until the server
/// stops.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> std::io::Result<()> {
    let store = MemoryStore::new();
    let sweeper = store.spawn_sweeper(config.sweep_interval);

    let service = SignalingService::with_store(Arc::new(store), &config);
    let app = service.router(&config.base_path);

    info!(
        "Signaling relay listening on http://{}{}",
        listener.local_addr()?,
        normalize_base(&config.base_path)
    );
    let result = axum::serve(listener, app).await;
    sweeper.abort();
    result
}
