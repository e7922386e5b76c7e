use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{routing::get, Router};
use serde_json::Value;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::store::MemoryStore;

pub mod handlers;

#[derive(Clone)]
pub struct MockState {
    pub store: Arc<MemoryStore>,
    pub db_path: Option<Arc<PathBuf>>,
    writes: Arc<Mutex<()>>,
}

/// A write in progress. Holding it keeps other writers out until the
/// change is saved or rolled back.
pub(crate) struct WriteGuard<'a> {
    state: &'a MockState,
    before: Option<Value>,
    _lock: MutexGuard<'a, ()>,
}

impl WriteGuard<'_> {
    /// Saves the database file. On failure the in-memory change is undone.
    pub(crate) async fn commit(self) -> anyhow::Result<()> {
        let (Some(path), Some(before)) = (&self.state.db_path, &self.before) else {
            return Ok(());
        };
        if let Err(e) = self.state.store.save_file(path).await {
            if let Err(undo) = self.state.store.restore(before).await {
                error!(error = %undo, "could not roll back unsaved change");
            }
            return Err(e);
        }
        Ok(())
    }
}

impl MockState {
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            db_path: None,
            writes: Arc::default(),
        }
    }

    /// Store backed by a JSON file, written after every change.
    pub fn with_file(path: PathBuf) -> anyhow::Result<Self> {
        let store = MemoryStore::load_file(&path)?;
        Ok(Self {
            store: Arc::new(store),
            db_path: Some(Arc::new(path)),
            writes: Arc::default(),
        })
    }

    /// Starts a write. Pair every store change with `commit`.
    pub(crate) async fn begin_write(&self) -> WriteGuard<'_> {
        let lock = self.writes.lock().await;
        let before = match self.db_path {
            Some(_) => Some(self.store.snapshot().await),
            None => None,
        };
        WriteGuard {
            state: self,
            before,
            _lock: lock,
        }
    }
}

pub fn build_app(state: MockState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(handlers::collection_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;
    tracing::info!("mock store listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
