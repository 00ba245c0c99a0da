//! Admin API: read-only status and counters behind a bearer token.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::net::ConnectionRegistry;
use crate::observability::MetricsManager;

use self::auth::admin_auth_middleware;
use self::handlers::{get_metrics, get_status};

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub metrics: Arc<MetricsManager>,
    pub registry: ConnectionRegistry,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(metrics: Arc<MetricsManager>, registry: ConnectionRegistry, api_key: &str) -> Self {
        Self {
            metrics,
            registry,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/metrics", get(get_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Admin API listening");
    }
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
