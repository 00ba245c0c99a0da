//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Accept connections through the bounded listener
//! - Register each connection with the registry
//! - Serve HTTP/1.1 with keep-alive disabled: one exchange, then close
//! - Wire up middleware (tracing)
//! - Turn each request into an inbound event and dispatch it
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::http::request::RequestExtractor;
use crate::net::{ConnectionRegistry, Listener, ListenerError};
use crate::observability::MetricsRecorder;
use crate::producer::Producer;
use crate::submission::{RequestDispatcher, SubmissionError};

/// Shared state behind every connection.
struct ServerState {
    extractor: RequestExtractor,
    dispatcher: RequestDispatcher,
}

impl ServerState {
    async fn serve(&self, request: Request<Incoming>, peer: SocketAddr) -> Result<Response<Body>, SubmissionError> {
        let event = self.extractor.extract(request, peer).await;
        match self.dispatcher.handle(event) {
            Some(response) => Ok(response.into_http()),
            // Erroring the service makes hyper drop the connection unanswered.
            None => Err(SubmissionError::ConnectionClosed),
        }
    }
}

/// HTTP server for the submission gateway.
pub struct SubmissionServer {
    state: Arc<ServerState>,
    registry: ConnectionRegistry,
    drain_timeout: Duration,
}

impl SubmissionServer {
    /// Create a new server with the given configuration and collaborators.
    pub fn new(
        config: &GatewayConfig,
        producer: Arc<dyn Producer>,
        metrics: MetricsRecorder,
        registry: ConnectionRegistry,
    ) -> Self {
        let state = ServerState {
            extractor: RequestExtractor::new(config),
            dispatcher: RequestDispatcher::new(producer, metrics),
        };

        Self {
            state: Arc::new(state),
            registry,
            drain_timeout: Duration::from_secs(config.shutdown.drain_timeout_secs),
        }
    }

    /// Run the server until `shutdown` fires, then wait for open connections.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %addr,
            max_connections = listener.max_connections(),
            "HTTP server starting"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(connection) => connection,
                        Err(ListenerError::Closed) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let guard = self.registry.register(peer);
                    let connection_id = guard.id();
                    let state = Arc::clone(&self.state);
                    let connection_shutdown = shutdown.resubscribe();

                    tokio::spawn(async move {
                        let _permit = permit;
                        let _guard = guard;
                        serve_connection(stream, peer, state, connection_shutdown)
                            .instrument(tracing::debug_span!("connection", id = %connection_id))
                            .await;
                    });
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(open_connections = self.registry.open_count(), "HTTP server draining");
        if !self.registry.drain(self.drain_timeout).await {
            for (id, peer) in self.registry.peers() {
                tracing::warn!(connection_id = %id, peer_addr = %peer, "Connection still open after drain timeout");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let service = tower::service_fn(move |request: Request<Incoming>| {
        let state = Arc::clone(&state);
        async move { state.serve(request, peer).await }
    });
    let service = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http().on_failure(()))
        .service(service);

    let connection = http1::Builder::new()
        .keep_alive(false)
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!(peer_addr = %peer, error = %e, "Connection ended with error");
    }
}
