//! Connection registry.
//!
//! # Responsibilities
//! - Register every accepted connection under a unique id
//! - Deregister it when its task ends (guard dropped)
//! - Let shutdown wait for open connections to drain
//!
//! The registry is bookkeeping only; no request decision consults it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Inner {
    open: DashMap<ConnectionId, SocketAddr>,
    closed: Notify,
}

/// Open connections, shared between the accept loop and the admin API.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. It stays registered until the guard drops.
    pub fn register(&self, peer: SocketAddr) -> ConnectionGuard {
        let id = ConnectionId::new();
        self.inner.open.insert(id, peer);
        tracing::trace!(connection_id = %id, peer_addr = %peer, "Connection registered");
        ConnectionGuard {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    /// Number of currently open connections.
    pub fn open_count(&self) -> usize {
        self.inner.open.len()
    }

    /// Peer addresses of the open connections.
    pub fn peers(&self) -> Vec<(ConnectionId, SocketAddr)> {
        self.inner
            .open
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    /// Wait until every connection has closed or `timeout` elapses.
    /// Returns whether the registry drained.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let closed = self.inner.closed.notified();
                if self.inner.open.is_empty() {
                    return;
                }
                closed.await;
            }
        };

        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
/// Deregisters the connection when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    inner: Arc<Inner>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.inner.open.remove(&self.id);
        self.inner.closed.notify_waiters();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}
