//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Keep per-namespace and global HTTP counters
//! - Mirror every update to the `metrics` facade
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `submission_http_requests_total` (counter): requests by scope, method
//! - `submission_http_request_bytes_total` (counter): request body bytes by scope
//! - `submission_http_responses_total` (counter): responses by scope, status
//!
//! `scope` is the namespace, or `*` for the global counter set.
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Per-namespace sets are created on first use and live for the process

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;

/// Metric names as constants for consistency
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "submission_http_requests_total";
    pub const HTTP_REQUEST_BYTES_TOTAL: &str = "submission_http_request_bytes_total";
    pub const HTTP_RESPONSES_TOTAL: &str = "submission_http_responses_total";
}

/// Labels for metrics
pub mod labels {
    pub const SCOPE: &str = "scope";
    pub const METHOD: &str = "method";
    pub const STATUS: &str = "status";

    /// Scope value of the global counter set.
    pub const GLOBAL_SCOPE: &str = "*";
}

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// One counter set: requests by method, responses by status.
#[derive(Debug)]
pub struct HttpMetric {
    scope: String,
    requests: AtomicU64,
    request_bytes: AtomicU64,
    methods: DashMap<String, u64>,
    statuses: DashMap<u16, u64>,
}

impl HttpMetric {
    fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            requests: AtomicU64::new(0),
            request_bytes: AtomicU64::new(0),
            methods: DashMap::new(),
            statuses: DashMap::new(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn update_request_metrics(&self, method: &str, size: usize) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.request_bytes.fetch_add(size as u64, Ordering::Relaxed);
        *self.methods.entry(method.to_string()).or_insert(0) += 1;

        counter!(
            names::HTTP_REQUESTS_TOTAL,
            labels::SCOPE => self.scope.clone(),
            labels::METHOD => method.to_string(),
        )
        .increment(1);
        counter!(
            names::HTTP_REQUEST_BYTES_TOTAL,
            labels::SCOPE => self.scope.clone(),
        )
        .increment(size as u64);
    }

    pub fn update_response_metrics(&self, status: u16) {
        *self.statuses.entry(status).or_insert(0) += 1;

        counter!(
            names::HTTP_RESPONSES_TOTAL,
            labels::SCOPE => self.scope.clone(),
            labels::STATUS => status.to_string(),
        )
        .increment(1);
    }

    pub fn snapshot(&self) -> HttpMetricSnapshot {
        HttpMetricSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            request_bytes: self.request_bytes.load(Ordering::Relaxed),
            methods: self
                .methods
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            statuses: self
                .statuses
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect(),
        }
    }
}

/// Point-in-time copy of an [`HttpMetric`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HttpMetricSnapshot {
    pub requests: u64,
    pub request_bytes: u64,
    pub methods: BTreeMap<String, u64>,
    pub statuses: BTreeMap<u16, u64>,
}

impl HttpMetricSnapshot {
    pub fn responses(&self) -> u64 {
        self.statuses.values().sum()
    }

    pub fn status_count(&self, status: u16) -> u64 {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

/// Snapshot of every counter set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub global: HttpMetricSnapshot,
    pub namespaces: BTreeMap<String, HttpMetricSnapshot>,
}

/// Owner of the global and per-namespace counter sets.
#[derive(Debug)]
pub struct MetricsManager {
    global: Arc<HttpMetric>,
    namespaces: DashMap<String, Arc<HttpMetric>>,
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            global: Arc::new(HttpMetric::new(labels::GLOBAL_SCOPE)),
            namespaces: DashMap::new(),
        }
    }

    pub fn global_http_metric(&self) -> Arc<HttpMetric> {
        Arc::clone(&self.global)
    }

    /// Counter set for `namespace`, created on first use.
    pub fn http_metric_for_namespace(&self, namespace: &str) -> Arc<HttpMetric> {
        if let Some(metric) = self.namespaces.get(namespace) {
            return Arc::clone(metric.value());
        }
        let metric = self
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(HttpMetric::new(namespace)));
        Arc::clone(metric.value())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            global: self.global.snapshot(),
            namespaces: self
                .namespaces
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().snapshot()))
                .collect(),
        }
    }
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Request/response accounting used by the submission path.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    manager: Arc<MetricsManager>,
}

impl MetricsRecorder {
    pub fn new(manager: Arc<MetricsManager>) -> Self {
        Self { manager }
    }

    /// Count a request against `namespace` and the global set.
    pub fn record_request(&self, namespace: &str, method: &str, size: usize) {
        self.manager
            .http_metric_for_namespace(namespace)
            .update_request_metrics(method, size);
        self.manager
            .global_http_metric()
            .update_request_metrics(method, size);
    }

    /// Count a response globally, and against `namespace` when known.
    pub fn record_response(&self, namespace: Option<&str>, status: u16) {
        if let Some(namespace) = namespace {
            self.manager
                .http_metric_for_namespace(namespace)
                .update_response_metrics(status);
        }
        self.manager.global_http_metric().update_response_metrics(status);
    }

    pub fn manager(&self) -> &Arc<MetricsManager> {
        &self.manager
    }
}
