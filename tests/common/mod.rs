//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use submission_gateway::config::{GatewayConfig, NamespaceConfig};
use submission_gateway::net::{ConnectionRegistry, Listener, ListenerError};
use submission_gateway::observability::{MetricsManager, MetricsRecorder};
use submission_gateway::producer::{MemoryProducer, Producer};
use submission_gateway::{Shutdown, SubmissionServer};

/// A gateway running on an ephemeral port.
#[allow(dead_code)]
pub struct TestGateway {
    pub addr: SocketAddr,
    pub producer: Arc<MemoryProducer>,
    pub metrics: Arc<MetricsManager>,
    pub registry: ConnectionRegistry,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), ListenerError>>,
}

#[allow(dead_code)]
impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Configuration with a `telemetry` namespace and a read-only `archive` namespace.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.namespaces = vec![
        NamespaceConfig {
            name: "telemetry".into(),
            allow_delete: true,
        },
        NamespaceConfig {
            name: "archive".into(),
            allow_delete: false,
        },
    ];
    config.shutdown.drain_timeout_secs = 2;
    config
}

/// Start a gateway with `config`, backed by an in-memory producer.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_listener(tcp, config.listener.max_connections);

    let producer = Arc::new(MemoryProducer::new());
    let metrics = Arc::new(MetricsManager::new());
    let registry = ConnectionRegistry::new();
    let shutdown = Shutdown::new();

    let server = SubmissionServer::new(
        &config,
        Arc::clone(&producer) as Arc<dyn Producer>,
        MetricsRecorder::new(Arc::clone(&metrics)),
        registry.clone(),
    );
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestGateway {
        addr,
        producer,
        metrics,
        registry,
        shutdown,
        task,
    }
}

/// HTTP client that never goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
