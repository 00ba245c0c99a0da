//! Backing log producers.
//!
//! # Data Flow
//! ```text
//! RequestDispatcher
//!     → Producer::send (synchronous, non-blocking, best-effort)
//!     → log.rs (channel → background task → append-only JSON lines file)
//!     → memory.rs (ordered in-process record, tests and dry runs)
//! ```
//!
//! # Design Decisions
//! - `send` never blocks the request path and never reports delivery
//! - Ownership of a message transfers to the producer on `send`
//! - Ordering is preserved per sender

pub mod log;
pub mod memory;

use thiserror::Error;

use crate::message::CanonicalMessage;

pub use log::LogProducer;
pub use memory::MemoryProducer;

/// Appends canonical messages to the backing log.
pub trait Producer: Send + Sync {
    /// Hand `message` over for delivery. Delivery failures are the
    /// producer's concern and are not reported back.
    fn send(&self, message: CanonicalMessage);
}

/// Errors raised while setting up or running a producer.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("failed to open backing log {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode message {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write backing log: {0}")]
    Write(#[from] std::io::Error),
}
