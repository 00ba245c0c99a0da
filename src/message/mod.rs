//! Canonical message subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → translator.rs (stamp namespace, partitions, address, timestamp)
//!     → MessageTemplate (shared by every message of the request)
//!     → canonical.rs (store / delete variants, by value)
//!     → Producer::send
//! ```

pub mod canonical;
pub mod translator;

pub use canonical::{CanonicalMessage, MessageTemplate, Operation};
pub use translator::{now_millis, MessageTranslator};
