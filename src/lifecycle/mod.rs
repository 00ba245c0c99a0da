//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → open connections finish → registry drains
//!             → producer flushes → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, flush
//! - Draining has a deadline; stragglers are abandoned after it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_handler, wait_for_signal};
