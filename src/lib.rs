//! HTTP submission gateway library.
//!
//! Accepts document submissions over HTTP, turns each into a canonical
//! message and hands it to a [`producer::Producer`].

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod observability;
pub mod producer;
pub mod submission;

pub use config::schema::GatewayConfig;
pub use http::SubmissionServer;
pub use lifecycle::Shutdown;
