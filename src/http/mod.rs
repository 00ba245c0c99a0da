//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper HTTP/1.1, keep-alive off, trace layer)
//!     → request.rs (body limit, client address, validation → InboundEvent)
//!     → submission dispatcher
//!     → response.rs (OutboundResponse → hyper response)
//!     → Send to client, close connection
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::RequestExtractor;
pub use response::{OutboundResponse, ResponseWriter};
pub use server::SubmissionServer;
