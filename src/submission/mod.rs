//! Submission handling subsystem.
//!
//! # Data Flow
//! ```text
//! raw HTTP request
//!     → validator.rs (path → namespace / id / partitions, namespace policy)
//!     → request.rs (InboundRequest)
//!     → dispatcher.rs (route on endpoint + method)
//!         PUT/POST → store message, then obsolete.rs cascade of deletes
//!         DELETE   → single delete message
//!         OPTIONS  → CORS preflight
//!     → ResponseWriter (status, entity, response metric)
//!
//! Any failure on the way:
//!     → error.rs (classify → status or silent close)
//! ```
//!
//! # Design Decisions
//! - One template per request; every message of a request is stamped from it
//! - Sends happen synchronously, in header order, before the response is built
//! - Failure classification happens exactly once, at the dispatcher

pub mod dispatcher;
pub mod error;
pub mod obsolete;
pub mod request;
pub mod validator;

pub use dispatcher::{InboundEvent, RequestDispatcher};
pub use error::{classify, Classification, SubmissionError};
pub use obsolete::{ObsoleteDocumentProcessor, HEADER_OBSOLETE_DOCUMENT};
pub use request::InboundRequest;
pub use validator::{Validator, ENDPOINT_SUBMIT};
