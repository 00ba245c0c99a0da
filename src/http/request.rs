//! Request extraction.
//!
//! # Responsibilities
//! - Enforce the body size limit (declared length first, then while reading)
//! - Resolve the originating client address, honouring a trusted forwarding header
//! - Hand method, path, headers and body to the validator
//! - Turn every failure on the way into an [`InboundEvent::Failure`]
//!
//! # Design Decisions
//! - Oversized bodies are rejected before they are fully read
//! - Only the first entry of the forwarding header is trusted

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap, HeaderName, Method, Request};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body as HttpBody;

use crate::config::GatewayConfig;
use crate::submission::{InboundEvent, SubmissionError, Validator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reads raw requests into inbound events.
#[derive(Debug, Clone)]
pub struct RequestExtractor {
    validator: Validator,
    max_body_size: usize,
    forward_header: Option<HeaderName>,
}

impl RequestExtractor {
    pub fn new(config: &GatewayConfig) -> Self {
        let header = &config.gateway.trusted_forward_header;
        Self {
            validator: Validator::new(config),
            max_body_size: config.gateway.max_body_size,
            forward_header: if header.is_empty() {
                None
            } else {
                HeaderName::from_bytes(header.as_bytes()).ok()
            },
        }
    }

    pub async fn extract<B>(&self, request: Request<B>, peer: SocketAddr) -> InboundEvent
    where
        B: HttpBody,
        B::Error: Into<BoxError>,
    {
        let client_addr = resolve_client_addr(request.headers(), peer.ip(), self.forward_header.as_ref());

        if request.method() == Method::CONNECT || request.headers().contains_key(header::UPGRADE) {
            return InboundEvent::Unsupported { client_addr };
        }

        if declared_length(request.headers()).is_some_and(|len| len > self.max_body_size as u64) {
            return InboundEvent::Failure(SubmissionError::PayloadTooLarge {
                limit: self.max_body_size,
            });
        }

        let (parts, body) = request.into_parts();
        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => return InboundEvent::Failure(body_error(e, self.max_body_size)),
        };

        match self
            .validator
            .validate(parts.method, parts.uri.path(), parts.headers, body, client_addr)
        {
            Ok(request) => InboundEvent::Request(request),
            Err(e) => InboundEvent::Failure(e),
        }
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn body_error(error: BoxError, limit: usize) -> SubmissionError {
    if error.is::<LengthLimitError>() {
        return SubmissionError::PayloadTooLarge { limit };
    }
    if is_disconnect(&*error) {
        return SubmissionError::ConnectionClosed;
    }
    SubmissionError::unexpected_with_source(format!("failed to read request body: {error}"), error)
}

/// Whether `error`, or anything in its source chain, means the client went away.
/// hyper wraps a truncated body as `Body` error around an `UnexpectedEof` io error.
fn is_disconnect(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(e) = current {
        if let Some(hyper_err) = e.downcast_ref::<hyper::Error>() {
            if hyper_err.is_incomplete_message() || hyper_err.is_closed() || hyper_err.is_canceled() {
                return true;
            }
        }
        if let Some(io_err) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io_err.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// First address listed in the trusted forwarding header, or the socket peer.
pub fn resolve_client_addr(headers: &HeaderMap, peer: IpAddr, forward_header: Option<&HeaderName>) -> IpAddr {
    forward_header
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .unwrap_or(peer)
}
