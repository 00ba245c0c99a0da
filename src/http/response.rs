//! Response construction.
//!
//! # Responsibilities
//! - Build plain-text responses with content metadata
//! - Mark every response `Connection: close`; the server writes it and then
//!   closes the connection (keep-alive is disabled)
//! - Record the response metric once the final status is known
//!
//! # Design Decisions
//! - Responses are plain values until handed to hyper, so handlers stay
//!   independent of the transport
//! - CORS preflight answers are not metered

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use bytes::Bytes;

use crate::observability::MetricsRecorder;

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "POST,PUT,DELETE";
pub const CORS_ALLOW_HEADERS: &str = "X-Requested-With, Content-Type, Content-Length";

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl OutboundResponse {
    fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        Self {
            status,
            headers,
            body: Bytes::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_text(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }

    /// Add a header to the response.
    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn into_http(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Builds responses and accounts for them.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    metrics: MetricsRecorder,
}

impl ResponseWriter {
    pub fn new(metrics: MetricsRecorder) -> Self {
        Self { metrics }
    }

    /// Plain-text response with an optional entity. The response metric is
    /// attributed to `namespace` only when one is given.
    pub fn write(&self, status: StatusCode, namespace: Option<&str>, entity: Option<&str>) -> OutboundResponse {
        let mut response = OutboundResponse::new(status);
        response
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));

        if let Some(entity) = entity {
            response.body = Bytes::copy_from_slice(entity.as_bytes());
            response
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(response.body.len()));
        }

        self.metrics.record_response(namespace, response.status.as_u16());
        response
    }

    /// CORS preflight answer. Not metered.
    pub fn preflight(&self) -> OutboundResponse {
        OutboundResponse::new(StatusCode::OK)
            .with_header(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(CORS_ALLOW_ORIGIN),
            )
            .with_header(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(CORS_ALLOW_METHODS),
            )
            .with_header(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(CORS_ALLOW_HEADERS),
            )
    }
}
