//! Structured submission request.
//!
//! Built by the [`Validator`](crate::submission::validator::Validator) from a
//! raw HTTP request and consumed read-only by the dispatcher.

use std::net::IpAddr;

use axum::http::{header::AsHeaderName, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;

/// A parsed request against the gateway.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    endpoint: String,
    namespace: String,
    id: Option<String>,
    api_version: Option<String>,
    partitions: Vec<String>,
    headers: HeaderMap,
    body: Bytes,
    client_addr: IpAddr,
}

impl InboundRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, client_addr: IpAddr) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            namespace: String::new(),
            id: None,
            api_version: None,
            partitions: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_addr,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn with_partitions(mut self, partitions: Vec<String>) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Append a header value, keeping earlier values of the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolved document id: taken from the path, or generated for stores
    /// that did not name one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Every value of `name`, in the order received.
    pub fn header_values<K: AsHeaderName>(&self, name: K) -> impl Iterator<Item = &HeaderValue> {
        self.headers.get_all(name).into_iter()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Originating client address, after honouring a trusted forwarding header.
    pub fn client_addr(&self) -> IpAddr {
        self.client_addr
    }
}
