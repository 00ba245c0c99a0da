//! Request validation.
//!
//! Turns method, path, headers and body into an [`InboundRequest`].
//!
//! Path grammar:
//! ```text
//! /[<api-version>/]<endpoint>[/<namespace>[/<id>[/<partition>...]]]
//! ```
//! Requests for an endpoint other than `submit` pass through carrying only the
//! endpoint; the dispatcher answers them.

use std::collections::HashMap;
use std::net::IpAddr;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::submission::error::{Result, SubmissionError};
use crate::submission::obsolete::HEADER_OBSOLETE_DOCUMENT;
use crate::submission::request::InboundRequest;

/// The one endpoint that accepts submissions.
pub const ENDPOINT_SUBMIT: &str = "submit";

const MAX_NAMESPACE_LENGTH: usize = 64;

/// Namespace names: ASCII alphanumerics, `-`, `_` and `.`.
pub fn is_valid_namespace(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAMESPACE_LENGTH
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Ids must be usable verbatim as a URI path segment.
pub fn is_valid_id(id: &str, max_length: usize) -> bool {
    if id.is_empty() || id.len() > max_length {
        return false;
    }

    let bytes = id.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3);
                if !matches!(hex, Some(h) if h.iter().all(u8::is_ascii_hexdigit)) {
                    return false;
                }
                i += 3;
            }
            b if is_segment_char(b) => i += 1,
            _ => return false,
        }
    }
    true
}

// RFC 3986 pchar without pct-encoded.
fn is_segment_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.' | b'_' | b'~' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+'
                | b',' | b';' | b'=' | b':' | b'@'
        )
}

fn is_api_version(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit())
        && !segment.ends_with('.')
        && !segment.contains("..")
        && segment.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Builds [`InboundRequest`]s and enforces namespace policy.
#[derive(Debug, Clone)]
pub struct Validator {
    /// Namespace name → delete allowed.
    namespaces: HashMap<String, bool>,
    max_id_length: usize,
}

impl Validator {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            namespaces: config
                .namespaces
                .iter()
                .map(|ns| (ns.name.clone(), ns.allow_delete))
                .collect(),
            max_id_length: config.gateway.max_id_length,
        }
    }

    pub fn validate(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Bytes,
        client_addr: IpAddr,
    ) -> Result<InboundRequest> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();

        let api_version = match segments.peek() {
            Some(segment) if is_api_version(segment) => segments.next(),
            _ => None,
        };
        let endpoint = segments.next().unwrap_or_default();

        if endpoint != ENDPOINT_SUBMIT {
            return Ok(InboundRequest::new(method, endpoint, client_addr).with_headers(headers));
        }

        let namespace = segments
            .next()
            .ok_or_else(|| SubmissionError::invalid_resource(format!("no namespace in {path}")))?;
        let allow_delete = self.namespace_policy(namespace)?;

        let id = match segments.next() {
            Some(id) if is_valid_id(id, self.max_id_length) => Some(id.to_string()),
            Some(id) => {
                return Err(SubmissionError::invalid_resource(format!("invalid id {id:?}")));
            }
            None if method == Method::POST || method == Method::PUT => Some(Uuid::new_v4().to_string()),
            None if method == Method::DELETE => {
                return Err(SubmissionError::invalid_resource(format!("no id in {path}")));
            }
            None => None,
        };

        let partitions: Vec<String> = segments.map(str::to_owned).collect();

        let retracts = method == Method::DELETE
            || ((method == Method::POST || method == Method::PUT)
                && headers.contains_key(HEADER_OBSOLETE_DOCUMENT));
        if retracts && !allow_delete {
            return Err(SubmissionError::access_denied(format!(
                "delete not permitted in namespace {namespace}"
            )));
        }

        let mut request = InboundRequest::new(method, endpoint, client_addr)
            .with_namespace(namespace)
            .with_partitions(partitions)
            .with_headers(headers)
            .with_body(body);
        if let Some(version) = api_version {
            request = request.with_api_version(version);
        }
        if let Some(id) = id {
            request = request.with_id(id);
        }
        Ok(request)
    }

    /// Whether `namespace` may be retracted from; errors if it is unknown.
    fn namespace_policy(&self, namespace: &str) -> Result<bool> {
        if !is_valid_namespace(namespace) {
            return Err(SubmissionError::invalid_resource(format!(
                "invalid namespace {namespace:?}"
            )));
        }
        self.namespaces
            .get(namespace)
            .copied()
            .ok_or_else(|| SubmissionError::invalid_resource(format!("unknown namespace {namespace}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamespaceConfig;
    use axum::http::HeaderValue;
    use std::net::Ipv4Addr;

    const CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

    fn validator() -> Validator {
        let mut config = GatewayConfig::default();
        config.namespaces = vec![NamespaceConfig { name: "telemetry".into(), allow_delete: true }];
        Validator::new(&config)
    }

    fn restricted() -> Validator {
        let mut config = GatewayConfig::default();
        config.namespaces = vec![
            NamespaceConfig { name: "telemetry".into(), allow_delete: true },
            NamespaceConfig { name: "crashes".into(), allow_delete: false },
        ];
        Validator::new(&config)
    }

    fn validate(v: &Validator, method: Method, path: &str) -> Result<InboundRequest> {
        v.validate(method, path, HeaderMap::new(), Bytes::from_static(b"{}"), CLIENT)
    }

    #[test]
    fn parses_full_path() {
        let req = validate(&validator(), Method::PUT, "/1.0/submit/telemetry/abc-123/nightly/linux").unwrap();
        assert_eq!(req.endpoint(), "submit");
        assert_eq!(req.api_version(), Some("1.0"));
        assert_eq!(req.namespace(), "telemetry");
        assert_eq!(req.id(), Some("abc-123"));
        assert_eq!(req.partitions(), ["nightly", "linux"]);
        assert_eq!(req.body().as_ref(), b"{}");
        assert_eq!(req.client_addr(), CLIENT);
    }

    #[test]
    fn post_without_id_gets_generated_uuid() {
        let req = validate(&validator(), Method::POST, "/submit/telemetry").unwrap();
        let id = req.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert!(req.partitions().is_empty());
        assert_eq!(req.api_version(), None);
    }

    #[test]
    fn delete_without_id_is_invalid() {
        let err = validate(&validator(), Method::DELETE, "/submit/telemetry").unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResource(_)));
    }

    #[test]
    fn other_endpoints_pass_through() {
        let req = validate(&validator(), Method::GET, "/status/whatever").unwrap();
        assert_eq!(req.endpoint(), "status");
        assert_eq!(req.namespace(), "");

        let req = validate(&validator(), Method::GET, "/").unwrap();
        assert_eq!(req.endpoint(), "");
    }

    #[test]
    fn missing_or_bad_namespace_is_invalid() {
        assert!(matches!(
            validate(&validator(), Method::PUT, "/submit"),
            Err(SubmissionError::InvalidResource(_))
        ));
        assert!(matches!(
            validate(&validator(), Method::PUT, "/submit/bad%20ns/id"),
            Err(SubmissionError::InvalidResource(_))
        ));
    }

    #[test]
    fn unknown_namespace_is_invalid_when_restricted() {
        assert!(validate(&restricted(), Method::PUT, "/submit/telemetry/x").is_ok());
        assert!(matches!(
            validate(&restricted(), Method::PUT, "/submit/other/x"),
            Err(SubmissionError::InvalidResource(_))
        ));
    }

    #[test]
    fn no_namespaces_configured_rejects_everything() {
        let empty = Validator::new(&GatewayConfig::default());
        assert!(matches!(
            validate(&empty, Method::PUT, "/submit/telemetry/x"),
            Err(SubmissionError::InvalidResource(_))
        ));
    }

    #[test]
    fn delete_denied_by_namespace_policy() {
        assert!(validate(&restricted(), Method::DELETE, "/submit/telemetry/x").is_ok());
        assert!(matches!(
            validate(&restricted(), Method::DELETE, "/submit/crashes/x"),
            Err(SubmissionError::AccessDenied(_))
        ));
        assert!(validate(&restricted(), Method::PUT, "/submit/crashes/x").is_ok());
    }

    #[test]
    fn obsolete_header_counts_as_delete() {
        let mut headers = HeaderMap::new();
        headers.append(HEADER_OBSOLETE_DOCUMENT, HeaderValue::from_static("old"));
        let err = restricted()
            .validate(Method::PUT, "/submit/crashes/x", headers, Bytes::new(), CLIENT)
            .unwrap_err();
        assert!(matches!(err, SubmissionError::AccessDenied(_)));
    }

    #[test]
    fn id_rules() {
        assert!(is_valid_id("abc-123_~.", 128));
        assert!(is_valid_id("a%2Fb", 128));
        assert!(!is_valid_id("a%2", 128));
        assert!(!is_valid_id("a%zz", 128));
        assert!(!is_valid_id("with space", 128));
        assert!(!is_valid_id("", 128));
        assert!(!is_valid_id("abcd", 3));

        let err = validate(&validator(), Method::PUT, "/submit/telemetry/a%zz").unwrap_err();
        assert!(matches!(err, SubmissionError::InvalidResource(_)));
    }

    #[test]
    fn api_version_detection() {
        assert!(is_api_version("1"));
        assert!(is_api_version("1.0"));
        assert!(is_api_version("2.10.3"));
        assert!(!is_api_version("v1"));
        assert!(!is_api_version("1."));
        assert!(!is_api_version("1..0"));
        assert!(!is_api_version("submit"));
    }

    #[test]
    fn options_without_id_is_allowed() {
        let req = validate(&validator(), Method::OPTIONS, "/submit/telemetry").unwrap();
        assert_eq!(req.id(), None);
    }
}
