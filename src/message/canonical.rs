//! Canonical message and the per-request template it is stamped from.
//!
//! A [`MessageTemplate`] carries the provenance shared by every message one
//! request produces. Variants are derived from it by value; the template
//! itself is never modified, so a store and the deletes it cascades into all
//! carry the same namespace, partitions, client address and timestamp.

use std::net::IpAddr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// What a canonical message asks the backing log to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Create or replace the document.
    Store,
    /// Retract the document.
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Store => "STORE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit handed to the producer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    partitions: Vec<String>,
    #[serde(with = "raw_address")]
    source_address: IpAddr,
    timestamp: i64,
    id: String,
    operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Bytes>,
}

impl CanonicalMessage {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    pub fn partitions(&self) -> &[String] {
        &self.partitions
    }

    pub fn source_address(&self) -> IpAddr {
        self.source_address
    }

    /// Raw address bytes: 4 for IPv4, 16 for IPv6.
    pub fn source_address_octets(&self) -> Vec<u8> {
        raw_address::octets(&self.source_address)
    }

    /// Milliseconds since the Unix epoch, taken when the request arrived.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Document body. Only present on [`Operation::Store`].
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }
}

/// Source addresses travel as their raw octets.
mod raw_address {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn octets(addr: &IpAddr) -> Vec<u8> {
        match addr {
            IpAddr::V4(addr) => addr.octets().to_vec(),
            IpAddr::V6(addr) => addr.octets().to_vec(),
        }
    }

    pub fn serialize<S: Serializer>(addr: &IpAddr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&octets(addr))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IpAddr, D::Error> {
        let raw = Vec::<u8>::deserialize(deserializer)?;
        if let Ok(v4) = <[u8; 4]>::try_from(raw.as_slice()) {
            return Ok(IpAddr::V4(Ipv4Addr::from(v4)));
        }
        if let Ok(v6) = <[u8; 16]>::try_from(raw.as_slice()) {
            return Ok(IpAddr::V6(Ipv6Addr::from(v6)));
        }
        Err(D::Error::invalid_length(raw.len(), &"4 or 16 address octets"))
    }
}

/// Fields shared by every message derived from one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    namespace: String,
    api_version: Option<String>,
    partitions: Vec<String>,
    source_address: IpAddr,
    timestamp: i64,
    id: Option<String>,
}

impl MessageTemplate {
    pub fn new(
        namespace: impl Into<String>,
        api_version: Option<String>,
        partitions: Vec<String>,
        source_address: IpAddr,
        timestamp: i64,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            api_version,
            partitions,
            source_address,
            timestamp,
            id: None,
        }
    }

    /// Return a template that also carries the document id.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..self
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn source_address(&self) -> IpAddr {
        self.source_address
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Build a store message for `id` carrying `payload`.
    pub fn store(&self, id: impl Into<String>, payload: Bytes) -> CanonicalMessage {
        self.derive(id.into(), Operation::Store, Some(payload))
    }

    /// Build a delete message for `id`.
    pub fn delete(&self, id: impl Into<String>) -> CanonicalMessage {
        self.derive(id.into(), Operation::Delete, None)
    }

    /// Build a delete message for the template's own id, if it has one.
    pub fn delete_self(&self) -> Option<CanonicalMessage> {
        self.id.as_ref().map(|id| self.delete(id.clone()))
    }

    fn derive(&self, id: String, operation: Operation, payload: Option<Bytes>) -> CanonicalMessage {
        CanonicalMessage {
            namespace: self.namespace.clone(),
            api_version: self.api_version.clone(),
            partitions: self.partitions.clone(),
            source_address: self.source_address,
            timestamp: self.timestamp,
            id,
            operation,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn template() -> MessageTemplate {
        MessageTemplate::new(
            "telemetry",
            Some("1.0".into()),
            vec!["nightly".into(), "linux".into()],
            IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)),
            1_700_000_000_000,
        )
    }

    #[test]
    fn store_and_delete_share_provenance() {
        let template = template();
        let store = template.store("doc-1", Bytes::from_static(b"{}"));
        let delete = template.delete("doc-0");

        for msg in [&store, &delete] {
            assert_eq!(msg.namespace(), "telemetry");
            assert_eq!(msg.api_version(), Some("1.0"));
            assert_eq!(msg.partitions(), ["nightly", "linux"]);
            assert_eq!(msg.timestamp(), 1_700_000_000_000);
            assert_eq!(msg.source_address_octets(), vec![10, 1, 2, 3]);
        }

        assert_eq!(store.operation(), Operation::Store);
        assert_eq!(store.payload().map(|b| b.as_ref()), Some(&b"{}"[..]));
        assert_eq!(delete.operation(), Operation::Delete);
        assert!(delete.payload().is_none());
    }

    #[test]
    fn deriving_leaves_template_untouched() {
        let template = template();
        let before = template.clone();

        let _ = template.store("a", Bytes::from_static(b"x"));
        let _ = template.delete("b");

        assert_eq!(template, before);
        assert_eq!(template.id(), None);
    }

    #[test]
    fn delete_self_requires_id() {
        assert!(template().delete_self().is_none());

        let msg = template().with_id("doc-9").delete_self().unwrap();
        assert_eq!(msg.id(), "doc-9");
        assert_eq!(msg.operation(), Operation::Delete);
    }

    #[test]
    fn source_address_survives_json() {
        let template = MessageTemplate::new("ns", None, vec![], IpAddr::V6(Ipv6Addr::LOCALHOST), 0);
        let msg = template.delete("x");
        let back: CanonicalMessage = serde_json::from_str(&serde_json::to_string(&msg).unwrap()).unwrap();
        assert_eq!(back.source_address(), IpAddr::V6(Ipv6Addr::LOCALHOST));

        let bad = r#"{"namespace":"ns","source_address":[1,2,3],"timestamp":0,"id":"x","operation":"DELETE"}"#;
        assert!(serde_json::from_str::<CanonicalMessage>(bad).is_err());
    }

    #[test]
    fn ipv6_octets() {
        let template = MessageTemplate::new("ns", None, vec![], IpAddr::V6(Ipv6Addr::LOCALHOST), 0);
        assert_eq!(template.delete("x").source_address_octets().len(), 16);
    }

    #[test]
    fn serializes_without_empty_fields() {
        let msg = MessageTemplate::new("ns", None, vec![], IpAddr::V4(Ipv4Addr::LOCALHOST), 42).delete("x");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "namespace": "ns",
                "source_address": [127, 0, 0, 1],
                "timestamp": 42,
                "id": "x",
                "operation": "DELETE",
            })
        );
    }
}
