//! Cascading deletes carried by the `X-Obsolete-Document` header.
//!
//! The header may repeat, and each occurrence may itself be a comma-separated
//! list (RFC 2616 §4.2). Occurrence order and list order are both significant:
//! deletes reach the backing log in exactly the order the client wrote them.

use axum::http::HeaderValue;

use crate::message::MessageTemplate;
use crate::producer::Producer;

pub const HEADER_OBSOLETE_DOCUMENT: &str = "X-Obsolete-Document";

/// Emits one delete per id listed in the obsolete-document header.
#[derive(Debug, Clone, Default)]
pub struct ObsoleteDocumentProcessor;

impl ObsoleteDocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Send a delete for every non-empty id in `values`, each derived from
    /// `template`, and return the audit string (`id1,id2,...,`).
    pub fn process<'a, I>(&self, values: I, template: &MessageTemplate, producer: &dyn Producer) -> String
    where
        I: IntoIterator<Item = &'a HeaderValue>,
    {
        let mut audit = String::new();

        for value in values {
            let Ok(value) = value.to_str() else {
                tracing::debug!(namespace = %template.namespace(), "Skipping non-text obsolete document header");
                continue;
            };

            for id in value.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                producer.send(template.delete(id));
                audit.push_str(id);
                audit.push(',');
            }
        }

        audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Operation;
    use crate::producer::MemoryProducer;
    use std::net::{IpAddr, Ipv4Addr};

    fn template() -> MessageTemplate {
        MessageTemplate::new(
            "telemetry",
            Some("1".into()),
            vec!["p".into()],
            IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)),
            555,
        )
    }

    fn values(raw: &[&'static str]) -> Vec<HeaderValue> {
        raw.iter().map(|v| HeaderValue::from_static(v)).collect()
    }

    #[test]
    fn splits_trims_and_keeps_order() {
        let producer = MemoryProducer::new();
        let audit = ObsoleteDocumentProcessor::new().process(&values(&["a, b", " c ,"]), &template(), &producer);

        let sent = producer.messages();
        let ids: Vec<_> = sent.iter().map(|m| m.id()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(audit, "a,b,c,");
        assert!(sent.iter().all(|m| m.operation() == Operation::Delete && m.payload().is_none()));
    }

    #[test]
    fn deletes_share_template_fields() {
        let producer = MemoryProducer::new();
        let template = template();
        ObsoleteDocumentProcessor::new().process(&values(&["x", "y"]), &template, &producer);

        for msg in producer.messages() {
            assert_eq!(msg.namespace(), "telemetry");
            assert_eq!(msg.api_version(), Some("1"));
            assert_eq!(msg.partitions(), ["p"]);
            assert_eq!(msg.timestamp(), 555);
            assert_eq!(msg.source_address(), template.source_address());
        }
    }

    #[test]
    fn blank_entries_produce_nothing() {
        let producer = MemoryProducer::new();
        let audit = ObsoleteDocumentProcessor::new().process(&values(&["", " , ,", ","]), &template(), &producer);
        assert!(producer.is_empty());
        assert_eq!(audit, "");
    }

    #[test]
    fn non_text_values_are_skipped() {
        let producer = MemoryProducer::new();
        let raw = vec![
            HeaderValue::from_bytes(b"\xffbad").unwrap(),
            HeaderValue::from_static("good"),
        ];
        let audit = ObsoleteDocumentProcessor::new().process(&raw, &template(), &producer);
        assert_eq!(audit, "good,");
        assert_eq!(producer.len(), 1);
    }
}
