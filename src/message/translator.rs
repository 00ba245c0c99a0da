//! Request to canonical message translation.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::message::canonical::MessageTemplate;
use crate::submission::request::InboundRequest;

/// Builds the per-request [`MessageTemplate`].
#[derive(Debug, Clone, Default)]
pub struct MessageTranslator;

impl MessageTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Stamp namespace, api version, partitions, client address and
    /// `timestamp` from `request`. No id is set.
    pub fn template(&self, request: &InboundRequest, timestamp: i64) -> MessageTemplate {
        MessageTemplate::new(
            request.namespace(),
            request.api_version().map(str::to_owned),
            request.partitions().to_vec(),
            request.client_addr(),
            timestamp,
        )
    }

    /// Like [`template`](Self::template), additionally carrying the request's id.
    pub fn template_with_id(&self, request: &InboundRequest, timestamp: i64) -> MessageTemplate {
        let template = self.template(request, timestamp);
        match request.id() {
            Some(id) => template.with_id(id),
            None => template,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
