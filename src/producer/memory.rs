//! In-memory producer.

use std::sync::Mutex;

use crate::message::CanonicalMessage;
use crate::producer::Producer;

/// Records every message in send order.
#[derive(Debug, Default)]
pub struct MemoryProducer {
    messages: Mutex<Vec<CanonicalMessage>>,
}

impl MemoryProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far.
    pub fn messages(&self) -> Vec<CanonicalMessage> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Producer for MemoryProducer {
    fn send(&self, message: CanonicalMessage) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message);
    }
}
