//! The set of live publishers for this process: fan-out of local-registry
//! events to every attached stream.

use dashmap::DashMap;
use std::sync::Arc;

use concord_proto::{AnyPayload, Operation, StreamResponse};

use super::publisher::Publisher;
use crate::error::{Error, Result};

/// `streamId -> Publisher`, guarded internally by `DashMap`'s sharded
/// locking.
pub struct PublisherRegistry {
    publishers: DashMap<String, Arc<Publisher>>,
}

impl Default for PublisherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PublisherRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            publishers: DashMap::new(),
        }
    }

    /// Creates a new entry for the publisher identified by `id`. Fails
    /// with `AlreadyExists` for a duplicate id.
    pub fn register(&self, id: &str) -> Result<Arc<Publisher>> {
        if self.publishers.contains_key(id) {
            return Err(Error::AlreadyExists(format!("publisher {id}")));
        }
        let publisher = Arc::new(Publisher::new(id));
        self.publishers.insert(id.to_string(), publisher.clone());
        Ok(publisher)
    }

    /// Deregisters the publisher identified by `id`. A no-op if absent.
    pub fn deregister(&self, id: &str) {
        self.publishers.remove(id);
    }

    /// Fans a local-registry event out to every live publisher. A
    /// publisher whose queue overflows is logged and skipped: isolating
    /// failure to one laggy peer is the chosen trade-off, so one
    /// publisher's overflow never stops delivery to the others.
    pub fn notify(&self, type_url: &str, resource_id: &str, payload: AnyPayload, operation: Operation) {
        for entry in &self.publishers {
            let response = StreamResponse {
                resource_url: type_url.to_string(),
                resource_id: resource_id.to_string(),
                payload: Some(payload.clone()),
                operation: operation as i32,
                nonce: String::new(),
            };
            if let Err(err) = entry.value().notify_stream(response) {
                tracing::warn!(
                    publisher = entry.key(),
                    %resource_id,
                    %err,
                    "failed to fan out resource change to publisher"
                );
            }
        }
    }
}
