//! The set of live consumers for this process: lifetime-scoped teardown
//! of their provider state on deregistration.

use dashmap::DashMap;
use std::sync::Arc;

use super::consumer::Consumer;
use crate::error::{Error, Result};
use crate::registry::RemoteRegistry;

/// `streamId -> Consumer`. Deregistering a consumer cascades into
/// `RemoteRegistry::delete_provider`, tearing down every resource that
/// peer had announced.
pub struct ConsumerRegistry {
    consumers: DashMap<String, Arc<Consumer>>,
    remote_registry: Arc<RemoteRegistry>,
}

impl ConsumerRegistry {
    #[must_use]
    pub fn new(remote_registry: Arc<RemoteRegistry>) -> Self {
        Self {
            consumers: DashMap::new(),
            remote_registry,
        }
    }

    /// Creates a new entry for the consumer identified by `id`. Fails with
    /// `AlreadyExists` for a duplicate id.
    pub fn register(&self, id: &str) -> Result<Arc<Consumer>> {
        if self.consumers.contains_key(id) {
            return Err(Error::AlreadyExists(format!("consumer {id}")));
        }
        let consumer = Arc::new(Consumer::new(id, self.remote_registry.clone()));
        self.consumers.insert(id.to_string(), consumer.clone());
        Ok(consumer)
    }

    /// Deregisters the consumer identified by `id` and tears down every
    /// remote-registry entry it owned. A no-op if `id` was never
    /// registered or never announced any resource.
    pub fn deregister(&self, id: &str) {
        self.consumers.remove(id);
        if let Err(err) = self.remote_registry.delete_provider(id) {
            tracing::debug!(consumer = %id, %err, "no remote resources to tear down on deregister");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_duplicate_fails() {
        let registry = ConsumerRegistry::new(Arc::new(RemoteRegistry::new()));
        registry.register("stream-1").unwrap();
        assert!(matches!(
            registry.register("stream-1"),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn deregister_tears_down_remote_resources() {
        let remote = Arc::new(RemoteRegistry::new());
        let registry = ConsumerRegistry::new(remote.clone());
        let consumer = registry.register("stream-1").unwrap();

        let response = concord_proto::StreamResponse {
            resource_url: "type/FederatedService".to_string(),
            resource_id: "svc.acme.com".to_string(),
            payload: Some(concord_proto::AnyPayload {
                type_url: "type/FederatedService".to_string(),
                value: b"body".to_vec(),
            }),
            operation: concord_proto::Operation::Upsert as i32,
            nonce: "n".to_string(),
        };
        consumer.accept_stream_data(&response);

        registry.deregister("stream-1");
        assert!(matches!(
            remote.delete("stream-1", "svc.acme.com"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn deregister_unknown_is_a_noop() {
        let registry = ConsumerRegistry::new(Arc::new(RemoteRegistry::new()));
        registry.deregister("never-registered");
    }
}
