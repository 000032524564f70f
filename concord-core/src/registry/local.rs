//! Local registry: the store of resources this peer advertises.

use std::sync::Arc;

use concord_proto::{AnyPayload, Operation};
use indexmap::IndexMap;
use parking_lot::Mutex;
use prost::Message;

use crate::error::{Error, Result};
use crate::publisher::PublisherRegistry;

struct Inner {
    entries: IndexMap<String, AnyPayload>,
}

/// Mapping `resourceId -> payload`, change-detecting, fanning notifications
/// out to every live publisher. All mutating operations are serialized
/// under a single lock; `get_full` returns a consistent snapshot.
pub struct LocalRegistry {
    inner: Mutex<Inner>,
    publishers: Arc<PublisherRegistry>,
    only_publish_changes: bool,
}

impl LocalRegistry {
    #[must_use]
    pub fn new(publishers: Arc<PublisherRegistry>) -> Self {
        Self::with_policy(publishers, true)
    }

    /// `only_publish_changes` toggles whether a same-body upsert is a no-op
    /// (default `true`, per the protocol's `onlyPublishChanges` policy).
    #[must_use]
    pub fn with_policy(publishers: Arc<PublisherRegistry>, only_publish_changes: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: IndexMap::new(),
            }),
            publishers,
            only_publish_changes,
        }
    }

    /// Encodes `message` under `type_url`, stores it under `id`, and
    /// notifies publishers unless the policy is `onlyPublishChanges` and the
    /// body is unchanged. First insert always notifies.
    pub fn upsert<T: Message>(
        &self,
        id: impl Into<String>,
        type_url: &str,
        message: &T,
    ) -> Result<()> {
        let id = id.into();
        let mut body = Vec::with_capacity(message.encoded_len());
        message
            .encode(&mut body)
            .map_err(|e| Error::Encode(e.to_string()))?;
        let payload = AnyPayload {
            type_url: type_url.to_string(),
            value: body,
        };

        // The lock is held across the notify call (not dropped first) so
        // that two concurrent upserts to the same id are observed by
        // publishers in the same order their mutations were serialized in.
        let mut inner = self.inner.lock();
        let changed = match inner.entries.get(&id) {
            Some(existing) => existing.value != payload.value,
            None => true,
        };
        let should_notify = changed || !self.only_publish_changes;
        inner.entries.insert(id.clone(), payload.clone());

        if should_notify {
            self.publishers
                .notify(type_url, &id, payload, Operation::Upsert);
        }
        Ok(())
    }

    /// Removes `id`. Fails with `NotFound` if absent.
    pub fn delete(&self, id: &str) -> Result<()> {
        // As in `upsert`, the lock stays held across the notify call so
        // concurrent mutations are delivered in the order they were applied.
        let mut inner = self.inner.lock();
        let payload = inner
            .entries
            .shift_remove(id)
            .ok_or_else(|| Error::NotFound(format!("local resource {id}")))?;

        self.publishers
            .notify(&payload.type_url, id, payload, Operation::Delete);
        Ok(())
    }

    /// Snapshot of all entries whose type URL matches, or every entry if
    /// `type_url` is empty.
    #[must_use]
    pub fn get_full(&self, type_url: &str) -> Vec<(String, AnyPayload)> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|(_, payload)| type_url.is_empty() || payload.type_url == type_url)
            .map(|(id, payload)| (id.clone(), payload.clone()))
            .collect()
    }

    /// Id-only projection of `get_full`.
    #[must_use]
    pub fn get_all_resource_ids(&self, type_url: &str) -> Vec<String> {
        self.get_full(type_url)
            .into_iter()
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_proto::FederatedService;

    fn registry() -> LocalRegistry {
        LocalRegistry::new(Arc::new(PublisherRegistry::new()))
    }

    fn svc(fqdn: &str) -> FederatedService {
        FederatedService {
            fqdn: fqdn.to_string(),
            name: "svc".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_then_get_full_round_trips() {
        let registry = registry();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &svc("svc.acme.com"))
            .unwrap();
        let entries = registry.get_full("type/FederatedService");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "svc.acme.com");
    }

    #[test]
    fn upsert_idempotence_leaves_one_entry() {
        let registry = registry();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &svc("svc.acme.com"))
            .unwrap();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &svc("svc.acme.com"))
            .unwrap();
        assert_eq!(registry.get_all_resource_ids("").len(), 1);
    }

    #[test]
    fn delete_of_absent_fails() {
        let registry = registry();
        assert!(matches!(registry.delete("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn delete_removes_entry() {
        let registry = registry();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &svc("svc.acme.com"))
            .unwrap();
        registry.delete("svc.acme.com").unwrap();
        assert!(registry.get_full("").is_empty());
    }

    #[test]
    fn changed_body_notifies_again() {
        let registry = registry();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &svc("svc.acme.com"))
            .unwrap();
        let mut updated = svc("svc.acme.com");
        updated.name = "svc_blue".to_string();
        registry
            .upsert("svc.acme.com", "type/FederatedService", &updated)
            .unwrap();
        let entries = registry.get_full("");
        assert_eq!(entries.len(), 1);
    }
}
