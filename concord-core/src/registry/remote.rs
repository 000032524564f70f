//! Remote registry: the store of resources this peer has learned about,
//! keyed by originating provider (the stream id of the peer that
//! advertised them).

use std::sync::Arc;

use concord_proto::AnyPayload;
use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Callback contract for application-level watchers of the remote
/// registry. Invoked synchronously while the registry lock is held:
/// implementations must not re-enter registry mutation on the same
/// thread. An error aborts the current notification fan-out; the
/// registry's own state has already been mutated by that point.
pub trait RemoteObserver: Send + Sync {
    fn on_upsert(&self, resource_url: &str, provider_id: &str, payload: &AnyPayload) -> Result<()>;

    fn on_delete(&self, resource_url: &str, provider_id: &str, payload: &AnyPayload) -> Result<()>;
}

struct Inner {
    // providerId -> resourceId -> payload
    resources: IndexMap<String, IndexMap<String, AnyPayload>>,
    observers: IndexMap<String, Arc<dyn RemoteObserver>>,
}

/// `(providerId, resourceId) -> payload`, observer-fanout to the
/// application. Deleting a provider deletes all of its resources with one
/// `OnDelete` per entry.
pub struct RemoteRegistry {
    inner: Mutex<Inner>,
}

impl Default for RemoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                resources: IndexMap::new(),
                observers: IndexMap::new(),
            }),
        }
    }

    /// Stores the entry; emits `OnUpsert` to every observer regardless of
    /// whether the id existed under this provider already.
    pub fn upsert(&self, provider_id: &str, resource_id: &str, payload: AnyPayload) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .resources
            .entry(provider_id.to_string())
            .or_default()
            .insert(resource_id.to_string(), payload.clone());

        let type_url = payload.type_url.clone();
        for observer in inner.observers.values() {
            observer.on_upsert(&type_url, provider_id, &payload)?;
        }
        Ok(())
    }

    /// Removes the entry; emits `OnDelete`. Fails with `NotFound` if the
    /// provider or id is absent.
    pub fn delete(&self, provider_id: &str, resource_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let payload = inner
            .resources
            .get_mut(provider_id)
            .and_then(|entries| entries.shift_remove(resource_id))
            .ok_or_else(|| {
                Error::NotFound(format!("provider {provider_id} resource {resource_id}"))
            })?;

        let type_url = payload.type_url.clone();
        for observer in inner.observers.values() {
            observer.on_delete(&type_url, provider_id, &payload)?;
        }
        Ok(())
    }

    /// Removes every entry for `provider_id`, emitting one `OnDelete` per
    /// removed entry. Best-effort: an observer error for one entry does not
    /// stop the remaining entries from being torn down. Fails with
    /// `NotFound` only if the provider has no entries at all.
    pub fn delete_provider(&self, provider_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let entries = inner
            .resources
            .shift_remove(provider_id)
            .ok_or_else(|| Error::NotFound(format!("provider {provider_id}")))?;

        for (resource_id, payload) in entries {
            for observer in inner.observers.values() {
                if let Err(err) = observer.on_delete(&payload.type_url, provider_id, &payload) {
                    tracing::warn!(
                        %provider_id,
                        %resource_id,
                        %err,
                        "observer rejected teardown notification, continuing"
                    );
                }
            }
        }
        Ok(())
    }

    /// Registers `observer` under `watcher_id` and immediately replays
    /// every currently-known entry as `OnUpsert`. Fails with
    /// `AlreadyExists` if `watcher_id` is taken.
    pub fn watch_remote_resources(
        &self,
        watcher_id: &str,
        observer: Arc<dyn RemoteObserver>,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.observers.contains_key(watcher_id) {
            return Err(Error::AlreadyExists(format!("watcher {watcher_id}")));
        }
        inner
            .observers
            .insert(watcher_id.to_string(), observer.clone());

        for (provider_id, entries) in &inner.resources {
            for payload in entries.values() {
                observer.on_upsert(&payload.type_url, provider_id, payload)?;
            }
        }
        Ok(())
    }

    /// Deregisters `watcher_id`. Fails with `NotFound` if absent.
    pub fn unwatch_remote_resources(&self, watcher_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .observers
            .shift_remove(watcher_id)
            .ok_or_else(|| Error::NotFound(format!("watcher {watcher_id}")))?;
        Ok(())
    }
}
