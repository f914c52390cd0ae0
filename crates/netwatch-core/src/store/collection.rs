// ── Generic reactive entity collection ──
//
// Lock-free concurrent storage with O(1) lookups and push-based
// change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

/// A lock-free, reactive collection for a single entity type.
///
/// Entities are stored under their `EntityId`. An optional natural key
/// (the IP address for devices) forms a unique secondary index. Every
/// mutation bumps a version counter and rebuilds the snapshot that
/// subscribers receive.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    /// Primary storage: EntityId -> entity.
    by_id: DashMap<EntityId, Arc<T>>,

    /// Secondary index: natural key -> EntityId.
    key_to_id: DashMap<String, EntityId>,

    /// Reverse of `key_to_id` for efficient re-keying and removal.
    id_to_key: DashMap<EntityId, String>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            key_to_id: DashMap::new(),
            id_to_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Apply many writes, publishing a single snapshot at the end.
    pub(crate) fn upsert_many(&self, items: impl IntoIterator<Item = (EntityId, Option<String>, T)>) {
        let mut touched = false;
        for (id, key, entity) in items {
            self.insert_quiet(id, key, entity);
            touched = true;
        }
        if touched {
            self.publish();
        }
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Look up an entity by its natural key.
    pub(crate) fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        let id = self.key_to_id.get(key)?;
        self.by_id.get(id.value()).map(|r| Arc::clone(r.value()))
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn insert_quiet(&self, id: EntityId, key: Option<String>, entity: T) {
        // Drop the old natural key if this entity moved (e.g. new IP).
        if let Some((_, old_key)) = self.id_to_key.remove(&id) {
            if key.as_deref() != Some(old_key.as_str()) {
                self.key_to_id.remove(&old_key);
            }
        }

        if let Some(key) = key {
            // Another entity holding this key loses it.
            if let Some(prev) = self.key_to_id.insert(key.clone(), id.clone()) {
                if prev != id {
                    self.id_to_key.remove(&prev);
                }
            }
            self.id_to_key.insert(id.clone(), key);
        }

        self.by_id.insert(id, Arc::new(entity));
    }

    /// Rebuild the snapshot, ordered by id, and broadcast to subscribers.
    fn publish(&self) {
        let mut values: Vec<(EntityId, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        let values: Vec<Arc<T>> = values.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn put(col: &EntityCollection<String>, id: &str, key: Option<&str>, value: &str) {
        col.upsert_many([(id.into(), key.map(str::to_owned), value.to_owned())]);
    }

    #[test]
    fn upsert_replaces_existing_id() {
        let col: EntityCollection<String> = EntityCollection::new();
        put(&col, "a", None, "hello");
        put(&col, "a", None, "world");
        assert_eq!(col.len(), 1);
        assert_eq!(*col.get(&"a".into()).unwrap(), "world");
    }

    #[test]
    fn natural_key_lookup() {
        let col: EntityCollection<String> = EntityCollection::new();
        put(&col, "sw-1", Some("10.0.0.2"), "switch");
        assert_eq!(*col.get_by_key("10.0.0.2").unwrap(), "switch");
        assert!(col.get_by_key("10.0.0.3").is_none());
    }

    #[test]
    fn rekey_drops_stale_key() {
        let col: EntityCollection<String> = EntityCollection::new();
        put(&col, "sw-1", Some("10.0.0.2"), "v1");
        put(&col, "sw-1", Some("10.0.0.9"), "v2");

        assert!(col.get_by_key("10.0.0.2").is_none());
        assert_eq!(*col.get_by_key("10.0.0.9").unwrap(), "v2");
    }

    #[test]
    fn key_moves_to_new_owner() {
        let col: EntityCollection<String> = EntityCollection::new();
        put(&col, "old", Some("10.0.0.2"), "old");
        put(&col, "new", Some("10.0.0.2"), "new");

        assert_eq!(*col.get_by_key("10.0.0.2").unwrap(), "new");
        // The old entity keeps existing, just without a natural key.
        assert!(col.get(&"old".into()).is_some());
    }

    #[test]
    fn empty_batch_publishes_nothing() {
        let col: EntityCollection<String> = EntityCollection::new();
        let v0 = col.version();
        col.upsert_many(Vec::new());
        assert_eq!(col.version(), v0);
    }

    #[test]
    fn snapshot_is_sorted_and_versioned() {
        let col: EntityCollection<String> = EntityCollection::new();
        let v0 = col.version();
        col.upsert_many([
            ("b".into(), None, "y".to_owned()),
            ("a".into(), None, "x".to_owned()),
        ]);

        let snap = col.snapshot();
        assert_eq!(snap.iter().map(|s| s.as_str()).collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(col.version(), v0 + 1);
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let col: EntityCollection<String> = EntityCollection::new();
        let mut rx = col.subscribe();
        put(&col, "a", None, "x");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
