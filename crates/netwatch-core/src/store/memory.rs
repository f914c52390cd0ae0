// ── In-memory entity store ──
//
// Reactive `EntityCollection`s hold committed state. Transactions stage
// writes in their own maps and apply them under a commit lock.

use std::net::IpAddr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::debug;

use super::collection::EntityCollection;
use super::filter::EventFilter;
use super::{EntityStore, StoreError, StoreTransaction};
use crate::model::{Device, EntityId, Event, EventSubject, EventType, Link};

/// Serializable image of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Cheaply cloneable in-memory store.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    devices: EntityCollection<Device>,
    links: EntityCollection<Link>,
    events: EntityCollection<Event>,
    commit_lock: Mutex<()>,
}

fn device_key(device: &Device) -> Option<String> {
    device.ip.map(|ip| ip.to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                devices: EntityCollection::new(),
                links: EntityCollection::new(),
                events: EntityCollection::new(),
                commit_lock: Mutex::new(()),
            }),
        }
    }

    pub fn from_snapshot(snapshot: TopologySnapshot) -> Self {
        let store = Self::new();
        let inner = &store.inner;
        inner.devices.upsert_many(
            snapshot
                .devices
                .into_iter()
                .map(|d| (d.id.clone(), device_key(&d), d)),
        );
        inner
            .links
            .upsert_many(snapshot.links.into_iter().map(|l| (l.id.clone(), None, l)));
        inner
            .events
            .upsert_many(snapshot.events.into_iter().map(|e| (e.id.clone(), None, e)));
        store
    }

    /// Copy of all committed state.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            devices: cloned(&self.inner.devices.snapshot()),
            links: cloned(&self.inner.links.snapshot()),
            events: cloned(&self.inner.events.snapshot()),
        }
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.devices.snapshot()
    }

    /// Subscribe to committed event changes.
    pub fn subscribe_events(&self) -> watch::Receiver<Arc<Vec<Arc<Event>>>> {
        self.inner.events.subscribe()
    }

    /// Number of committed transactions that changed devices, links or events.
    pub fn version(&self) -> u64 {
        self.inner.devices.version() + self.inner.links.version() + self.inner.events.version()
    }

    pub fn device_count(&self) -> usize {
        self.inner.devices.len()
    }

    pub fn link_count(&self) -> usize {
        self.inner.links.len()
    }

    pub fn event_count(&self) -> usize {
        self.inner.events.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cloned<T: Clone>(items: &[Arc<T>]) -> Vec<T> {
    items.iter().map(|item| T::clone(item)).collect()
}

impl EntityStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            store: self.clone(),
            devices: DashMap::new(),
            links: DashMap::new(),
            events: DashMap::new(),
        })
    }
}

// ── Transaction ─────────────────────────────────────────────────────

/// Staged writes against a [`MemoryStore`].
pub struct MemoryTransaction {
    store: MemoryStore,
    devices: DashMap<EntityId, Device>,
    links: DashMap<EntityId, Link>,
    events: DashMap<EntityId, Event>,
}

impl MemoryTransaction {
    /// Committed entities overlaid with this transaction's staged writes.
    fn merged<T: Clone + Send + Sync + 'static>(
        committed: &EntityCollection<T>,
        staged: &DashMap<EntityId, T>,
        id_of: impl Fn(&T) -> &EntityId,
    ) -> Vec<T> {
        let snapshot = committed.snapshot();
        let mut out = Vec::with_capacity(snapshot.len() + staged.len());
        for item in snapshot.iter() {
            let item: &T = item;
            if !staged.contains_key(id_of(item)) {
                out.push(item.clone());
            }
        }
        out.extend(staged.iter().map(|r| r.value().clone()));
        out.sort_by(|a, b| id_of(a).cmp(id_of(b)));
        out
    }

    fn staged_or_committed<T: Clone + Send + Sync + 'static>(
        committed: &EntityCollection<T>,
        staged: &DashMap<EntityId, T>,
        id: &EntityId,
    ) -> Option<T> {
        staged
            .get(id)
            .map(|r| r.value().clone())
            .or_else(|| committed.get(id).map(|item| T::clone(&item)))
    }

    fn staged_writes(&self) -> usize {
        self.devices.len() + self.links.len() + self.events.len()
    }
}

impl StoreTransaction for MemoryTransaction {
    async fn list_devices(&self) -> Result<Vec<Device>, StoreError> {
        Ok(Self::merged(&self.store.inner.devices, &self.devices, |d| &d.id))
    }

    async fn get_device(&self, id: &EntityId) -> Result<Option<Device>, StoreError> {
        Ok(Self::staged_or_committed(
            &self.store.inner.devices,
            &self.devices,
            id,
        ))
    }

    async fn find_device_by_ip(&self, ip: IpAddr) -> Result<Option<Device>, StoreError> {
        if let Some(staged) = self.devices.iter().find(|r| r.ip == Some(ip)) {
            return Ok(Some(staged.value().clone()));
        }
        let committed = self
            .store
            .inner
            .devices
            .get_by_key(&ip.to_string())
            .filter(|d| !self.devices.contains_key(&d.id))
            .map(|d| Device::clone(&d));
        Ok(committed)
    }

    async fn save_device(&self, device: Device) -> Result<(), StoreError> {
        self.devices.insert(device.id.clone(), device);
        Ok(())
    }

    async fn list_links(&self) -> Result<Vec<Link>, StoreError> {
        Ok(Self::merged(&self.store.inner.links, &self.links, |l| &l.id))
    }

    async fn get_link(&self, id: &EntityId) -> Result<Option<Link>, StoreError> {
        Ok(Self::staged_or_committed(
            &self.store.inner.links,
            &self.links,
            id,
        ))
    }

    async fn save_link(&self, link: Link) -> Result<(), StoreError> {
        self.links.insert(link.id.clone(), link);
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        let mut events = Self::merged(&self.store.inner.events, &self.events, |e| &e.id);
        events.retain(|e| filter.matches(e));
        events.sort_by(|a, b| b.last_occurred_at.cmp(&a.last_occurred_at));
        Ok(events)
    }

    async fn get_event(&self, id: &EntityId) -> Result<Option<Event>, StoreError> {
        Ok(Self::staged_or_committed(
            &self.store.inner.events,
            &self.events,
            id,
        ))
    }

    async fn find_active_event(
        &self,
        subject: &EventSubject,
        event_type: EventType,
    ) -> Result<Option<Event>, StoreError> {
        let found = Self::merged(&self.store.inner.events, &self.events, |e| &e.id)
            .into_iter()
            .filter(|e| e.is_active() && e.event_type == event_type && e.subject() == *subject)
            .max_by_key(|e| e.last_occurred_at);
        Ok(found)
    }

    async fn save_event(&self, event: Event) -> Result<(), StoreError> {
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let writes = self.staged_writes();
        let inner = &self.store.inner;
        let _guard = inner.commit_lock.lock().await;

        let Self {
            devices,
            links,
            events,
            ..
        } = self;
        if !devices.is_empty() {
            inner.devices.upsert_many(
                devices
                    .into_iter()
                    .map(|(id, d)| (id, device_key(&d), d)),
            );
        }
        if !links.is_empty() {
            inner
                .links
                .upsert_many(links.into_iter().map(|(id, l)| (id, None, l)));
        }
        if !events.is_empty() {
            inner
                .events
                .upsert_many(events.into_iter().map(|(id, e)| (id, None, e)));
        }

        debug!(writes, "memory transaction committed");
        Ok(())
    }

    async fn rollback(self) {
        debug!(discarded = self.staged_writes(), "memory transaction rolled back");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{EventSeverity, Status};
    use chrono::Utc;

    fn device(id: &str, ip: &str) -> Device {
        Device::new(id, id, Some(ip.parse().unwrap()))
    }

    #[tokio::test]
    async fn staged_writes_are_private_until_commit() {
        let store = MemoryStore::new();
        let tx = store.begin().await.unwrap();
        tx.save_device(device("sw-1", "10.0.0.2")).await.unwrap();

        assert!(tx.get_device(&"sw-1".into()).await.unwrap().is_some());
        assert_eq!(store.device_count(), 0);

        tx.commit().await.unwrap();
        assert_eq!(store.device_count(), 1);
    }

    #[tokio::test]
    async fn rollback_and_drop_discard_writes() {
        let store = MemoryStore::new();

        let tx = store.begin().await.unwrap();
        tx.save_device(device("sw-1", "10.0.0.2")).await.unwrap();
        tx.rollback().await;

        let tx = store.begin().await.unwrap();
        tx.save_device(device("sw-2", "10.0.0.3")).await.unwrap();
        drop(tx);

        assert_eq!(store.device_count(), 0);
    }

    #[tokio::test]
    async fn find_by_ip_prefers_staged_state() {
        let store = MemoryStore::from_snapshot(TopologySnapshot {
            devices: vec![device("sw-1", "10.0.0.2")],
            ..TopologySnapshot::default()
        });
        let tx = store.begin().await.unwrap();
        assert!(tx.find_device_by_ip("10.0.0.2".parse().unwrap()).await.unwrap().is_some());

        // Moving the device inside the transaction hides the old address.
        let mut moved = device("sw-1", "10.0.0.9");
        moved.status = Status::Up;
        tx.save_device(moved).await.unwrap();
        assert!(tx.find_device_by_ip("10.0.0.2".parse().unwrap()).await.unwrap().is_none());
        assert!(tx.find_device_by_ip("10.0.0.9".parse().unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn find_active_event_skips_resolved() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let subject = EventSubject::Device("sw-1".into());

        let mut resolved = Event::new(EventType::DeviceDown, EventSeverity::High, subject.clone(), "old", now);
        resolved.resolve("ops", None, now).unwrap();
        let open = Event::new(EventType::DeviceDown, EventSeverity::High, subject.clone(), "new", now);
        let open_id = open.id.clone();

        let tx = store.begin().await.unwrap();
        tx.save_event(resolved).await.unwrap();
        tx.save_event(open).await.unwrap();
        tx.commit().await.unwrap();

        let tx = store.begin().await.unwrap();
        let found = tx.find_active_event(&subject, EventType::DeviceDown).await.unwrap();
        assert_eq!(found.unwrap().id, open_id);
        assert!(tx.find_active_event(&subject, EventType::DeviceUp).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_json() {
        let store = MemoryStore::new();
        let tx = store.begin().await.unwrap();
        tx.save_device(device("sw-1", "10.0.0.2")).await.unwrap();
        tx.save_link(Link::new("l1", "core", "sw-1")).await.unwrap();
        tx.commit().await.unwrap();

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let restored = MemoryStore::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.snapshot(), store.snapshot());
    }

    #[tokio::test]
    async fn event_subscribers_see_commits() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe_events();
        let tx = store.begin().await.unwrap();
        tx.save_event(Event::new(
            EventType::LinkDown,
            EventSeverity::Critical,
            EventSubject::Link("l1".into()),
            "down",
            Utc::now(),
        ))
        .await
        .unwrap();
        tx.commit().await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);
    }
}
