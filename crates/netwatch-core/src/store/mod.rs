// ── Entity store ──
//
// Durability belongs to an external store. The core only needs a
// transactional view: each monitoring cycle opens one transaction,
// stages device/link/event writes through it, and commits or rolls back.

mod collection;
mod filter;
mod memory;

use std::future::Future;
use std::net::IpAddr;

use thiserror::Error;

use crate::model::{Device, EntityId, Event, EventSubject, EventType, Link};

pub use filter::{DeviceFilter, EventFilter, LinkFilter};
pub use memory::{MemoryStore, MemoryTransaction, TopologySnapshot};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("write conflict on {entity_type} {identifier}")]
    Conflict {
        entity_type: String,
        identifier: String,
    },

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("{0}")]
    Backend(String),
}

/// A source of transactions.
pub trait EntityStore: Send + Sync + 'static {
    type Tx: StoreTransaction;

    /// Open a fresh transactional context.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, StoreError>> + Send;
}

/// Reads see this transaction's own staged writes. Nothing becomes
/// visible to other transactions until [`commit`](Self::commit); dropping
/// a transaction discards its writes.
pub trait StoreTransaction: Send + Sync + Sized {
    // ── Devices ──────────────────────────────────────────────────────
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, StoreError>> + Send;

    fn get_device(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Device>, StoreError>> + Send;

    fn find_device_by_ip(
        &self,
        ip: IpAddr,
    ) -> impl Future<Output = Result<Option<Device>, StoreError>> + Send;

    fn save_device(&self, device: Device) -> impl Future<Output = Result<(), StoreError>> + Send;

    // ── Links ────────────────────────────────────────────────────────
    fn list_links(&self) -> impl Future<Output = Result<Vec<Link>, StoreError>> + Send;

    fn get_link(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Link>, StoreError>> + Send;

    fn save_link(&self, link: Link) -> impl Future<Output = Result<(), StoreError>> + Send;

    // ── Events ───────────────────────────────────────────────────────
    fn list_events(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<Event>, StoreError>> + Send;

    fn get_event(
        &self,
        id: &EntityId,
    ) -> impl Future<Output = Result<Option<Event>, StoreError>> + Send;

    /// The most recent unresolved event for `subject` with `event_type`.
    fn find_active_event(
        &self,
        subject: &EventSubject,
        event_type: EventType,
    ) -> impl Future<Output = Result<Option<Event>, StoreError>> + Send;

    fn save_event(&self, event: Event) -> impl Future<Output = Result<(), StoreError>> + Send;

    // ── Completion ───────────────────────────────────────────────────
    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn rollback(self) -> impl Future<Output = ()> + Send;
}
