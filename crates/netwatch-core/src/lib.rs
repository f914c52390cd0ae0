//! Network topology health monitoring.
//!
//! This crate owns the domain model and the monitoring logic; probing and
//! persistence are capabilities supplied by the caller:
//!
//! - **[`Monitor`]**: Central facade. [`run_cycle()`](Monitor::run_cycle)
//!   checks every monitored device and link inside one store transaction;
//!   [`start_continuous()`](Monitor::start_continuous) spawns a background
//!   loop that repeats it on an interval until [`stop()`](Monitor::stop).
//!
//! - **Checkers** ([`check`]): Probe entities concurrently (bounded by
//!   `max_concurrency`), persist their new status and raise an [`Event`] on
//!   every status transition.
//!
//! - **[`HealthAnalyzer`]**: Pure scoring of latency, loss and jitter into
//!   a 0-100 health score, plus physical-medium validation.
//!
//! - **[`EventManager`]**: Event lifecycle (open, acknowledged, resolved)
//!   with recurrence folding.
//!
//! - **[`DiscoveryEngine`]**: Address-resolution sweep, liveness
//!   verification and ordered heuristic device classification.
//!
//! - **Capabilities**: [`Prober`] (echo, address resolution, management
//!   query) and [`EntityStore`] (transactional device/link/event storage,
//!   with [`MemoryStore`] as the in-process implementation).

pub mod analyzer;
pub mod check;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod model;
pub mod monitor;
pub mod probe;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analyzer::{
    HealthAnalyzer, MediumValidation, NetworkCounts, NetworkHealth, Recommendation,
    RecommendationLevel,
};
pub use check::{
    CheckOutcome, DeviceCheck, DeviceChecker, DeviceSummary, DeviceSweep, LinkCheck, LinkChecker,
    LinkSummary, LinkSweep,
};
pub use config::{
    DedupKey, DedupPolicy, DiscoveryConfig, EventPolicy, HealthThresholds, MonitorConfig,
    ProbeConfig,
};
pub use discovery::{
    Candidate, DiscoveryEngine, DiscoveryIssue, DiscoveryReport, DiscoverySummary, PingResult,
};
pub use error::CoreError;
pub use events::{BulkAcknowledgement, EventManager, Raised};
pub use monitor::{CableReport, CycleSummary, Monitor, MonitorStatus, SchedulerState};
pub use probe::{EchoReply, ProbeError, Prober, ResolvedHost, SystemDescription};
pub use store::{
    DeviceFilter, EntityStore, EventFilter, LinkFilter, MemoryStore, MemoryTransaction,
    StoreError, StoreTransaction, TopologySnapshot,
};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Device, DeviceType, EntityId, Event, EventSeverity, EventState, EventSubject, EventType,
    HealthSample, HealthStatus, Link, MacAddress, Medium, MediumType, NetworkRange, Status,
};
