// ── Runtime monitoring configuration ──
//
// These types describe *how* to probe, score and alert. They never touch
// disk: the CLI (via netwatch-config) builds a `MonitorConfig` and hands
// it to the `Monitor`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::NetworkRange;

/// Echo-test tuning for device and link checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Packets per device echo test.
    pub echo_count: u32,
    /// Per-packet timeout.
    pub echo_timeout: Duration,
    /// Packets per link echo test. Links use a longer burst for jitter.
    pub link_echo_count: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            echo_count: 3,
            echo_timeout: Duration::from_secs(2),
            link_echo_count: 10,
        }
    }
}

/// Warning and critical thresholds used by the health score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub latency_warning_ms: f64,
    pub latency_critical_ms: f64,
    pub loss_warning_pct: f64,
    pub loss_critical_pct: f64,
    pub jitter_warning_ms: f64,
    pub jitter_critical_ms: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            latency_warning_ms: 50.0,
            latency_critical_ms: 100.0,
            loss_warning_pct: 2.0,
            loss_critical_pct: 5.0,
            jitter_warning_ms: 10.0,
            jitter_critical_ms: 20.0,
        }
    }
}

/// Subnet discovery tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Address-resolution timeout, also used for verification pings.
    pub timeout: Duration,
    /// Address-resolution retries.
    pub retries: u32,
    /// Range scanned when the caller does not name one.
    pub default_range: NetworkRange,
    /// Query each candidate's management agent for a system description.
    pub enrich: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            retries: 2,
            default_range: NetworkRange::DEFAULT,
            enrich: false,
        }
    }
}

/// Which events collapse into an existing, still-active event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupKey {
    /// Same entity and same event type.
    EntityAndType,
    /// Every occurrence is a new event.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupPolicy {
    pub key: DedupKey,
    /// Only absorb a recurrence when the active event last occurred within
    /// this window. `None` means any unresolved event absorbs it.
    pub window: Option<Duration>,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            key: DedupKey::EntityAndType,
            window: None,
        }
    }
}

/// Event emission policy for status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventPolicy {
    /// Emit `DEVICE_UP` when a device transitions to UP.
    pub device_recovery_events: bool,
    /// Emit `LINK_UP` when a link transitions to UP.
    pub link_recovery_events: bool,
    /// Resolve the entity's open outage events when it recovers.
    pub auto_resolve_on_recovery: bool,
    pub dedup: DedupPolicy,
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self {
            device_recovery_events: true,
            link_recovery_events: false,
            auto_resolve_on_recovery: false,
            dedup: DedupPolicy::default(),
        }
    }
}

/// Top-level configuration for a [`Monitor`](crate::Monitor).
///
/// Built by the CLI, passed to `Monitor` -- core never reads config files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Delay between cycle starts in continuous mode.
    pub interval: Duration,
    /// Maximum probes in flight during one fan-out.
    pub max_concurrency: usize,
    pub probe: ProbeConfig,
    pub thresholds: HealthThresholds,
    pub discovery: DiscoveryConfig,
    pub events: EventPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_concurrency: 64,
            probe: ProbeConfig::default(),
            thresholds: HealthThresholds::default(),
            discovery: DiscoveryConfig::default(),
            events: EventPolicy::default(),
        }
    }
}
