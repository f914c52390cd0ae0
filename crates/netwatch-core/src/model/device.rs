// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use strum::{Display, EnumString};

use super::entity_id::{EntityId, MacAddress};

/// Device role, inferred by discovery or assigned by an operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DeviceType {
    Router,
    Switch,
    Server,
    Pc,
    #[serde(rename = "AP")]
    #[strum(serialize = "AP")]
    AccessPoint,
    Printer,
    Camera,
    Firewall,
    LoadBalancer,
    #[default]
    Unknown,
}

/// Operational status shared by devices and links.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Status {
    Up,
    Down,
    Degraded,
    Unreachable,
    #[default]
    Unknown,
}

impl Status {
    pub fn is_up(self) -> bool {
        matches!(self, Self::Up)
    }

    /// Down, unreachable or degraded.
    pub fn is_impaired(self) -> bool {
        matches!(self, Self::Down | Self::Unreachable | Self::Degraded)
    }
}

/// A monitored network device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub ip: Option<IpAddr>,
    #[serde(default)]
    pub mac: Option<MacAddress>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_monitored")]
    pub is_monitored: bool,

    // Last probe results
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub packet_loss_pct: Option<f64>,

    // Lifecycle
    /// Last time the device answered a probe.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

fn default_monitored() -> bool {
    true
}

impl Device {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, ip: Option<IpAddr>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ip,
            mac: None,
            hostname: None,
            device_type: DeviceType::Unknown,
            status: Status::Unknown,
            is_monitored: true,
            latency_ms: None,
            packet_loss_pct: None,
            last_seen: None,
            last_checked_at: None,
        }
    }
}
