// ── Link domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::device::Status;
use super::entity_id::EntityId;

/// Physical transmission medium of a link.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum MediumType {
    Cat5,
    Cat5e,
    Cat6,
    Cat6a,
    Cat7,
    Cat8,
    FiberSm,
    FiberMm,
    Coax,
    #[default]
    Unknown,
}

impl MediumType {
    /// Rated capacity in Mbps.
    pub fn rated_speed_mbps(self) -> u32 {
        match self {
            Self::Cat5 => 100,
            Self::Cat5e | Self::Coax | Self::Unknown => 1_000,
            Self::Cat6 | Self::Cat6a | Self::Cat7 => 10_000,
            Self::Cat8 | Self::FiberMm => 40_000,
            Self::FiberSm => 100_000,
        }
    }
}

/// Cable descriptor attached to a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    pub medium_type: MediumType,
    #[serde(default)]
    pub length_m: Option<f64>,
}

/// A monitored connection between two devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: EntityId,
    #[serde(default)]
    pub name: Option<String>,
    pub source_device_id: EntityId,
    /// Probes are sent to this device's address.
    pub target_device_id: EntityId,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_monitored")]
    pub is_monitored: bool,

    // Measurements
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub jitter_ms: Option<f64>,
    #[serde(default)]
    pub packet_loss_pct: Option<f64>,
    #[serde(default)]
    pub utilization_pct: Option<f64>,
    #[serde(default)]
    pub health_score: Option<u8>,

    // Physical layer
    /// Negotiated speed, if known.
    #[serde(default)]
    pub speed_mbps: Option<u32>,
    #[serde(default)]
    pub medium: Option<Medium>,

    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

fn default_monitored() -> bool {
    true
}

impl Link {
    pub fn new(
        id: impl Into<EntityId>,
        source_device_id: impl Into<EntityId>,
        target_device_id: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            source_device_id: source_device_id.into(),
            target_device_id: target_device_id.into(),
            status: Status::Unknown,
            is_monitored: true,
            latency_ms: None,
            jitter_ms: None,
            packet_loss_pct: None,
            utilization_pct: None,
            health_score: None,
            speed_mbps: None,
            medium: None,
            last_seen: None,
            last_checked_at: None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("{} -> {}", self.source_device_id, self.target_device_id)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn rated_speeds() {
        assert_eq!(MediumType::Cat5.rated_speed_mbps(), 100);
        assert_eq!(MediumType::Cat6.rated_speed_mbps(), 10_000);
        assert_eq!(MediumType::FiberSm.rated_speed_mbps(), 100_000);
        assert_eq!(MediumType::Unknown.rated_speed_mbps(), 1_000);
    }

    #[test]
    fn every_medium_has_a_positive_rating() {
        assert!(MediumType::iter().all(|m| m.rated_speed_mbps() > 0));
    }

    #[test]
    fn medium_parses_case_insensitively() {
        assert_eq!("cat6a".parse::<MediumType>().unwrap(), MediumType::Cat6a);
        assert_eq!("FIBER_SM".parse::<MediumType>().unwrap(), MediumType::FiberSm);
    }

    #[test]
    fn display_name_falls_back_to_endpoints() {
        let link = Link::new("l1", "core", "edge");
        assert_eq!(link.display_name(), "core -> edge");
    }
}
