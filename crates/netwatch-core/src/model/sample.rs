// ── Health samples ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::device::Status;

/// Health bucket derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    Unknown,
}

impl HealthStatus {
    /// Bucket a score: >=90 excellent, >=80 good, >=60 fair, >=40 poor.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            80..=89 => Self::Good,
            60..=79 => Self::Fair,
            40..=59 => Self::Poor,
            _ => Self::Critical,
        }
    }

    /// Coarse link status for this bucket.
    pub fn link_status(self) -> Status {
        match self {
            Self::Excellent | Self::Good => Status::Up,
            Self::Fair | Self::Poor => Status::Degraded,
            Self::Critical | Self::Unknown => Status::Down,
        }
    }
}

/// Result of one probe, scored. Never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub reachable: bool,
    pub latency_avg_ms: Option<f64>,
    pub latency_min_ms: Option<f64>,
    pub latency_max_ms: Option<f64>,
    pub loss_pct: f64,
    pub jitter_ms: Option<f64>,
    pub score: u8,
    pub status: HealthStatus,
    /// Set when the probe itself failed.
    pub error: Option<String>,
    pub sampled_at: DateTime<Utc>,
}
