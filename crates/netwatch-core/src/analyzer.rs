//! Health scoring and physical-medium validation.
//!
//! Everything here is pure: the analyzer turns probe measurements into a
//! bounded score, a status bucket and human-readable recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::HealthThresholds;
use crate::model::{HealthSample, HealthStatus, MediumType};
use crate::probe::EchoReply;

/// Fraction of rated capacity a link must reach to count as healthy.
const MEDIUM_VALID_RATIO: f64 = 0.8;

// ── Medium validation ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediumValidation {
    pub medium_type: MediumType,
    pub expected_speed_mbps: u32,
    pub actual_speed_mbps: f64,
    pub utilization_pct: f64,
    pub is_valid: bool,
    pub recommendation: String,
}

// ── Recommendations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Critical,
    Warning,
    Ok,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub message: String,
}

impl Recommendation {
    fn warning(message: String) -> Self {
        Self {
            level: RecommendationLevel::Warning,
            message,
        }
    }
}

// ── Network health ──────────────────────────────────────────────────

/// Share of the network score carried by device and link availability;
/// event impact takes the rest.
const DEVICE_WEIGHT: f64 = 0.4;
const LINK_WEIGHT: f64 = 0.4;
const EVENT_WEIGHT: f64 = 0.2;

/// Points each unacknowledged critical event takes off the event impact.
const CRITICAL_EVENT_PENALTY: f64 = 10.0;

/// Inventory counts a network score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCounts {
    pub total_devices: u32,
    pub devices_up: u32,
    pub total_links: u32,
    pub links_up: u32,
    /// Unacknowledged critical events created in the last hour.
    pub critical_events: u32,
}

/// Weighted network-wide score with its components, each in `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealth {
    pub overall_score: f64,
    pub status: HealthStatus,
    pub device_health: f64,
    pub link_health: f64,
    pub event_impact: f64,
    pub counts: NetworkCounts,
}

fn percent(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(part.min(total)) / f64::from(total) * 100.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Analyzer ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HealthAnalyzer {
    thresholds: HealthThresholds,
}

impl HealthAnalyzer {
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    /// Score latency, loss and jitter from 100 down, clamped at 0.
    ///
    /// Each metric costs the high penalty above its critical threshold,
    /// the low penalty above its warning threshold. Non-finite inputs are
    /// treated as critical.
    pub fn score(&self, latency_avg_ms: f64, loss_pct: f64, jitter_ms: f64) -> (u8, HealthStatus) {
        let t = &self.thresholds;
        let penalty = penalty(latency_avg_ms, t.latency_warning_ms, t.latency_critical_ms, 40, 20)
            + penalty(loss_pct, t.loss_warning_pct, t.loss_critical_pct, 40, 20)
            + penalty(jitter_ms, t.jitter_warning_ms, t.jitter_critical_ms, 20, 10);
        let score = 100u8.saturating_sub(penalty);
        (score, HealthStatus::from_score(score))
    }

    /// Turn an echo reply into a scored sample. Silent hosts score 0.
    pub fn sample(&self, reply: &EchoReply, now: DateTime<Utc>) -> HealthSample {
        if !reply.alive {
            return HealthSample {
                reachable: false,
                latency_avg_ms: None,
                latency_min_ms: None,
                latency_max_ms: None,
                loss_pct: 100.0,
                jitter_ms: None,
                score: 0,
                status: HealthStatus::Critical,
                error: None,
                sampled_at: now,
            };
        }

        let jitter = (reply.max_rtt_ms - reply.min_rtt_ms).max(0.0);
        let loss_pct = reply.loss_fraction * 100.0;
        let (score, status) = self.score(reply.avg_rtt_ms, loss_pct, jitter);

        HealthSample {
            reachable: true,
            latency_avg_ms: Some(reply.avg_rtt_ms),
            latency_min_ms: Some(reply.min_rtt_ms),
            latency_max_ms: Some(reply.max_rtt_ms),
            loss_pct,
            jitter_ms: Some(jitter),
            score,
            status,
            error: None,
            sampled_at: now,
        }
    }

    /// Sample for a probe that could not be performed.
    pub fn failed_sample(&self, error: impl Into<String>, now: DateTime<Utc>) -> HealthSample {
        HealthSample {
            reachable: false,
            latency_avg_ms: None,
            latency_min_ms: None,
            latency_max_ms: None,
            loss_pct: 100.0,
            jitter_ms: None,
            score: 0,
            status: HealthStatus::Unknown,
            error: Some(error.into()),
            sampled_at: now,
        }
    }

    /// Blend device availability, link availability and recent critical
    /// events into one network score.
    ///
    /// An empty inventory counts as 0% available, so a topology with no
    /// devices never reports as healthy.
    pub fn network_health(counts: NetworkCounts) -> NetworkHealth {
        let device_health = percent(counts.devices_up, counts.total_devices);
        let link_health = percent(counts.links_up, counts.total_links);
        let event_impact =
            (100.0 - f64::from(counts.critical_events) * CRITICAL_EVENT_PENALTY).max(0.0);
        let overall = round2(
            device_health * DEVICE_WEIGHT + link_health * LINK_WEIGHT + event_impact * EVENT_WEIGHT,
        );

        let status = match overall {
            s if s >= 90.0 => HealthStatus::Excellent,
            s if s >= 75.0 => HealthStatus::Good,
            s if s >= 60.0 => HealthStatus::Fair,
            s if s >= 40.0 => HealthStatus::Poor,
            _ => HealthStatus::Critical,
        };

        NetworkHealth {
            overall_score: overall,
            status,
            device_health: round2(device_health),
            link_health: round2(link_health),
            event_impact: round2(event_impact),
            counts,
        }
    }

    /// Compare a measured speed against the medium's rated capacity.
    pub fn validate_medium(actual_speed_mbps: f64, medium_type: MediumType) -> MediumValidation {
        let expected = medium_type.rated_speed_mbps();
        let expected_f = f64::from(expected);
        let utilization_pct = actual_speed_mbps / expected_f * 100.0;
        let is_valid = actual_speed_mbps >= expected_f * MEDIUM_VALID_RATIO;

        let recommendation = if is_valid {
            format!("Cable operating normally at {utilization_pct:.1}% capacity")
        } else {
            format!(
                "Speed below expected ({actual_speed_mbps}/{expected} Mbps). Check cable condition."
            )
        };

        MediumValidation {
            medium_type,
            expected_speed_mbps: expected,
            actual_speed_mbps,
            utilization_pct,
            is_valid,
            recommendation,
        }
    }

    /// Actionable advice for a sample and optional medium check.
    pub fn recommendations(
        &self,
        sample: &HealthSample,
        medium: Option<&MediumValidation>,
    ) -> Vec<Recommendation> {
        let mut out = Vec::new();

        if sample.status == HealthStatus::Critical {
            out.push(Recommendation {
                level: RecommendationLevel::Critical,
                message: "Link is DOWN or severely degraded. Immediate action required.".into(),
            });
        }

        let loss = sample.loss_pct;
        if loss > 5.0 {
            out.push(Recommendation::warning(format!(
                "High packet loss ({loss:.1}%). Check cable connections and quality."
            )));
        } else if loss > 1.0 {
            out.push(Recommendation::warning(format!(
                "Elevated packet loss ({loss:.1}%). Monitor closely."
            )));
        }

        let latency = sample.latency_avg_ms.unwrap_or_default();
        if latency > 100.0 {
            out.push(Recommendation::warning(format!(
                "High latency ({latency:.1}ms). Consider shorter cable runs or upgrade."
            )));
        } else if latency > 50.0 {
            out.push(Recommendation::warning(format!(
                "Elevated latency ({latency:.1}ms). Monitor performance."
            )));
        }

        let jitter = sample.jitter_ms.unwrap_or_default();
        if jitter > 20.0 {
            out.push(Recommendation::warning(format!(
                "High jitter ({jitter:.1}ms). May impact real-time applications."
            )));
        }

        if let Some(medium) = medium.filter(|m| !m.is_valid) {
            out.push(Recommendation::warning(format!(
                "Cable not meeting specifications: {}",
                medium.recommendation
            )));
        }

        if out.is_empty() {
            out.push(Recommendation {
                level: RecommendationLevel::Ok,
                message: "Link health is EXCELLENT. No issues detected.".into(),
            });
        }
        out
    }
}

fn penalty(value: f64, warning: f64, critical: f64, high: u8, low: u8) -> u8 {
    if value.is_nan() || value > critical {
        high
    } else if value > warning {
        low
    } else {
        0
    }
}
