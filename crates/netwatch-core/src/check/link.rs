// ── Link health checker ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{CheckOutcome, fan_out, partition_results};
use crate::analyzer::HealthAnalyzer;
use crate::config::ProbeConfig;
use crate::error::CoreError;
use crate::events::EventManager;
use crate::model::{
    EntityId, Event, EventSeverity, EventSubject, EventType, HealthSample, Link, Status,
};
use crate::probe::{ProbeError, Prober};
use crate::store::StoreTransaction;

const EVENT_SOURCE: &str = "link_monitor";

/// Result of checking one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkCheck {
    pub link_id: EntityId,
    pub name: String,
    pub previous_status: Status,
    pub status: Status,
    pub health_score: Option<u8>,
    pub latency_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub jitter_ms: Option<f64>,
    pub status_changed: bool,
    pub outcome: CheckOutcome,
    pub error: Option<String>,
    /// Scored measurement, absent when the check was skipped.
    pub sample: Option<HealthSample>,
    pub checked_at: DateTime<Utc>,
}

/// Tally of a link sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub total: usize,
    pub up: usize,
    pub degraded: usize,
    pub down: usize,
    pub errored: usize,
}

impl LinkSummary {
    fn record(&mut self, check: &LinkCheck) {
        if check.outcome == CheckOutcome::Skipped {
            self.errored += 1;
            return;
        }
        if check.outcome == CheckOutcome::ProbeFailed {
            self.errored += 1;
        }
        match check.status {
            Status::Up => self.up += 1,
            Status::Degraded => self.degraded += 1,
            _ => self.down += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkSweep {
    pub summary: LinkSummary,
    pub checks: Vec<LinkCheck>,
}

/// Probes the far end of each link, scores it and raises outage events.
pub struct LinkChecker<'a, P> {
    prober: &'a P,
    probe: &'a ProbeConfig,
    analyzer: &'a HealthAnalyzer,
    events: &'a EventManager,
    max_concurrency: usize,
}

impl<'a, P: Prober> LinkChecker<'a, P> {
    pub fn new(
        prober: &'a P,
        probe: &'a ProbeConfig,
        analyzer: &'a HealthAnalyzer,
        events: &'a EventManager,
        max_concurrency: usize,
    ) -> Self {
        Self {
            prober,
            probe,
            analyzer,
            events,
            max_concurrency,
        }
    }

    /// Probe and score a link without touching the store.
    pub async fn measure<T: StoreTransaction>(
        &self,
        tx: &T,
        link: &Link,
    ) -> Result<Option<(HealthSample, CheckOutcome)>, CoreError> {
        let target = tx.get_device(&link.target_device_id).await?;
        let Some(ip) = target.and_then(|d| d.ip) else {
            return Ok(None);
        };

        let now = Utc::now();
        match self
            .prober
            .echo(ip, self.probe.link_echo_count, self.probe.echo_timeout)
            .await
        {
            Ok(reply) => Ok(Some((self.analyzer.sample(&reply, now), CheckOutcome::Probed))),
            Err(e @ ProbeError::Unsupported { .. }) => Err(e.into()),
            Err(e) => {
                warn!(link_id = %link.id, %ip, error = %e, "link probe failed");
                Ok(Some((
                    self.analyzer.failed_sample(e.to_string(), now),
                    CheckOutcome::ProbeFailed,
                )))
            }
        }
    }

    /// Check one link and persist the measurement.
    pub async fn check<T: StoreTransaction>(
        &self,
        tx: &T,
        mut link: Link,
    ) -> Result<LinkCheck, CoreError> {
        if !link.is_monitored {
            return Err(CoreError::NotMonitored {
                entity_type: "link".into(),
                identifier: link.id.to_string(),
            });
        }

        let previous = link.status;
        let Some((sample, outcome)) = self.measure(tx, &link).await? else {
            debug!(link_id = %link.id, "target device has no address, skipping");
            return Ok(LinkCheck {
                name: link.display_name(),
                link_id: link.id,
                previous_status: previous,
                status: previous,
                health_score: link.health_score,
                latency_ms: link.latency_ms,
                packet_loss_pct: link.packet_loss_pct,
                jitter_ms: link.jitter_ms,
                status_changed: false,
                outcome: CheckOutcome::Skipped,
                error: Some("Target device IP not available".into()),
                sample: None,
                checked_at: Utc::now(),
            });
        };

        let now = sample.sampled_at;
        link.status = sample.status.link_status();
        link.health_score = Some(sample.score);
        link.latency_ms = sample.latency_avg_ms;
        link.jitter_ms = sample.jitter_ms;
        link.packet_loss_pct = (outcome == CheckOutcome::Probed).then_some(sample.loss_pct);
        link.last_checked_at = Some(now);
        if sample.reachable {
            link.last_seen = Some(now);
        }

        let status_changed = link.status != previous;
        tx.save_link(link.clone()).await?;
        if status_changed {
            self.on_transition(tx, &link, previous, now).await?;
        }

        debug!(
            link_id = %link.id,
            status = %link.status,
            score = sample.score,
            changed = status_changed,
            "link checked"
        );

        Ok(LinkCheck {
            name: link.display_name(),
            link_id: link.id,
            previous_status: previous,
            status: link.status,
            health_score: link.health_score,
            latency_ms: link.latency_ms,
            packet_loss_pct: link.packet_loss_pct,
            jitter_ms: link.jitter_ms,
            status_changed,
            outcome,
            error: sample.error.clone(),
            sample: Some(sample),
            checked_at: now,
        })
    }

    /// Check every monitored link concurrently.
    pub async fn check_all<T: StoreTransaction>(&self, tx: &T) -> Result<LinkSweep, CoreError> {
        let links: Vec<Link> = tx
            .list_links()
            .await?
            .into_iter()
            .filter(|l| l.is_monitored)
            .collect();

        let mut summary = LinkSummary {
            total: links.len(),
            ..LinkSummary::default()
        };

        let results = fan_out(links, self.max_concurrency, |link| self.check(tx, link)).await;
        let checks = partition_results(results, |e| {
            warn!(error = %e, "link check failed");
            summary.errored += 1;
        })?;

        for check in &checks {
            summary.record(check);
        }
        Ok(LinkSweep { summary, checks })
    }

    async fn on_transition<T: StoreTransaction>(
        &self,
        tx: &T,
        link: &Link,
        previous: Status,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let policy = self.events.policy();
        let subject = EventSubject::Link(link.id.clone());

        let kind = match link.status {
            Status::Down => Some((EventType::LinkDown, EventSeverity::Critical)),
            Status::Degraded => Some((EventType::LinkDegraded, EventSeverity::Medium)),
            Status::Up => policy
                .link_recovery_events
                .then_some((EventType::LinkUp, EventSeverity::Info)),
            Status::Unreachable | Status::Unknown => None,
        };

        if let Some((event_type, severity)) = kind {
            let event = Event::new(
                event_type,
                severity,
                subject.clone(),
                format!(
                    "Link {} status changed from {previous} to {}",
                    link.display_name(),
                    link.status
                ),
                now,
            )
            .with_details(json!({
                "old_status": previous.to_string(),
                "new_status": link.status.to_string(),
                "health_score": link.health_score,
                "latency_ms": link.latency_ms,
                "packet_loss_percent": link.packet_loss_pct,
            }))
            .with_source(EVENT_SOURCE);
            self.events.raise(tx, event).await?;
        }

        if link.status == Status::Up && policy.auto_resolve_on_recovery {
            self.events
                .resolve_active(
                    tx,
                    &subject,
                    &[EventType::LinkDown, EventType::LinkDegraded],
                    now,
                )
                .await?;
        }
        Ok(())
    }
}
