// ── Device health checker ──

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{CheckOutcome, fan_out, partition_results};
use crate::config::ProbeConfig;
use crate::error::CoreError;
use crate::events::EventManager;
use crate::model::{Device, EntityId, Event, EventSeverity, EventSubject, EventType, Status};
use crate::probe::{ProbeError, Prober};
use crate::store::StoreTransaction;

const EVENT_SOURCE: &str = "device_monitor";

/// Result of checking one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCheck {
    pub device_id: EntityId,
    pub name: String,
    pub ip: Option<IpAddr>,
    pub previous_status: Status,
    pub status: Status,
    pub latency_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub status_changed: bool,
    pub outcome: CheckOutcome,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Tally of a device sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    /// Monitored devices considered.
    pub total: usize,
    pub up: usize,
    pub down: usize,
    pub unreachable: usize,
    /// Checks that failed or could not run.
    pub errored: usize,
}

impl DeviceSummary {
    fn record(&mut self, check: &DeviceCheck) {
        match check.outcome {
            CheckOutcome::Skipped => self.errored += 1,
            CheckOutcome::ProbeFailed => {
                self.unreachable += 1;
                self.errored += 1;
            }
            CheckOutcome::Probed if check.status == Status::Up => self.up += 1,
            CheckOutcome::Probed => self.down += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSweep {
    pub summary: DeviceSummary,
    pub checks: Vec<DeviceCheck>,
}

/// Probes devices, persists their status and raises transition events.
pub struct DeviceChecker<'a, P> {
    prober: &'a P,
    probe: &'a ProbeConfig,
    events: &'a EventManager,
    max_concurrency: usize,
}

impl<'a, P: Prober> DeviceChecker<'a, P> {
    pub fn new(
        prober: &'a P,
        probe: &'a ProbeConfig,
        events: &'a EventManager,
        max_concurrency: usize,
    ) -> Self {
        Self {
            prober,
            probe,
            events,
            max_concurrency,
        }
    }

    /// Check one device. Probe failures are absorbed into the result;
    /// only store errors and a missing echo capability are returned.
    pub async fn check<T: StoreTransaction>(
        &self,
        tx: &T,
        mut device: Device,
    ) -> Result<DeviceCheck, CoreError> {
        if !device.is_monitored {
            return Err(CoreError::NotMonitored {
                entity_type: "device".into(),
                identifier: device.id.to_string(),
            });
        }

        let now = Utc::now();
        let previous = device.status;

        let Some(ip) = device.ip else {
            debug!(device_id = %device.id, "device has no address, skipping");
            return Ok(DeviceCheck {
                device_id: device.id,
                name: device.name,
                ip: None,
                previous_status: previous,
                status: previous,
                latency_ms: device.latency_ms,
                packet_loss_pct: device.packet_loss_pct,
                status_changed: false,
                outcome: CheckOutcome::Skipped,
                error: Some("No IP address configured".into()),
                checked_at: now,
            });
        };

        let (outcome, error) = match self
            .prober
            .echo(ip, self.probe.echo_count, self.probe.echo_timeout)
            .await
        {
            Ok(reply) => {
                device.status = if reply.alive { Status::Up } else { Status::Down };
                device.latency_ms = reply.alive.then_some(reply.avg_rtt_ms);
                device.packet_loss_pct = Some(reply.loss_fraction * 100.0);
                if reply.alive {
                    device.last_seen = Some(now);
                }
                (CheckOutcome::Probed, None)
            }
            Err(e @ ProbeError::Unsupported { .. }) => return Err(e.into()),
            Err(e) => {
                warn!(device_id = %device.id, %ip, error = %e, "device probe failed");
                device.status = Status::Unreachable;
                device.latency_ms = None;
                device.packet_loss_pct = None;
                (CheckOutcome::ProbeFailed, Some(e.to_string()))
            }
        };
        device.last_checked_at = Some(now);

        let status_changed = device.status != previous;
        tx.save_device(device.clone()).await?;
        if status_changed {
            self.on_transition(tx, &device, previous, now).await?;
        }

        debug!(
            device_id = %device.id,
            status = %device.status,
            changed = status_changed,
            "device checked"
        );

        Ok(DeviceCheck {
            device_id: device.id,
            name: device.name,
            ip: Some(ip),
            previous_status: previous,
            status: device.status,
            latency_ms: device.latency_ms,
            packet_loss_pct: device.packet_loss_pct,
            status_changed,
            outcome,
            error,
            checked_at: now,
        })
    }

    /// Check every monitored device concurrently.
    pub async fn check_all<T: StoreTransaction>(&self, tx: &T) -> Result<DeviceSweep, CoreError> {
        let devices: Vec<Device> = tx
            .list_devices()
            .await?
            .into_iter()
            .filter(|d| d.is_monitored)
            .collect();

        let mut summary = DeviceSummary {
            total: devices.len(),
            ..DeviceSummary::default()
        };

        let results = fan_out(devices, self.max_concurrency, |device| self.check(tx, device)).await;
        let checks = partition_results(results, |e| {
            warn!(error = %e, "device check failed");
            summary.errored += 1;
        })?;

        for check in &checks {
            summary.record(check);
        }
        Ok(DeviceSweep { summary, checks })
    }

    async fn on_transition<T: StoreTransaction>(
        &self,
        tx: &T,
        device: &Device,
        previous: Status,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        let policy = self.events.policy();
        let subject = EventSubject::Device(device.id.clone());

        let kind = match device.status {
            Status::Up => policy
                .device_recovery_events
                .then_some((EventType::DeviceUp, EventSeverity::Info)),
            Status::Down => Some((EventType::DeviceDown, EventSeverity::High)),
            Status::Unreachable => Some((EventType::DeviceUnreachable, EventSeverity::High)),
            Status::Degraded | Status::Unknown => None,
        };

        if let Some((event_type, severity)) = kind {
            let event = Event::new(
                event_type,
                severity,
                subject.clone(),
                format!(
                    "Device {} status changed from {previous} to {}",
                    device.name, device.status
                ),
                now,
            )
            .with_details(json!({
                "old_status": previous.to_string(),
                "new_status": device.status.to_string(),
                "ip": device.ip.map(|ip| ip.to_string()),
            }))
            .with_source(EVENT_SOURCE);
            self.events.raise(tx, event).await?;
        }

        if device.status == Status::Up && policy.auto_resolve_on_recovery {
            self.events
                .resolve_active(
                    tx,
                    &subject,
                    &[EventType::DeviceDown, EventType::DeviceUnreachable],
                    now,
                )
                .await?;
        }
        Ok(())
    }
}
