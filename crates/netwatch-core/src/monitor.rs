// ── Monitor ──
//
// Facade over the checkers, event manager and discovery engine. Owns the
// cycle lock (no two cycles overlap), the scheduler state and the
// continuous-mode task. Every mutating operation runs in its own store
// transaction: commit on success, rollback on failure.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyzer::{
    HealthAnalyzer, MediumValidation, NetworkCounts, NetworkHealth, Recommendation,
};
use crate::check::{
    DeviceCheck, DeviceChecker, DeviceSummary, DeviceSweep, LinkCheck, LinkChecker, LinkSummary,
    LinkSweep,
};
use crate::config::MonitorConfig;
use crate::discovery::{Candidate, DiscoveryEngine, DiscoveryReport, DiscoverySummary, PingResult};
use crate::error::CoreError;
use crate::events::{BulkAcknowledgement, EventManager};
use crate::model::{
    Device, EntityId, Event, EventSeverity, EventSubject, EventType, HealthSample, Link,
    NetworkRange,
};
use crate::probe::{Prober, SystemDescription};
use crate::store::{EntityStore, EventFilter, StoreTransaction};

/// Window for [`MonitorStatus::recent_events`].
const RECENT_EVENT_WINDOW: chrono::Duration = chrono::Duration::hours(1);

// ── Scheduler state ──────────────────────────────────────────────

/// Continuous-mode state, observable through [`Monitor::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running { interval: Duration },
    /// Stop requested; the in-flight cycle is finishing.
    Stopping,
}

struct Runner {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    interval: Duration,
}

// ── Reports ──────────────────────────────────────────────────────

/// Outcome of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub devices: DeviceSummary,
    pub links: LinkSummary,
    /// Whether the cycle's writes reached the store.
    pub committed: bool,
    /// Cycle-level failure; the cycle's writes were rolled back.
    pub error: Option<String>,
}

impl CycleSummary {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub running: bool,
    /// Continuous-mode interval, when running.
    pub interval_secs: Option<u64>,
    pub cycles_completed: u64,
    pub last_cycle: Option<CycleSummary>,
    pub monitored_devices: usize,
    pub monitored_links: usize,
    /// Unresolved events.
    pub open_events: usize,
    /// Events created during the last hour.
    pub recent_events: usize,
    /// Weighted network-wide score over the whole inventory.
    pub health: NetworkHealth,
}

/// Health report for one link. Nothing is written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CableReport {
    pub link_id: EntityId,
    pub name: String,
    pub sample: HealthSample,
    pub validation: Option<MediumValidation>,
    pub recommendations: Vec<Recommendation>,
}

// ── Monitor ──────────────────────────────────────────────────────

/// Entry point for running health checks.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. Clones share the cycle lock
/// and the continuous-mode task.
pub struct Monitor<P, S> {
    inner: Arc<MonitorInner<P, S>>,
}

impl<P, S> Clone for Monitor<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<P, S> {
    config: MonitorConfig,
    prober: P,
    store: S,
    analyzer: HealthAnalyzer,
    events: EventManager,
    cycle_lock: Mutex<()>,
    state: watch::Sender<SchedulerState>,
    last_cycle: ArcSwapOption<CycleSummary>,
    cycles_completed: AtomicU64,
    runner: Mutex<Option<Runner>>,
}

impl<P: Prober, S: EntityStore> Monitor<P, S> {
    pub fn new(prober: P, store: S, config: MonitorConfig) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            inner: Arc::new(MonitorInner {
                analyzer: HealthAnalyzer::new(config.thresholds),
                events: EventManager::new(config.events),
                config,
                prober,
                store,
                cycle_lock: Mutex::new(()),
                state,
                last_cycle: ArcSwapOption::empty(),
                cycles_completed: AtomicU64::new(0),
                runner: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn prober(&self) -> &P {
        &self.inner.prober
    }

    pub fn analyzer(&self) -> &HealthAnalyzer {
        &self.inner.analyzer
    }

    fn device_checker(&self) -> DeviceChecker<'_, P> {
        DeviceChecker::new(
            &self.inner.prober,
            &self.inner.config.probe,
            &self.inner.events,
            self.inner.config.max_concurrency,
        )
    }

    fn link_checker(&self) -> LinkChecker<'_, P> {
        LinkChecker::new(
            &self.inner.prober,
            &self.inner.config.probe,
            &self.inner.analyzer,
            &self.inner.events,
            self.inner.config.max_concurrency,
        )
    }

    fn discovery(&self) -> DiscoveryEngine<'_, P> {
        DiscoveryEngine::new(
            &self.inner.prober,
            &self.inner.config.discovery,
            self.inner.config.max_concurrency,
        )
    }

    async fn begin(&self) -> Result<S::Tx, CoreError> {
        Ok(self.inner.store.begin().await?)
    }

    // ── Cycles ───────────────────────────────────────────────────

    /// Run one full cycle: every monitored device, then every monitored
    /// link, in one transaction. Failures are reported in the summary.
    pub async fn run_cycle(&self) -> CycleSummary {
        let _cycle = self.inner.cycle_lock.lock().await;
        let started_at = Utc::now();
        let clock = Instant::now();
        info!("monitoring cycle started");

        let mut devices = DeviceSummary::default();
        let mut links = LinkSummary::default();
        let outcome = match self.begin().await {
            Ok(tx) => {
                let result = async {
                    devices = self.device_checker().check_all(&tx).await?.summary;
                    links = self.link_checker().check_all(&tx).await?.summary;
                    Ok::<_, CoreError>(())
                }
                .await;
                finish(tx, result).await
            }
            Err(e) => Err(e),
        };

        let summary = CycleSummary {
            started_at,
            finished_at: Utc::now(),
            duration_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
            devices,
            links,
            committed: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        };

        match &summary.error {
            None => info!(
                duration_ms = summary.duration_ms,
                devices_up = summary.devices.up,
                devices_down = summary.devices.down,
                devices_unreachable = summary.devices.unreachable,
                links_up = summary.links.up,
                links_degraded = summary.links.degraded,
                links_down = summary.links.down,
                "monitoring cycle complete"
            ),
            Some(error) => warn!(
                duration_ms = summary.duration_ms,
                error = %error,
                "monitoring cycle failed, changes rolled back"
            ),
        }

        self.inner.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.inner.last_cycle.store(Some(Arc::new(summary.clone())));
        summary
    }

    /// Summary of the most recent cycle.
    pub fn last_cycle(&self) -> Option<Arc<CycleSummary>> {
        self.inner.last_cycle.load_full()
    }

    // ── Continuous mode ──────────────────────────────────────────

    /// Spawn the cycle loop. The first cycle starts immediately; later
    /// ones follow every `interval` (the configured one when `None`).
    pub async fn start_continuous(&self, interval: Option<Duration>) -> Result<(), CoreError> {
        let mut runner = self.inner.runner.lock().await;
        if runner.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(CoreError::AlreadyRunning);
        }

        let period = interval.unwrap_or(self.inner.config.interval);
        if period.is_zero() {
            return Err(CoreError::invalid("interval", "must be greater than zero"));
        }

        self.record_system_event(
            EventType::MonitoringStarted,
            format!("Continuous monitoring started ({}s interval)", period.as_secs()),
        )
        .await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(cycle_loop(self.clone(), period, cancel.clone()));
        *runner = Some(Runner {
            cancel,
            handle,
            interval: period,
        });
        self.inner
            .state
            .send_replace(SchedulerState::Running { interval: period });
        info!(interval_secs = period.as_secs(), "continuous monitoring started");
        Ok(())
    }

    /// Stop the cycle loop, letting an in-flight cycle finish. A no-op
    /// when nothing is running.
    pub async fn stop(&self) {
        let Some(runner) = self.inner.runner.lock().await.take() else {
            return;
        };

        self.inner.state.send_replace(SchedulerState::Stopping);
        runner.cancel.cancel();
        if let Err(e) = runner.handle.await {
            warn!(error = %e, "cycle loop ended abnormally");
        }
        self.inner.state.send_replace(SchedulerState::Idle);

        self.record_system_event(
            EventType::MonitoringStopped,
            "Continuous monitoring stopped".into(),
        )
        .await;
        info!("continuous monitoring stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .runner
            .lock()
            .await
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Subscribe to scheduler state changes.
    pub fn state(&self) -> watch::Receiver<SchedulerState> {
        self.inner.state.subscribe()
    }

    /// Scheduler state changes as a stream, starting with the current one.
    pub fn status_stream(&self) -> WatchStream<SchedulerState> {
        WatchStream::new(self.inner.state.subscribe())
    }

    pub async fn status(&self) -> Result<MonitorStatus, CoreError> {
        let interval = {
            let runner = self.inner.runner.lock().await;
            runner
                .as_ref()
                .filter(|r| !r.handle.is_finished())
                .map(|r| r.interval)
        };

        let tx = self.begin().await?;
        let counts = async {
            let devices = tx.list_devices().await?;
            let links = tx.list_links().await?;
            let open = tx.list_events(&EventFilter::Active).await?;
            let recent = tx
                .list_events(&EventFilter::Since(Utc::now() - RECENT_EVENT_WINDOW))
                .await?;
            let critical = recent
                .iter()
                .filter(|e| e.severity == EventSeverity::Critical && !e.acknowledged)
                .count();
            let network = NetworkCounts {
                total_devices: count(devices.len()),
                devices_up: count(devices.iter().filter(|d| d.status.is_up()).count()),
                total_links: count(links.len()),
                links_up: count(links.iter().filter(|l| l.status.is_up()).count()),
                critical_events: count(critical),
            };
            Ok::<_, CoreError>((
                devices.iter().filter(|d| d.is_monitored).count(),
                links.iter().filter(|l| l.is_monitored).count(),
                open.len(),
                recent.len(),
                network,
            ))
        }
        .await;
        tx.rollback().await;
        let (monitored_devices, monitored_links, open_events, recent_events, network) = counts?;

        Ok(MonitorStatus {
            running: interval.is_some(),
            interval_secs: interval.map(|i| i.as_secs()),
            cycles_completed: self.inner.cycles_completed.load(Ordering::Relaxed),
            last_cycle: self.last_cycle().map(|c| (*c).clone()),
            monitored_devices,
            monitored_links,
            open_events,
            recent_events,
            health: HealthAnalyzer::network_health(network),
        })
    }

    async fn record_system_event(&self, event_type: EventType, message: String) {
        let event = Event::new(
            event_type,
            EventSeverity::Info,
            EventSubject::System,
            message,
            Utc::now(),
        )
        .with_source("scheduler");

        let _cycle = self.inner.cycle_lock.lock().await;
        let result = async {
            let tx = self.begin().await?;
            let raised = self.inner.events.raise(&tx, event).await;
            finish(tx, raised).await
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "failed to record scheduler event");
        }
    }

    // ── Ad-hoc checks ────────────────────────────────────────────

    pub async fn check_device(&self, id: &EntityId) -> Result<DeviceCheck, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = async {
            let device = tx
                .get_device(id)
                .await?
                .ok_or_else(|| CoreError::DeviceNotFound {
                    identifier: id.to_string(),
                })?;
            self.device_checker().check(&tx, device).await
        }
        .await;
        finish(tx, result).await
    }

    pub async fn check_link(&self, id: &EntityId) -> Result<LinkCheck, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = async {
            let link = load_link(&tx, id).await?;
            self.link_checker().check(&tx, link).await
        }
        .await;
        finish(tx, result).await
    }

    pub async fn check_all_devices(&self) -> Result<DeviceSweep, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = self.device_checker().check_all(&tx).await;
        finish(tx, result).await
    }

    pub async fn check_all_links(&self) -> Result<LinkSweep, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = self.link_checker().check_all(&tx).await;
        finish(tx, result).await
    }

    /// Probe a link and report on its health and medium without
    /// persisting anything.
    pub async fn cable_report(&self, id: &EntityId) -> Result<CableReport, CoreError> {
        let tx = self.begin().await?;
        let result = async {
            let link = load_link(&tx, id).await?;
            let measured = self.link_checker().measure(&tx, &link).await?;
            Ok::<_, CoreError>((link, measured))
        }
        .await;
        tx.rollback().await;

        let (link, measured) = result?;
        let Some((sample, _)) = measured else {
            return Err(CoreError::invalid(
                "link",
                format!("target device of {} has no IP address", link.display_name()),
            ));
        };

        let validation = match (link.speed_mbps, &link.medium) {
            (Some(speed), Some(medium)) => Some(HealthAnalyzer::validate_medium(
                f64::from(speed),
                medium.medium_type,
            )),
            _ => None,
        };
        let recommendations = self
            .inner
            .analyzer
            .recommendations(&sample, validation.as_ref());

        Ok(CableReport {
            name: link.display_name(),
            link_id: link.id,
            sample,
            validation,
            recommendations,
        })
    }

    /// Ask a device's management agent for its system description.
    pub async fn describe_device(&self, id: &EntityId) -> Result<SystemDescription, CoreError> {
        let device = self.device(id).await?;
        let ip = device.ip.ok_or_else(|| {
            CoreError::invalid("device", format!("{} has no IP address", device.name))
        })?;
        Ok(self.inner.prober.describe(ip).await?)
    }

    // ── Discovery ────────────────────────────────────────────────

    fn parse_range(&self, range: Option<&str>) -> Result<NetworkRange, CoreError> {
        range.map_or(Ok(self.inner.config.discovery.default_range), str::parse)
    }

    /// Sweep a CIDR range (the configured default when `None`).
    pub async fn scan_network(
        &self,
        range: Option<&str>,
        verify: bool,
    ) -> Result<DiscoveryReport, CoreError> {
        let range = self.parse_range(range)?;
        self.discovery().scan(&range, verify).await
    }

    pub async fn scan_single(&self, ip: IpAddr) -> Result<Option<Candidate>, CoreError> {
        self.discovery().scan_single(ip).await
    }

    pub async fn batch_ping(&self, ips: &[IpAddr]) -> Result<Vec<PingResult>, CoreError> {
        self.discovery().batch_ping(ips).await
    }

    /// Scan with verification and upsert every candidate by address.
    pub async fn discover_and_save(
        &self,
        range: Option<&str>,
    ) -> Result<DiscoverySummary, CoreError> {
        let range = self.parse_range(range)?;
        let engine = self.discovery();
        let report = engine.scan(&range, true).await?;

        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let persisted = engine.persist(&tx, &self.inner.events, report).await;
        let summary = finish(tx, persisted).await?;
        info!(
            %range,
            discovered = summary.total_discovered,
            new = summary.new_devices,
            updated = summary.updated_devices,
            errors = summary.errors.len(),
            "discovery saved"
        );
        Ok(summary)
    }

    // ── Events ───────────────────────────────────────────────────

    pub async fn acknowledge(
        &self,
        id: &EntityId,
        by: &str,
        notes: Option<&str>,
    ) -> Result<Event, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = self.inner.events.acknowledge(&tx, id, by, notes).await;
        finish(tx, result).await
    }

    pub async fn resolve(
        &self,
        id: &EntityId,
        by: &str,
        notes: Option<&str>,
    ) -> Result<Event, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = self.inner.events.resolve(&tx, id, by, notes).await;
        finish(tx, result).await
    }

    pub async fn bulk_acknowledge(
        &self,
        ids: &[EntityId],
        by: &str,
        notes: Option<&str>,
    ) -> Result<BulkAcknowledgement, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let tx = self.begin().await?;
        let result = self.inner.events.bulk_acknowledge(&tx, ids, by, notes).await;
        finish(tx, result).await
    }

    // ── Reads ────────────────────────────────────────────────────

    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, CoreError> {
        let tx = self.begin().await?;
        let result = tx.list_events(filter).await;
        tx.rollback().await;
        Ok(result?)
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>, CoreError> {
        let tx = self.begin().await?;
        let result = tx.list_devices().await;
        tx.rollback().await;
        Ok(result?)
    }

    pub async fn list_links(&self) -> Result<Vec<Link>, CoreError> {
        let tx = self.begin().await?;
        let result = tx.list_links().await;
        tx.rollback().await;
        Ok(result?)
    }

    pub async fn device(&self, id: &EntityId) -> Result<Device, CoreError> {
        let tx = self.begin().await?;
        let result = tx.get_device(id).await;
        tx.rollback().await;
        result?.ok_or_else(|| CoreError::DeviceNotFound {
            identifier: id.to_string(),
        })
    }
}

async fn load_link<T: StoreTransaction>(tx: &T, id: &EntityId) -> Result<Link, CoreError> {
    tx.get_link(id)
        .await?
        .ok_or_else(|| CoreError::LinkNotFound {
            identifier: id.to_string(),
        })
}

/// Commit on success, roll back on failure.
fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

async fn finish<T: StoreTransaction, R>(
    tx: T,
    result: Result<R, CoreError>,
) -> Result<R, CoreError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            tx.rollback().await;
            Err(e)
        }
    }
}

// ── Background task ──────────────────────────────────────────────

async fn cycle_loop<P: Prober, S: EntityStore>(
    monitor: Monitor<P, S>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                monitor.run_cycle().await;
            }
        }
    }
    debug!("cycle loop exited");
}
