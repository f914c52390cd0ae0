#![allow(clippy::unwrap_used)]
// Integration tests for the Monitor facade: cycles, transactions,
// continuous mode and the event lifecycle as seen by operators.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_stream::StreamExt;
use tokio_test::{assert_err, assert_ok};

use netwatch_core::{
    CoreError, Device, DeviceSummary, EchoReply, EntityId, EntityStore, Event, EventFilter,
    EventSeverity, EventSubject, EventType, Link, LinkSummary, MemoryStore, MemoryTransaction,
    Medium, MediumType, Monitor, MonitorConfig, NetworkRange, ProbeError, Prober, ResolvedHost,
    SchedulerState, Status, StoreError, StoreTransaction,
};

// ── Scripted prober ─────────────────────────────────────────────────

/// Replies per address, changeable between cycles. Counts every echo and
/// tracks how many are in flight at once.
#[derive(Clone, Default)]
struct ScriptedProber {
    replies: Arc<Mutex<HashMap<IpAddr, Result<EchoReply, ProbeError>>>>,
    echoes: Arc<Mutex<Vec<IpAddr>>>,
    /// Hosts answering a sweep; `None` leaves resolution unsupported.
    hosts: Arc<Mutex<Option<Vec<ResolvedHost>>>>,
    delay: Arc<Mutex<Duration>>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedProber {
    fn set(&self, ip: IpAddr, reply: Result<EchoReply, ProbeError>) {
        self.replies.lock().unwrap().insert(ip, reply);
    }

    fn echoed(&self, ip: IpAddr) -> usize {
        self.echoes.lock().unwrap().iter().filter(|i| **i == ip).count()
    }

    fn answer_sweep(&self, hosts: Vec<ResolvedHost>) {
        *self.hosts.lock().unwrap() = Some(hosts);
    }

    fn slow_down(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Prober for ScriptedProber {
    async fn echo(
        &self,
        ip: IpAddr,
        _count: u32,
        _timeout: Duration,
    ) -> Result<EchoReply, ProbeError> {
        self.echoes.lock().unwrap().push(ip);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .get(&ip)
            .cloned()
            .unwrap_or(Ok(EchoReply::silent()))
    }

    async fn resolve(
        &self,
        range: &NetworkRange,
        _timeout: Duration,
        _retries: u32,
    ) -> Result<Vec<ResolvedHost>, ProbeError> {
        let hosts = self.hosts.lock().unwrap().clone();
        hosts
            .map(|hosts| hosts.into_iter().filter(|h| range.contains(h.ip)).collect())
            .ok_or_else(|| ProbeError::unsupported("address resolution"))
    }
}

fn ip(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 1, 0, last))
}

fn alive(avg: f64) -> Result<EchoReply, ProbeError> {
    Ok(EchoReply {
        alive: true,
        avg_rtt_ms: avg,
        min_rtt_ms: avg,
        max_rtt_ms: avg,
        loss_fraction: 0.0,
    })
}

// ── Fault-injecting store ───────────────────────────────────────────

/// Wraps a MemoryStore; commits fail while `fail_commit` is set and
/// event writes fail while `fail_events` is set.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_commit: Arc<AtomicBool>,
    fail_events: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

struct FlakyTx {
    inner: MemoryTransaction,
    fail_commit: bool,
    fail_events: bool,
    commits: Arc<AtomicUsize>,
}

impl EntityStore for FlakyStore {
    type Tx = FlakyTx;

    async fn begin(&self) -> Result<FlakyTx, StoreError> {
        Ok(FlakyTx {
            inner: self.inner.begin().await?,
            fail_commit: self.fail_commit.load(Ordering::SeqCst),
            fail_events: self.fail_events.load(Ordering::SeqCst),
            commits: Arc::clone(&self.commits),
        })
    }
}

impl StoreTransaction for FlakyTx {
    async fn list_devices(&self) -> Result<Vec<Device>, StoreError> {
        self.inner.list_devices().await
    }

    async fn get_device(&self, id: &EntityId) -> Result<Option<Device>, StoreError> {
        self.inner.get_device(id).await
    }

    async fn find_device_by_ip(&self, ip: IpAddr) -> Result<Option<Device>, StoreError> {
        self.inner.find_device_by_ip(ip).await
    }

    async fn save_device(&self, device: Device) -> Result<(), StoreError> {
        self.inner.save_device(device).await
    }

    async fn list_links(&self) -> Result<Vec<Link>, StoreError> {
        self.inner.list_links().await
    }

    async fn get_link(&self, id: &EntityId) -> Result<Option<Link>, StoreError> {
        self.inner.get_link(id).await
    }

    async fn save_link(&self, link: Link) -> Result<(), StoreError> {
        self.inner.save_link(link).await
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, StoreError> {
        self.inner.list_events(filter).await
    }

    async fn get_event(&self, id: &EntityId) -> Result<Option<Event>, StoreError> {
        self.inner.get_event(id).await
    }

    async fn find_active_event(
        &self,
        subject: &EventSubject,
        event_type: EventType,
    ) -> Result<Option<Event>, StoreError> {
        self.inner.find_active_event(subject, event_type).await
    }

    async fn save_event(&self, event: Event) -> Result<(), StoreError> {
        if self.fail_events {
            return Err(StoreError::Unavailable("events table locked".into()));
        }
        self.inner.save_event(event).await
    }

    async fn commit(self) -> Result<(), StoreError> {
        if self.fail_commit {
            self.inner.rollback().await;
            return Err(StoreError::Commit("disk full".into()));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.inner.commit().await
    }

    async fn rollback(self) {
        self.inner.rollback().await;
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

/// core (10.1.0.1) -- uplink --> edge (10.1.0.2), plus an unmonitored
/// lab box (10.1.0.9).
async fn seed(store: &MemoryStore) {
    let tx = store.begin().await.unwrap();

    let mut core = Device::new("core", "core-router", Some(ip(1)));
    core.status = Status::Up;
    let mut edge = Device::new("edge", "edge-switch", Some(ip(2)));
    edge.status = Status::Up;
    let mut lab = Device::new("lab", "lab-box", Some(ip(9)));
    lab.is_monitored = false;
    lab.status = Status::Up;
    for d in [core, edge, lab] {
        tx.save_device(d).await.unwrap();
    }

    let mut uplink = Link::new("uplink", "core", "edge");
    uplink.status = Status::Up;
    uplink.speed_mbps = Some(850);
    uplink.medium = Some(Medium {
        medium_type: MediumType::Cat6,
        length_m: Some(40.0),
    });
    tx.save_link(uplink).await.unwrap();
    tx.commit().await.unwrap();
}

async fn healthy_monitor() -> (Monitor<ScriptedProber, FlakyStore>, ScriptedProber, FlakyStore) {
    let store = FlakyStore::default();
    seed(&store.inner).await;
    let prober = ScriptedProber::default();
    prober.set(ip(1), alive(1.0));
    prober.set(ip(2), alive(2.0));
    prober.set(ip(9), alive(1.0));
    let monitor = Monitor::new(prober.clone(), store.clone(), MonitorConfig::default());
    (monitor, prober, store)
}

// ── Cycles ──────────────────────────────────────────────────────────

#[tokio::test]
async fn healthy_cycle_commits_without_events() {
    let (monitor, _, store) = healthy_monitor().await;

    let summary = monitor.run_cycle().await;

    assert!(summary.is_ok());
    assert!(summary.committed);
    assert_eq!(
        summary.devices,
        DeviceSummary {
            total: 2,
            up: 2,
            ..DeviceSummary::default()
        }
    );
    assert_eq!(
        summary.links,
        LinkSummary {
            total: 1,
            up: 1,
            ..LinkSummary::default()
        }
    );
    assert_eq!(store.inner.event_count(), 0);
    assert_eq!(store.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unmonitored_devices_are_never_probed() {
    let (monitor, prober, store) = healthy_monitor().await;
    prober.set(ip(9), Ok(EchoReply::silent()));

    monitor.run_cycle().await;
    monitor.run_cycle().await;

    assert_eq!(prober.echoed(ip(9)), 0);
    let lab = store
        .inner
        .devices_snapshot()
        .iter()
        .find(|d| d.id == EntityId::from("lab"))
        .map(|d| d.status);
    assert_eq!(lab, Some(Status::Up));
}

#[tokio::test]
async fn outage_raises_one_event_per_transition() {
    let (monitor, prober, store) = healthy_monitor().await;
    prober.set(ip(2), Ok(EchoReply::silent()));

    let first = monitor.run_cycle().await;
    assert_eq!(first.devices.down, 1);
    assert_eq!(first.links.down, 1);

    let events = store.inner.snapshot().events;
    let mut kinds: Vec<_> = events.iter().map(|e| (e.event_type, e.severity)).collect();
    kinds.sort_by_key(|(t, _)| t.to_string());
    assert_eq!(
        kinds,
        vec![
            (EventType::DeviceDown, EventSeverity::High),
            (EventType::LinkDown, EventSeverity::Critical),
        ]
    );

    // Still down: no transition, no new events.
    monitor.run_cycle().await;
    assert_eq!(store.inner.event_count(), 2);
}

#[tokio::test]
async fn commit_failure_rolls_back_and_next_cycle_recovers() {
    let (monitor, prober, store) = healthy_monitor().await;
    prober.set(ip(2), Ok(EchoReply::silent()));
    store.fail_commit.store(true, Ordering::SeqCst);

    let failed = monitor.run_cycle().await;
    assert!(!failed.committed);
    assert!(failed.error.as_deref().unwrap().contains("disk full"));
    assert_eq!(store.inner.event_count(), 0);
    let edge = monitor.device(&"edge".into()).await.unwrap();
    assert_eq!(edge.status, Status::Up);

    store.fail_commit.store(false, Ordering::SeqCst);
    let recovered = monitor.run_cycle().await;
    assert!(recovered.committed);
    assert_eq!(store.inner.event_count(), 2);
    assert_eq!(monitor.last_cycle().unwrap().as_ref(), &recovered);
}

#[tokio::test]
async fn probe_errors_are_counted_not_fatal() {
    let (monitor, prober, _) = healthy_monitor().await;
    prober.set(
        ip(1),
        Err(ProbeError::Timeout {
            target: ip(1).to_string(),
            timeout_ms: 2000,
        }),
    );

    let summary = monitor.run_cycle().await;
    assert!(summary.committed);
    assert_eq!(summary.devices.unreachable, 1);
    assert_eq!(summary.devices.errored, 1);
    assert_eq!(summary.devices.up, 1);
}

// ── Ad-hoc operations ───────────────────────────────────────────────

#[tokio::test]
async fn check_device_rejects_unknown_and_unmonitored() {
    let (monitor, _, _) = healthy_monitor().await;

    let missing = assert_err!(monitor.check_device(&"ghost".into()).await);
    assert!(matches!(missing, CoreError::DeviceNotFound { .. }));

    let unmonitored = assert_err!(monitor.check_device(&"lab".into()).await);
    assert!(matches!(unmonitored, CoreError::NotMonitored { .. }));

    let check = assert_ok!(monitor.check_device(&"core".into()).await);
    assert_eq!(check.status, Status::Up);
}

#[tokio::test]
async fn cable_report_flags_underperforming_medium() {
    let (monitor, _, store) = healthy_monitor().await;
    let before = store.inner.version();

    let report = assert_ok!(monitor.cable_report(&"uplink".into()).await);

    let validation = report.validation.unwrap();
    assert!(!validation.is_valid);
    assert!((validation.utilization_pct - 8.5).abs() < 1e-9);
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.message.starts_with("Cable not meeting specifications"))
    );
    assert_eq!(store.inner.version(), before);
}

#[tokio::test]
async fn management_queries_are_unsupported_by_default() {
    let (monitor, _, _) = healthy_monitor().await;
    let err = assert_err!(monitor.describe_device(&"core".into()).await);
    assert!(matches!(err, CoreError::Unsupported { .. }));
}

#[tokio::test]
async fn malformed_range_is_a_hard_error() {
    let (monitor, _, _) = healthy_monitor().await;
    let err = assert_err!(monitor.scan_network(Some("10.0.0.0/40"), true).await);
    assert!(matches!(err, CoreError::InvalidInput { .. }));
    let err = assert_err!(monitor.scan_network(None, false).await);
    assert!(matches!(err, CoreError::Unsupported { .. }));
}

// ── Discovery ───────────────────────────────────────────────────────

fn sweep_host(last: u8) -> ResolvedHost {
    ResolvedHost {
        ip: IpAddr::V4(Ipv4Addr::new(10, 9, 0, last)),
        mac: None,
        hostname: Some(format!("host-{last}")),
        response_time_ms: Some(0.8),
    }
}

#[tokio::test]
async fn discovery_saves_new_device_with_its_event() {
    let (monitor, prober, store) = healthy_monitor().await;
    let found = sweep_host(5);
    prober.answer_sweep(vec![found.clone()]);
    prober.set(found.ip, alive(0.8));

    let summary = assert_ok!(monitor.discover_and_save(Some("10.9.0.0/24")).await);
    assert_eq!(summary.total_discovered, 1);
    assert_eq!(summary.new_devices, 1);
    assert!(summary.errors.is_empty());

    let events = store.inner.snapshot().events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::DeviceDiscovered);
    let saved = store
        .inner
        .devices_snapshot()
        .iter()
        .find(|d| d.ip == Some(found.ip))
        .map(|d| d.id.clone());
    assert_eq!(events[0].device_id, saved);
}

#[tokio::test]
async fn discovery_event_failure_rolls_back_the_device() {
    let (monitor, prober, store) = healthy_monitor().await;
    let found = sweep_host(5);
    prober.answer_sweep(vec![found.clone()]);
    prober.set(found.ip, alive(0.8));
    store.fail_events.store(true, Ordering::SeqCst);

    let err = assert_err!(monitor.discover_and_save(Some("10.9.0.0/24")).await);
    assert!(matches!(err, CoreError::Store(_)));

    // Neither the device nor its event reached the store.
    assert_eq!(store.inner.devices_snapshot().len(), 3);
    assert!(
        store
            .inner
            .devices_snapshot()
            .iter()
            .all(|d| d.ip != Some(found.ip))
    );
    assert_eq!(store.inner.event_count(), 0);
    assert_eq!(store.commits.load(Ordering::SeqCst), 0);

    store.fail_events.store(false, Ordering::SeqCst);
    let retried = assert_ok!(monitor.discover_and_save(Some("10.9.0.0/24")).await);
    assert_eq!(retried.new_devices, 1);
    assert_eq!(store.inner.event_count(), 1);
}

// ── Event lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn operator_lifecycle_through_monitor() {
    let (monitor, prober, _) = healthy_monitor().await;
    prober.set(ip(1), Ok(EchoReply::silent()));
    monitor.run_cycle().await;

    let attention = monitor
        .list_events(&EventFilter::RequiresAttention)
        .await
        .unwrap();
    assert_eq!(attention.len(), 1);
    let id = attention[0].id.clone();

    let resolved = assert_ok!(monitor.resolve(&id, "noc", Some("power restored")).await);
    assert!(resolved.acknowledged && resolved.resolved);
    assert!(resolved.acknowledged_at.unwrap() <= resolved.resolved_at.unwrap());

    let err = assert_err!(monitor.acknowledge(&id, "noc", None).await);
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    assert!(
        monitor
            .list_events(&EventFilter::Active)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn bulk_acknowledge_counts_only_new_acknowledgements() {
    let (monitor, prober, _) = healthy_monitor().await;
    prober.set(ip(2), Ok(EchoReply::silent()));
    monitor.run_cycle().await;

    let ids: Vec<_> = monitor
        .list_events(&EventFilter::All)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_ok!(monitor.acknowledge(&ids[0], "alice", None).await);

    let bulk = assert_ok!(monitor.bulk_acknowledge(&ids, "bob", None).await);
    assert_eq!(bulk.acknowledged_count, 1);
    assert_eq!(bulk.total_events, 2);
}

// ── Continuous mode ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn continuous_mode_runs_until_stopped() {
    let (monitor, _, store) = healthy_monitor().await;
    let mut states = monitor.status_stream();
    assert_eq!(states.next().await, Some(SchedulerState::Idle));

    assert_ok!(monitor.start_continuous(Some(Duration::from_secs(60))).await);
    let again = assert_err!(monitor.start_continuous(None).await);
    assert!(matches!(again, CoreError::AlreadyRunning));

    tokio::time::sleep(Duration::from_secs(150)).await;
    let status = assert_ok!(monitor.status().await);
    assert!(status.running);
    assert_eq!(status.interval_secs, Some(60));
    assert!(status.cycles_completed >= 2);
    assert_eq!(status.monitored_devices, 2);
    assert_eq!(status.monitored_links, 1);

    monitor.stop().await;
    monitor.stop().await;
    assert!(!monitor.is_running().await);
    assert_eq!(*monitor.state().borrow(), SchedulerState::Idle);

    let scheduler_events = store
        .inner
        .snapshot()
        .events
        .into_iter()
        .filter(|e| e.subject() == EventSubject::System)
        .map(|e| e.event_type)
        .collect::<Vec<_>>();
    assert_eq!(scheduler_events.len(), 2);
    assert!(scheduler_events.contains(&EventType::MonitoringStarted));
    assert!(scheduler_events.contains(&EventType::MonitoringStopped));
}

#[tokio::test(start_paused = true)]
async fn concurrent_cycles_never_overlap() {
    let store = FlakyStore::default();
    seed(&store.inner).await;
    let prober = ScriptedProber::default();
    prober.set(ip(1), alive(1.0));
    prober.set(ip(2), alive(2.0));
    prober.slow_down(Duration::from_secs(1));
    // One echo at a time inside a cycle, so any overlap shows in the peak.
    let config = MonitorConfig {
        max_concurrency: 1,
        ..MonitorConfig::default()
    };
    let monitor = Monitor::new(prober.clone(), store.clone(), config);

    let (a, b) = tokio::join!(monitor.run_cycle(), monitor.run_cycle());

    assert!(a.committed && b.committed);
    assert_eq!(prober.peak(), 1);
    assert_eq!(store.commits.load(Ordering::SeqCst), 2);
    let (first, second) = if a.started_at <= b.started_at { (a, b) } else { (b, a) };
    assert!(first.finished_at <= second.started_at);
}

#[tokio::test(start_paused = true)]
async fn stop_lets_the_running_cycle_commit() {
    let (monitor, prober, store) = healthy_monitor().await;
    prober.set(ip(2), Ok(EchoReply::silent()));
    prober.slow_down(Duration::from_secs(5));

    assert_ok!(monitor.start_continuous(Some(Duration::from_secs(60))).await);
    // The first cycle starts immediately and is now waiting on its echoes.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(prober.in_flight() > 0);
    assert!(monitor.last_cycle().is_none());

    monitor.stop().await;

    let last = monitor.last_cycle().unwrap();
    assert!(last.committed);
    assert_eq!(last.devices.down, 1);
    let edge = monitor.device(&"edge".into()).await.unwrap();
    assert_eq!(edge.status, Status::Down);
    let downs = store
        .inner
        .snapshot()
        .events
        .into_iter()
        .filter(|e| e.event_type == EventType::DeviceDown)
        .count();
    assert_eq!(downs, 1);
}
