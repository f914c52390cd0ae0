//! Subnet discovery: address-resolution sweep, liveness verification and
//! heuristic device-type classification.
//!
//! Classification runs an ordered list of pure classifiers (MAC vendor
//! prefix, hostname keywords, management system description). The first
//! one with an opinion wins; nothing matching leaves the type `UNKNOWN`.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::check::fan_out;
use crate::config::DiscoveryConfig;
use crate::error::CoreError;
use crate::events::EventManager;
use crate::model::{
    Device, DeviceType, EntityId, Event, EventSeverity, EventSubject, EventType, MacAddress,
    NetworkRange, Status,
};
use crate::probe::{EchoReply, ProbeError, Prober, ResolvedHost};
use crate::store::StoreTransaction;

const EVENT_SOURCE: &str = "discovery";

// ── Results ─────────────────────────────────────────────────────────

/// A host found by discovery, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ip: IpAddr,
    pub mac: Option<MacAddress>,
    pub hostname: Option<String>,
    /// Management-agent system description, when enrichment ran.
    pub description: Option<String>,
    pub device_type: DeviceType,
    pub status: Status,
    pub latency_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    /// Address-resolution round trip.
    pub response_time_ms: Option<f64>,
    pub discovered_at: DateTime<Utc>,
}

impl Candidate {
    fn from_resolved(host: ResolvedHost, now: DateTime<Utc>) -> Self {
        Self {
            ip: host.ip,
            mac: host.mac,
            hostname: host.hostname,
            description: None,
            device_type: DeviceType::Unknown,
            status: Status::Up,
            latency_ms: None,
            packet_loss_pct: None,
            response_time_ms: host.response_time_ms,
            discovered_at: now,
        }
    }

    fn merge_echo(&mut self, reply: &EchoReply) {
        self.status = if reply.alive { Status::Up } else { Status::Down };
        self.latency_ms = reply.alive.then_some(reply.avg_rtt_ms);
        self.packet_loss_pct = Some(reply.loss_fraction * 100.0);
    }
}

/// A per-host failure that did not stop the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    pub ip: Option<IpAddr>,
    pub message: String,
}

impl DiscoveryIssue {
    fn new(ip: Option<IpAddr>, message: impl Into<String>) -> Self {
        Self {
            ip,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub network_range: NetworkRange,
    /// Sorted by address.
    pub candidates: Vec<Candidate>,
    pub errors: Vec<DiscoveryIssue>,
}

/// Outcome of one liveness ping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    pub ip: IpAddr,
    pub alive: bool,
    pub latency_ms: Option<f64>,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,
    pub packet_loss_pct: f64,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl PingResult {
    fn from_echo(ip: IpAddr, result: Result<EchoReply, ProbeError>, now: DateTime<Utc>) -> Self {
        match result {
            Ok(reply) => Self {
                ip,
                alive: reply.alive,
                latency_ms: reply.alive.then_some(reply.avg_rtt_ms),
                min_rtt_ms: reply.alive.then_some(reply.min_rtt_ms),
                max_rtt_ms: reply.alive.then_some(reply.max_rtt_ms),
                packet_loss_pct: if reply.alive {
                    reply.loss_fraction * 100.0
                } else {
                    100.0
                },
                error: None,
                checked_at: now,
            },
            Err(e) => Self {
                ip,
                alive: false,
                latency_ms: None,
                min_rtt_ms: None,
                max_rtt_ms: None,
                packet_loss_pct: 100.0,
                error: Some(e.to_string()),
                checked_at: now,
            },
        }
    }
}

/// Outcome of persisting a discovery scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySummary {
    pub network_range: NetworkRange,
    pub total_discovered: usize,
    pub new_devices: usize,
    pub updated_devices: usize,
    pub errors: Vec<DiscoveryIssue>,
}

// ── Classification ──────────────────────────────────────────────────

/// A classifier inspects a candidate and may name its device type.
pub type Classifier = fn(&Candidate) -> Option<DeviceType>;

/// Classifiers in priority order.
pub const CLASSIFIERS: &[(&str, Classifier)] = &[
    ("mac_oui", classify_by_oui),
    ("hostname", classify_by_hostname),
    ("system_description", classify_by_description),
];

const OUI_TABLE: &[(&str, DeviceType)] = &[
    ("00:0A:95", DeviceType::Router),
    ("00:1A:2F", DeviceType::Switch),
    ("00:1B:D4", DeviceType::Switch),
    ("00:24:C4", DeviceType::Switch),
    ("00:22:55", DeviceType::Switch),
    ("BC:52:B7", DeviceType::Router),
    ("54:E6:FC", DeviceType::Router),
    ("00:21:6A", DeviceType::Router),
    ("00:50:56", DeviceType::Server),
    ("00:1C:42", DeviceType::Server),
    ("08:00:27", DeviceType::Pc),
];

const HOSTNAME_KEYWORDS: &[(&[&str], DeviceType)] = &[
    (&["router", "rt", "gw", "gateway"], DeviceType::Router),
    (&["switch", "sw"], DeviceType::Switch),
    (&["server", "srv"], DeviceType::Server),
    (&["ap", "access-point", "wifi"], DeviceType::AccessPoint),
    (&["printer", "print"], DeviceType::Printer),
    (&["camera", "cam", "ipc"], DeviceType::Camera),
];

/// Run the classifiers in order; the first match wins.
pub fn classify(candidate: &Candidate) -> DeviceType {
    CLASSIFIERS
        .iter()
        .find_map(|(name, classifier)| {
            let found = classifier(candidate)?;
            debug!(ip = %candidate.ip, classifier = name, device_type = %found, "classified");
            Some(found)
        })
        .unwrap_or_default()
}

pub fn classify_by_oui(candidate: &Candidate) -> Option<DeviceType> {
    let oui = candidate.mac.as_ref()?.oui();
    OUI_TABLE
        .iter()
        .find(|(prefix, _)| *prefix == oui)
        .map(|(_, device_type)| *device_type)
}

pub fn classify_by_hostname(candidate: &Candidate) -> Option<DeviceType> {
    let hostname = candidate.hostname.as_deref()?.to_lowercase();
    HOSTNAME_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| hostname.contains(k)))
        .map(|(_, device_type)| *device_type)
}

pub fn classify_by_description(candidate: &Candidate) -> Option<DeviceType> {
    let text = candidate.description.as_deref()?.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has(&["cisco", "catalyst"]) {
        return Some(if has(&["switch", "catalyst"]) {
            DeviceType::Switch
        } else {
            DeviceType::Router
        });
    }
    if has(&["hp", "arista", "juniper", "dell", "netgear"]) {
        return Some(DeviceType::Switch);
    }
    if has(&["windows", "linux", "ubuntu", "centos"]) {
        return Some(DeviceType::Server);
    }
    if has(&["printer"]) {
        return Some(DeviceType::Printer);
    }
    let words: Vec<&str> = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if text.contains("access point") || text.contains("wireless") || words.contains(&"ap") {
        return Some(DeviceType::AccessPoint);
    }
    None
}

// ── Engine ──────────────────────────────────────────────────────────

pub struct DiscoveryEngine<'a, P> {
    prober: &'a P,
    config: &'a DiscoveryConfig,
    max_concurrency: usize,
}

impl<'a, P: Prober> DiscoveryEngine<'a, P> {
    pub fn new(prober: &'a P, config: &'a DiscoveryConfig, max_concurrency: usize) -> Self {
        Self {
            prober,
            config,
            max_concurrency,
        }
    }

    /// Sweep `range`, optionally verify each host with an echo, then
    /// classify. Sweep and verification failures land in `errors`.
    pub async fn scan(&self, range: &NetworkRange, verify: bool) -> Result<DiscoveryReport, CoreError> {
        info!(%range, verify, "starting network scan");
        let now = Utc::now();
        let mut errors = Vec::new();

        let hosts = match self
            .prober
            .resolve(range, self.config.timeout, self.config.retries)
            .await
        {
            Ok(hosts) => hosts,
            Err(e @ ProbeError::Unsupported { .. }) => return Err(e.into()),
            Err(e) => {
                warn!(%range, error = %e, "address resolution failed");
                errors.push(DiscoveryIssue::new(None, e.to_string()));
                Vec::new()
            }
        };

        // One candidate per address, inside the requested range.
        let mut by_ip = BTreeMap::new();
        for host in hosts {
            if range.contains(host.ip) {
                by_ip
                    .entry(host.ip)
                    .or_insert_with(|| Candidate::from_resolved(host, now));
            } else {
                debug!(ip = %host.ip, %range, "ignoring host outside range");
            }
        }
        let mut candidates: Vec<Candidate> = by_ip.into_values().collect();

        if verify && !candidates.is_empty() {
            let replies = fan_out(candidates.iter().map(|c| c.ip), self.max_concurrency, |ip| {
                self.prober.echo(ip, 1, self.config.timeout)
            })
            .await;
            for (candidate, reply) in candidates.iter_mut().zip(replies) {
                match reply {
                    Ok(reply) => candidate.merge_echo(&reply),
                    Err(e @ ProbeError::Unsupported { .. }) => return Err(e.into()),
                    Err(e) => {
                        warn!(ip = %candidate.ip, error = %e, "verification ping failed");
                        candidate.merge_echo(&EchoReply::silent());
                        errors.push(DiscoveryIssue::new(Some(candidate.ip), e.to_string()));
                    }
                }
            }
        }

        if self.config.enrich {
            self.enrich(&mut candidates, &mut errors).await;
        }

        for candidate in &mut candidates {
            candidate.device_type = classify(candidate);
        }

        info!(%range, found = candidates.len(), errors = errors.len(), "network scan complete");
        Ok(DiscoveryReport {
            network_range: *range,
            candidates,
            errors,
        })
    }

    async fn enrich(&self, candidates: &mut [Candidate], errors: &mut Vec<DiscoveryIssue>) {
        for candidate in candidates.iter_mut() {
            match self.prober.describe(candidate.ip).await {
                Ok(system) => {
                    candidate.description = Some(system.description);
                    if candidate.hostname.is_none() {
                        candidate.hostname = system.name;
                    }
                }
                Err(ProbeError::Unsupported { capability }) => {
                    debug!(%capability, "management queries unavailable, skipping enrichment");
                    return;
                }
                Err(e) => {
                    debug!(ip = %candidate.ip, error = %e, "system description failed");
                    errors.push(DiscoveryIssue::new(Some(candidate.ip), e.to_string()));
                }
            }
        }
    }

    /// Echo a single address. Silent or failing hosts yield `None`.
    pub async fn scan_single(&self, ip: IpAddr) -> Result<Option<Candidate>, CoreError> {
        match self.prober.echo(ip, 1, self.config.timeout).await {
            Ok(reply) if reply.alive => {
                let now = Utc::now();
                let mut candidate = Candidate::from_resolved(
                    ResolvedHost {
                        ip,
                        mac: None,
                        hostname: None,
                        response_time_ms: None,
                    },
                    now,
                );
                candidate.merge_echo(&reply);
                Ok(Some(candidate))
            }
            Ok(_) => Ok(None),
            Err(e @ ProbeError::Unsupported { .. }) => Err(e.into()),
            Err(e) => {
                warn!(%ip, error = %e, "ping failed");
                Ok(None)
            }
        }
    }

    /// Ping every address concurrently. Individual failures become
    /// results with `error` set.
    pub async fn batch_ping(&self, ips: &[IpAddr]) -> Result<Vec<PingResult>, CoreError> {
        let replies = fan_out(ips.iter().copied(), self.max_concurrency, |ip| async move {
            (ip, self.prober.echo(ip, 1, self.config.timeout).await)
        })
        .await;

        let now = Utc::now();
        replies
            .into_iter()
            .map(|(ip, reply)| match reply {
                Err(e @ ProbeError::Unsupported { .. }) => Err(e.into()),
                other => Ok(PingResult::from_echo(ip, other, now)),
            })
            .collect()
    }

    /// Upsert scanned candidates by address. New devices get a
    /// `DEVICE_DISCOVERED` event. Per-candidate failures are collected;
    /// a store failure aborts so the caller can roll back.
    pub async fn persist<T: StoreTransaction>(
        &self,
        tx: &T,
        events: &EventManager,
        report: DiscoveryReport,
    ) -> Result<DiscoverySummary, CoreError> {
        let mut summary = DiscoverySummary {
            network_range: report.network_range,
            total_discovered: report.candidates.len(),
            new_devices: 0,
            updated_devices: 0,
            errors: report.errors,
        };

        for candidate in report.candidates {
            let ip = candidate.ip;
            match save_candidate(tx, events, candidate).await {
                Ok(true) => summary.new_devices += 1,
                Ok(false) => summary.updated_devices += 1,
                // A store failure leaves the transaction unusable.
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(%ip, error = %e, "failed to save discovered device");
                    summary.errors.push(DiscoveryIssue::new(Some(ip), e.to_string()));
                }
            }
        }
        Ok(summary)
    }
}

/// Returns `true` when a new device was created.
async fn save_candidate<T: StoreTransaction>(
    tx: &T,
    events: &EventManager,
    candidate: Candidate,
) -> Result<bool, CoreError> {
    let now = Utc::now();

    if let Some(mut device) = tx.find_device_by_ip(candidate.ip).await? {
        device.status = candidate.status;
        device.last_seen = Some(now);
        if candidate.mac.is_some() {
            device.mac = candidate.mac;
        }
        tx.save_device(device).await?;
        return Ok(false);
    }

    let ip = candidate.ip;
    let mut device = Device::new(EntityId::for_discovered(ip), format!("Device {ip}"), Some(ip));
    device.mac = candidate.mac;
    device.hostname = candidate.hostname;
    device.device_type = candidate.device_type;
    device.status = candidate.status;
    device.latency_ms = candidate.latency_ms;
    device.packet_loss_pct = candidate.packet_loss_pct;
    device.last_seen = Some(now);

    let event = Event::new(
        EventType::DeviceDiscovered,
        EventSeverity::Info,
        EventSubject::Device(device.id.clone()),
        format!("Discovered new device at {ip}"),
        now,
    )
    .with_details(json!({
        "ip": ip.to_string(),
        "mac": device.mac.as_ref().map(MacAddress::as_str),
        "device_type": device.device_type.to_string(),
    }))
    .with_source(EVENT_SOURCE);

    tx.save_device(device).await?;
    events.raise(tx, event).await?;
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::probe::SystemDescription;
    use crate::store::{EntityStore, EventFilter, MemoryStore};

    fn candidate(mac: Option<&str>, hostname: Option<&str>, description: Option<&str>) -> Candidate {
        Candidate {
            ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10)),
            mac: mac.map(|m| MacAddress::parse(m).unwrap()),
            hostname: hostname.map(str::to_owned),
            description: description.map(str::to_owned),
            device_type: DeviceType::Unknown,
            status: Status::Up,
            latency_ms: None,
            packet_loss_pct: None,
            response_time_ms: None,
            discovered_at: Utc::now(),
        }
    }

    #[test]
    fn oui_wins_over_hostname() {
        let c = candidate(Some("00:50:56:ab:cd:ef"), Some("core-switch"), None);
        assert_eq!(classify(&c), DeviceType::Server);
    }

    #[test]
    fn hostname_keywords_in_priority_order() {
        let cases = [
            ("edge-gw", DeviceType::Router),
            ("floor2-switch", DeviceType::Switch),
            ("db-srv-01", DeviceType::Server),
            ("lobby-wifi", DeviceType::AccessPoint),
            ("hr-printer", DeviceType::Printer),
            ("door-cam", DeviceType::Camera),
        ];
        for (hostname, expected) in cases {
            assert_eq!(
                classify(&candidate(None, Some(hostname), None)),
                expected,
                "{hostname}"
            );
        }
    }

    #[test]
    fn system_description_rules() {
        let cases = [
            ("Cisco IOS Software, Catalyst 2960", DeviceType::Switch),
            ("Cisco IOS Software, C1900", DeviceType::Router),
            ("Juniper Networks EX2300", DeviceType::Switch),
            ("Linux nas 5.15.0", DeviceType::Server),
            ("Ubiquiti wireless controller", DeviceType::AccessPoint),
        ];
        for (text, expected) in cases {
            assert_eq!(
                classify(&candidate(None, None, Some(text))),
                expected,
                "{text}"
            );
        }
    }

    #[test]
    fn nothing_known_is_unknown() {
        let c = candidate(Some("aa:bb:cc:dd:ee:ff"), None, None);
        assert_eq!(classify(&c), DeviceType::Unknown);
    }

    /// Resolves a fixed host list; .3 never answers an echo, .4 errors.
    struct LabProber {
        hosts: Vec<ResolvedHost>,
        describe_supported: bool,
    }

    impl LabProber {
        fn new() -> Self {
            let host = |last: u8, mac: &str| ResolvedHost {
                ip: IpAddr::V4(Ipv4Addr::new(192, 168, 1, last)),
                mac: Some(MacAddress::parse(mac).unwrap()),
                hostname: None,
                response_time_ms: Some(1.5),
            };
            Self {
                hosts: vec![
                    host(4, "00:11:22:33:44:04"),
                    host(2, "00:1a:2f:00:00:02"),
                    host(3, "08:00:27:00:00:03"),
                    host(2, "00:1a:2f:00:00:02"),
                    ResolvedHost {
                        ip: IpAddr::V4(Ipv4Addr::new(10, 9, 9, 9)),
                        mac: None,
                        hostname: None,
                        response_time_ms: None,
                    },
                ],
                describe_supported: false,
            }
        }
    }

    impl Prober for LabProber {
        async fn echo(
            &self,
            ip: IpAddr,
            _count: u32,
            _timeout: Duration,
        ) -> Result<EchoReply, ProbeError> {
            match ip {
                IpAddr::V4(v4) if v4.octets()[3] == 3 => Ok(EchoReply::silent()),
                IpAddr::V4(v4) if v4.octets()[3] == 4 => Err(ProbeError::Transport {
                    target: ip.to_string(),
                    reason: "socket closed".into(),
                }),
                _ => Ok(EchoReply {
                    alive: true,
                    avg_rtt_ms: 0.8,
                    min_rtt_ms: 0.8,
                    max_rtt_ms: 0.8,
                    loss_fraction: 0.0,
                }),
            }
        }

        async fn resolve(
            &self,
            _range: &NetworkRange,
            _timeout: Duration,
            _retries: u32,
        ) -> Result<Vec<ResolvedHost>, ProbeError> {
            Ok(self.hosts.clone())
        }

        async fn describe(&self, ip: IpAddr) -> Result<SystemDescription, ProbeError> {
            if self.describe_supported {
                Ok(SystemDescription {
                    ip,
                    description: "Linux appliance".into(),
                    name: Some("lab-host".into()),
                })
            } else {
                Err(ProbeError::unsupported("management query"))
            }
        }
    }

    fn range() -> NetworkRange {
        "192.168.1.0/24".parse().unwrap()
    }

    #[tokio::test]
    async fn scan_dedupes_verifies_and_classifies() {
        let prober = LabProber::new();
        let config = DiscoveryConfig::default();
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let report = engine.scan(&range(), true).await.unwrap();
        let summary: Vec<_> = report
            .candidates
            .iter()
            .map(|c| (c.ip.to_string(), c.status, c.device_type))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("192.168.1.2".to_owned(), Status::Up, DeviceType::Switch),
                ("192.168.1.3".to_owned(), Status::Down, DeviceType::Pc),
                ("192.168.1.4".to_owned(), Status::Down, DeviceType::Unknown),
            ]
        );
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].ip, Some("192.168.1.4".parse().unwrap()));
    }

    #[tokio::test]
    async fn scan_without_verify_trusts_resolution() {
        let prober = LabProber::new();
        let config = DiscoveryConfig::default();
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let report = engine.scan(&range(), false).await.unwrap();
        assert!(report.candidates.iter().all(|c| c.status == Status::Up));
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn enrichment_fills_description() {
        let mut prober = LabProber::new();
        prober.describe_supported = true;
        let config = DiscoveryConfig {
            enrich: true,
            ..DiscoveryConfig::default()
        };
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let report = engine.scan(&range(), false).await.unwrap();
        let unknown = &report.candidates[2];
        assert_eq!(unknown.hostname.as_deref(), Some("lab-host"));
        assert_eq!(unknown.device_type, DeviceType::Server);
    }

    #[tokio::test]
    async fn unsupported_enrichment_is_silent() {
        let prober = LabProber::new();
        let config = DiscoveryConfig {
            enrich: true,
            ..DiscoveryConfig::default()
        };
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let report = engine.scan(&range(), false).await.unwrap();
        assert!(report.candidates.iter().all(|c| c.description.is_none()));
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn batch_ping_tolerates_failures() {
        let prober = LabProber::new();
        let config = DiscoveryConfig::default();
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let ips: Vec<IpAddr> = ["192.168.1.2", "192.168.1.3", "192.168.1.4"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let results = engine.batch_ping(&ips).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].alive);
        assert!(!results[1].alive && results[1].error.is_none());
        assert!(results[2].error.is_some());
    }

    #[tokio::test]
    async fn scan_single_ignores_silent_hosts() {
        let prober = LabProber::new();
        let config = DiscoveryConfig::default();
        let engine = DiscoveryEngine::new(&prober, &config, 8);

        let alive = engine
            .scan_single("192.168.1.2".parse().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alive.status, Status::Up);
        assert!(alive.mac.is_none());
        assert!(
            engine
                .scan_single("192.168.1.3".parse().unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn persist_creates_and_updates_by_address() {
        let prober = LabProber::new();
        let config = DiscoveryConfig::default();
        let engine = DiscoveryEngine::new(&prober, &config, 8);
        let store = MemoryStore::new();
        let events = EventManager::default();

        let tx = store.begin().await.unwrap();
        let mut existing = Device::new("core-sw", "Core switch", Some("192.168.1.2".parse().unwrap()));
        existing.status = Status::Down;
        tx.save_device(existing).await.unwrap();

        let report = engine.scan(&range(), true).await.unwrap();
        let summary = engine.persist(&tx, &events, report).await.unwrap();

        assert_eq!(summary.total_discovered, 3);
        assert_eq!(summary.updated_devices, 1);
        assert_eq!(summary.new_devices, 2);
        assert_eq!(summary.errors.len(), 1);

        let core = tx.get_device(&"core-sw".into()).await.unwrap().unwrap();
        assert_eq!(core.status, Status::Up);
        assert_eq!(core.name, "Core switch");

        let created = tx
            .get_device(&"dev-192-168-1-3".into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.name, "Device 192.168.1.3");
        assert_eq!(created.device_type, DeviceType::Pc);
        assert!(created.is_monitored);

        let discovered = tx
            .list_events(&EventFilter::ByType(EventType::DeviceDiscovered))
            .await
            .unwrap();
        assert_eq!(discovered.len(), 2);
    }
}
