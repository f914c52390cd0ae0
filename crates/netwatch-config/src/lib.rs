//! Shared configuration for netwatch.
//!
//! TOML profiles merged with `NETWATCH_*` environment variables, and
//! translation to `netwatch_core::MonitorConfig`. The core never reads
//! files; the CLI loads a [`Config`] here and hands the result over.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use netwatch_core::{
    DedupKey, DedupPolicy, DiscoveryConfig, EventPolicy, HealthThresholds, MonitorConfig,
    NetworkRange, ProbeConfig,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub probe: ProbeSection,

    #[serde(default)]
    pub thresholds: ThresholdsSection,

    #[serde(default)]
    pub discovery: DiscoverySection,

    #[serde(default)]
    pub events: EventsSection,

    /// Named topology profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            monitor: MonitorSection::default(),
            probe: ProbeSection::default(),
            thresholds: ThresholdsSection::default(),
            discovery: DiscoverySection::default(),
            events: EventsSection::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorSection {
    /// Seconds between cycle starts in continuous mode.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum probes in flight at once.
    #[serde(default = "default_concurrency")]
    pub max_concurrency: usize,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_concurrency: default_concurrency(),
        }
    }
}

fn default_interval() -> u64 {
    60
}
fn default_concurrency() -> usize {
    64
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProbeSection {
    #[serde(default = "default_echo_count")]
    pub echo_count: u32,

    #[serde(default = "default_echo_timeout")]
    pub echo_timeout_secs: u64,

    #[serde(default = "default_link_echo_count")]
    pub link_echo_count: u32,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            echo_count: default_echo_count(),
            echo_timeout_secs: default_echo_timeout(),
            link_echo_count: default_link_echo_count(),
        }
    }
}

fn default_echo_count() -> u32 {
    3
}
fn default_echo_timeout() -> u64 {
    2
}
fn default_link_echo_count() -> u32 {
    10
}

/// Health-score thresholds. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdsSection {
    pub latency_warning_ms: f64,
    pub latency_critical_ms: f64,
    pub loss_warning_pct: f64,
    pub loss_critical_pct: f64,
    pub jitter_warning_ms: f64,
    pub jitter_critical_ms: f64,
}

impl Default for ThresholdsSection {
    fn default() -> Self {
        let t = HealthThresholds::default();
        Self {
            latency_warning_ms: t.latency_warning_ms,
            latency_critical_ms: t.latency_critical_ms,
            loss_warning_pct: t.loss_warning_pct,
            loss_critical_pct: t.loss_critical_pct,
            jitter_warning_ms: t.jitter_warning_ms,
            jitter_critical_ms: t.jitter_critical_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiscoverySection {
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    /// CIDR range scanned when none is given.
    #[serde(default = "default_range")]
    pub default_range: String,

    /// Query management agents for system descriptions.
    #[serde(default)]
    pub enrich: bool,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            timeout_secs: default_discovery_timeout(),
            retries: default_retries(),
            default_range: default_range(),
            enrich: false,
        }
    }
}

fn default_discovery_timeout() -> u64 {
    3
}
fn default_retries() -> u32 {
    2
}
fn default_range() -> String {
    NetworkRange::DEFAULT.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct EventsSection {
    #[serde(default = "default_true")]
    pub device_recovery_events: bool,

    #[serde(default)]
    pub link_recovery_events: bool,

    #[serde(default)]
    pub auto_resolve_on_recovery: bool,

    /// Collapse recurrences into the active event for the same entity and type.
    #[serde(default = "default_true")]
    pub dedup: bool,

    /// Only collapse recurrences within this many seconds.
    pub dedup_window_secs: Option<u64>,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            device_recovery_events: true,
            link_recovery_events: false,
            auto_resolve_on_recovery: false,
            dedup: true,
            dedup_window_secs: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A named topology profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Topology file (devices, links, events) for this profile.
    pub topology: Option<PathBuf>,

    /// Override the discovery range.
    pub network_range: Option<String>,

    /// Override the cycle interval.
    pub interval_secs: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("rs", "netwatch", "netwatch")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netwatch");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Topology file used when a profile does not name one.
pub fn default_topology_path(profile_name: &str) -> PathBuf {
    let file = format!("{profile_name}.topology.json");
    project_dirs().map_or_else(
        || dirs_fallback().join(&file),
        |dirs| dirs.data_dir().join(&file),
    )
}

// ── Loading and saving ──────────────────────────────────────────────

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then
/// `NETWATCH_*` variables (`NETWATCH_MONITOR__INTERVAL_SECS=30`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Resolve a profile by explicit name, else the default profile.
    ///
    /// An explicitly named profile must exist; a missing default profile
    /// yields an empty one.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .cloned()
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }
        let name = self
            .default_profile
            .clone()
            .unwrap_or_else(|| "default".into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        Ok((name, profile))
    }

    /// Topology file for a resolved profile.
    pub fn topology_path(profile_name: &str, profile: &Profile) -> PathBuf {
        profile
            .topology
            .clone()
            .unwrap_or_else(|| default_topology_path(profile_name))
    }

    /// Build a validated `MonitorConfig`, applying profile overrides.
    pub fn to_monitor_config(&self, profile: &Profile) -> Result<MonitorConfig, ConfigError> {
        let interval_secs = profile.interval_secs.unwrap_or(self.monitor.interval_secs);
        if interval_secs < 10 {
            return Err(invalid(
                "interval_secs",
                format!("must be at least 10 seconds, got {interval_secs}"),
            ));
        }
        if self.monitor.max_concurrency == 0 {
            return Err(invalid("max_concurrency", "must be at least 1"));
        }

        let probe = &self.probe;
        check_range("echo_count", u64::from(probe.echo_count), 1, 10)?;
        check_range("link_echo_count", u64::from(probe.link_echo_count), 1, 100)?;
        check_range("echo_timeout_secs", probe.echo_timeout_secs, 1, 30)?;
        check_range("discovery.timeout_secs", self.discovery.timeout_secs, 1, 30)?;

        let thresholds = self.thresholds.validated()?;

        let range_text = profile
            .network_range
            .as_deref()
            .unwrap_or(&self.discovery.default_range);
        let default_range: NetworkRange = range_text
            .parse()
            .map_err(|e: netwatch_core::CoreError| invalid("network_range", e.to_string()))?;

        Ok(MonitorConfig {
            interval: Duration::from_secs(interval_secs),
            max_concurrency: self.monitor.max_concurrency,
            probe: ProbeConfig {
                echo_count: probe.echo_count,
                echo_timeout: Duration::from_secs(probe.echo_timeout_secs),
                link_echo_count: probe.link_echo_count,
            },
            thresholds,
            discovery: DiscoveryConfig {
                timeout: Duration::from_secs(self.discovery.timeout_secs),
                retries: self.discovery.retries,
                default_range,
                enrich: self.discovery.enrich,
            },
            events: EventPolicy {
                device_recovery_events: self.events.device_recovery_events,
                link_recovery_events: self.events.link_recovery_events,
                auto_resolve_on_recovery: self.events.auto_resolve_on_recovery,
                dedup: DedupPolicy {
                    key: if self.events.dedup {
                        DedupKey::EntityAndType
                    } else {
                        DedupKey::Disabled
                    },
                    window: self.events.dedup_window_secs.map(Duration::from_secs),
                },
            },
        })
    }
}

impl ThresholdsSection {
    fn validated(&self) -> Result<HealthThresholds, ConfigError> {
        let pairs = [
            ("latency", self.latency_warning_ms, self.latency_critical_ms),
            ("loss", self.loss_warning_pct, self.loss_critical_pct),
            ("jitter", self.jitter_warning_ms, self.jitter_critical_ms),
        ];
        for (metric, warning, critical) in pairs {
            if !(warning >= 0.0 && warning < critical) {
                return Err(invalid(
                    &format!("thresholds.{metric}"),
                    format!("warning ({warning}) must be non-negative and below critical ({critical})"),
                ));
            }
        }
        Ok(HealthThresholds {
            latency_warning_ms: self.latency_warning_ms,
            latency_critical_ms: self.latency_critical_ms,
            loss_warning_pct: self.loss_warning_pct,
            loss_critical_pct: self.loss_critical_pct,
            jitter_warning_ms: self.jitter_warning_ms,
            jitter_critical_ms: self.jitter_critical_ms,
        })
    }
}

fn check_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("must be between {min} and {max}, got {value}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_translate_to_core_defaults() {
        let cfg = Config::default();
        let monitor = cfg.to_monitor_config(&Profile::default()).unwrap();
        assert_eq!(monitor, MonitorConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "lab"

                [thresholds]
                latency_warning_ms = 20.0

                [probe]
                echo_count = 5

                [profiles.lab]
                topology = "lab.json"
                network_range = "10.20.0.0/16"
                "#,
            )?;
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.thresholds.latency_warning_ms, 20.0);
            assert_eq!(cfg.thresholds.latency_critical_ms, 100.0);
            assert_eq!(cfg.probe.echo_count, 5);
            assert_eq!(cfg.probe.link_echo_count, 10);

            let (name, profile) = cfg.profile(None).unwrap();
            assert_eq!(name, "lab");
            let monitor = cfg.to_monitor_config(&profile).unwrap();
            assert_eq!(monitor.discovery.default_range.to_string(), "10.20.0.0/16");
            assert_eq!(
                Config::topology_path(&name, &profile),
                PathBuf::from("lab.json")
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[monitor]\ninterval_secs = 120\n")?;
            jail.set_env("NETWATCH_MONITOR__INTERVAL_SECS", "30");
            jail.set_env("NETWATCH_EVENTS__LINK_RECOVERY_EVENTS", "true");
            let cfg = load_config_from(Path::new("config.toml")).unwrap();
            assert_eq!(cfg.monitor.interval_secs, 30);
            assert!(cfg.events.link_recovery_events);
            Ok(())
        });
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = Config::default();
        cfg.monitor.interval_secs = 5;
        let err = cfg.to_monitor_config(&Profile::default()).unwrap_err();
        assert!(err.to_string().contains("interval_secs"));

        let mut cfg = Config::default();
        cfg.probe.echo_count = 0;
        assert!(cfg.to_monitor_config(&Profile::default()).is_err());

        let mut cfg = Config::default();
        cfg.probe.echo_timeout_secs = 31;
        assert!(cfg.to_monitor_config(&Profile::default()).is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut cfg = Config::default();
        cfg.thresholds.loss_warning_pct = 10.0;
        let err = cfg.to_monitor_config(&Profile::default()).unwrap_err();
        assert!(err.to_string().contains("thresholds.loss"));
    }

    #[test]
    fn rejects_malformed_range() {
        let profile = Profile {
            network_range: Some("10.0.0/8".into()),
            ..Profile::default()
        };
        let err = Config::default().to_monitor_config(&profile).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn profile_override_wins_and_unknown_profile_errors() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "fast".into(),
            Profile {
                interval_secs: Some(15),
                ..Profile::default()
            },
        );
        let (_, fast) = cfg.profile(Some("fast")).unwrap();
        assert_eq!(
            cfg.to_monitor_config(&fast).unwrap().interval,
            Duration::from_secs(15)
        );
        assert!(matches!(
            cfg.profile(Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.events.dedup_window_secs = Some(600);
        save_config_to(&cfg, &path).unwrap();

        let loaded: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, cfg);
    }
}
