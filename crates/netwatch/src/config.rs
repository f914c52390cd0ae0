//! CLI configuration: thin wrapper around `netwatch_config` shared types.
//!
//! Adds CLI-specific resolution that respects `GlobalOpts` overrides
//! (--config, --profile, --topology) and builds the monitoring session.

use std::path::PathBuf;

use netwatch_core::{MemoryStore, Monitor, MonitorConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::probe::SystemProber;
use crate::topology;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netwatch_config::{Config, Profile, config_path, load_config_from, save_config_to};

/// The monitor every topology-bound command runs against.
pub type NetMonitor = Monitor<SystemProber, MemoryStore>;

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file path: `--config` flag, else the platform default.
pub fn resolved_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load config from the resolved path merged with `NETWATCH_*` variables.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&resolved_config_path(global))?)
}

/// Resolve the active profile, listing the known names when it is missing.
pub fn active_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    cfg.profile(global.profile.as_deref()).map_err(|e| match e {
        netwatch_config::ConfigError::UnknownProfile { name } => {
            let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            names.sort_unstable();
            CliError::ProfileNotFound {
                name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            }
        }
        other => other.into(),
    })
}

// ── Session ─────────────────────────────────────────────────────────

/// A loaded topology plus the monitor running over it.
pub struct Session {
    pub monitor: NetMonitor,
    pub topology_path: PathBuf,
}

impl Session {
    /// Build a session from config, profile and flag overrides.
    ///
    /// `allow_missing` starts from an empty topology when the file does not
    /// exist yet (discovery into a fresh file).
    pub fn open(global: &GlobalOpts, allow_missing: bool) -> Result<Self, CliError> {
        let cfg = load(global)?;
        let (profile_name, profile) = active_profile(global, &cfg)?;
        let monitor_config: MonitorConfig = cfg.to_monitor_config(&profile)?;

        let topology_path = global
            .topology
            .clone()
            .unwrap_or_else(|| Config::topology_path(&profile_name, &profile));
        let store = topology::load(&topology_path, allow_missing)?;

        tracing::debug!(
            profile = %profile_name,
            topology = %topology_path.display(),
            "session opened"
        );

        let prober = SystemProber::new(monitor_config.max_concurrency);
        Ok(Self {
            monitor: Monitor::new(prober, store, monitor_config),
            topology_path,
        })
    }

    /// Persist the store's committed state to the topology file.
    pub fn save(&self) -> Result<(), CliError> {
        topology::save(&self.topology_path, self.monitor.store())
    }
}
