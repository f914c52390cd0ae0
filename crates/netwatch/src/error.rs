//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netwatch_config::ConfigError;
use netwatch_core::{CoreError, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const PROBE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Topology ─────────────────────────────────────────────────────
    #[error("Topology file not found: {path}")]
    #[diagnostic(
        code(netwatch::no_topology),
        help(
            "Discover hosts into a new topology with: netwatch scan --save\n\
             Or point at an existing file with --topology or the profile's `topology` key."
        )
    )]
    NoTopology { path: String },

    #[error("Topology file {path} is not valid")]
    #[diagnostic(code(netwatch::bad_topology))]
    BadTopology {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netwatch::not_found),
        help("Run: netwatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{entity_type} '{identifier}' is not monitored")]
    #[diagnostic(
        code(netwatch::not_monitored),
        help("Set `is_monitored` to true in the topology file to include it in checks.")
    )]
    NotMonitored {
        entity_type: String,
        identifier: String,
    },

    // ── Events ───────────────────────────────────────────────────────
    #[error("Cannot {action} event {event_id}: it is already {state}")]
    #[diagnostic(code(netwatch::invalid_transition))]
    InvalidTransition {
        event_id: String,
        action: String,
        state: String,
    },

    // ── Monitoring ───────────────────────────────────────────────────
    #[error("Continuous monitoring is already running")]
    #[diagnostic(code(netwatch::already_running))]
    AlreadyRunning,

    #[error("Monitoring cycle failed: {message}")]
    #[diagnostic(
        code(netwatch::cycle_failed),
        help("No status changes were saved. Re-run with -v for details.")
    )]
    CycleFailed { message: String },

    #[error("Probe failed: {message}")]
    #[diagnostic(
        code(netwatch::probe_failed),
        help("Check that `ping` is installed and the target is routable.")
    )]
    ProbeFailed { message: String },

    // ── Unsupported ──────────────────────────────────────────────────
    #[error("Operation '{operation}' is not supported")]
    #[diagnostic(
        code(netwatch::unsupported),
        help("This command requires {required}.")
    )]
    Unsupported { operation: String, required: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: netwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(netwatch::config),
        help("Inspect the resolved configuration with: netwatch config show")
    )]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Store ────────────────────────────────────────────────────────
    #[error("Store error: {0}")]
    #[diagnostic(code(netwatch::store))]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(netwatch::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(netwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(netwatch::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoTopology { .. } | Self::NotFound { .. } | Self::ProfileNotFound { .. } => {
                exit_code::NOT_FOUND
            }
            Self::NotMonitored { .. } | Self::InvalidTransition { .. } | Self::AlreadyRunning => {
                exit_code::CONFLICT
            }
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::ProbeFailed { .. } => exit_code::PROBE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { identifier } => CliError::NotFound {
                resource_type: "device".into(),
                identifier,
                list_command: "devices list".into(),
            },

            CoreError::LinkNotFound { identifier } => CliError::NotFound {
                resource_type: "link".into(),
                identifier,
                list_command: "links list".into(),
            },

            CoreError::EventNotFound { identifier } => CliError::NotFound {
                resource_type: "event".into(),
                identifier,
                list_command: "events list".into(),
            },

            CoreError::NotMonitored {
                entity_type,
                identifier,
            } => CliError::NotMonitored {
                entity_type,
                identifier,
            },

            CoreError::Unsupported {
                operation,
                required,
            } => CliError::Unsupported {
                operation,
                required,
            },

            CoreError::InvalidInput { field, reason } => CliError::Validation { field, reason },

            CoreError::InvalidTransition {
                event_id,
                action,
                state,
            } => CliError::InvalidTransition {
                event_id,
                action,
                state: state.to_lowercase(),
            },

            CoreError::AlreadyRunning => CliError::AlreadyRunning,

            CoreError::Probe(e) => CliError::ProbeFailed {
                message: e.to_string(),
            },

            CoreError::Store(e) => CliError::Store(e),

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use netwatch_core::ProbeError;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let not_found: CliError = CoreError::DeviceNotFound {
            identifier: "dev-1".into(),
        }
        .into();
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let unmonitored: CliError = CoreError::NotMonitored {
            entity_type: "Device".into(),
            identifier: "dev-1".into(),
        }
        .into();
        assert_eq!(unmonitored.exit_code(), exit_code::CONFLICT);

        let unsupported: CliError =
            CoreError::from(ProbeError::unsupported("management query")).into();
        assert_eq!(unsupported.exit_code(), exit_code::UNSUPPORTED);

        let malformed: CliError = CoreError::InvalidInput {
            field: "network_range".into(),
            reason: "bad prefix".into(),
        }
        .into();
        assert_eq!(malformed.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn unknown_profile_maps_to_profile_not_found() {
        let err: CliError = ConfigError::UnknownProfile {
            name: "lab".into(),
        }
        .into();
        assert!(matches!(err, CliError::ProfileNotFound { ref name, .. } if name == "lab"));
    }
}
