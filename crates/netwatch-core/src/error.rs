// ── Core error types ──
//
// User-facing errors from netwatch-core. Probe and store failures are
// translated into these variants; only capability-unavailable and
// malformed-input conditions are meant to abort a caller outright.

use thiserror::Error;

use crate::probe::ProbeError;
use crate::store::StoreError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    #[error("Link not found: {identifier}")]
    LinkNotFound { identifier: String },

    #[error("Event not found: {identifier}")]
    EventNotFound { identifier: String },

    #[error("{entity_type} {identifier} is not monitored")]
    NotMonitored {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported: {operation} (requires {required})")]
    Unsupported { operation: String, required: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Cannot {action} event {event_id}: event is {state}")]
    InvalidTransition {
        event_id: String,
        action: String,
        state: String,
    },

    // ── Scheduler errors ─────────────────────────────────────────────
    #[error("Continuous monitoring is already running")]
    AlreadyRunning,

    // ── Wrapped layer errors ─────────────────────────────────────────
    #[error("Probe failed: {0}")]
    Probe(ProbeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether a batch should stop instead of recording this error and moving on.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. } | Self::InvalidInput { .. } | Self::Store(_)
        )
    }
}

// ── Conversion from probe-layer errors ───────────────────────────────

impl From<ProbeError> for CoreError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Unsupported { capability } => CoreError::Unsupported {
                operation: capability,
                required: "a prober with this capability".into(),
            },
            other => CoreError::Probe(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_probe_maps_to_unsupported() {
        let err = CoreError::from(ProbeError::Unsupported {
            capability: "management query".into(),
        });
        assert!(matches!(err, CoreError::Unsupported { ref operation, .. } if operation == "management query"));
        assert!(err.is_fatal());
    }

    #[test]
    fn transport_failure_is_not_fatal() {
        let err = CoreError::from(ProbeError::Transport {
            target: "10.0.0.1".into(),
            reason: "network unreachable".into(),
        });
        assert!(matches!(err, CoreError::Probe(_)));
        assert!(!err.is_fatal());
    }
}
