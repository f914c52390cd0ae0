// ── Event domain types ──
//
// Events are alerts raised on status transitions. Their lifecycle
// (open -> acknowledged -> resolved) only moves forward; the
// `EventManager` is the sole writer of lifecycle fields.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[non_exhaustive]
pub enum EventType {
    // Device
    DeviceUp,
    DeviceDown,
    DeviceUnreachable,
    DeviceDiscovered,
    DeviceRemoved,
    // Link
    LinkUp,
    LinkDown,
    LinkDegraded,
    // Performance
    HighLatency,
    HighPacketLoss,
    HighJitter,
    // Cable health
    CableHealthDegraded,
    CableHealthCritical,
    CableHealthExcellent,
    // Monitoring lifecycle
    MonitoringStarted,
    MonitoringStopped,
}

/// Alert severity, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EventSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle state, derived from the acknowledged/resolved flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventState {
    Open,
    Acknowledged,
    Resolved,
}

/// The entity an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSubject {
    Device(EntityId),
    Link(EntityId),
    System,
}

/// A persisted alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Event {
    pub id: EntityId,
    pub event_type: EventType,
    pub severity: EventSeverity,

    // Related entities
    #[serde(default)]
    pub device_id: Option<EntityId>,
    #[serde(default)]
    pub link_id: Option<EntityId>,

    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
    #[serde(default)]
    pub source: Option<String>,

    // Acknowledgement
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub acknowledged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,

    // Resolution
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub auto_resolved: bool,

    // Recurrence
    pub occurrence_count: u32,
    pub first_occurred_at: DateTime<Utc>,
    pub last_occurred_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// A fresh, open event with a single occurrence at `now`.
    pub fn new(
        event_type: EventType,
        severity: EventSeverity,
        subject: EventSubject,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let (device_id, link_id) = match subject {
            EventSubject::Device(id) => (Some(id), None),
            EventSubject::Link(id) => (None, Some(id)),
            EventSubject::System => (None, None),
        };
        Self {
            id: EntityId::generate(),
            event_type,
            severity,
            device_id,
            link_id,
            message: message.into(),
            details: serde_json::Value::Null,
            source: None,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            notes: None,
            resolved: false,
            resolved_by: None,
            resolved_at: None,
            resolution_notes: None,
            auto_resolved: false,
            occurrence_count: 1,
            first_occurred_at: now,
            last_occurred_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn subject(&self) -> EventSubject {
        match (&self.device_id, &self.link_id) {
            (_, Some(link)) => EventSubject::Link(link.clone()),
            (Some(device), None) => EventSubject::Device(device.clone()),
            (None, None) => EventSubject::System,
        }
    }

    pub fn state(&self) -> EventState {
        if self.resolved {
            EventState::Resolved
        } else if self.acknowledged {
            EventState::Acknowledged
        } else {
            EventState::Open
        }
    }

    // ── Lifecycle transitions ────────────────────────────────────────

    /// Acknowledge the event. Re-acknowledging refreshes the actor,
    /// timestamp and (when given) the notes.
    ///
    /// Returns `true` if the event was previously unacknowledged.
    pub fn acknowledge(
        &mut self,
        by: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        self.ensure_not_resolved("acknowledge")?;
        let newly = !self.acknowledged;
        self.apply_acknowledgement(by, notes, now);
        Ok(newly)
    }

    /// Resolve the event, acknowledging it first if nobody has.
    pub fn resolve(
        &mut self,
        by: &str,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.ensure_not_resolved("resolve")?;
        if !self.acknowledged {
            self.apply_acknowledgement(by, Some("Auto-acknowledged on resolution"), now);
        }
        self.resolved = true;
        self.resolved_by = Some(by.to_owned());
        self.resolved_at = Some(now);
        if let Some(notes) = notes {
            self.resolution_notes = Some(notes.to_owned());
        }
        self.updated_at = now;
        Ok(())
    }

    /// Record another occurrence of the same condition.
    pub fn increment_occurrence(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.ensure_not_resolved("record a recurrence of")?;
        self.occurrence_count = self.occurrence_count.saturating_add(1);
        self.last_occurred_at = self.last_occurred_at.max(now);
        self.updated_at = now;
        Ok(())
    }

    fn apply_acknowledgement(&mut self, by: &str, notes: Option<&str>, now: DateTime<Utc>) {
        self.acknowledged = true;
        self.acknowledged_by = Some(by.to_owned());
        self.acknowledged_at = Some(now);
        if let Some(notes) = notes {
            self.notes = Some(notes.to_owned());
        }
        self.updated_at = now;
    }

    fn ensure_not_resolved(&self, action: &str) -> Result<(), CoreError> {
        if self.resolved {
            return Err(CoreError::InvalidTransition {
                event_id: self.id.to_string(),
                action: action.into(),
                state: EventState::Resolved.to_string(),
            });
        }
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_critical(&self) -> bool {
        self.severity == EventSeverity::Critical
    }

    pub fn is_high_priority(&self) -> bool {
        self.severity >= EventSeverity::High
    }

    /// Unacknowledged and high priority.
    pub fn requires_attention(&self) -> bool {
        !self.acknowledged && self.is_high_priority()
    }

    pub fn is_device_event(&self) -> bool {
        self.device_id.is_some()
    }

    pub fn is_link_event(&self) -> bool {
        self.link_id.is_some()
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}
