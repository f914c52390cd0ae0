// ── Event lifecycle manager ──
//
// Sole writer of event lifecycle state. Checkers hand new events to
// `raise`, which folds recurrences into the existing active event;
// operators acknowledge and resolve through the `Monitor`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DedupKey, EventPolicy};
use crate::error::CoreError;
use crate::model::{EntityId, Event, EventSubject, EventType};
use crate::store::StoreTransaction;

/// What [`EventManager::raise`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Raised {
    Created(Event),
    /// An active event for the same subject and type absorbed it.
    Recurred(Event),
}

impl Raised {
    pub fn event(&self) -> &Event {
        match self {
            Self::Created(e) | Self::Recurred(e) => e,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Result of a bulk acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAcknowledgement {
    /// Events that went from unacknowledged to acknowledged.
    pub acknowledged_count: usize,
    /// Events requested.
    pub total_events: usize,
    /// Requested ids with no matching event.
    pub not_found: Vec<EntityId>,
}

#[derive(Debug, Clone, Default)]
pub struct EventManager {
    policy: EventPolicy,
}

impl EventManager {
    pub fn new(policy: EventPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EventPolicy {
        &self.policy
    }

    /// Persist `event`, or record a recurrence on the matching active event.
    pub async fn raise<T: StoreTransaction>(
        &self,
        tx: &T,
        event: Event,
    ) -> Result<Raised, CoreError> {
        if let Some(mut existing) = self.find_recurrence_target(tx, &event).await? {
            existing.increment_occurrence(event.last_occurred_at)?;
            existing.details = event.details;
            debug!(
                event_id = %existing.id,
                event_type = %existing.event_type,
                occurrences = existing.occurrence_count,
                "event recurred"
            );
            tx.save_event(existing.clone()).await?;
            return Ok(Raised::Recurred(existing));
        }

        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            severity = %event.severity,
            "{}",
            event.message
        );
        tx.save_event(event.clone()).await?;
        Ok(Raised::Created(event))
    }

    async fn find_recurrence_target<T: StoreTransaction>(
        &self,
        tx: &T,
        event: &Event,
    ) -> Result<Option<Event>, CoreError> {
        let dedup = self.policy.dedup;
        if dedup.key == DedupKey::Disabled {
            return Ok(None);
        }
        let subject = event.subject();
        if subject == EventSubject::System {
            return Ok(None);
        }

        let Some(existing) = tx.find_active_event(&subject, event.event_type).await? else {
            return Ok(None);
        };

        let within_window = dedup.window.is_none_or(|window| {
            chrono::Duration::from_std(window).is_ok_and(|window| {
                event.last_occurred_at - existing.last_occurred_at <= window
            })
        });
        Ok(within_window.then_some(existing))
    }

    /// Auto-resolve the subject's active events of the given types.
    /// Returns how many were resolved.
    pub async fn resolve_active<T: StoreTransaction>(
        &self,
        tx: &T,
        subject: &EventSubject,
        types: &[EventType],
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        let mut resolved = 0;
        for event_type in types {
            while let Some(mut event) = tx.find_active_event(subject, *event_type).await? {
                event.resolve("system", Some("Condition cleared"), now)?;
                event.auto_resolved = true;
                tx.save_event(event).await?;
                resolved += 1;
            }
        }
        Ok(resolved)
    }

    pub async fn acknowledge<T: StoreTransaction>(
        &self,
        tx: &T,
        id: &EntityId,
        by: &str,
        notes: Option<&str>,
    ) -> Result<Event, CoreError> {
        let mut event = load(tx, id).await?;
        event.acknowledge(by, notes, Utc::now())?;
        tx.save_event(event.clone()).await?;
        Ok(event)
    }

    pub async fn resolve<T: StoreTransaction>(
        &self,
        tx: &T,
        id: &EntityId,
        by: &str,
        notes: Option<&str>,
    ) -> Result<Event, CoreError> {
        let mut event = load(tx, id).await?;
        event.resolve(by, notes, Utc::now())?;
        tx.save_event(event.clone()).await?;
        Ok(event)
    }

    /// Acknowledge every listed event that is not yet acknowledged.
    /// Already-acknowledged events are left untouched.
    pub async fn bulk_acknowledge<T: StoreTransaction>(
        &self,
        tx: &T,
        ids: &[EntityId],
        by: &str,
        notes: Option<&str>,
    ) -> Result<BulkAcknowledgement, CoreError> {
        let now = Utc::now();
        let mut result = BulkAcknowledgement {
            total_events: ids.len(),
            ..BulkAcknowledgement::default()
        };

        for id in ids {
            let Some(mut event) = tx.get_event(id).await? else {
                result.not_found.push(id.clone());
                continue;
            };
            if event.acknowledged {
                continue;
            }
            event.acknowledge(by, notes, now)?;
            tx.save_event(event).await?;
            result.acknowledged_count += 1;
        }
        Ok(result)
    }
}

async fn load<T: StoreTransaction>(tx: &T, id: &EntityId) -> Result<Event, CoreError> {
    tx.get_event(id)
        .await?
        .ok_or_else(|| CoreError::EventNotFound {
            identifier: id.to_string(),
        })
}
