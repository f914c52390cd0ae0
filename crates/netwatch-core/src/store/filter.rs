// ── Filter predicates for store queries ──

use chrono::{DateTime, Utc};

use crate::model::{
    Device, DeviceType, EntityId, Event, EventSeverity, EventSubject, EventType, Link, Status,
};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    All,
    Monitored,
    ByType(DeviceType),
    ByStatus(Status),
    Custom(Box<dyn Fn(&Device) -> bool + Send + Sync>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::Monitored => device.is_monitored,
            Self::ByType(dt) => device.device_type == *dt,
            Self::ByStatus(s) => device.status == *s,
            Self::Custom(f) => f(device),
        }
    }
}

/// Filter predicate for link collections.
pub enum LinkFilter {
    All,
    Monitored,
    ByStatus(Status),
    /// Links touching this device on either end.
    ByDevice(EntityId),
    Custom(Box<dyn Fn(&Link) -> bool + Send + Sync>),
}

impl LinkFilter {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Self::All => true,
            Self::Monitored => link.is_monitored,
            Self::ByStatus(s) => link.status == *s,
            Self::ByDevice(id) => link.source_device_id == *id || link.target_device_id == *id,
            Self::Custom(f) => f(link),
        }
    }
}

/// Filter predicate for event queries.
pub enum EventFilter {
    All,
    /// Not yet resolved.
    Active,
    Unacknowledged,
    RequiresAttention,
    MinSeverity(EventSeverity),
    ByType(EventType),
    Subject(EventSubject),
    /// Created at or after the given instant.
    Since(DateTime<Utc>),
    /// Every inner filter must match.
    And(Vec<EventFilter>),
    Custom(Box<dyn Fn(&Event) -> bool + Send + Sync>),
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Active => event.is_active(),
            Self::Unacknowledged => !event.acknowledged,
            Self::RequiresAttention => event.requires_attention(),
            Self::MinSeverity(min) => event.severity >= *min,
            Self::ByType(t) => event.event_type == *t,
            Self::Subject(subject) => event.subject() == *subject,
            Self::Since(at) => event.created_at >= *at,
            Self::And(filters) => filters.iter().all(|f| f.matches(event)),
            Self::Custom(f) => f(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(severity: EventSeverity) -> Event {
        Event::new(
            EventType::LinkDown,
            severity,
            EventSubject::Link("uplink".into()),
            "down",
            Utc::now(),
        )
    }

    #[test]
    fn min_severity_includes_equal() {
        let f = EventFilter::MinSeverity(EventSeverity::High);
        assert!(f.matches(&event(EventSeverity::High)));
        assert!(f.matches(&event(EventSeverity::Critical)));
        assert!(!f.matches(&event(EventSeverity::Medium)));
    }

    #[test]
    fn and_requires_all() {
        let f = EventFilter::And(vec![
            EventFilter::Active,
            EventFilter::Subject(EventSubject::Link("uplink".into())),
        ]);
        assert!(f.matches(&event(EventSeverity::Low)));

        let other = EventFilter::Subject(EventSubject::Device("uplink".into()));
        assert!(!other.matches(&event(EventSeverity::Low)));
    }

    #[test]
    fn device_filters_match_their_field() {
        let mut device = Device::new("core", "Core", None);
        device.device_type = DeviceType::Router;
        device.status = Status::Down;

        assert!(DeviceFilter::Monitored.matches(&device));
        assert!(DeviceFilter::ByType(DeviceType::Router).matches(&device));
        assert!(!DeviceFilter::ByType(DeviceType::Switch).matches(&device));
        assert!(DeviceFilter::ByStatus(Status::Down).matches(&device));

        device.is_monitored = false;
        assert!(!DeviceFilter::Monitored.matches(&device));
    }

    #[test]
    fn link_filter_by_device_checks_both_ends() {
        let link = Link::new("l1", "core", "edge");
        assert!(LinkFilter::ByDevice("core".into()).matches(&link));
        assert!(LinkFilter::ByDevice("edge".into()).matches(&link));
        assert!(!LinkFilter::ByDevice("other".into()).matches(&link));
    }
}
