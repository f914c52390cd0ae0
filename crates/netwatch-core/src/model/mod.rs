// ── Domain model ──

pub mod device;
pub mod entity_id;
pub mod event;
pub mod link;
pub mod range;
pub mod sample;

pub use device::{Device, DeviceType, Status};
pub use entity_id::{EntityId, MacAddress};
pub use event::{Event, EventSeverity, EventState, EventSubject, EventType};
pub use link::{Link, Medium, MediumType};
pub use range::NetworkRange;
pub use sample::{HealthSample, HealthStatus};
