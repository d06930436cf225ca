pub mod battery_gate;
pub mod device_events;
pub mod fcm;
pub mod messages;
pub mod notification_service;

pub use battery_gate::*;
pub use device_events::*;
pub use fcm::*;
pub use messages::*;
pub use notification_service::*;
