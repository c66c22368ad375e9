//! The domoticz module contains everything on the backend side of the bridge:
//! sensor request templates, the debounced per-sensor transmission scheduler,
//! and the HTTP client that delivers requests to Domoticz.

pub mod http;
pub mod log_message;
pub mod scheduler;
pub mod sensor;
pub mod sink;

pub use http::{DeviceStatus, DomoticzClient};
pub use log_message::DomoticzLog;
pub use scheduler::{JobConfig, JobPhase, JobStats, SensorJob};
pub use sensor::{SensorKind, SensorValues};
pub use sink::PushSink;
