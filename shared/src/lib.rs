pub mod config;
pub mod logger;
pub mod types;


pub use config::{BaseSelection, DispatchConfig, EdgeConfig, TopologyConfig};
pub use types::{Incident, IncidentId, IncidentStatus, SensorSnapshot, SeverityLevel};
