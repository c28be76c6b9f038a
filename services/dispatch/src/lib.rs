//! Incident dispatch engine
//!
//! Classifies fire detections by sensor risk, queues them by severity and
//! routes the nearest team base to each one over the location graph.

pub mod classifier;
pub mod engine;
pub mod graph;
pub mod priority_queue;
pub mod simulation;
pub mod store;


pub use classifier::{risk_score, CacheOutcome, RiskClassifier};
pub use engine::{DispatchEngine, DispatchError, DispatchResult};
pub use graph::{GraphError, LocationGraph, Route};
pub use priority_queue::DispatchQueue;
pub use simulation::DetectionSimulator;
pub use store::{Clock, IncidentStore, StoreError, SystemClock};
