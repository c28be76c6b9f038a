//! Shared fixtures for the cross-crate dispatch tests.

use chrono::{DateTime, Utc};
use dispatch_engine::{Clock, DispatchEngine, LocationGraph, RiskClassifier};
use parking_lot::{Mutex, RwLock};
use shared::config::BaseSelection;
use shared::{DispatchConfig, SensorSnapshot};
use std::sync::Arc;

pub const LOW: SensorSnapshot = SensorSnapshot {
    temperature: 15,
    air_humidity: 95,
    soil_humidity: 90,
};
pub const MEDIUM: SensorSnapshot = SensorSnapshot {
    temperature: 28,
    air_humidity: 60,
    soil_humidity: 50,
};
pub const HIGH: SensorSnapshot = SensorSnapshot {
    temperature: 33,
    air_humidity: 40,
    soil_humidity: 30,
};
pub const CRITICAL: SensorSnapshot = SensorSnapshot {
    temperature: 45,
    air_humidity: 5,
    soil_humidity: 0,
};

/// Engine over the nine-location reference network.
pub fn reference_engine() -> DispatchEngine {
    DispatchEngine::from_config(&DispatchConfig::default()).expect("reference config is valid")
}

/// Engine with bases `A` and `B` reaching `target` at weights 10 and 5.
pub fn two_base_engine() -> DispatchEngine {
    let mut graph = LocationGraph::new();
    for name in ["A", "B", "target"] {
        graph.add_vertex(name);
    }
    graph.add_edge("A", "target", 10).expect("vertices exist");
    graph.add_edge("B", "target", 5).expect("vertices exist");
    DispatchEngine::new(
        Arc::new(RiskClassifier::default()),
        Arc::new(RwLock::new(graph)),
        BaseSelection::Explicit {
            names: vec!["A".to_string(), "B".to_string()],
        },
    )
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
