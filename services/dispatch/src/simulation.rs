//! Random detection rounds for exercising the engine without sensors.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::config::{ReadingRange, SimulationConfig};
use shared::{Incident, SensorSnapshot};
use tracing::{info, warn};

use crate::engine::{DispatchEngine, DispatchError};

pub struct DetectionSimulator {
    config: SimulationConfig,
}

impl DetectionSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn sample_sensors<R: Rng + ?Sized>(&self, rng: &mut R) -> SensorSnapshot {
        SensorSnapshot::new(
            sample(rng, self.config.temperature),
            sample(rng, self.config.air_humidity),
            sample(rng, self.config.soil_humidity),
        )
    }

    /// Reports `count` detections at random graph locations.
    pub fn simulate_detections<R: Rng + ?Sized>(
        &self,
        engine: &DispatchEngine,
        rng: &mut R,
        count: usize,
    ) -> Result<Vec<Incident>, DispatchError> {
        let locations = engine.locations();
        if locations.is_empty() {
            warn!("Location graph is empty; no detections simulated");
            return Ok(Vec::new());
        }

        let mut detected = Vec::with_capacity(count);
        for _ in 0..count {
            let sensors = self.sample_sensors(rng);
            let location = match locations.choose(rng) {
                Some(location) => location,
                None => break,
            };
            detected.push(engine.report_detection(location, sensors)?);
        }
        info!(count = detected.len(), "Simulated detection round complete");
        Ok(detected)
    }

    /// Simulates a round with a random detection count within the configured
    /// bounds.
    pub fn simulate_round<R: Rng + ?Sized>(
        &self,
        engine: &DispatchEngine,
        rng: &mut R,
    ) -> Result<Vec<Incident>, DispatchError> {
        let (low, high) = ordered(self.config.min_detections, self.config.max_detections);
        let count = rng.gen_range(low..=high);
        self.simulate_detections(engine, rng, count)
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, range: ReadingRange) -> i32 {
    let (low, high) = ordered(range.min, range.max);
    rng.gen_range(low..=high)
}

// gen_range panics on an empty range
fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
