//! Runtime configuration for the dispatch engine.
//!
//! Loaded through the `config` crate from an optional file plus
//! `DISPATCH__`-prefixed environment variables. Every section has defaults,
//! so an empty source yields the reference network.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_CACHE_CAPACITY: usize = 128;
pub const DEFAULT_BASE_PREFIX: &str = "Base_";
/// Largest accepted edge weight. Route totals are summed in `u64`, so no
/// realistic path length can overflow.
pub const MAX_EDGE_WEIGHT: u64 = u32::MAX as u64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub classifier: ClassifierConfig,
    pub topology: TopologyConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of distinct sensor tuples kept in the classification cache
    pub cache_capacity: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// A directed, weighted route between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,
    pub weight: u64,
}

impl EdgeConfig {
    pub fn new(from: &str, to: &str, weight: u64) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            weight,
        }
    }
}

/// How team bases are picked out of the location graph.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaseSelection {
    /// Every vertex whose name starts with `prefix`, in vertex insertion order
    Prefix { prefix: String },
    /// Exactly these vertices, evaluated in list order
    Explicit { names: Vec<String> },
}

impl Default for BaseSelection {
    fn default() -> Self {
        BaseSelection::Prefix {
            prefix: DEFAULT_BASE_PREFIX.to_string(),
        }
    }
}

/// Location network supplied once at startup. A file that declares a
/// `[topology]` section replaces the reference network entirely.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub vertices: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
    #[serde(default)]
    pub bases: BaseSelection,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::reference_network()
    }
}

impl TopologyConfig {
    /// The nine-location network used by the field simulator.
    pub fn reference_network() -> Self {
        let vertices = [
            "Base_Alpha",
            "Base_Beta",
            "Red_Forest",
            "Blue_Grove",
            "Green_Mountain",
            "Serene_River",
            "Clear_Village",
            "High_Peak",
            "Main_Road",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect();

        let edges = vec![
            EdgeConfig::new("Base_Alpha", "Red_Forest", 10),
            EdgeConfig::new("Base_Alpha", "Green_Mountain", 25),
            EdgeConfig::new("Base_Beta", "Blue_Grove", 15),
            EdgeConfig::new("Base_Beta", "Clear_Village", 8),
            EdgeConfig::new("Red_Forest", "Blue_Grove", 12),
            EdgeConfig::new("Red_Forest", "Serene_River", 7),
            EdgeConfig::new("Blue_Grove", "Base_Alpha", 18),
            EdgeConfig::new("Blue_Grove", "Green_Mountain", 20),
            EdgeConfig::new("Green_Mountain", "Serene_River", 5),
            EdgeConfig::new("Serene_River", "Clear_Village", 10),
            EdgeConfig::new("Clear_Village", "Red_Forest", 30),
            EdgeConfig::new("Clear_Village", "Base_Beta", 8),
            EdgeConfig::new("Main_Road", "Base_Alpha", 5),
            // uphill and downhill legs differ
            EdgeConfig::new("Green_Mountain", "High_Peak", 15),
            EdgeConfig::new("High_Peak", "Green_Mountain", 12),
        ];

        Self {
            vertices,
            edges,
            bases: BaseSelection::default(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for vertex in &self.vertices {
            if !seen.insert(vertex.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate vertex {vertex:?} in topology"
                )));
            }
        }

        for edge in &self.edges {
            if edge.weight > MAX_EDGE_WEIGHT {
                return Err(ConfigError::Invalid(format!(
                    "edge {} -> {} weight {} exceeds {MAX_EDGE_WEIGHT}",
                    edge.from, edge.to, edge.weight
                )));
            }
            for endpoint in [&edge.from, &edge.to] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "edge {} -> {} references undeclared vertex {endpoint:?}",
                        edge.from, edge.to
                    )));
                }
            }
        }

        if let BaseSelection::Explicit { names } = &self.bases {
            if let Some(missing) = names.iter().find(|name| !seen.contains(name.as_str())) {
                return Err(ConfigError::Invalid(format!(
                    "base {missing:?} is not a declared vertex"
                )));
            }
        }

        Ok(())
    }
}

/// Inclusive bounds for one simulated sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReadingRange {
    pub min: i32,
    pub max: i32,
}

impl ReadingRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed RNG seed; entropy-seeded when absent
    pub seed: Option<u64>,
    pub min_detections: usize,
    pub max_detections: usize,
    pub temperature: ReadingRange,
    pub air_humidity: ReadingRange,
    pub soil_humidity: ReadingRange,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_detections: 3,
            max_detections: 7,
            temperature: ReadingRange::new(15, 45),
            air_humidity: ReadingRange::new(5, 95),
            soil_humidity: ReadingRange::new(0, 90),
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_detections > self.max_detections {
            return Err(ConfigError::Invalid(format!(
                "simulation.min_detections ({}) exceeds max_detections ({})",
                self.min_detections, self.max_detections
            )));
        }
        for (name, range) in [
            ("temperature", self.temperature),
            ("air_humidity", self.air_humidity),
            ("soil_humidity", self.soil_humidity),
        ] {
            if range.min > range.max {
                return Err(ConfigError::Invalid(format!(
                    "simulation.{name} range is inverted ({} > {})",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

impl DispatchConfig {
    /// Loads configuration from `path` (if given) and the environment, then
    /// validates it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("DISPATCH")
                .separator("__")
                .try_parsing(true),
        );

        let config: DispatchConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "classifier.cache_capacity must be at least 1".to_string(),
            ));
        }
        self.topology.validate()?;
        self.simulation.validate()
    }
}
