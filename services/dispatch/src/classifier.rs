//! Risk classification of sensor readings
//!
//! Each reading scores 0..=4 points against fixed breakpoints; the summed
//! score (0..=12) maps onto a severity level. Results are memoized per exact
//! input tuple in a bounded LRU cache.

use lru::LruCache;
use parking_lot::Mutex;
use shared::{SensorSnapshot, SeverityLevel};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

type SensorKey = (i32, i32, i32);

fn temperature_points(temperature: i32) -> u8 {
    match temperature {
        t if t <= 20 => 0,
        t if t <= 25 => 1,
        t if t <= 30 => 2,
        t if t <= 35 => 3,
        _ => 4,
    }
}

// Drier air means more risk
fn air_humidity_points(air_humidity: i32) -> u8 {
    match air_humidity {
        h if h > 70 => 0,
        h if h > 50 => 1,
        h if h > 30 => 2,
        h if h > 15 => 3,
        _ => 4,
    }
}

fn soil_humidity_points(soil_humidity: i32) -> u8 {
    match soil_humidity {
        h if h > 60 => 0,
        h if h > 40 => 1,
        h if h > 20 => 2,
        h if h > 10 => 3,
        _ => 4,
    }
}

/// Summed risk score in `0..=12`. Uncached.
pub fn risk_score(temperature: i32, air_humidity: i32, soil_humidity: i32) -> u8 {
    temperature_points(temperature)
        + air_humidity_points(air_humidity)
        + soil_humidity_points(soil_humidity)
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classification cache capacity must be at least 1")]
    ZeroCapacity,
}

/// Whether a classification was computed or served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: SeverityLevel,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Memoizing risk classifier.
///
/// Lookup and insert happen under one lock, so two callers racing on the same
/// new tuple at worst compute it twice and store one entry.
pub struct RiskClassifier {
    cache: Mutex<LruCache<SensorKey, SeverityLevel>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RiskClassifier {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, ClassifierError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(ClassifierError::ZeroCapacity)
    }

    pub fn classify(&self, temperature: i32, air_humidity: i32, soil_humidity: i32) -> SeverityLevel {
        self.classify_traced(temperature, air_humidity, soil_humidity).level
    }

    pub fn classify_snapshot(&self, sensors: &SensorSnapshot) -> SeverityLevel {
        let (temperature, air_humidity, soil_humidity) = sensors.as_tuple();
        self.classify(temperature, air_humidity, soil_humidity)
    }

    /// Classifies and reports whether the cache answered. Used for
    /// instrumentation only; the level never depends on the outcome.
    pub fn classify_traced(
        &self,
        temperature: i32,
        air_humidity: i32,
        soil_humidity: i32,
    ) -> Classification {
        let key = (temperature, air_humidity, soil_humidity);
        let mut cache = self.cache.lock();

        if let Some(level) = cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Classification {
                level: *level,
                outcome: CacheOutcome::Hit,
            };
        }

        let score = risk_score(temperature, air_humidity, soil_humidity);
        let level = SeverityLevel::from_score(score);
        self.misses.fetch_add(1, Ordering::Relaxed);

        if let Some((evicted, _)) = cache.push(key, level) {
            if evicted != key {
                debug!(?evicted, "Evicted least recently used classification");
            }
        }
        debug!(temperature, air_humidity, soil_humidity, score, %level, "Computed risk classification");

        Classification {
            level,
            outcome: CacheOutcome::Miss,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: cache.len(),
            capacity: cache.cap().get(),
        }
    }

    /// Drops every cached entry. Counters are kept.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(shared::config::DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}
