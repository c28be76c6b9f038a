use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of an incident. Assigned by the incident store, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub u64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered classification of incident urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 4] = [
        SeverityLevel::Low,
        SeverityLevel::Medium,
        SeverityLevel::High,
        SeverityLevel::Critical,
    ];

    /// Canonical numeric rank, 1 (LOW) through 4 (CRITICAL).
    pub fn rank(self) -> u8 {
        match self {
            SeverityLevel::Low => 1,
            SeverityLevel::Medium => 2,
            SeverityLevel::High => 3,
            SeverityLevel::Critical => 4,
        }
    }

    /// Maps a summed risk score (0..=12) onto a level. Scores above 12 are
    /// treated as critical.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=3 => SeverityLevel::Low,
            4..=6 => SeverityLevel::Medium,
            7..=9 => SeverityLevel::High,
            _ => SeverityLevel::Critical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Low => "LOW",
            SeverityLevel::Medium => "MEDIUM",
            SeverityLevel::High => "HIGH",
            SeverityLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for SeverityLevel {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SeverityLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// Incident lifecycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Detected,
    InProgress,
    Contained,
    Extinguished,
}

impl IncidentStatus {
    pub const ALL: [IncidentStatus; 4] = [
        IncidentStatus::Detected,
        IncidentStatus::InProgress,
        IncidentStatus::Contained,
        IncidentStatus::Extinguished,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Detected => "DETECTED",
            IncidentStatus::InProgress => "IN_PROGRESS",
            IncidentStatus::Contained => "CONTAINED",
            IncidentStatus::Extinguished => "EXTINGUISHED",
        }
    }

    pub fn is_active(self) -> bool {
        self != IncidentStatus::Extinguished
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized incident status: {0:?}")]
pub struct ParseStatusError(pub String);

/// Parses the canonical status names only. Callers normalize free-form input
/// first (see [`normalize_status_input`]).
impl FromStr for IncidentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Upper-cases, trims and joins inner whitespace with underscores, so
/// `" in progress "` becomes `"IN_PROGRESS"`.
pub fn normalize_status_input(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| word.to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Sensor readings captured at detection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temperature: i32,
    pub air_humidity: i32,
    pub soil_humidity: i32,
}

impl SensorSnapshot {
    pub fn new(temperature: i32, air_humidity: i32, soil_humidity: i32) -> Self {
        Self {
            temperature,
            air_humidity,
            soil_humidity,
        }
    }

    pub fn as_tuple(&self) -> (i32, i32, i32) {
        (self.temperature, self.air_humidity, self.soil_humidity)
    }
}

/// An incident record. Only `status` changes after creation, and only through
/// the incident store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub severity: SeverityLevel,
    pub location: String,
    pub status: IncidentStatus,
    pub detected_at: DateTime<Utc>,
    pub sensors: SensorSnapshot,
}

impl Incident {
    pub fn severity_rank(&self) -> u8 {
        self.severity.rank()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
