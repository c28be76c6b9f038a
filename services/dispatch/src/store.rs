use chrono::{DateTime, Utc};
use shared::{Incident, IncidentId, IncidentStatus, SensorSnapshot, SeverityLevel};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("incident {0} not found")]
    NotFound(IncidentId),
    #[error("unrecognized status {0:?}")]
    InvalidTransition(String),
}

/// Source of detection timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Authoritative incident records, keyed by identity.
///
/// Identities come from a counter that never goes backwards, so they stay
/// unique after `remove`. Without removals the next identity is always
/// `len() + 1`.
pub struct IncidentStore {
    incidents: BTreeMap<IncidentId, Incident>,
    next_id: u64,
    last_detected_at: Option<DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            incidents: BTreeMap::new(),
            next_id: 1,
            last_detected_at: None,
            clock,
        }
    }

    /// Registers a new DETECTED incident. The caller guarantees `location` is
    /// a graph vertex.
    pub fn create(
        &mut self,
        severity: SeverityLevel,
        location: &str,
        sensors: SensorSnapshot,
    ) -> Incident {
        let id = IncidentId(self.next_id);
        self.next_id += 1;

        // Never hand out a timestamp earlier than the previous one
        let now = self.clock.now();
        let detected_at = match self.last_detected_at {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_detected_at = Some(detected_at);

        let incident = Incident {
            id,
            severity,
            location: location.to_string(),
            status: IncidentStatus::Detected,
            detected_at,
            sensors,
        };
        self.incidents.insert(id, incident.clone());
        incident
    }

    pub fn get(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.get(&id)
    }

    /// Moves an incident to `status`. Any lifecycle value is accepted from
    /// any current state.
    pub fn set_status(&mut self, id: IncidentId, status: IncidentStatus) -> Result<&Incident, StoreError> {
        let incident = self.incidents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let previous = incident.status;
        incident.status = status;
        info!(incident_id = %id, from = %previous, to = %status, "Incident status updated");
        Ok(incident)
    }

    /// Like [`set_status`](Self::set_status) but takes a canonical status
    /// name. Unknown names are rejected without touching the record.
    pub fn update_status(&mut self, id: IncidentId, raw: &str) -> Result<&Incident, StoreError> {
        if !self.incidents.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        let status = raw
            .parse::<IncidentStatus>()
            .map_err(|_| StoreError::InvalidTransition(raw.to_string()))?;
        self.set_status(id, status)
    }

    pub fn remove(&mut self, id: IncidentId) -> Result<Incident, StoreError> {
        self.incidents.remove(&id).ok_or(StoreError::NotFound(id))
    }

    /// Incidents not yet extinguished, in detection order.
    pub fn list_active(&self) -> Vec<Incident> {
        self.incidents
            .values()
            .filter(|incident| incident.is_active())
            .cloned()
            .collect()
    }

    /// Active incidents with exactly this severity, in detection order.
    pub fn list_by_severity(&self, severity: SeverityLevel) -> Vec<Incident> {
        self.incidents
            .values()
            .filter(|incident| incident.is_active() && incident.severity == severity)
            .cloned()
            .collect()
    }

    /// Every incident, extinguished ones included, grouped by location.
    /// Groups appear in order of each location's first detection.
    pub fn group_by_location(&self) -> Vec<(String, Vec<Incident>)> {
        let mut groups: Vec<(String, Vec<Incident>)> = Vec::new();
        for incident in self.incidents.values() {
            match groups.iter_mut().find(|(location, _)| *location == incident.location) {
                Some((_, members)) => members.push(incident.clone()),
                None => groups.push((incident.location.clone(), vec![incident.clone()])),
            }
        }
        groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &Incident> + '_ {
        self.incidents.values()
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::new()
    }
}
