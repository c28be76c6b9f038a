//! Logging utilities

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::types::{Incident, IncidentId};

/// Initialize the logger.
///
/// Reads `RUST_LOG`, falling back to `info`. Safe to call more than once;
/// later calls leave the first subscriber in place.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .try_init();
}

/// Log a newly registered incident
pub fn log_detection(incident: &Incident) {
    info!(
        incident_id = %incident.id,
        severity = %incident.severity,
        location = %incident.location,
        temperature = incident.sensors.temperature,
        air_humidity = incident.sensors.air_humidity,
        soil_humidity = incident.sensors.soil_humidity,
        "Incident detected"
    );
}

/// Log a completed dispatch
pub fn log_dispatch<T: Serialize>(dispatch: &T) {
    info!(
        dispatch = %serde_json::to_string(dispatch).unwrap_or_default(),
        "Team dispatched"
    );
}

/// Log a dispatch attempt that found no reachable base
pub fn log_no_route(incident_id: IncidentId, location: &str) {
    warn!(
        incident_id = %incident_id,
        location = %location,
        "No base can reach incident; dispatch must be retried explicitly"
    );
}
