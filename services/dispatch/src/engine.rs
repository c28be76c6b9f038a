use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use shared::config::BaseSelection;
use shared::types::normalize_status_input;
use shared::{DispatchConfig, Incident, IncidentId, IncidentStatus, SensorSnapshot, SeverityLevel};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{ClassifierError, RiskClassifier};
use crate::graph::{GraphError, LocationGraph, Route};
use crate::priority_queue::DispatchQueue;
use crate::store::{Clock, IncidentStore, StoreError, SystemClock};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no dispatchable incidents in the queue")]
    Empty,
    #[error("no base can reach incident {0}")]
    NoRouteAvailable(IncidentId),
    #[error("location {0:?} is not in the location graph")]
    UnknownLocation(String),
    #[error("incident {0} is already queued for dispatch")]
    AlreadyQueued(IncidentId),
    #[error("incident {id} is {status}, not awaiting dispatch")]
    NotAwaitingDispatch { id: IncidentId, status: IncidentStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// A successful dispatch: which base goes, by which route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResult {
    pub incident: Incident,
    pub base: String,
    pub path: Vec<String>,
    pub distance: u64,
}

// Store and queue change together, under one lock.
struct DispatchState {
    store: IncidentStore,
    queue: DispatchQueue,
}

/// Orchestrates detection intake and dispatch.
///
/// Lock order is always `state` then `graph`.
pub struct DispatchEngine {
    classifier: Arc<RiskClassifier>,
    graph: Arc<RwLock<LocationGraph>>,
    bases: BaseSelection,
    state: Mutex<DispatchState>,
}

impl DispatchEngine {
    pub fn new(
        classifier: Arc<RiskClassifier>,
        graph: Arc<RwLock<LocationGraph>>,
        bases: BaseSelection,
    ) -> Self {
        Self::with_clock(classifier, graph, bases, Arc::new(SystemClock))
    }

    pub fn with_clock(
        classifier: Arc<RiskClassifier>,
        graph: Arc<RwLock<LocationGraph>>,
        bases: BaseSelection,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            classifier,
            graph,
            bases,
            state: Mutex::new(DispatchState {
                store: IncidentStore::with_clock(clock),
                queue: DispatchQueue::new(),
            }),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let classifier = RiskClassifier::with_capacity(config.classifier.cache_capacity)?;
        let graph = LocationGraph::from_topology(&config.topology)?;
        info!(
            vertices = graph.vertex_count(),
            edges = graph.edge_count(),
            cache_capacity = config.classifier.cache_capacity,
            "Dispatch engine configured"
        );
        Ok(Self::new(
            Arc::new(classifier),
            Arc::new(RwLock::new(graph)),
            config.topology.bases.clone(),
        ))
    }

    pub fn classifier(&self) -> &Arc<RiskClassifier> {
        &self.classifier
    }

    pub fn graph(&self) -> &Arc<RwLock<LocationGraph>> {
        &self.graph
    }

    /// Classifies a detection, stores it and queues it for dispatch.
    /// An unknown location is rejected before anything is recorded.
    pub fn report_detection(
        &self,
        location: &str,
        sensors: SensorSnapshot,
    ) -> Result<Incident, DispatchError> {
        let mut state = self.state.lock();
        if !self.graph.read().contains(location) {
            return Err(DispatchError::UnknownLocation(location.to_string()));
        }

        let severity = self.classifier.classify_snapshot(&sensors);
        let incident = state.store.create(severity, location, sensors);
        state.queue.enqueue_detection(&incident);

        shared::logger::log_detection(&incident);
        Ok(incident)
    }

    /// Dispatches the most severe active incident from the nearest base.
    pub fn dispatch_next(&self) -> Result<DispatchResult, DispatchError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let id = state
            .queue
            .pop_dispatchable(&state.store)
            .ok_or(DispatchError::Empty)?;

        let location = match state.store.get(id) {
            Some(incident) => incident.location.clone(),
            None => return Err(StoreError::NotFound(id).into()),
        };

        let (base, route) = match self.nearest_base(&location) {
            Some(found) => found,
            None => {
                shared::logger::log_no_route(id, &location);
                return Err(DispatchError::NoRouteAvailable(id));
            }
        };

        let incident = state.store.set_status(id, IncidentStatus::InProgress)?.clone();
        let result = DispatchResult {
            incident,
            base,
            path: route.path,
            distance: route.total_weight,
        };
        shared::logger::log_dispatch(&result);
        Ok(result)
    }

    /// Evaluates every base in order and keeps the strictly cheapest route,
    /// so the first-evaluated base wins a tie.
    fn nearest_base(&self, location: &str) -> Option<(String, Route)> {
        let graph = self.graph.read();
        let mut best: Option<(String, Route)> = None;

        for base in self.candidate_bases(&graph) {
            match graph.shortest_path(&base, location) {
                Ok(route) => {
                    debug!(base = %base, location, distance = route.total_weight, "Candidate route");
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, current)| route.total_weight < current.total_weight);
                    if better {
                        best = Some((base, route));
                    }
                }
                Err(GraphError::NoPathFound { .. }) => {
                    debug!(base = %base, location, "Base cannot reach location");
                }
                Err(err) => {
                    warn!(base = %base, location, error = %err, "Skipping base during route search");
                }
            }
        }
        best
    }

    fn candidate_bases(&self, graph: &LocationGraph) -> Vec<String> {
        match &self.bases {
            BaseSelection::Prefix { prefix } => graph
                .vertices()
                .filter(|name| name.starts_with(prefix.as_str()))
                .map(str::to_string)
                .collect(),
            BaseSelection::Explicit { names } => names.clone(),
        }
    }

    /// Sets a status from free-form input such as `"in progress"`.
    pub fn update_status(&self, id: IncidentId, raw: &str) -> Result<Incident, DispatchError> {
        let normalized = normalize_status_input(raw);
        let mut state = self.state.lock();
        let incident = state.store.update_status(id, &normalized)?;
        Ok(incident.clone())
    }

    pub fn set_status(&self, id: IncidentId, status: IncidentStatus) -> Result<Incident, DispatchError> {
        let mut state = self.state.lock();
        let incident = state.store.set_status(id, status)?;
        Ok(incident.clone())
    }

    /// Queues a DETECTED incident again, typically after `NoRouteAvailable`.
    /// An incident that still has a pending entry is rejected.
    pub fn requeue(&self, id: IncidentId) -> Result<(), DispatchError> {
        let mut state = self.state.lock();
        let incident = state.store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
        if incident.status != IncidentStatus::Detected {
            return Err(DispatchError::NotAwaitingDispatch {
                id,
                status: incident.status,
            });
        }
        if !state.queue.enqueue_detection(&incident) {
            return Err(DispatchError::AlreadyQueued(id));
        }
        info!(incident_id = %id, "Incident requeued for dispatch");
        Ok(())
    }

    /// Removes an incident record. Its queue entry, if any, goes stale.
    pub fn retire(&self, id: IncidentId) -> Result<Incident, DispatchError> {
        let mut state = self.state.lock();
        let incident = state.store.remove(id)?;
        info!(incident_id = %id, "Incident retired");
        Ok(incident)
    }

    pub fn incident(&self, id: IncidentId) -> Option<Incident> {
        self.state.lock().store.get(id).cloned()
    }

    pub fn active_incidents(&self) -> Vec<Incident> {
        self.state.lock().store.list_active()
    }

    pub fn incidents_by_severity(&self, severity: SeverityLevel) -> Vec<Incident> {
        self.state.lock().store.list_by_severity(severity)
    }

    pub fn report_by_location(&self) -> Vec<(String, Vec<Incident>)> {
        self.state.lock().store.group_by_location()
    }

    /// Queue entries not yet consumed, stale ones included.
    pub fn pending_dispatches(&self) -> usize {
        self.state.lock().queue.len()
    }

    pub fn incident_count(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Snapshot of the graph's location names, in insertion order.
    pub fn locations(&self) -> Vec<String> {
        self.graph.read().vertices().map(str::to_string).collect()
    }
}
