//! Severity-ordered dispatch queue
//!
//! Entries are references (rank, identity) into the incident store. They can
//! go stale when an incident is extinguished or removed after enqueueing;
//! stale entries are dropped on the way out, never returned. An incident has
//! at most one pending entry at a time.

use shared::{Incident, IncidentId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use tracing::debug;

use crate::store::IncidentStore;

/// Dispatch priority for one incident
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub severity_rank: u8,
    pub incident_id: IncidentId,
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher rank first; same rank: lower identity (earlier detection) first
        match self.severity_rank.cmp(&other.severity_rank) {
            Ordering::Equal => other.incident_id.cmp(&self.incident_id),
            ord => ord,
        }
    }
}

#[derive(Debug, Default)]
pub struct DispatchQueue {
    heap: BinaryHeap<QueueEntry>,
    queued: HashSet<IncidentId>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the incident. Returns `false` without queueing if it already
    /// has a pending entry.
    pub fn enqueue_detection(&mut self, incident: &Incident) -> bool {
        if !self.queued.insert(incident.id) {
            return false;
        }
        self.heap.push(QueueEntry {
            severity_rank: incident.severity_rank(),
            incident_id: incident.id,
        });
        true
    }

    pub fn contains(&self, id: IncidentId) -> bool {
        self.queued.contains(&id)
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.heap.peek()
    }

    /// Pops entries until one references an incident that is still in the
    /// store and not extinguished.
    pub fn pop_dispatchable(&mut self, store: &IncidentStore) -> Option<IncidentId> {
        while let Some(entry) = self.heap.pop() {
            self.queued.remove(&entry.incident_id);
            match store.get(entry.incident_id) {
                Some(incident) if incident.is_active() => return Some(entry.incident_id),
                Some(incident) => {
                    debug!(incident_id = %entry.incident_id, status = %incident.status, "Skipping stale queue entry");
                }
                None => {
                    debug!(incident_id = %entry.incident_id, "Skipping queue entry for removed incident");
                }
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
