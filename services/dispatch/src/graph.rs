use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use shared::config::MAX_EDGE_WEIGHT;
use shared::TopologyConfig;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("location {0:?} is not in the graph")]
    VertexNotFound(String),
    #[error("no path from {from:?} to {to:?}")]
    NoPathFound { from: String, to: String },
    #[error("edge {from:?} -> {to:?} weight {weight} exceeds {}", MAX_EDGE_WEIGHT)]
    WeightTooLarge { from: String, to: String, weight: u64 },
}

/// A shortest path and its total travel cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub path: Vec<String>,
    pub total_weight: u64,
}

/// Directed, weighted network of named locations.
#[derive(Debug, Clone, Default)]
pub struct LocationGraph {
    graph: DiGraph<String, u64>,
    index: HashMap<String, NodeIndex>,
}

impl LocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from a startup topology. Edges must reference
    /// declared vertices.
    pub fn from_topology(topology: &TopologyConfig) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for vertex in &topology.vertices {
            graph.add_vertex(vertex);
        }
        for edge in &topology.edges {
            graph.add_edge(&edge.from, &edge.to, edge.weight)?;
        }
        Ok(graph)
    }

    /// Adds a location. Returns `false` if the name already exists.
    pub fn add_vertex(&mut self, name: &str) -> bool {
        if self.index.contains_key(name) {
            return false;
        }
        let node = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), node);
        true
    }

    /// Adds or overwrites the directed edge `from -> to`. Weights above
    /// [`MAX_EDGE_WEIGHT`] are rejected so route totals cannot overflow.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: u64) -> Result<(), GraphError> {
        let a = self.node(from)?;
        let b = self.node(to)?;
        if weight > MAX_EDGE_WEIGHT {
            return Err(GraphError::WeightTooLarge {
                from: from.to_string(),
                to: to.to_string(),
                weight,
            });
        }
        self.graph.update_edge(a, b, weight);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Location names in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_indices().map(move |node| self.graph[node].as_str())
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge_weight(&self, from: &str, to: &str) -> Option<u64> {
        let a = *self.index.get(from)?;
        let b = *self.index.get(to)?;
        self.graph
            .find_edge(a, b)
            .and_then(|edge| self.graph.edge_weight(edge))
            .copied()
    }

    /// Cheapest path from `source` to `target` (Dijkstra; A* with a zero
    /// heuristic).
    pub fn shortest_path(&self, source: &str, target: &str) -> Result<Route, GraphError> {
        let start = self.node(source)?;
        let goal = self.node(target)?;

        let (total_weight, nodes) = astar(
            &self.graph,
            start,
            |node| node == goal,
            |edge| *edge.weight(),
            |_| 0,
        )
        .ok_or_else(|| GraphError::NoPathFound {
            from: source.to_string(),
            to: target.to_string(),
        })?;

        Ok(Route {
            path: nodes.into_iter().map(|node| self.graph[node].clone()).collect(),
            total_weight,
        })
    }

    fn node(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::VertexNotFound(name.to_string()))
    }
}
