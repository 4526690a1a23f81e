//! Graph wrapper using petgraph::StableDiGraph keyed by NodeId

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::model::*;

/// The page graph. A directed graph whose node IDs survive removals.
pub struct SiteGraph {
    inner: StableDiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl std::fmt::Debug for SiteGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl SiteGraph {
    pub fn new() -> Self {
        SiteGraph {
            inner: StableDiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build from node and edge lists. Edges with unknown endpoints are dropped.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut graph = SiteGraph::new();
        for node in nodes {
            if !graph.insert_node(node) {
                tracing::warn!("Duplicate node id ignored");
            }
        }
        let mut dropped = 0usize;
        for edge in edges {
            if !graph.add_edge(edge) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!("Dropped {} edges with unknown endpoints", dropped);
        }
        graph
    }

    /// Insert a node under its own ID. Returns false if the ID is taken.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id;
        let idx = self.inner.add_node(node);
        self.index.insert(id, idx);
        true
    }

    /// Add an edge between existing nodes. Returns false if an endpoint is missing.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let (Some(&source), Some(&target)) = (self.index.get(&edge.source), self.index.get(&edge.target)) else {
            return false;
        };
        self.inner.add_edge(source, target, edge);
        true
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let idx = *self.index.get(&id)?;
        self.inner.node_weight_mut(idx)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    pub fn edges_from(&self, source: NodeId) -> impl Iterator<Item = &Edge> {
        self.directed(source, Direction::Outgoing)
    }

    pub fn edges_to(&self, target: NodeId) -> impl Iterator<Item = &Edge> {
        self.directed(target, Direction::Incoming)
    }

    fn directed(&self, id: NodeId, direction: Direction) -> impl Iterator<Item = &Edge> {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(move |&idx| self.inner.edges_directed(idx, direction))
            .map(|edge_ref| edge_ref.weight())
    }

    /// Highest node ID present.
    pub fn max_node_id(&self) -> Option<NodeId> {
        self.index.keys().max().copied()
    }

    /// First ID strictly above every present ID.
    pub fn next_free_id(&self) -> u64 {
        self.max_node_id().map_or(0, |id| id.0 + 1)
    }

    /// Remove a node together with its edges.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.index.remove(&id)?;
        self.inner.remove_node(idx)
    }

    /// Move every edge touching `from` onto `to`, then remove `from`.
    ///
    /// Returns the number of edges rewritten, or `None` if either node is
    /// missing. Other node IDs are never changed.
    pub fn redirect_node(&mut self, from: NodeId, to: NodeId) -> Option<usize> {
        if from == to {
            return Some(0);
        }
        let from_idx = *self.index.get(&from)?;
        let to_idx = *self.index.get(&to)?;

        let mut touching: Vec<EdgeIndex> = self
            .inner
            .edges_directed(from_idx, Direction::Outgoing)
            .chain(self.inner.edges_directed(from_idx, Direction::Incoming))
            .map(|edge_ref| edge_ref.id())
            .collect();
        touching.sort();
        touching.dedup();

        let mut rewritten = 0;
        for edge_idx in touching {
            let Some((source, target)) = self.inner.edge_endpoints(edge_idx) else {
                continue;
            };
            let Some(mut edge) = self.inner.remove_edge(edge_idx) else {
                continue;
            };
            let source = if source == from_idx {
                edge.source = to;
                to_idx
            } else {
                source
            };
            let target = if target == from_idx {
                edge.target = to;
                to_idx
            } else {
                target
            };
            self.inner.add_edge(source, target, edge);
            rewritten += 1;
        }

        self.remove_node(from);
        Some(rewritten)
    }

    /// Consume the graph into node and edge lists.
    pub fn into_parts(self) -> (Vec<Node>, Vec<Edge>) {
        let mut inner = self.inner;
        let edges = inner
            .edge_indices()
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|idx| inner.remove_edge(idx))
            .collect();
        let nodes = inner
            .node_indices()
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|idx| inner.remove_node(idx))
            .collect();
        (nodes, edges)
    }
}

impl Default for SiteGraph {
    fn default() -> Self {
        Self::new()
    }
}
