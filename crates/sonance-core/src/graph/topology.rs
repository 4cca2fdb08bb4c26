//! Audio graph: mutation API and cycle detection.

use thiserror::Error;

use super::edge::{Edge, EdgeId};
use super::node::{NodeData, NodeId, NodeKind};

/// Errors that can occur during graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The specified node was not found in the graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// No edge exists between these nodes.
    #[error("no edge from {0} to {1}")]
    EdgeNotFound(NodeId, NodeId),
    /// Adding this edge would create a cycle.
    #[error("adding this edge would create a cycle")]
    CycleDetected,
    /// The connection is structurally invalid (e.g., edge out of the destination).
    #[error("invalid connection: {0}")]
    InvalidConnection(String),
    /// A duplicate edge already exists between these nodes.
    #[error("edge from {0} to {1} already exists")]
    DuplicateEdge(NodeId, NodeId),
}

/// Directed acyclic graph of backend nodes.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes with [`add_node()`](Self::add_node)
/// 3. Wire them with [`connect()`](Self::connect) /
///    [`disconnect()`](Self::disconnect)
#[derive(Default)]
pub struct AudioGraph {
    nodes: Vec<Option<NodeData>>,
    edges: Vec<Option<Edge>>,
    next_edge_slot: u32,
}

impl AudioGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node mutations ---

    /// Adds a node of the given kind. Returns the new node's ID.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeData::new(kind)));
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} node {id}", kind.label());
        id
    }

    /// Removes a node and all its connected edges.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.node(id)?;

        let edge_ids: Vec<EdgeId> = node
            .incoming
            .iter()
            .chain(node.outgoing.iter())
            .copied()
            .collect();

        for edge_id in edge_ids {
            self.disconnect_internal(edge_id);
        }

        self.nodes[id.0 as usize] = None;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    /// Connects two nodes with a directed edge.
    ///
    /// Returns the new edge's ID, or an error if:
    /// - Either node doesn't exist
    /// - The edge would create a cycle
    /// - A duplicate edge already exists
    /// - The connection is structurally invalid (edge out of the destination,
    ///   or a self-loop)
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<EdgeId, GraphError> {
        let from_kind = self.node(from)?.kind;
        self.node(to)?;

        if from_kind == NodeKind::Destination {
            return Err(GraphError::InvalidConnection(format!(
                "destination {from} cannot have outgoing edges"
            )));
        }
        if from == to {
            return Err(GraphError::InvalidConnection(format!(
                "self-loop on {from}"
            )));
        }
        if self.has_edge(from, to) {
            return Err(GraphError::DuplicateEdge(from, to));
        }
        // A cycle exists if `to` can already reach `from`.
        if self.can_reach(to, from) {
            return Err(GraphError::CycleDetected);
        }

        let edge_id = EdgeId(self.next_edge_slot);
        self.next_edge_slot += 1;

        let edge_idx = edge_id.0 as usize;
        if edge_idx >= self.edges.len() {
            self.edges.resize_with(edge_idx + 1, || None);
        }
        self.edges[edge_idx] = Some(Edge { from, to });

        if let Some(Some(node)) = self.nodes.get_mut(from.0 as usize) {
            node.outgoing.push(edge_id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(to.0 as usize) {
            node.incoming.push(edge_id);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(edge_id)
    }

    /// Removes the edge from `from` to `to`.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.node(from)?;
        self.node(to)?;
        let edge_id = self
            .find_edge(from, to)
            .ok_or(GraphError::EdgeNotFound(from, to))?;
        self.disconnect_internal(edge_id);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_disconnect: {from} ↛ {to}");
        Ok(())
    }

    // --- Queries ---

    /// Returns the kind of a node, or `None` if it does not exist.
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).ok().map(|n| n.kind)
    }

    /// Whether a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Whether a direct edge `from → to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// Finds the edge `from → to`, if present.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let node = self.node(from).ok()?;
        node.outgoing.iter().copied().find(|edge_id| {
            self.edges
                .get(edge_id.0 as usize)
                .and_then(|e| e.as_ref())
                .is_some_and(|e| e.to == to)
        })
    }

    /// Nodes fed directly by `id`, in connection order.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| {
                node.outgoing
                    .iter()
                    .filter_map(|e| self.edge(*e).map(|edge| edge.to))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes feeding directly into `id`, in connection order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| {
                node.incoming
                    .iter()
                    .filter_map(|e| self.edge(*e).map(|edge| edge.from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `to` is reachable from `from` along directed edges.
    ///
    /// A node always reaches itself.
    pub fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            let idx = current.0 as usize;
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            stack.extend(self.successors(current));
        }
        false
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_some()).count()
    }

    /// All live node IDs in creation order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_some())
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    // --- Internal helpers ---

    fn node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|n| n.as_ref())
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize).and_then(|e| e.as_ref())
    }

    fn disconnect_internal(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.get_mut(id.0 as usize).and_then(Option::take) else {
            return;
        };
        if let Some(Some(node)) = self.nodes.get_mut(edge.from.0 as usize) {
            node.outgoing.retain(|e| *e != id);
        }
        if let Some(Some(node)) = self.nodes.get_mut(edge.to.0 as usize) {
            node.incoming.retain(|e| *e != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> (AudioGraph, NodeId, NodeId, NodeId) {
        let mut graph = AudioGraph::new();
        let out = graph.add_node(NodeKind::Destination);
        let comp = graph.add_node(NodeKind::Compressor);
        let gain = graph.add_node(NodeKind::Gain);
        graph.connect(gain, comp).unwrap();
        graph.connect(comp, out).unwrap();
        (graph, gain, comp, out)
    }

    #[test]
    fn test_connect_and_query() {
        let (graph, gain, comp, out) = chain();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.successors(gain), vec![comp]);
        assert_eq!(graph.predecessors(out), vec![comp]);
        assert!(graph.can_reach(gain, out));
        assert!(!graph.can_reach(out, gain));
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut graph, gain, comp, _) = chain();
        assert_eq!(graph.connect(comp, gain), Err(GraphError::CycleDetected));
    }

    #[test]
    fn test_duplicate_rejected() {
        let (mut graph, gain, comp, _) = chain();
        assert_eq!(
            graph.connect(gain, comp),
            Err(GraphError::DuplicateEdge(gain, comp))
        );
    }

    #[test]
    fn test_destination_has_no_outputs() {
        let (mut graph, _, _, out) = chain();
        let extra = graph.add_node(NodeKind::Gain);
        assert!(matches!(
            graph.connect(out, extra),
            Err(GraphError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = AudioGraph::new();
        let g = graph.add_node(NodeKind::Gain);
        assert!(matches!(
            graph.connect(g, g),
            Err(GraphError::InvalidConnection(_))
        ));
    }

    #[test]
    fn test_disconnect() {
        let (mut graph, gain, comp, _) = chain();
        graph.disconnect(gain, comp).unwrap();
        assert!(!graph.has_edge(gain, comp));
        assert_eq!(
            graph.disconnect(gain, comp),
            Err(GraphError::EdgeNotFound(gain, comp))
        );
        // Reconnecting after a disconnect is allowed.
        graph.connect(gain, comp).unwrap();
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let (mut graph, gain, comp, out) = chain();
        graph.remove_node(comp).unwrap();
        assert!(!graph.contains(comp));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.successors(gain).is_empty());
        assert!(graph.predecessors(out).is_empty());
        assert_eq!(graph.remove_node(comp), Err(GraphError::NodeNotFound(comp)));
    }

    #[test]
    fn test_fan_out_and_fan_in() {
        let mut graph = AudioGraph::new();
        let out = graph.add_node(NodeKind::Destination);
        let main = graph.add_node(NodeKind::Gain);
        let wet = graph.add_node(NodeKind::Gain);
        let dry = graph.add_node(NodeKind::Gain);
        let category = graph.add_node(NodeKind::Gain);
        graph.connect(main, out).unwrap();
        graph.connect(wet, main).unwrap();
        graph.connect(dry, main).unwrap();
        graph.connect(category, wet).unwrap();
        graph.connect(category, dry).unwrap();

        assert_eq!(graph.successors(category), vec![wet, dry]);
        assert_eq!(graph.predecessors(main), vec![wet, dry]);
        assert!(graph.can_reach(category, out));
    }

    #[test]
    fn test_kind_lookup() {
        let (graph, gain, comp, out) = chain();
        assert_eq!(graph.kind(gain), Some(NodeKind::Gain));
        assert_eq!(graph.kind(comp), Some(NodeKind::Compressor));
        assert_eq!(graph.kind(out), Some(NodeKind::Destination));
        assert_eq!(graph.kind(NodeId(99)), None);
        assert_eq!(graph.node_ids(), vec![out, comp, gain]);
    }
}
