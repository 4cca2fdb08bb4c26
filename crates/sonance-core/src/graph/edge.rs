//! Graph edge types.
//!
//! An `Edge` connects two nodes, representing audio signal flow from a source
//! node to a destination node.

/// Unique identifier for an edge in an audio graph.
///
/// Edge IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

/// A directed connection between two nodes.
pub(crate) struct Edge {
    /// Source node.
    pub from: super::node::NodeId,
    /// Destination node.
    pub to: super::node::NodeId,
}
