//! Graph node types.
//!
//! Each node in an [`AudioGraph`](super::AudioGraph) has a [`NodeId`] and a
//! [`NodeKind`] describing which backend primitive it stands for. The
//! `NodeData` struct bundles the kind with adjacency bookkeeping.

/// Unique identifier for a node in an audio graph.
///
/// Node IDs are assigned sequentially and never reused within a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Builds a node id from its raw index.
    ///
    /// Backends that keep their own node tables use this to mint ids.
    #[inline]
    pub fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// The backend primitive a node represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Multiplies its summed input by a (possibly ramping) gain value.
    Gain,
    /// Convolution reverb. Output only; the impulse is a backend concern.
    Convolver,
    /// Fixed dynamics compressor / limiter ahead of the device.
    Compressor,
    /// The device output. Exactly one per graph, no outgoing edges.
    Destination,
}

impl NodeKind {
    /// Short lowercase label used in logs and topology dumps.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::Convolver => "convolver",
            Self::Compressor => "compressor",
            Self::Destination => "destination",
        }
    }
}

/// Internal bookkeeping for a node in the graph.
pub(crate) struct NodeData {
    pub kind: NodeKind,
    /// Edges arriving at this node.
    pub incoming: Vec<super::edge::EdgeId>,
    /// Edges leaving this node.
    pub outgoing: Vec<super::edge::EdgeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }
}
