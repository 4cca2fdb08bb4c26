//! Node topology for the sound output graph.
//!
//! [`AudioGraph`] records which backend primitives exist ([`NodeKind`]) and
//! how they are wired. It enforces the structural rules a real audio backend
//! enforces at connect time: no cycles, no duplicate edges, nothing leaves the
//! destination.
//!
//! The graph stores topology only. Gain values and their ramps live with the
//! backend that owns the node (see `sonance-io`).
//!
//! # Example
//!
//! ```rust
//! use sonance_core::graph::{AudioGraph, NodeKind};
//!
//! let mut graph = AudioGraph::new();
//! let out = graph.add_node(NodeKind::Destination);
//! let main = graph.add_node(NodeKind::Gain);
//! graph.connect(main, out).unwrap();
//!
//! assert!(graph.has_edge(main, out));
//! assert!(graph.connect(out, main).is_err());
//! ```

pub mod edge;
pub mod node;
mod topology;

pub use edge::EdgeId;
pub use node::{NodeId, NodeKind};
pub use topology::{AudioGraph, GraphError};
