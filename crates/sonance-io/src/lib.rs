//! Backend layer for the sonance sound output engine.
//!
//! This crate provides:
//!
//! - **Backend abstraction**: [`AudioBackend`], the opaque vocabulary the
//!   engine uses to build and automate its gain stages, plus the device
//!   lifecycle types [`DeviceState`] and [`UserGesture`]
//! - **Sound sources**: the [`SoundSource`] trait implemented by anything the
//!   engine routes into its graph, and [`RecordingSource`] for tests and
//!   simulation
//! - **Simulation**: [`MemoryBackend`], a deterministic in-memory backend with
//!   a [`DeviceController`] for driving suspend/resume scenarios
//!
//! ## Quick Start
//!
//! ```rust
//! use sonance_io::{AudioBackend, MemoryBackend};
//!
//! let mut backend = MemoryBackend::new();
//! let gain = backend.create_gain(1.0).unwrap();
//! backend.connect(gain, backend.destination()).unwrap();
//!
//! backend.linear_ramp_to(gain, 0.0, 0.1).unwrap();
//! backend.advance(0.05);
//! assert!((backend.gain_value(gain).unwrap() - 0.5).abs() < 1e-3);
//! ```

pub mod backend;
mod memory;
mod source;

pub use backend::{AudioBackend, DeviceState, ResumeCallback, UserGesture};
pub use memory::{DEFAULT_SAMPLE_RATE, DeviceController, MemoryBackend, ResumeBehavior};
pub use source::{RecordingSource, SoundSource, SourceEvent};

use sonance_core::{GraphError, NodeId};

/// Error types for backend operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    /// The node handle does not belong to this backend.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A gain operation was applied to a node that is not a gain stage.
    #[error("{node} is a {kind} node, not a gain stage")]
    NotAGain {
        /// The offending node.
        node: NodeId,
        /// Label of the node's actual kind.
        kind: &'static str,
    },

    /// Topology change rejected.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The device refused to resume.
    #[error("resume failed: {0}")]
    ResumeFailed(String),

    /// The device is closed and cannot be resumed.
    #[error("audio device is closed")]
    DeviceClosed,
}

/// Convenience result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
