//! Sound sources routed by the engine.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use sonance_core::NodeId;

/// Anything that produces audio into the engine's graph.
///
/// Sources are owned by the caller (typically as `Rc<dyn SoundSource>`); the
/// engine keeps only a non-owning handle and identifies a source by its
/// allocation, not by value. Methods take `&self` because sources are shared.
pub trait SoundSource {
    /// Route this source's output into `node`.
    fn connect(&self, node: NodeId);

    /// Remove the route from this source to `node`.
    fn disconnect(&self, node: NodeId);

    /// Whether this source currently feeds `node`.
    fn is_connected_to(&self, node: NodeId) -> bool;

    /// Gate output for sources that only play at the extra sonification level.
    ///
    /// The default implementation ignores the call.
    fn set_sonification_enabled(&self, _enabled: bool) {}
}

/// Something that happened to a [`RecordingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// Connected to a node.
    Connected(NodeId),
    /// Disconnected from a node.
    Disconnected(NodeId),
    /// Sonification gate changed.
    SonificationEnabled(bool),
}

/// A [`SoundSource`] that produces no audio and records every call.
///
/// Used by tests and by the CLI simulator to observe what the engine did.
#[derive(Debug)]
pub struct RecordingSource {
    name: String,
    connections: RefCell<BTreeSet<NodeId>>,
    events: RefCell<Vec<SourceEvent>>,
    sonification_enabled: Cell<bool>,
}

impl RecordingSource {
    /// Create a disconnected source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: RefCell::new(BTreeSet::new()),
            events: RefCell::new(Vec::new()),
            sonification_enabled: Cell::new(true),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nodes this source is connected to, in id order.
    pub fn connections(&self) -> Vec<NodeId> {
        self.connections.borrow().iter().copied().collect()
    }

    /// Every call received so far, oldest first.
    pub fn events(&self) -> Vec<SourceEvent> {
        self.events.borrow().clone()
    }

    /// Last value passed to [`SoundSource::set_sonification_enabled`]
    /// (`true` until gated).
    pub fn sonification_enabled(&self) -> bool {
        self.sonification_enabled.get()
    }
}

impl SoundSource for RecordingSource {
    fn connect(&self, node: NodeId) {
        self.connections.borrow_mut().insert(node);
        self.events.borrow_mut().push(SourceEvent::Connected(node));
    }

    fn disconnect(&self, node: NodeId) {
        self.connections.borrow_mut().remove(&node);
        self.events.borrow_mut().push(SourceEvent::Disconnected(node));
    }

    fn is_connected_to(&self, node: NodeId) -> bool {
        self.connections.borrow().contains(&node)
    }

    fn set_sonification_enabled(&self, enabled: bool) {
        self.sonification_enabled.set(enabled);
        self.events
            .borrow_mut()
            .push(SourceEvent::SonificationEnabled(enabled));
    }
}
