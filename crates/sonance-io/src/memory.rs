//! Deterministic in-memory backend.
//!
//! [`MemoryBackend`] keeps the node topology in an [`AudioGraph`] and one
//! [`AutomatedParam`] per gain stage. Time only moves when the caller says so
//! ([`MemoryBackend::advance`]), which makes ramp timing observable in tests
//! and in the CLI simulator.
//!
//! The device side (state, gestures, pending resume requests) lives behind a
//! shared [`DeviceController`] handle so a test can suspend the device or
//! deliver a gesture while the backend itself is owned by the engine.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use sonance_config::CompressorSettings;
use sonance_core::{AudioGraph, AutomatedParam, Emitter, NodeId, NodeKind, Property, RampShape};

use crate::backend::{AudioBackend, DeviceState, ResumeCallback, UserGesture};
use crate::{BackendError, Result};

/// Sample rate used to step gain automation.
pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;

/// How the simulated device answers a resume request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResumeBehavior {
    /// Switch to [`DeviceState::Running`] and report success synchronously.
    #[default]
    Succeed,
    /// Report failure synchronously with the given reason.
    Fail(String),
    /// Queue the request until [`DeviceController::complete_resume`] is called.
    Defer,
}

struct DeviceShared {
    state: Property<DeviceState>,
    gestures: Emitter<UserGesture>,
    behavior: RefCell<ResumeBehavior>,
    pending: RefCell<VecDeque<ResumeCallback>>,
    resume_requests: Cell<usize>,
}

/// Shared handle to the simulated device behind a [`MemoryBackend`].
#[derive(Clone)]
pub struct DeviceController {
    shared: Rc<DeviceShared>,
}

impl DeviceController {
    /// Current device state.
    pub fn state(&self) -> DeviceState {
        self.shared.state.get()
    }

    /// Force a state transition (suspension, interruption, closing, ...).
    pub fn set_state(&self, state: DeviceState) {
        tracing::debug!("memory device: {} → {state}", self.shared.state.get());
        self.shared.state.set(state);
    }

    /// Deliver a user gesture to every gesture listener.
    pub fn gesture(&self, gesture: UserGesture) {
        tracing::debug!("memory device: gesture {gesture}");
        self.shared.gestures.emit(&gesture);
    }

    /// Choose how subsequent resume requests are answered.
    pub fn set_resume_behavior(&self, behavior: ResumeBehavior) {
        *self.shared.behavior.borrow_mut() = behavior;
    }

    /// Number of resume requests received so far.
    pub fn resume_requests(&self) -> usize {
        self.shared.resume_requests.get()
    }

    /// Number of deferred resume requests waiting for an outcome.
    pub fn pending_resumes(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    /// Answer the oldest deferred resume request.
    ///
    /// On success the device switches to [`DeviceState::Running`] (unless it
    /// was closed meanwhile, which turns the outcome into
    /// [`BackendError::DeviceClosed`]). Returns `false` if nothing was pending.
    pub fn complete_resume(&self, result: Result<()>) -> bool {
        let Some(callback) = self.shared.pending.borrow_mut().pop_front() else {
            return false;
        };

        let result = match result {
            Ok(()) if self.state() == DeviceState::Closed => Err(BackendError::DeviceClosed),
            Ok(()) => {
                self.shared.state.set(DeviceState::Running);
                Ok(())
            }
            Err(e) => Err(e),
        };
        callback(result);
        true
    }
}

impl fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceController")
            .field("state", &self.state())
            .field("pending_resumes", &self.pending_resumes())
            .finish_non_exhaustive()
    }
}

/// In-memory [`AudioBackend`] with manual time.
pub struct MemoryBackend {
    graph: AudioGraph,
    gains: HashMap<NodeId, AutomatedParam>,
    compressors: HashMap<NodeId, CompressorSettings>,
    destination: NodeId,
    sample_rate: f32,
    elapsed: f64,
    device: Rc<DeviceShared>,
}

impl MemoryBackend {
    /// Create a backend whose device starts suspended, the way platforms
    /// start audio before the first user gesture.
    pub fn new() -> Self {
        Self::with_state(DeviceState::Suspended)
    }

    /// Create a backend whose device starts in `state`.
    pub fn with_state(state: DeviceState) -> Self {
        let mut graph = AudioGraph::new();
        let destination = graph.add_node(NodeKind::Destination);
        Self {
            graph,
            gains: HashMap::new(),
            compressors: HashMap::new(),
            destination,
            sample_rate: DEFAULT_SAMPLE_RATE,
            elapsed: 0.0,
            device: Rc::new(DeviceShared {
                state: Property::new(state),
                gestures: Emitter::new(),
                behavior: RefCell::new(ResumeBehavior::default()),
                pending: RefCell::new(VecDeque::new()),
                resume_requests: Cell::new(0),
            }),
        }
    }

    /// Set the rate at which automation is stepped. Affects gain stages
    /// created afterwards.
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Handle for driving the simulated device.
    pub fn controller(&self) -> DeviceController {
        DeviceController {
            shared: Rc::clone(&self.device),
        }
    }

    /// Topology built so far.
    pub fn graph(&self) -> &AudioGraph {
        &self.graph
    }

    /// Automation sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds of simulated time since creation.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Advance simulated time, moving every in-flight ramp.
    pub fn advance(&mut self, seconds: f32) {
        for param in self.gains.values_mut() {
            param.advance_seconds(seconds);
        }
        self.elapsed += f64::from(seconds.max(0.0));
    }

    /// Finish every in-flight ramp immediately.
    pub fn settle(&mut self) {
        for param in self.gains.values_mut() {
            param.snap_to_target();
        }
    }

    /// Whether every gain stage has reached its target.
    pub fn is_settled(&self) -> bool {
        self.gains.values().all(AutomatedParam::is_settled)
    }

    /// Shape of the transition most recently scheduled on a gain stage.
    pub fn ramp_shape(&self, node: NodeId) -> Result<RampShape> {
        Ok(self.gain(node)?.shape())
    }

    /// Settings a compressor was created with.
    pub fn compressor_settings(&self, node: NodeId) -> Option<&CompressorSettings> {
        self.compressors.get(&node)
    }

    fn add(&mut self, kind: NodeKind) -> NodeId {
        self.graph.add_node(kind)
    }

    fn check_gain(&self, node: NodeId) -> Result<()> {
        match self.graph.kind(node) {
            None => Err(BackendError::UnknownNode(node)),
            Some(NodeKind::Gain) => Ok(()),
            Some(kind) => Err(BackendError::NotAGain {
                node,
                kind: kind.label(),
            }),
        }
    }

    fn gain(&self, node: NodeId) -> Result<&AutomatedParam> {
        self.check_gain(node)?;
        self.gains.get(&node).ok_or(BackendError::UnknownNode(node))
    }

    fn gain_mut(&mut self, node: NodeId) -> Result<&mut AutomatedParam> {
        self.check_gain(node)?;
        self.gains
            .get_mut(&node)
            .ok_or(BackendError::UnknownNode(node))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .field("sample_rate", &self.sample_rate)
            .field("elapsed", &self.elapsed)
            .field("device_state", &self.device.state.get())
            .finish_non_exhaustive()
    }
}

impl AudioBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_gain(&mut self, initial: f32) -> Result<NodeId> {
        let id = self.add(NodeKind::Gain);
        self.gains
            .insert(id, AutomatedParam::new(initial, self.sample_rate));
        Ok(id)
    }

    fn create_convolver(&mut self) -> Result<NodeId> {
        Ok(self.add(NodeKind::Convolver))
    }

    fn create_compressor(&mut self, settings: &CompressorSettings) -> Result<NodeId> {
        let id = self.add(NodeKind::Compressor);
        self.compressors.insert(id, *settings);
        Ok(id)
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.graph.connect(from, to)?;
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.graph.disconnect(from, to)?;
        Ok(())
    }

    fn set_value_at_time(&mut self, node: NodeId, value: f32) -> Result<()> {
        self.gain_mut(node)?.set_value(value);
        Ok(())
    }

    fn linear_ramp_to(&mut self, node: NodeId, target: f32, duration: f32) -> Result<()> {
        self.gain_mut(node)?.linear_ramp_to(target, duration);
        Ok(())
    }

    fn set_target_at_time(
        &mut self,
        node: NodeId,
        target: f32,
        time_constant: f32,
    ) -> Result<()> {
        self.gain_mut(node)?.set_target_at_time(target, time_constant);
        Ok(())
    }

    fn gain_target(&self, node: NodeId) -> Result<f32> {
        Ok(self.gain(node)?.target())
    }

    fn gain_value(&self, node: NodeId) -> Result<f32> {
        Ok(self.gain(node)?.value())
    }

    fn device_state(&self) -> Property<DeviceState> {
        self.device.state.clone()
    }

    fn user_gestures(&self) -> Emitter<UserGesture> {
        self.device.gestures.clone()
    }

    fn resume(&mut self, on_complete: ResumeCallback) {
        let device = &self.device;
        device.resume_requests.set(device.resume_requests.get() + 1);

        if device.state.get() == DeviceState::Closed {
            on_complete(Err(BackendError::DeviceClosed));
            return;
        }

        let behavior = device.behavior.borrow().clone();
        match behavior {
            ResumeBehavior::Succeed => {
                device.state.set(DeviceState::Running);
                on_complete(Ok(()));
            }
            ResumeBehavior::Fail(reason) => on_complete(Err(BackendError::ResumeFailed(reason))),
            ResumeBehavior::Defer => device.pending.borrow_mut().push_back(on_complete),
        }
    }
}
