//! Opaque audio backend abstraction.
//!
//! The engine never talks to an audio API directly. Everything it needs from
//! the platform goes through the [`AudioBackend`] trait: creating gain,
//! convolution and compression stages, wiring them together, automating gain
//! values, observing the device state, and asking a suspended device to
//! resume.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │          SoundManager            │
//! │ (registry, mixer, ducking, ...)  │
//! └──────────────┬───────────────────┘
//!                │ uses AudioBackend trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! │ create_* / connect / automation  │
//! │ device_state / gestures / resume │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │MemoryBackend│  │  platform   │
//! │(simulation) │  │  backends   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Device state and user gestures are exposed as shared observable handles
//! ([`Property`] and [`Emitter`]) rather than methods, so the engine can
//! subscribe once and be notified without holding a borrow of the backend.

use std::fmt;

use sonance_config::CompressorSettings;
use sonance_core::{Emitter, NodeId, Property};

use crate::Result;

/// Lifecycle state of the underlying audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceState {
    /// Not producing output; typically waiting for a user gesture.
    #[default]
    Suspended,
    /// Paused by the platform (e.g. an incoming call or a lost audio session).
    Interrupted,
    /// Producing output.
    Running,
    /// Shut down permanently. A closed device is never resumed.
    Closed,
}

impl DeviceState {
    /// Whether the device is producing output.
    pub fn is_running(self) -> bool {
        self == DeviceState::Running
    }

    /// Whether a resume request can bring the device back to [`DeviceState::Running`].
    pub fn is_resumable(self) -> bool {
        matches!(self, DeviceState::Suspended | DeviceState::Interrupted)
    }

    /// Lowercase name used in logs and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            DeviceState::Suspended => "suspended",
            DeviceState::Interrupted => "interrupted",
            DeviceState::Running => "running",
            DeviceState::Closed => "closed",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A user interaction that platforms accept as permission to start audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserGesture {
    /// Mouse button or pen press.
    PointerDown,
    /// Touch start or end.
    Touch,
    /// Key press.
    KeyDown,
}

impl UserGesture {
    /// Lowercase name used in logs and CLI output.
    pub fn label(self) -> &'static str {
        match self {
            UserGesture::PointerDown => "pointer-down",
            UserGesture::Touch => "touch",
            UserGesture::KeyDown => "key-down",
        }
    }
}

impl fmt::Display for UserGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Completion callback for [`AudioBackend::resume`].
///
/// Invoked exactly once, either synchronously from inside `resume` or later
/// when the platform reports the outcome.
pub type ResumeCallback = Box<dyn FnOnce(Result<()>)>;

/// Audio backend trait.
///
/// Node handles are [`NodeId`]s allocated by the backend. Gain automation
/// follows the usual scheduling vocabulary: an immediate value, a linear ramp
/// over a duration, or an exponential approach with a time constant. A new
/// automation call always starts from the value in flight at that moment.
///
/// ## Implementing a Custom Backend
///
/// ```rust,ignore
/// use sonance_io::{AudioBackend, DeviceState, ResumeCallback, Result, UserGesture};
/// use sonance_core::{Emitter, NodeId, Property};
/// use sonance_config::CompressorSettings;
///
/// struct PlatformBackend { /* ... */ }
///
/// impl AudioBackend for PlatformBackend {
///     fn name(&self) -> &str { "platform" }
///     fn create_gain(&mut self, initial: f32) -> Result<NodeId> { todo!() }
///     fn create_convolver(&mut self) -> Result<NodeId> { todo!() }
///     fn create_compressor(&mut self, settings: &CompressorSettings) -> Result<NodeId> { todo!() }
///     fn destination(&self) -> NodeId { todo!() }
///     // connect / disconnect / automation / device state / resume ...
/// }
/// ```
pub trait AudioBackend {
    /// Human-readable name of this backend (e.g. "memory").
    fn name(&self) -> &str;

    /// Create a gain stage with the given initial value.
    fn create_gain(&mut self, initial: f32) -> Result<NodeId>;

    /// Create a convolution reverb stage.
    fn create_convolver(&mut self) -> Result<NodeId>;

    /// Create a dynamics compressor with fixed settings.
    fn create_compressor(&mut self, settings: &CompressorSettings) -> Result<NodeId>;

    /// The device output node. Always present; it has no outputs.
    fn destination(&self) -> NodeId;

    /// Route the output of `from` into the input of `to`.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()>;

    /// Remove the route from `from` to `to`.
    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<()>;

    /// Set a gain value immediately, cancelling any ramp in flight.
    fn set_value_at_time(&mut self, node: NodeId, value: f32) -> Result<()>;

    /// Ramp a gain linearly to `target` over `duration` seconds.
    fn linear_ramp_to(&mut self, node: NodeId, target: f32, duration: f32) -> Result<()>;

    /// Approach `target` exponentially with the given time constant in seconds.
    fn set_target_at_time(&mut self, node: NodeId, target: f32, time_constant: f32)
    -> Result<()>;

    /// Value the gain stage is heading towards.
    fn gain_target(&self, node: NodeId) -> Result<f32>;

    /// Value the gain stage has at the current moment.
    fn gain_value(&self, node: NodeId) -> Result<f32>;

    /// Observable device state. The returned handle shares state with the
    /// backend; subscribing to it observes every transition.
    fn device_state(&self) -> Property<DeviceState>;

    /// Stream of user gestures that may be used to resume the device.
    fn user_gestures(&self) -> Emitter<UserGesture>;

    /// Ask the device to resume. `on_complete` reports the outcome.
    fn resume(&mut self, on_complete: ResumeCallback);
}
