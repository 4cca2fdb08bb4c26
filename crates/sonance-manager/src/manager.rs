//! The [`SoundManager`] facade.
//!
//! All state lives behind one `Rc`. Listeners registered on host properties,
//! on the backend's device state and on its gesture stream capture a `Weak`
//! handle, so dropping the manager ends every reaction. No state borrow is
//! held while calling into a source or the alert handler. Resume results are
//! queued and handled only once the backend is no longer borrowed, so a
//! backend may complete [`AudioBackend::resume`] synchronously and the alert
//! handler may call back into the manager.

use std::cell::{RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use sonance_config::SoundConfig;
use sonance_core::level::is_valid_level;
use sonance_core::{ListenerId, NodeId, Property};
use sonance_io::{AudioBackend, BackendError, DeviceState, ResumeCallback, SoundSource, UserGesture};

use crate::device::{DeviceMonitor, GestureAction, ResumeArm};
use crate::ducking::DuckingAggregator;
use crate::error::{Result, SoundManagerError};
use crate::mixer::Mixer;
use crate::output::{OutputController, OutputSignals};
use crate::registry::{Registration, Registry, SonificationLevel, SoundGeneratorOptions, SourceKey};
use crate::topology::{EngineNodes, TopologySnapshot};

/// Called when the device refuses to resume. Only invoked in debug builds.
pub type AlertHandler = Rc<dyn Fn(&BackendError)>;

struct EngineState {
    config: SoundConfig,
    nodes: Option<EngineNodes>,
    registry: Registry,
    output: OutputController,
    ducking: DuckingAggregator,
    mixer: Mixer,
    device: Option<DeviceMonitor>,
    sonification: Property<SonificationLevel>,
    sonification_link: Option<ListenerId>,
    alert: Option<AlertHandler>,
}

impl EngineState {
    fn new() -> Self {
        let config = SoundConfig::default();
        let mixer = Mixer::new(config.reverb_level);
        Self {
            config,
            nodes: None,
            registry: Registry::default(),
            output: OutputController::new(),
            ducking: DuckingAggregator::new(),
            mixer,
            device: None,
            sonification: Property::new(SonificationLevel::default()),
            sonification_link: None,
            alert: None,
        }
    }
}

struct Shared<B> {
    backend: RefCell<B>,
    state: RefCell<EngineState>,
    resumes: RefCell<VecDeque<sonance_io::Result<()>>>,
}

/// Sound output engine.
///
/// Owns the backend and the signal graph built on it, gates the main output
/// on the host's enable signals, aggregates ducking conditions, mixes
/// categories and reverb, and keeps the audio device running.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use sonance_config::SoundConfig;
/// use sonance_core::Property;
/// use sonance_io::{MemoryBackend, RecordingSource, SoundSource};
/// use sonance_manager::{OutputSignals, SoundGeneratorOptions, SoundManager};
///
/// let manager = SoundManager::new(MemoryBackend::new());
/// manager.initialize(OutputSignals::new(), SoundConfig::default()).unwrap();
///
/// let click: Rc<dyn SoundSource> = Rc::new(RecordingSource::new("click"));
/// manager
///     .add_sound_generator(&click, SoundGeneratorOptions::new().with_category("user-interface"))
///     .unwrap();
/// assert!(manager.has_sound_generator(&click));
///
/// let dialog_open = Property::new(false);
/// manager.add_ducking_property(&dialog_open).unwrap();
/// dialog_open.set(true);
/// assert!(manager.is_ducking());
/// ```
pub struct SoundManager<B: AudioBackend + 'static> {
    shared: Rc<Shared<B>>,
}

impl<B: AudioBackend + 'static> SoundManager<B> {
    /// Wrap a backend. Nothing is built until [`initialize`](Self::initialize).
    pub fn new(backend: B) -> Self {
        let shared = Rc::new(Shared {
            backend: RefCell::new(backend),
            state: RefCell::new(EngineState::new()),
            resumes: RefCell::new(VecDeque::new()),
        });

        let sonification = shared.state.borrow().sonification.clone();
        let weak = Rc::downgrade(&shared);
        let link = sonification.lazy_link(move |level, _| {
            if let Some(shared) = weak.upgrade() {
                Self::gate_extra_sources(&shared, *level);
            }
        });
        shared.state.borrow_mut().sonification_link = Some(link);

        Self { shared }
    }

    // --- Lifecycle ---

    /// Build the signal graph, register queued sources, and start watching
    /// the audio device.
    ///
    /// May be called once. The configuration is validated before any node
    /// is created.
    pub fn initialize(&self, signals: OutputSignals, config: SoundConfig) -> Result<()> {
        if self.is_initialized() {
            return Err(reported(SoundManagerError::AlreadyInitialized));
        }
        if let Err(e) = config.validate() {
            return Err(reported(SoundManagerError::InvalidConfig(e.into())));
        }

        let mut backend = self.backend_mut()?;
        let (main_initial, ducking_initial) = {
            let mut st = self.shared.state.borrow_mut();
            st.output.attach(signals.clone());
            let ducking = if st.ducking.is_active() {
                config.ducking.level
            } else {
                1.0
            };
            (st.output.main_target(), ducking)
        };

        let built = build_graph(&mut *backend, &config, main_initial, ducking_initial);
        drop(backend);
        let (nodes, categories) = match built {
            Ok(built) => built,
            Err(e) => {
                self.shared.state.borrow_mut().output.detach();
                return Err(reported(e.into()));
            }
        };

        {
            let mut st = self.shared.state.borrow_mut();
            st.mixer = Mixer::new(config.reverb_level);
            for (name, node) in &categories {
                st.mixer.add_category(name, *node);
            }
            st.nodes = Some(nodes);
            st.config = config;
        }

        self.link_output_signals(&signals);
        let queued = self.flush_pending();
        self.start_device_monitor();

        tracing::info!(
            "sound manager initialized: {} categories, {queued} queued sound generators",
            categories.len()
        );
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.shared.state.borrow().nodes.is_some()
    }

    // --- Registry ---

    /// Register a source.
    ///
    /// Before initialization the source is queued and connected once the
    /// graph exists. Afterwards it is connected immediately: to its
    /// category's gain stage, or to the reverb and dry paths when it has no
    /// category.
    pub fn add_sound_generator(
        &self,
        source: &Rc<dyn SoundSource>,
        options: SoundGeneratorOptions,
    ) -> Result<()> {
        let nodes = self.shared.state.borrow().nodes;
        let Some(nodes) = nodes else {
            tracing::debug!("sound generator queued until initialization");
            self.shared
                .state
                .borrow_mut()
                .registry
                .queue(SourceKey::of(source), Registration::new(source, options));
            return Ok(());
        };
        Self::register_live(&self.shared, nodes, source, options).map_err(reported)
    }

    /// Unregister a source and disconnect it from every engine stage it
    /// feeds. Before initialization, drops all of its queued entries.
    pub fn remove_sound_generator(&self, source: &Rc<dyn SoundSource>) -> Result<()> {
        let key = SourceKey::of(source);
        let candidates: Vec<NodeId> = {
            let mut st = self.shared.state.borrow_mut();
            let Some(nodes) = st.nodes else {
                if st.registry.remove_pending(key) == 0 {
                    return Err(reported(SoundManagerError::NotRegistered));
                }
                return Ok(());
            };
            if st.registry.remove_active(key).is_none() {
                return Err(reported(SoundManagerError::NotRegistered));
            }
            st.mixer
                .categories()
                .iter()
                .map(|c| c.node)
                .chain(nodes.source_inputs())
                .collect()
        };

        for node in candidates {
            if source.is_connected_to(node) {
                source.disconnect(node);
            }
        }
        tracing::debug!("sound generator removed");
        Ok(())
    }

    /// Whether the source is registered. Queued sources do not count.
    pub fn has_sound_generator(&self, source: &Rc<dyn SoundSource>) -> bool {
        self.shared
            .state
            .borrow()
            .registry
            .is_active(SourceKey::of(source))
    }

    /// Number of registered sources.
    pub fn sound_generator_count(&self) -> usize {
        self.shared.state.borrow().registry.active_count()
    }

    /// Number of sources waiting for initialization.
    pub fn pending_count(&self) -> usize {
        self.shared.state.borrow().registry.pending_count()
    }

    /// Category names in configuration order. Empty before initialization.
    pub fn category_names(&self) -> Vec<String> {
        self.shared
            .state
            .borrow()
            .mixer
            .categories()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    // --- Output gating ---

    /// Set the user's output level. Ignored (with a warning) before
    /// initialization.
    pub fn set_main_output_level(&self, level: f32) -> Result<()> {
        check_level("main output level", level)?;
        let audible = {
            let mut st = self.shared.state.borrow_mut();
            if st.nodes.is_none() {
                tracing::warn!("set_main_output_level({level}) before initialization; ignored");
                return Ok(());
            }
            st.output.set_user_level(level);
            st.output.fully_enabled()
        };
        if audible {
            Self::apply_main_gain(&self.shared);
        }
        Ok(())
    }

    /// The user's output level (not the gated gain).
    pub fn main_output_level(&self) -> f32 {
        self.shared.state.borrow().output.user_level()
    }

    /// Engine-owned enable switch.
    pub fn enabled(&self) -> bool {
        self.shared.state.borrow().output.enabled().get()
    }

    /// Turn the engine-owned enable switch on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled_property().set(enabled);
    }

    /// Shared handle to the engine-owned enable switch.
    pub fn enabled_property(&self) -> Property<bool> {
        self.shared.state.borrow().output.enabled().clone()
    }

    /// Whether every enable input currently allows output.
    pub fn is_fully_enabled(&self) -> bool {
        self.shared.state.borrow().output.fully_enabled()
    }

    // --- Sonification ---

    /// Current sonification tier.
    pub fn sonification_level(&self) -> SonificationLevel {
        self.shared.state.borrow().sonification.get()
    }

    /// Change the sonification tier, gating every extra-tier source.
    pub fn set_sonification_level(&self, level: SonificationLevel) {
        self.sonification_level_property().set(level);
    }

    /// Shared handle to the sonification tier.
    pub fn sonification_level_property(&self) -> Property<SonificationLevel> {
        self.shared.state.borrow().sonification.clone()
    }

    // --- Mixer ---

    /// Set a category's gain immediately. Ignored (with a warning) before
    /// initialization.
    pub fn set_output_level_for_category(&self, name: &str, level: f32) -> Result<()> {
        check_level("category level", level)?;
        {
            let st = self.shared.state.borrow();
            if st.nodes.is_none() {
                tracing::warn!(
                    "set_output_level_for_category('{name}', {level}) before initialization; ignored"
                );
                return Ok(());
            }
            if st.mixer.category(name).is_none() {
                return Err(reported(SoundManagerError::UnknownCategory(name.to_string())));
            }
        }

        let mut backend = self.backend_mut()?;
        let node = {
            let mut st = self.shared.state.borrow_mut();
            let Some(stage) = st.mixer.category_mut(name) else {
                return Err(reported(SoundManagerError::UnknownCategory(name.to_string())));
            };
            stage.level = level;
            stage.node
        };
        backend
            .set_value_at_time(node, level)
            .map_err(|e| reported(e.into()))?;
        tracing::debug!("category '{name}' level {level}");
        Ok(())
    }

    /// A category's current level.
    pub fn output_level_for_category(&self, name: &str) -> Result<f32> {
        self.shared
            .state
            .borrow()
            .mixer
            .category(name)
            .map(|c| c.level)
            .ok_or_else(|| SoundManagerError::UnknownCategory(name.to_string()))
    }

    /// Ramp the reverb blend to `level` wet and `1 - level` dry. Ignored
    /// (with a warning) before initialization.
    pub fn set_reverb_level(&self, level: f32) -> Result<()> {
        check_level("reverb level", level)?;
        let (nodes, ramp) = {
            let st = self.shared.state.borrow();
            let Some(nodes) = st.nodes else {
                tracing::warn!("set_reverb_level({level}) before initialization; ignored");
                return Ok(());
            };
            (nodes, st.config.gain_ramp_time)
        };

        let mut backend = self.backend_mut()?;
        let change = self.shared.state.borrow_mut().mixer.set_reverb_level(level);
        let Some((wet, dry)) = change else {
            return Ok(());
        };
        backend
            .linear_ramp_to(nodes.wet, wet, ramp)
            .map_err(|e| reported(e.into()))?;
        backend
            .linear_ramp_to(nodes.dry, dry, ramp)
            .map_err(|e| reported(e.into()))?;
        tracing::debug!("reverb level {level} (wet {wet}, dry {dry})");
        Ok(())
    }

    /// Current reverb level.
    pub fn reverb_level(&self) -> f32 {
        self.shared.state.borrow().mixer.reverb_level()
    }

    // --- Ducking ---

    /// Add a condition that ducks the output while it is `true`.
    ///
    /// Conditions may be added before initialization; the aggregate is
    /// applied once the ducking stage exists.
    pub fn add_ducking_property(&self, property: &Property<bool>) -> Result<()> {
        if self.shared.state.borrow().ducking.contains(property) {
            return Err(reported(SoundManagerError::DuplicateDuckingProperty));
        }

        let weak = Rc::downgrade(&self.shared);
        let listener = property.lazy_link(move |_, _| {
            if let Some(shared) = weak.upgrade() {
                Self::on_ducking_input(&shared);
            }
        });
        self.shared
            .state
            .borrow_mut()
            .ducking
            .insert(property.clone(), listener);

        Self::on_ducking_input(&self.shared);
        Ok(())
    }

    /// Remove a ducking condition and its subscription.
    pub fn remove_ducking_property(&self, property: &Property<bool>) -> Result<()> {
        let removed = self.shared.state.borrow_mut().ducking.remove(property);
        let Some((property, listener)) = removed else {
            return Err(reported(SoundManagerError::NotPresent));
        };
        property.unlink(listener);

        Self::on_ducking_input(&self.shared);
        Ok(())
    }

    /// Whether any ducking condition is `true`.
    pub fn is_ducking(&self) -> bool {
        self.shared.state.borrow().ducking.is_active()
    }

    /// Number of ducking conditions.
    pub fn ducking_property_count(&self) -> usize {
        self.shared.state.borrow().ducking.len()
    }

    // --- Device ---

    /// Whether a gesture listener is waiting to resume the device.
    pub fn is_resume_armed(&self) -> bool {
        self.resume_arm() != ResumeArm::Disarmed
    }

    /// Resume arming state.
    pub fn resume_arm(&self) -> ResumeArm {
        self.shared
            .state
            .borrow()
            .device
            .as_ref()
            .map_or(ResumeArm::Disarmed, DeviceMonitor::arm)
    }

    /// Install a handler for resume failures. Only called in debug builds.
    pub fn set_alert_handler(&self, handler: impl Fn(&BackendError) + 'static) {
        self.shared.state.borrow_mut().alert = Some(Rc::new(handler));
    }

    // --- Introspection ---

    /// Node ids of every stage, or `None` before initialization.
    pub fn topology(&self) -> Option<TopologySnapshot> {
        let st = self.shared.state.borrow();
        st.nodes.map(|nodes| nodes.snapshot(st.mixer.categories()))
    }

    /// Configuration in effect (defaults before initialization).
    pub fn config(&self) -> SoundConfig {
        self.shared.state.borrow().config.clone()
    }

    /// Run `f` with mutable access to the backend.
    ///
    /// Engine inputs (properties, gestures) must not be changed from inside
    /// `f`; reactions that need the backend are dropped with an error log
    /// while it is borrowed. Resume results delivered by `f` are handled
    /// after it returns.
    ///
    /// # Panics
    ///
    /// Panics if called from inside another `with_backend` closure.
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        let out = f(&mut *self.shared.backend.borrow_mut());
        Self::finish_resumes(&self.shared);
        out
    }

    // --- Internals ---

    fn backend_mut(&self) -> Result<RefMut<'_, B>> {
        self.shared
            .backend
            .try_borrow_mut()
            .map_err(|_| reported(SoundManagerError::BackendBusy))
    }

    fn register_live(
        shared: &Shared<B>,
        nodes: EngineNodes,
        source: &Rc<dyn SoundSource>,
        options: SoundGeneratorOptions,
    ) -> Result<()> {
        let key = SourceKey::of(source);
        let (targets, gate) = {
            let st = shared.state.borrow();
            if st.registry.is_active(key) {
                return Err(SoundManagerError::DuplicateRegistration);
            }
            let targets: Vec<NodeId> = match &options.category {
                None => nodes.source_inputs().to_vec(),
                Some(name) => {
                    let stage = st
                        .mixer
                        .category(name)
                        .ok_or_else(|| SoundManagerError::UnknownCategory(name.clone()))?;
                    vec![stage.node]
                }
            };
            let gate = (options.sonification_level == SonificationLevel::Extra)
                .then(|| st.sonification.get() == SonificationLevel::Extra);
            (targets, gate)
        };

        for node in &targets {
            source.connect(*node);
        }
        if let Some(enabled) = gate {
            source.set_sonification_enabled(enabled);
        }

        tracing::debug!(
            "sound generator registered ({})",
            options.category.as_deref().unwrap_or("uncategorized")
        );
        shared
            .state
            .borrow_mut()
            .registry
            .insert_active(key, Registration::new(source, options));
        Ok(())
    }

    /// Registers every queued source in insertion order. Returns how many
    /// were registered.
    fn flush_pending(&self) -> usize {
        let (pending, nodes) = {
            let mut st = self.shared.state.borrow_mut();
            (st.registry.drain_pending(), st.nodes)
        };
        let Some(nodes) = nodes else {
            return 0;
        };

        let mut registered = 0;
        for registration in pending {
            let Some(source) = registration.source.upgrade() else {
                tracing::debug!("queued sound generator was dropped before initialization");
                continue;
            };
            match Self::register_live(&self.shared, nodes, &source, registration.options) {
                Ok(()) => registered += 1,
                Err(e) => tracing::error!("queued sound generator not registered: {e}"),
            }
        }
        registered
    }

    fn link_output_signals(&self, signals: &OutputSignals) {
        let enabled = self.enabled_property();
        let mut inputs: Vec<(&'static str, Property<bool>)> = vec![("enabled", enabled)];
        inputs.extend(signals.named().map(|(name, p)| (name, p.clone())));

        for (name, property) in inputs {
            let weak = Rc::downgrade(&self.shared);
            let id = property.lazy_link(move |new, _| {
                tracing::debug!("output input '{name}' → {new}");
                if let Some(shared) = weak.upgrade() {
                    Self::apply_main_gain(&shared);
                }
            });
            self.shared
                .state
                .borrow_mut()
                .output
                .track_link(property, id);
        }
    }

    fn apply_main_gain(shared: &Shared<B>) {
        let (node, target, ramp) = {
            let st = shared.state.borrow();
            let Some(nodes) = st.nodes else {
                return;
            };
            (nodes.main, st.output.main_target(), st.config.gain_ramp_time)
        };
        Self::drive(shared, "main gain", |b| b.linear_ramp_to(node, target, ramp));
    }

    fn on_ducking_input(shared: &Shared<B>) {
        let change = shared.state.borrow_mut().ducking.recompute();
        if let Some(active) = change {
            Self::apply_ducking(shared, active);
        }
    }

    fn apply_ducking(shared: &Shared<B>, active: bool) {
        let (node, settings) = {
            let st = shared.state.borrow();
            let Some(nodes) = st.nodes else {
                tracing::debug!("ducking {active} recorded; applied at initialization");
                return;
            };
            (nodes.ducking, st.config.ducking)
        };

        let (target, time_constant) = if active {
            tracing::debug!("ducking engaged");
            (settings.level, settings.engage_time_constant)
        } else {
            tracing::debug!("ducking released");
            (1.0, settings.release_time_constant)
        };
        Self::drive(shared, "ducking gain", |b| {
            b.set_target_at_time(node, target, time_constant)
        });
    }

    fn gate_extra_sources(shared: &Shared<B>, level: SonificationLevel) {
        let sources = shared.state.borrow().registry.extra_sources();
        tracing::debug!("sonification level {level}; gating {} sources", sources.len());
        for source in sources {
            source.set_sonification_enabled(level == SonificationLevel::Extra);
        }
    }

    /// Applies a listener-driven change to the backend, logging failures.
    fn drive(
        shared: &Shared<B>,
        what: &str,
        op: impl FnOnce(&mut B) -> sonance_io::Result<()>,
    ) {
        let Ok(mut backend) = shared.backend.try_borrow_mut() else {
            tracing::error!("{what}: backend is borrowed; change dropped");
            return;
        };
        if let Err(e) = op(&mut *backend) {
            tracing::error!("{what}: {e}");
        }
    }

    fn start_device_monitor(&self) {
        let (state, gestures) = {
            let backend = self.shared.backend.borrow();
            (backend.device_state(), backend.user_gestures())
        };

        let weak = Rc::downgrade(&self.shared);
        let listener = state.lazy_link(move |new, old| {
            if let Some(shared) = weak.upgrade() {
                Self::on_device_state(&shared, *new, *old);
            }
        });

        let initial = state.get();
        let mut monitor = DeviceMonitor::new(state, gestures);
        monitor.set_state_listener(listener);
        self.shared.state.borrow_mut().device = Some(monitor);

        tracing::info!("audio device {initial} at initialization");
        if initial == DeviceState::Closed {
            tracing::warn!("audio device is closed and will not be resumed");
        }
        Self::arm_if_needed(&self.shared);
    }

    fn on_device_state(shared: &Rc<Shared<B>>, new: DeviceState, old: DeviceState) {
        match new {
            DeviceState::Running => tracing::info!("audio device running (was {old})"),
            DeviceState::Suspended | DeviceState::Interrupted => {
                tracing::info!("audio device {new} (was {old})");
                Self::arm_if_needed(shared);
            }
            DeviceState::Closed => {
                tracing::warn!("audio device closed; it will not be resumed");
                Self::disarm(shared);
            }
        }
    }

    fn arm_if_needed(shared: &Rc<Shared<B>>) {
        let gestures = {
            let st = shared.state.borrow();
            match &st.device {
                Some(device) if device.should_arm() => device.gestures().clone(),
                _ => return,
            }
        };

        let weak = Rc::downgrade(shared);
        let id = gestures.add_listener(move |gesture| {
            if let Some(shared) = weak.upgrade() {
                Self::on_gesture(&shared, *gesture);
            }
        });
        if let Some(device) = shared.state.borrow_mut().device.as_mut() {
            device.set_armed(id);
        }
        tracing::debug!("resume armed; waiting for a user gesture");
    }

    fn disarm(shared: &Shared<B>) {
        let mut st = shared.state.borrow_mut();
        if let Some(device) = st.device.as_mut()
            && let Some(id) = device.disarm()
        {
            device.gestures().remove_listener(id);
        }
    }

    fn on_gesture(shared: &Rc<Shared<B>>, gesture: UserGesture) {
        let (action, gestures) = {
            let mut st = shared.state.borrow_mut();
            let Some(device) = st.device.as_mut() else {
                return;
            };
            (device.on_gesture(), device.gestures().clone())
        };

        match action {
            GestureAction::Ignore => {}
            GestureAction::Disarm(id) => {
                gestures.remove_listener(id);
                tracing::debug!("{gesture} while running; resume disarmed");
            }
            GestureAction::Resume => {
                tracing::debug!("{gesture}; requesting resume");
                let weak = Rc::downgrade(shared);
                let on_complete: ResumeCallback = Box::new(move |result| {
                    if let Some(shared) = weak.upgrade() {
                        shared.resumes.borrow_mut().push_back(result);
                        Self::finish_resumes(&shared);
                    }
                });
                match shared.backend.try_borrow_mut() {
                    Ok(mut backend) => backend.resume(on_complete),
                    Err(_) => {
                        tracing::error!("backend is borrowed; resume retried on the next gesture");
                        if let Some(device) = shared.state.borrow_mut().device.as_mut() {
                            device.cancel_resume();
                        }
                    }
                }
                Self::finish_resumes(shared);
            }
        }
    }

    /// Handles queued resume results. Does nothing while the backend is
    /// borrowed; the holder of that borrow calls this again on release.
    fn finish_resumes(shared: &Shared<B>) {
        if shared.backend.try_borrow_mut().is_err() {
            return;
        }
        loop {
            let next = shared.resumes.borrow_mut().pop_front();
            let Some(result) = next else {
                break;
            };
            Self::on_resume_complete(shared, result);
        }
    }

    fn on_resume_complete(shared: &Shared<B>, result: sonance_io::Result<()>) {
        let (disarmed, gestures, alert) = {
            let mut st = shared.state.borrow_mut();
            let alert = st.alert.clone();
            let Some(device) = st.device.as_mut() else {
                return;
            };
            (
                device.on_resume_complete(result.is_ok()),
                device.gestures().clone(),
                alert,
            )
        };

        match result {
            Ok(()) => {
                if let Some(id) = disarmed {
                    gestures.remove_listener(id);
                }
                tracing::info!("audio device resumed");
            }
            Err(e) => {
                tracing::error!("audio device failed to resume: {e}");
                if cfg!(debug_assertions)
                    && let Some(alert) = alert
                {
                    alert(&e);
                }
            }
        }
    }
}

impl<B: AudioBackend + 'static> Drop for SoundManager<B> {
    fn drop(&mut self) {
        let Ok(mut st) = self.shared.state.try_borrow_mut() else {
            return;
        };
        for (property, id) in st.output.take_links() {
            property.unlink(id);
        }
        for (property, id) in st.ducking.clear() {
            property.unlink(id);
        }
        if let Some(device) = st.device.as_mut() {
            if let Some(id) = device.take_state_listener() {
                device.state().unlink(id);
            }
            if let Some(id) = device.disarm() {
                device.gestures().remove_listener(id);
            }
        }
        if let Some(id) = st.sonification_link.take() {
            st.sonification.unlink(id);
        }
    }
}

impl<B: AudioBackend + 'static> fmt::Debug for SoundManager<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.shared.state.borrow();
        f.debug_struct("SoundManager")
            .field("initialized", &st.nodes.is_some())
            .field("sound_generators", &st.registry.active_count())
            .field("pending", &st.registry.pending_count())
            .field("ducking", &st.ducking.is_active())
            .field("reverb_level", &st.mixer.reverb_level())
            .finish_non_exhaustive()
    }
}

type BuiltGraph = (EngineNodes, Vec<(String, NodeId)>);

fn build_graph<B: AudioBackend>(
    backend: &mut B,
    config: &SoundConfig,
    main_initial: f32,
    ducking_initial: f32,
) -> sonance_io::Result<BuiltGraph> {
    let nodes = EngineNodes::build(backend, config, main_initial, ducking_initial)?;
    let categories = config
        .categories
        .iter()
        .map(|name| Ok((name.clone(), nodes.build_category(backend, name)?)))
        .collect::<sonance_io::Result<Vec<_>>>()?;
    Ok((nodes, categories))
}

fn check_level(what: &'static str, value: f32) -> Result<()> {
    if is_valid_level(value) {
        Ok(())
    } else {
        Err(reported(SoundManagerError::LevelOutOfRange { what, value }))
    }
}

/// Logs a caller-visible error before it is returned.
fn reported(err: SoundManagerError) -> SoundManagerError {
    tracing::error!("{err}");
    err
}
