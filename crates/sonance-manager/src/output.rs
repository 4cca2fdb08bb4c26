//! Output enable gating.
//!
//! The main gain stage is audible only while every enable input agrees:
//!
//! ```text
//! fully_enabled = enabled && audio_enabled && construction_complete
//!                 && visible && active && !restoring_state
//! main_gain     = fully_enabled ? user_level : 0
//! ```

use sonance_core::{ListenerId, Property};

/// Boolean inputs supplied by the host application.
///
/// Each field is a shared [`Property`]; the host keeps its own clones and sets
/// them as its state changes.
#[derive(Debug, Clone)]
pub struct OutputSignals {
    /// Application construction has finished.
    pub construction_complete: Property<bool>,
    /// The user has audio turned on.
    pub audio_enabled: Property<bool>,
    /// The application is visible.
    pub visible: Property<bool>,
    /// The application is active (focused, not paused).
    pub active: Property<bool>,
    /// A saved state is being restored; output is muted meanwhile.
    pub restoring_state: Property<bool>,
}

impl OutputSignals {
    /// Signals in their "audible" state.
    pub fn new() -> Self {
        Self {
            construction_complete: Property::new(true),
            audio_enabled: Property::new(true),
            visible: Property::new(true),
            active: Property::new(true),
            restoring_state: Property::new(false),
        }
    }

    /// Every signal with its name, in a fixed order.
    pub fn named(&self) -> [(&'static str, &Property<bool>); 5] {
        [
            ("construction_complete", &self.construction_complete),
            ("audio_enabled", &self.audio_enabled),
            ("visible", &self.visible),
            ("active", &self.active),
            ("restoring_state", &self.restoring_state),
        ]
    }
}

impl Default for OutputSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Combines the enable inputs and the user level into the main gain target.
pub(crate) struct OutputController {
    enabled: Property<bool>,
    signals: Option<OutputSignals>,
    user_level: f32,
    links: Vec<(Property<bool>, ListenerId)>,
}

impl OutputController {
    pub fn new() -> Self {
        Self {
            enabled: Property::new(true),
            signals: None,
            user_level: 1.0,
            links: Vec::new(),
        }
    }

    pub fn enabled(&self) -> &Property<bool> {
        &self.enabled
    }

    pub fn attach(&mut self, signals: OutputSignals) {
        self.signals = Some(signals);
    }

    pub fn detach(&mut self) {
        self.signals = None;
    }

    /// Records a subscription so it can be released on drop.
    pub fn track_link(&mut self, property: Property<bool>, id: ListenerId) {
        self.links.push((property, id));
    }

    pub fn take_links(&mut self) -> Vec<(Property<bool>, ListenerId)> {
        std::mem::take(&mut self.links)
    }

    pub fn user_level(&self) -> f32 {
        self.user_level
    }

    pub fn set_user_level(&mut self, level: f32) {
        self.user_level = level;
    }

    /// `false` until signals are attached.
    pub fn fully_enabled(&self) -> bool {
        let Some(signals) = &self.signals else {
            return false;
        };
        self.enabled.get()
            && signals.audio_enabled.get()
            && signals.construction_complete.get()
            && signals.visible.get()
            && signals.active.get()
            && !signals.restoring_state.get()
    }

    pub fn main_target(&self) -> f32 {
        if self.fully_enabled() {
            self.user_level
        } else {
            0.0
        }
    }
}
