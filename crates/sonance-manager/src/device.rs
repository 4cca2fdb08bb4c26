//! Device lifecycle monitoring.
//!
//! Platforms start audio devices suspended and only let them run after a user
//! gesture; they may also interrupt a running device at any time. The monitor
//! watches the backend's device state and, whenever the device is not
//! running, keeps a one-shot gesture listener armed that asks the backend to
//! resume.
//!
//! ```text
//!              not running / start
//!   Disarmed ───────────────────────▶ Armed(listener)
//!      ▲                                 │ gesture
//!      │ resume ok, or already running   ▼
//!      └──────────────────────────── resume requested
//!                                        │ resume failed
//!                                        └──▶ stays Armed
//! ```
//!
//! A closed device is terminal and never resumed.

use sonance_core::{Emitter, ListenerId, Property};
use sonance_io::{DeviceState, UserGesture};

/// Whether a gesture listener is waiting to resume the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeArm {
    /// No gesture listener installed.
    #[default]
    Disarmed,
    /// Gesture listener installed under this id.
    Armed(ListenerId),
}

/// What the engine must do in response to a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GestureAction {
    /// Nothing to do.
    Ignore,
    /// The device is already running; remove this gesture listener.
    Disarm(ListenerId),
    /// Ask the backend to resume.
    Resume,
}

pub(crate) struct DeviceMonitor {
    state: Property<DeviceState>,
    gestures: Emitter<UserGesture>,
    state_listener: Option<ListenerId>,
    arm: ResumeArm,
    resume_in_flight: bool,
}

impl DeviceMonitor {
    pub fn new(state: Property<DeviceState>, gestures: Emitter<UserGesture>) -> Self {
        Self {
            state,
            gestures,
            state_listener: None,
            arm: ResumeArm::Disarmed,
            resume_in_flight: false,
        }
    }

    pub fn state(&self) -> &Property<DeviceState> {
        &self.state
    }

    pub fn gestures(&self) -> &Emitter<UserGesture> {
        &self.gestures
    }

    pub fn set_state_listener(&mut self, id: ListenerId) {
        self.state_listener = Some(id);
    }

    pub fn take_state_listener(&mut self) -> Option<ListenerId> {
        self.state_listener.take()
    }

    pub fn arm(&self) -> ResumeArm {
        self.arm
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.arm, ResumeArm::Armed(_))
    }

    /// Whether a gesture listener should be installed now.
    pub fn should_arm(&self) -> bool {
        !self.is_armed() && self.state.get().is_resumable()
    }

    pub fn set_armed(&mut self, id: ListenerId) {
        self.arm = ResumeArm::Armed(id);
    }

    /// Moves to `Disarmed`, returning the listener to remove.
    pub fn disarm(&mut self) -> Option<ListenerId> {
        match std::mem::take(&mut self.arm) {
            ResumeArm::Armed(id) => Some(id),
            ResumeArm::Disarmed => None,
        }
    }

    pub fn on_gesture(&mut self) -> GestureAction {
        let ResumeArm::Armed(id) = self.arm else {
            return GestureAction::Ignore;
        };
        if self.state.get().is_running() {
            self.arm = ResumeArm::Disarmed;
            return GestureAction::Disarm(id);
        }
        if self.resume_in_flight {
            return GestureAction::Ignore;
        }
        self.resume_in_flight = true;
        GestureAction::Resume
    }

    /// Records a resume outcome. On success returns the listener to remove.
    pub fn on_resume_complete(&mut self, succeeded: bool) -> Option<ListenerId> {
        self.resume_in_flight = false;
        if succeeded { self.disarm() } else { None }
    }

    /// Clears the in-flight flag after a resume request could not be issued.
    pub fn cancel_resume(&mut self) {
        self.resume_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(state: DeviceState) -> (DeviceMonitor, Emitter<UserGesture>) {
        let gestures = Emitter::new();
        (DeviceMonitor::new(Property::new(state), gestures.clone()), gestures)
    }

    fn arm(monitor: &mut DeviceMonitor, gestures: &Emitter<UserGesture>) -> ListenerId {
        let id = gestures.add_listener(|_| {});
        monitor.set_armed(id);
        id
    }

    #[test]
    fn arms_only_when_resumable() {
        assert!(monitor(DeviceState::Suspended).0.should_arm());
        assert!(monitor(DeviceState::Interrupted).0.should_arm());
        assert!(!monitor(DeviceState::Running).0.should_arm());
        assert!(!monitor(DeviceState::Closed).0.should_arm());
    }

    #[test]
    fn gesture_requests_single_resume() {
        let (mut monitor, gestures) = monitor(DeviceState::Suspended);
        assert_eq!(monitor.on_gesture(), GestureAction::Ignore);

        let id = arm(&mut monitor, &gestures);
        assert!(!monitor.should_arm());
        assert_eq!(monitor.on_gesture(), GestureAction::Resume);
        assert_eq!(monitor.on_gesture(), GestureAction::Ignore);

        assert_eq!(monitor.on_resume_complete(true), Some(id));
        assert_eq!(monitor.arm(), ResumeArm::Disarmed);
    }

    #[test]
    fn failed_resume_stays_armed() {
        let (mut monitor, gestures) = monitor(DeviceState::Interrupted);
        let id = arm(&mut monitor, &gestures);

        assert_eq!(monitor.on_gesture(), GestureAction::Resume);
        assert_eq!(monitor.on_resume_complete(false), None);
        assert_eq!(monitor.arm(), ResumeArm::Armed(id));
        assert_eq!(monitor.on_gesture(), GestureAction::Resume);
    }

    #[test]
    fn gesture_while_running_disarms() {
        let (mut monitor, gestures) = monitor(DeviceState::Suspended);
        let id = arm(&mut monitor, &gestures);
        monitor.state().set(DeviceState::Running);

        assert_eq!(monitor.on_gesture(), GestureAction::Disarm(id));
        assert!(!monitor.is_armed());
    }
}
