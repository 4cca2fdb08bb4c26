//! Suspend/resume handling against the simulated device.

use std::cell::RefCell;
use std::rc::Rc;

use sonance_config::SoundConfig;
use sonance_io::{
    AudioBackend, BackendError, DeviceController, DeviceState, MemoryBackend, ResumeBehavior,
    UserGesture,
};
use sonance_manager::{OutputSignals, ResumeArm, SoundManager, SoundManagerError};

fn start(state: DeviceState) -> (SoundManager<MemoryBackend>, DeviceController) {
    let backend = MemoryBackend::with_state(state);
    let device = backend.controller();
    let manager = SoundManager::new(backend);
    manager
        .initialize(OutputSignals::new(), SoundConfig::default())
        .unwrap();
    (manager, device)
}

fn gesture_listeners(manager: &SoundManager<MemoryBackend>) -> usize {
    manager.with_backend(|b| b.user_gestures().listener_count())
}

#[test]
fn suspended_device_resumes_on_first_gesture() {
    let (manager, device) = start(DeviceState::Suspended);
    assert!(manager.is_resume_armed());
    assert_eq!(gesture_listeners(&manager), 1);

    device.gesture(UserGesture::PointerDown);

    assert_eq!(device.state(), DeviceState::Running);
    assert_eq!(device.resume_requests(), 1);
    assert!(!manager.is_resume_armed());
    assert_eq!(gesture_listeners(&manager), 0);

    // Later gestures are ignored.
    device.gesture(UserGesture::KeyDown);
    assert_eq!(device.resume_requests(), 1);
}

#[test]
fn running_device_is_not_armed() {
    let (manager, device) = start(DeviceState::Running);
    assert_eq!(manager.resume_arm(), ResumeArm::Disarmed);

    device.gesture(UserGesture::Touch);
    assert_eq!(device.resume_requests(), 0);
}

#[test]
fn interruption_arms_again() {
    let (manager, device) = start(DeviceState::Running);

    device.set_state(DeviceState::Interrupted);
    assert!(manager.is_resume_armed());

    device.gesture(UserGesture::Touch);
    assert_eq!(device.state(), DeviceState::Running);
    assert!(!manager.is_resume_armed());

    device.set_state(DeviceState::Suspended);
    assert!(manager.is_resume_armed());
    assert_eq!(gesture_listeners(&manager), 1);
}

#[test]
fn gesture_after_external_recovery_disarms_without_resume() {
    let (manager, device) = start(DeviceState::Suspended);
    device.set_state(DeviceState::Running);
    assert!(manager.is_resume_armed());

    device.gesture(UserGesture::PointerDown);
    assert!(!manager.is_resume_armed());
    assert_eq!(device.resume_requests(), 0);
}

#[test]
fn deferred_resume_is_requested_once() {
    let (manager, device) = start(DeviceState::Suspended);
    device.set_resume_behavior(ResumeBehavior::Defer);

    device.gesture(UserGesture::PointerDown);
    device.gesture(UserGesture::PointerDown);
    assert_eq!(device.resume_requests(), 1);
    assert_eq!(device.pending_resumes(), 1);
    assert!(manager.is_resume_armed());

    assert!(device.complete_resume(Ok(())));
    assert_eq!(device.state(), DeviceState::Running);
    assert!(!manager.is_resume_armed());
}

#[test]
fn failed_resume_stays_armed_and_alerts() {
    let (manager, device) = start(DeviceState::Suspended);
    let alerts = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&alerts);
    manager.set_alert_handler(move |e| sink.borrow_mut().push(e.clone()));
    device.set_resume_behavior(ResumeBehavior::Fail("blocked".into()));

    device.gesture(UserGesture::KeyDown);
    assert!(manager.is_resume_armed());
    assert_eq!(device.state(), DeviceState::Suspended);
    if cfg!(debug_assertions) {
        assert_eq!(
            *alerts.borrow(),
            vec![BackendError::ResumeFailed("blocked".into())]
        );
    }

    // The next gesture retries.
    device.set_resume_behavior(ResumeBehavior::Succeed);
    device.gesture(UserGesture::KeyDown);
    assert_eq!(device.resume_requests(), 2);
    assert!(!manager.is_resume_armed());
}

#[test]
fn alert_handler_can_adjust_levels() {
    let (manager, device) = start(DeviceState::Suspended);
    let manager = Rc::new(manager);
    let weak = Rc::downgrade(&manager);
    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&results);
    manager.set_alert_handler(move |_| {
        if let Some(manager) = weak.upgrade() {
            sink.borrow_mut().push(manager.set_reverb_level(0.0).is_ok());
            sink.borrow_mut().push(
                manager
                    .set_output_level_for_category("user-interface", 0.5)
                    .is_ok(),
            );
        }
    });
    device.set_resume_behavior(ResumeBehavior::Fail("blocked".into()));

    device.gesture(UserGesture::KeyDown);

    assert!(manager.is_resume_armed());
    if cfg!(debug_assertions) {
        assert_eq!(*results.borrow(), vec![true, true]);
        assert_eq!(manager.reverb_level(), 0.0);
        assert_eq!(manager.output_level_for_category("user-interface").unwrap(), 0.5);
    }
}

#[test]
fn resume_completed_inside_backend_access_is_handled_after() {
    let (manager, device) = start(DeviceState::Suspended);
    device.set_resume_behavior(ResumeBehavior::Defer);
    device.gesture(UserGesture::Touch);
    assert_eq!(device.pending_resumes(), 1);

    manager.with_backend(|_| {
        assert!(device.complete_resume(Ok(())));
    });

    assert_eq!(device.state(), DeviceState::Running);
    assert!(!manager.is_resume_armed());
    assert_eq!(gesture_listeners(&manager), 0);
}

#[test]
fn setters_report_busy_backend() {
    let (manager, _device) = start(DeviceState::Running);
    let manager = Rc::new(manager);
    let inner = Rc::clone(&manager);

    manager.with_backend(|_| {
        assert!(matches!(
            inner.set_reverb_level(0.5),
            Err(SoundManagerError::BackendBusy)
        ));
        assert!(matches!(
            inner.set_output_level_for_category("user-interface", 0.5),
            Err(SoundManagerError::BackendBusy)
        ));
    });

    // Rejected changes leave the levels alone.
    assert_eq!(manager.reverb_level(), SoundConfig::default().reverb_level);
    assert_eq!(manager.output_level_for_category("user-interface").unwrap(), 1.0);
}

#[test]
fn deferred_failure_allows_retry() {
    let (manager, device) = start(DeviceState::Interrupted);
    device.set_resume_behavior(ResumeBehavior::Defer);

    device.gesture(UserGesture::Touch);
    device.complete_resume(Err(BackendError::ResumeFailed("busy".into())));
    assert!(manager.is_resume_armed());

    device.gesture(UserGesture::Touch);
    assert_eq!(device.resume_requests(), 2);
    assert_eq!(device.pending_resumes(), 1);
}

#[test]
fn closed_device_is_never_resumed() {
    let (manager, device) = start(DeviceState::Suspended);
    device.set_state(DeviceState::Closed);
    assert!(!manager.is_resume_armed());
    assert_eq!(gesture_listeners(&manager), 0);

    device.gesture(UserGesture::PointerDown);
    assert_eq!(device.resume_requests(), 0);
    assert_eq!(device.state(), DeviceState::Closed);
}

#[test]
fn closed_at_start_is_not_armed() {
    let (manager, device) = start(DeviceState::Closed);
    assert!(!manager.is_resume_armed());
    device.gesture(UserGesture::PointerDown);
    assert_eq!(device.resume_requests(), 0);
}

#[test]
fn no_monitoring_before_initialization() {
    let backend = MemoryBackend::new();
    let device = backend.controller();
    let manager = SoundManager::new(backend);

    assert!(!manager.is_resume_armed());
    device.gesture(UserGesture::PointerDown);
    assert_eq!(device.resume_requests(), 0);
}

#[test]
fn resume_does_not_touch_gains() {
    let (manager, device) = start(DeviceState::Suspended);
    let topology = manager.topology().unwrap();
    manager.set_main_output_level(0.6).unwrap();
    manager.with_backend(|b| b.settle());

    device.gesture(UserGesture::PointerDown);

    manager.with_backend(|b| {
        assert_eq!(b.gain_target(topology.main).unwrap(), 0.6);
        assert_eq!(b.gain_target(topology.ducking).unwrap(), 1.0);
        assert!(b.is_settled());
    });
}
