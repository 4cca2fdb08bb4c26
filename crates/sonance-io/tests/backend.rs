//! Integration tests driving [`MemoryBackend`] through the [`AudioBackend`]
//! trait only, the way the engine does.

use std::cell::RefCell;
use std::rc::Rc;

use sonance_config::CompressorSettings;
use sonance_core::{GraphError, NodeId};
use sonance_io::{
    AudioBackend, BackendError, DeviceState, MemoryBackend, ResumeBehavior, UserGesture,
};

/// gain -> compressor -> destination, built generically.
fn build_chain<B: AudioBackend>(backend: &mut B) -> (NodeId, NodeId) {
    let gain = backend.create_gain(1.0).unwrap();
    let compressor = backend
        .create_compressor(&CompressorSettings::default())
        .unwrap();
    let destination = backend.destination();
    backend.connect(gain, compressor).unwrap();
    backend.connect(compressor, destination).unwrap();
    (gain, compressor)
}

#[test]
fn generic_chain_reaches_destination() {
    let mut backend = MemoryBackend::new();
    let (gain, compressor) = build_chain(&mut backend);

    assert_eq!(backend.name(), "memory");
    assert!(backend.graph().can_reach(gain, backend.destination()));
    assert_eq!(
        backend.compressor_settings(compressor),
        Some(&CompressorSettings::default())
    );
}

#[test]
fn invalid_connections_are_reported() {
    let mut backend = MemoryBackend::new();
    let (gain, compressor) = build_chain(&mut backend);
    let destination = backend.destination();

    assert_eq!(
        backend.connect(destination, gain),
        Err(BackendError::Graph(GraphError::InvalidConnection(format!(
            "destination {destination} cannot have outgoing edges"
        ))))
    );
    assert_eq!(
        backend.connect(compressor, gain),
        Err(BackendError::Graph(GraphError::CycleDetected))
    );
    assert!(matches!(
        backend.connect(gain, compressor),
        Err(BackendError::Graph(GraphError::DuplicateEdge(..)))
    ));
}

#[test]
fn automation_on_non_gain_rejected() {
    let mut backend = MemoryBackend::new();
    let (_, compressor) = build_chain(&mut backend);

    assert_eq!(
        backend.set_value_at_time(compressor, 0.5),
        Err(BackendError::NotAGain {
            node: compressor,
            kind: "compressor"
        })
    );
    let missing = NodeId::from_index(42);
    assert_eq!(
        backend.gain_value(missing),
        Err(BackendError::UnknownNode(missing))
    );
}

#[test]
fn linear_ramp_and_approach_timing() {
    let mut backend = MemoryBackend::new();
    let linear = backend.create_gain(1.0).unwrap();
    let approach = backend.create_gain(1.0).unwrap();

    backend.linear_ramp_to(linear, 0.0, 0.1).unwrap();
    backend.set_target_at_time(approach, 0.0, 0.1).unwrap();
    assert_eq!(backend.gain_target(linear).unwrap(), 0.0);

    backend.advance(0.05);
    assert!((backend.gain_value(linear).unwrap() - 0.5).abs() < 0.01);

    backend.advance(0.05);
    assert_eq!(backend.gain_value(linear).unwrap(), 0.0);
    // One time constant covers ~63% of the distance.
    let remaining = backend.gain_value(approach).unwrap();
    assert!((remaining - (-1.0f32).exp()).abs() < 0.01, "got {remaining}");
    assert!(!backend.is_settled());

    backend.settle();
    assert!(backend.is_settled());
    assert_eq!(backend.gain_value(approach).unwrap(), 0.0);
    assert!((backend.elapsed() - 0.1).abs() < 1e-6);
}

#[test]
fn superseding_ramp_starts_from_current_value() {
    let mut backend = MemoryBackend::new();
    let gain = backend.create_gain(0.0).unwrap();

    backend.linear_ramp_to(gain, 1.0, 0.1).unwrap();
    backend.advance(0.05);
    let midway = backend.gain_value(gain).unwrap();

    backend.linear_ramp_to(gain, 0.0, 0.1).unwrap();
    assert_eq!(backend.gain_value(gain).unwrap(), midway);
}

#[test]
fn device_handles_observe_backend_state() {
    let mut backend = MemoryBackend::new();
    let device = backend.controller();
    let state = backend.device_state();
    let gestures = backend.user_gestures();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    gestures.add_listener(move |g| sink.borrow_mut().push(*g));
    device.gesture(UserGesture::Touch);
    assert_eq!(*seen.borrow(), vec![UserGesture::Touch]);

    let outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&outcome);
    backend.resume(Box::new(move |r| *slot.borrow_mut() = Some(r)));
    assert_eq!(*outcome.borrow(), Some(Ok(())));
    assert_eq!(state.get(), DeviceState::Running);
}

#[test]
fn deferred_resume_after_close_fails() {
    let mut backend = MemoryBackend::with_state(DeviceState::Interrupted);
    let device = backend.controller();
    device.set_resume_behavior(ResumeBehavior::Defer);

    let outcome = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&outcome);
    backend.resume(Box::new(move |r| *slot.borrow_mut() = Some(r)));
    assert_eq!(device.pending_resumes(), 1);
    assert!(outcome.borrow().is_none());

    device.set_state(DeviceState::Closed);
    assert!(device.complete_resume(Ok(())));
    assert_eq!(*outcome.borrow(), Some(Err(BackendError::DeviceClosed)));
    assert_eq!(device.state(), DeviceState::Closed);
    assert!(!device.complete_resume(Ok(())));
}
