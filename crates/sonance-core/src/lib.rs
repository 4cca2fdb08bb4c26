//! Sonance Core - building blocks for the sound output engine
//!
//! This crate provides the primitives the engine is assembled from. None of
//! them touch an audio device.
//!
//! # Core Abstractions
//!
//! ## Gain Automation
//!
//! Click-free level changes:
//!
//! - [`LinearSmoothedParam`] - Linear ramps (constant rate)
//! - [`SmoothedParam`] - Exponential approach (time constant)
//! - [`AutomatedParam`] - Either shape, always re-targeting from the in-flight value
//!
//! ## Observation
//!
//! - [`Property`] - Observable value with `(new, old)` change listeners
//! - [`Emitter`] - Event stream without a stored value
//! - [`ListenerId`] - Handle used to unsubscribe from either
//!
//! ## Topology
//!
//! - [`AudioGraph`] - Node/edge bookkeeping with cycle detection
//! - [`NodeId`], [`NodeKind`], [`GraphError`]
//!
//! ## Utilities
//!
//! - [`level`] - `[0, 1]` level contract and dB conversions
//!
//! # Threading
//!
//! Properties and emitters are `Rc`-based and `!Send`. The engine
//! is single-threaded and callback-driven.

pub mod graph;
pub mod level;
pub mod param;
pub mod property;

pub use graph::{AudioGraph, EdgeId, GraphError, NodeId, NodeKind};
pub use param::{AutomatedParam, LinearSmoothedParam, RampShape, SmoothedParam};
pub use property::{Emitter, ListenerId, Property};
