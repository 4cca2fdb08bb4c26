//! Sonance sound output engine.
//!
//! [`SoundManager`] owns the signal graph on an [`AudioBackend`] and the
//! policies around it:
//!
//! - **Registry**: sources registered before initialization are queued and
//!   connected in order once the graph exists
//! - **Output gating**: the main gain follows the user level only while every
//!   [`OutputSignals`] input and the engine's own enable switch allow output
//! - **Ducking**: any number of boolean conditions; while one is `true` the
//!   ducking gain approaches the configured level quickly, and releases slowly
//! - **Mixing**: per-category gains and a wet/dry reverb blend
//! - **Device lifecycle**: a suspended or interrupted device is resumed on the
//!   next user gesture
//!
//! ```text
//!  source ─▶ category ─┬─▶ convolver ─▶ wet ─┐
//!                      └─▶ dry ──────────────┴─▶ main ─▶ ducking ─▶ compressor ─▶ device
//! ```
//!
//! # Threading
//!
//! The engine is single-threaded and callback-driven. Every reaction runs
//! synchronously inside the call that changed an input.
//!
//! [`AudioBackend`]: sonance_io::AudioBackend

mod device;
mod ducking;
mod error;
mod manager;
mod mixer;
mod output;
mod registry;
mod topology;

pub use device::ResumeArm;
pub use ducking::DuckingAggregator;
pub use error::{Result, SoundManagerError};
pub use manager::{AlertHandler, SoundManager};
pub use mixer::CategoryStage;
pub use output::OutputSignals;
pub use registry::{SonificationLevel, SoundGeneratorOptions};
pub use topology::TopologySnapshot;
