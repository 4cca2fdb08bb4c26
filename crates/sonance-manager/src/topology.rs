//! The engine's fixed node layout.
//!
//! ```text
//!  source ─▶ category gain ─┬─▶ convolver ─▶ wet gain ─┐
//!                           └─▶ dry gain ──────────────┴─▶ main gain ─▶ ducking gain ─▶ compressor ─▶ device
//! ```
//!
//! Uncategorized sources connect to the convolver and the dry gain directly.

use std::fmt;

use sonance_config::SoundConfig;
use sonance_core::NodeId;
use sonance_core::level::dry_for_wet;
use sonance_io::{AudioBackend, Result};

use crate::mixer::CategoryStage;

/// Node ids of every stage the engine built.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySnapshot {
    /// Main output gain (enable gating and user level).
    pub main: NodeId,
    /// Ducking gain.
    pub ducking: NodeId,
    /// Compressor ahead of the device.
    pub compressor: NodeId,
    /// Device output.
    pub destination: NodeId,
    /// Reverb convolver.
    pub convolver: NodeId,
    /// Reverb wet gain.
    pub wet: NodeId,
    /// Reverb dry gain.
    pub dry: NodeId,
    /// Category stages in configuration order.
    pub categories: Vec<CategoryStage>,
}

impl TopologySnapshot {
    /// Human-readable name of a stage, if it belongs to the engine.
    pub fn label(&self, node: NodeId) -> Option<String> {
        let fixed = [
            (self.main, "main"),
            (self.ducking, "ducking"),
            (self.compressor, "compressor"),
            (self.destination, "destination"),
            (self.convolver, "convolver"),
            (self.wet, "wet"),
            (self.dry, "dry"),
        ];
        if let Some((_, name)) = fixed.iter().find(|(id, _)| *id == node) {
            return Some((*name).to_string());
        }
        self.categories
            .iter()
            .find(|c| c.node == node)
            .map(|c| format!("category:{}", c.name))
    }

    /// Every edge the engine creates, as `(from, to)`.
    pub fn expected_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut edges = vec![
            (self.main, self.ducking),
            (self.ducking, self.compressor),
            (self.compressor, self.destination),
            (self.convolver, self.wet),
            (self.wet, self.main),
            (self.dry, self.main),
        ];
        for category in &self.categories {
            edges.push((category.node, self.convolver));
            edges.push((category.node, self.dry));
        }
        edges
    }
}

impl fmt::Display for TopologySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (from, to) in self.expected_edges() {
            let from_label = self.label(from).unwrap_or_else(|| from.to_string());
            let to_label = self.label(to).unwrap_or_else(|| to.to_string());
            writeln!(f, "{from_label} ({}) -> {to_label} ({})", from.index(), to.index())?;
        }
        Ok(())
    }
}

/// Stages common to every configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EngineNodes {
    pub main: NodeId,
    pub ducking: NodeId,
    pub compressor: NodeId,
    pub destination: NodeId,
    pub convolver: NodeId,
    pub wet: NodeId,
    pub dry: NodeId,
}

impl EngineNodes {
    /// Builds output chain and reverb branches, in that order.
    pub fn build<B: AudioBackend>(
        backend: &mut B,
        config: &SoundConfig,
        main_initial: f32,
        ducking_initial: f32,
    ) -> Result<Self> {
        let destination = backend.destination();

        let main = backend.create_gain(main_initial)?;
        let ducking = backend.create_gain(ducking_initial)?;
        let compressor = backend.create_compressor(&config.compressor)?;
        backend.connect(main, ducking)?;
        backend.connect(ducking, compressor)?;
        backend.connect(compressor, destination)?;

        let convolver = backend.create_convolver()?;
        let wet = backend.create_gain(config.reverb_level)?;
        backend.connect(convolver, wet)?;
        backend.connect(wet, main)?;

        let dry = backend.create_gain(dry_for_wet(config.reverb_level))?;
        backend.connect(dry, main)?;

        tracing::debug!(
            "engine graph: main {main}, ducking {ducking}, compressor {compressor}, convolver {convolver}, wet {wet}, dry {dry}"
        );

        Ok(Self {
            main,
            ducking,
            compressor,
            destination,
            convolver,
            wet,
            dry,
        })
    }

    /// Builds a category gain feeding both reverb branches.
    pub fn build_category<B: AudioBackend>(&self, backend: &mut B, name: &str) -> Result<NodeId> {
        let node = backend.create_gain(1.0)?;
        backend.connect(node, self.convolver)?;
        backend.connect(node, self.dry)?;
        tracing::debug!("engine graph: category '{name}' at {node}");
        Ok(node)
    }

    /// Stages an uncategorized source connects to.
    pub fn source_inputs(&self) -> [NodeId; 2] {
        [self.convolver, self.dry]
    }

    pub fn snapshot(&self, categories: &[CategoryStage]) -> TopologySnapshot {
        TopologySnapshot {
            main: self.main,
            ducking: self.ducking,
            compressor: self.compressor,
            destination: self.destination,
            convolver: self.convolver,
            wet: self.wet,
            dry: self.dry,
            categories: categories.to_vec(),
        }
    }
}
