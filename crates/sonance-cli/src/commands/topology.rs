//! Print the node graph the engine builds for a configuration.

use clap::Args;
use sonance_core::level::{SILENT, db_to_linear, linear_to_db};
use sonance_io::{AudioBackend, DeviceState, MemoryBackend};
use sonance_manager::{OutputSignals, SoundManager};

use super::common::load_config;

/// Print the engine graph.
#[derive(Args)]
pub struct TopologyArgs {
    /// Configuration file path or name (default: user config, else built-in)
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Run the topology command.
pub fn run(args: TopologyArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let manager = SoundManager::new(MemoryBackend::with_state(DeviceState::Running));
    manager.initialize(OutputSignals::new(), config.clone())?;
    let Some(topology) = manager.topology() else {
        anyhow::bail!("engine did not build a graph");
    };

    println!(
        "Categories:  {}",
        if config.categories.is_empty() {
            "(none)".to_string()
        } else {
            config.categories.join(", ")
        }
    );
    println!("Reverb:      {:.3}", config.reverb_level);
    println!("Ramp time:   {:.3}s", config.gain_ramp_time);
    println!(
        "Compressor:  threshold {:.1} dB ({:.3}), ratio {:.1}:1",
        config.compressor.threshold_db,
        db_to_linear(config.compressor.threshold_db),
        config.compressor.ratio
    );
    println!();

    println!("Nodes:");
    println!("======");
    manager.with_backend(|backend| {
        let graph = backend.graph();
        for id in graph.node_ids() {
            let kind = graph.kind(id).map_or("?", |k| k.label());
            let name = topology.label(id).unwrap_or_default();
            match backend.gain_target(id) {
                Ok(gain) => println!(
                    "  {:>3}  {:12} {:24} gain {:.3} ({})",
                    id.index(),
                    kind,
                    name,
                    gain,
                    decibels(gain)
                ),
                Err(_) => println!("  {:>3}  {:12} {}", id.index(), kind, name),
            }
        }
    });
    println!();

    println!("Edges:");
    println!("======");
    for line in topology.to_string().lines() {
        println!("  {line}");
    }

    Ok(())
}

fn decibels(gain: f32) -> String {
    if gain <= SILENT {
        "silent".to_string()
    } else {
        format!("{:+.1} dB", linear_to_db(gain))
    }
}
