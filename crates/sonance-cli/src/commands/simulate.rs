//! Run a scripted session against the in-memory backend.

use clap::Args;
use sonance_core::Property;
use sonance_io::{AudioBackend, DeviceController, MemoryBackend, RecordingSource, SoundSource};
use sonance_manager::{OutputSignals, SonificationLevel, SoundGeneratorOptions, SoundManager};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use super::common::load_config;
use crate::script::{
    Script, Step, parse_device_state, parse_gesture, parse_sonification, resume_result,
};

/// Run a simulation script.
#[derive(Args)]
pub struct SimulateArgs {
    /// Script file (TOML)
    pub script: PathBuf,

    /// Configuration file path or name (default: user config, else built-in)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Stop at the first failing step
    #[arg(long)]
    pub strict: bool,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.script)?;
    let config = load_config(args.config.as_deref())?;

    let backend = MemoryBackend::with_state(script.device_state()?);
    let device = backend.controller();
    device.set_resume_behavior(script.resume_behavior()?);

    let mut session = Session {
        manager: SoundManager::new(backend),
        device,
        signals: OutputSignals::new(),
        config,
        sources: HashMap::new(),
        conditions: HashMap::new(),
    };
    session.manager.set_alert_handler(|err| {
        eprintln!("  alert: {err}");
    });

    if !script.has_initialize() {
        session.step(&Step::Initialize)?;
    }

    let mut failures = 0usize;
    for (index, step) in script.steps.iter().enumerate() {
        println!("[{:>2}] {}", index + 1, step.label());
        if let Err(e) = session.step(step) {
            if args.strict {
                return Err(e.context(format!("step {} ({}) failed", index + 1, step.label())));
            }
            println!("     ! {e}");
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} step(s) failed", failures);
    }
    Ok(())
}

struct Session {
    manager: SoundManager<MemoryBackend>,
    device: DeviceController,
    signals: OutputSignals,
    config: sonance_config::SoundConfig,
    sources: HashMap<String, Rc<RecordingSource>>,
    conditions: HashMap<String, Property<bool>>,
}

impl Session {
    fn step(&mut self, step: &Step) -> anyhow::Result<()> {
        match step {
            Step::Initialize => {
                self.manager
                    .initialize(self.signals.clone(), self.config.clone())?;
            }
            Step::AddSource {
                name,
                category,
                extra,
            } => {
                let source = self
                    .sources
                    .entry(name.clone())
                    .or_insert_with(|| Rc::new(RecordingSource::new(name.clone())))
                    .clone();
                let mut options = SoundGeneratorOptions::new();
                if let Some(category) = category {
                    options = options.with_category(category.clone());
                }
                if *extra {
                    options = options.with_sonification_level(SonificationLevel::Extra);
                }
                let handle: Rc<dyn SoundSource> = source;
                self.manager.add_sound_generator(&handle, options)?;
            }
            Step::RemoveSource { name } => {
                let Some(source) = self.sources.get(name) else {
                    anyhow::bail!("No source named '{}'", name);
                };
                let handle: Rc<dyn SoundSource> = source.clone();
                self.manager.remove_sound_generator(&handle)?;
            }
            Step::MainLevel { level } => self.manager.set_main_output_level(*level)?,
            Step::Enable { value } => self.manager.set_enabled(*value),
            Step::CategoryLevel { category, level } => {
                self.manager.set_output_level_for_category(category, *level)?;
            }
            Step::Reverb { level } => self.manager.set_reverb_level(*level)?,
            Step::Duck { name, active } => {
                if let Some(condition) = self.conditions.get(name) {
                    condition.set(*active);
                } else {
                    let condition = Property::new(*active);
                    self.manager.add_ducking_property(&condition)?;
                    self.conditions.insert(name.clone(), condition);
                }
            }
            Step::Unduck { name } => {
                let Some(condition) = self.conditions.remove(name) else {
                    anyhow::bail!("No ducking condition named '{}'", name);
                };
                self.manager.remove_ducking_property(&condition)?;
            }
            Step::Signal { name, value } => {
                let Some((_, signal)) = self.signals.named().into_iter().find(|(n, _)| n == name)
                else {
                    anyhow::bail!("Unknown signal '{}'", name);
                };
                signal.set(*value);
            }
            Step::Sonification { level } => {
                self.manager.set_sonification_level(parse_sonification(level)?);
            }
            Step::Gesture { kind } => self.device.gesture(parse_gesture(kind)?),
            Step::Device { state } => self.device.set_state(parse_device_state(state)?),
            Step::CompleteResume { ok } => {
                if !self.device.complete_resume(resume_result(*ok)) {
                    anyhow::bail!("No resume request is waiting");
                }
            }
            Step::Advance { seconds } => {
                if !seconds.is_finite() || *seconds < 0.0 {
                    anyhow::bail!("Cannot advance by {} seconds", seconds);
                }
                self.manager.with_backend(|b| b.advance(*seconds));
            }
            Step::Settle => self.manager.with_backend(MemoryBackend::settle),
            Step::Print => self.print(),
        }
        Ok(())
    }

    fn print(&self) {
        let elapsed = self.manager.with_backend(|b| b.elapsed());
        println!(
            "     t={:.3}s  device={}  armed={}  enabled={}  ducking={}  sonification={}",
            elapsed,
            self.device.state(),
            yes_no(self.manager.is_resume_armed()),
            yes_no(self.manager.is_fully_enabled()),
            yes_no(self.manager.is_ducking()),
            self.manager.sonification_level(),
        );

        let Some(topology) = self.manager.topology() else {
            println!(
                "     engine not initialized ({} pending)",
                self.manager.pending_count()
            );
            return;
        };

        let mut stages = vec![
            topology.main,
            topology.ducking,
            topology.wet,
            topology.dry,
        ];
        stages.extend(topology.categories.iter().map(|c| c.node));

        self.manager.with_backend(|backend| {
            for node in stages {
                let label = topology.label(node).unwrap_or_default();
                let value = backend.gain_value(node).unwrap_or(f32::NAN);
                let target = backend.gain_target(node).unwrap_or(f32::NAN);
                println!("     {label:28} {value:.3} -> {target:.3}");
            }
        });

        let mut names: Vec<_> = self.sources.keys().collect();
        names.sort();
        for name in names {
            let source = &self.sources[name];
            let routes: Vec<String> = source
                .connections()
                .into_iter()
                .map(|n| topology.label(n).unwrap_or_else(|| n.to_string()))
                .collect();
            let gate = if source.sonification_enabled() { "" } else { " (gated)" };
            if routes.is_empty() {
                println!("     source {name}: unrouted{gate}");
            } else {
                println!("     source {name}: {}{gate}", routes.join(", "));
            }
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
