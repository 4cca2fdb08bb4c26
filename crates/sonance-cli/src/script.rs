//! Simulation script format.
//!
//! A script is a TOML file with an optional device setup and a list of steps
//! run in order against the in-memory backend:
//!
//! ```toml
//! device = "suspended"
//! resume = "succeed"
//!
//! [[step]]
//! action = "add-source"
//! name = "beep"
//! category = "user-interface"
//!
//! [[step]]
//! action = "initialize"
//!
//! [[step]]
//! action = "gesture"
//!
//! [[step]]
//! action = "advance"
//! seconds = 0.25
//!
//! [[step]]
//! action = "print"
//! ```

use serde::Deserialize;
use sonance_io::{BackendError, DeviceState, ResumeBehavior, UserGesture};
use sonance_manager::SonificationLevel;
use std::path::Path;

/// A parsed simulation script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Device state when the session starts
    #[serde(default = "default_device")]
    pub device: String,
    /// How resume requests are answered: "succeed", "fail", or "defer"
    #[serde(default = "default_resume")]
    pub resume: String,
    /// Steps in execution order
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

fn default_device() -> String {
    DeviceState::Running.label().to_string()
}

fn default_resume() -> String {
    "succeed".to_string()
}

fn default_gesture() -> String {
    UserGesture::PointerDown.label().to_string()
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Build the graph and connect queued sources
    Initialize,
    /// Register a recording source
    AddSource {
        name: String,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        extra: bool,
    },
    /// Unregister a source
    RemoveSource { name: String },
    /// Set the user's main output level
    MainLevel { level: f32 },
    /// Set the engine's own enable flag
    Enable { value: bool },
    /// Set one category's gain
    CategoryLevel { category: String, level: f32 },
    /// Set the reverb blend
    Reverb { level: f32 },
    /// Set a named ducking condition, registering it on first use
    Duck { name: String, active: bool },
    /// Unregister a named ducking condition
    Unduck { name: String },
    /// Set one of the host enable signals
    Signal { name: String, value: bool },
    /// Switch the sonification tier
    Sonification { level: String },
    /// Deliver a user gesture to the device
    Gesture {
        #[serde(default = "default_gesture")]
        kind: String,
    },
    /// Force the device into a state
    Device { state: String },
    /// Answer the oldest deferred resume request
    CompleteResume { ok: bool },
    /// Move simulated time forward
    Advance { seconds: f32 },
    /// Jump every ramp to its target
    Settle,
    /// Print the engine's current state
    Print,
}

impl Step {
    /// Action name as written in the script.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Initialize => "initialize",
            Step::AddSource { .. } => "add-source",
            Step::RemoveSource { .. } => "remove-source",
            Step::MainLevel { .. } => "main-level",
            Step::Enable { .. } => "enable",
            Step::CategoryLevel { .. } => "category-level",
            Step::Reverb { .. } => "reverb",
            Step::Duck { .. } => "duck",
            Step::Unduck { .. } => "unduck",
            Step::Signal { .. } => "signal",
            Step::Sonification { .. } => "sonification",
            Step::Gesture { .. } => "gesture",
            Step::Device { .. } => "device",
            Step::CompleteResume { .. } => "complete-resume",
            Step::Advance { .. } => "advance",
            Step::Settle => "settle",
            Step::Print => "print",
        }
    }
}

impl Script {
    /// Load and parse a script file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read script '{}': {}", path.display(), e))?;
        Self::parse(&content)
    }

    /// Parse a script from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let script: Script =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Invalid script: {}", e))?;
        // Surface bad setup values before any step runs.
        script.device_state()?;
        script.resume_behavior()?;
        Ok(script)
    }

    /// Whether the script initializes the engine itself.
    pub fn has_initialize(&self) -> bool {
        self.steps.iter().any(|s| *s == Step::Initialize)
    }

    /// Parsed initial device state.
    pub fn device_state(&self) -> anyhow::Result<DeviceState> {
        parse_device_state(&self.device)
    }

    /// Parsed resume behavior.
    pub fn resume_behavior(&self) -> anyhow::Result<ResumeBehavior> {
        match self.resume.as_str() {
            "succeed" => Ok(ResumeBehavior::Succeed),
            "fail" => Ok(ResumeBehavior::Fail("rejected by script".to_string())),
            "defer" => Ok(ResumeBehavior::Defer),
            other => anyhow::bail!(
                "Unknown resume behavior '{}' (expected succeed, fail, or defer)",
                other
            ),
        }
    }
}

/// Parse a device state label.
pub fn parse_device_state(name: &str) -> anyhow::Result<DeviceState> {
    [
        DeviceState::Suspended,
        DeviceState::Interrupted,
        DeviceState::Running,
        DeviceState::Closed,
    ]
    .into_iter()
    .find(|s| s.label() == name)
    .ok_or_else(|| anyhow::anyhow!("Unknown device state '{}'", name))
}

/// Parse a user gesture label.
pub fn parse_gesture(name: &str) -> anyhow::Result<UserGesture> {
    [UserGesture::PointerDown, UserGesture::Touch, UserGesture::KeyDown]
        .into_iter()
        .find(|g| g.label() == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown gesture '{}'", name))
}

/// Parse a sonification level label.
pub fn parse_sonification(name: &str) -> anyhow::Result<SonificationLevel> {
    [SonificationLevel::Basic, SonificationLevel::Extra]
        .into_iter()
        .find(|l| l.label() == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown sonification level '{}'", name))
}

/// Result of answering a deferred resume, as the device reports it.
pub fn resume_result(ok: bool) -> Result<(), BackendError> {
    if ok {
        Ok(())
    } else {
        Err(BackendError::ResumeFailed("rejected by script".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_in_order() {
        let script = Script::parse(
            r#"
device = "suspended"

[[step]]
action = "add-source"
name = "beep"
category = "ui"

[[step]]
action = "initialize"

[[step]]
action = "advance"
seconds = 0.5

[[step]]
action = "gesture"
"#,
        )
        .unwrap();

        assert_eq!(script.device_state().unwrap(), DeviceState::Suspended);
        assert!(script.has_initialize());
        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[0],
            Step::AddSource {
                name: "beep".to_string(),
                category: Some("ui".to_string()),
                extra: false,
            }
        );
        assert_eq!(script.steps[2], Step::Advance { seconds: 0.5 });
        assert_eq!(
            script.steps[3],
            Step::Gesture {
                kind: "pointer-down".to_string()
            }
        );
    }

    #[test]
    fn empty_script_uses_defaults() {
        let script = Script::parse("").unwrap();
        assert_eq!(script.device_state().unwrap(), DeviceState::Running);
        assert_eq!(script.resume_behavior().unwrap(), ResumeBehavior::Succeed);
        assert!(!script.has_initialize());
    }

    #[test]
    fn rejects_unknown_action() {
        let err = Script::parse("[[step]]\naction = \"explode\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid script"), "got: {err}");
    }

    #[test]
    fn rejects_bad_setup() {
        assert!(Script::parse("device = \"melted\"").is_err());
        assert!(Script::parse("resume = \"maybe\"").is_err());
    }

    #[test]
    fn labels_match_action_names() {
        let script = Script::parse(
            "[[step]]\naction = \"complete-resume\"\nok = true\n\n[[step]]\naction = \"settle\"\n",
        )
        .unwrap();
        let labels: Vec<_> = script.steps.iter().map(Step::label).collect();
        assert_eq!(labels, ["complete-resume", "settle"]);
    }

    #[test]
    fn label_parsers() {
        assert_eq!(parse_gesture("key-down").unwrap(), UserGesture::KeyDown);
        assert_eq!(parse_sonification("extra").unwrap(), SonificationLevel::Extra);
        assert_eq!(parse_device_state("closed").unwrap(), DeviceState::Closed);
        assert!(parse_gesture("wave").is_err());
        assert!(resume_result(true).is_ok());
        assert!(matches!(resume_result(false), Err(BackendError::ResumeFailed(_))));
    }
}
