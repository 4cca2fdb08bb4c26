//! Engine configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, validate_config};

/// Category names used when a configuration omits the list.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["sim-specific", "user-interface"];

/// Default wet share of the reverb blend.
pub const DEFAULT_REVERB_LEVEL: f32 = 0.02;

/// Default duration, in seconds, of linear gain ramps.
pub const DEFAULT_GAIN_RAMP_TIME: f32 = 0.1;

/// Default attenuation applied while ducking.
pub const DEFAULT_DUCKING_LEVEL: f32 = 0.15;

/// Configuration for the sound output engine.
///
/// All fields have defaults, so an empty TOML document is a valid
/// configuration.
///
/// # TOML Format
///
/// ```toml
/// categories = ["sim-specific", "user-interface"]
/// reverb_level = 0.02
/// gain_ramp_time = 0.1
///
/// [ducking]
/// level = 0.15
/// engage_time_constant = 0.05
/// release_time_constant = 0.5
///
/// [compressor]
/// threshold_db = -6.0
/// knee_db = 5.0
/// ratio = 12.0
/// attack = 0.0
/// release = 0.25
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoundConfig {
    /// Category names; each gets a dedicated gain stage at initialization.
    pub categories: Vec<String>,

    /// Initial wet share of the reverb blend, in `[0, 1]`.
    pub reverb_level: f32,

    /// Duration in seconds of linear ramps (main output, reverb blend).
    pub gain_ramp_time: f32,

    /// Ducking attenuation and timing.
    pub ducking: DuckingSettings,

    /// Settings of the fixed compressor ahead of the device output.
    pub compressor: CompressorSettings,
}

impl SoundConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the category list.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial reverb level.
    pub fn with_reverb_level(mut self, level: f32) -> Self {
        self.reverb_level = level;
        self
    }

    /// Set the linear ramp duration in seconds.
    pub fn with_gain_ramp_time(mut self, seconds: f32) -> Self {
        self.gain_ramp_time = seconds;
        self
    }

    /// Replace the ducking settings.
    pub fn with_ducking(mut self, ducking: DuckingSettings) -> Self {
        self.ducking = ducking;
        self
    }

    /// Load a configuration from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: SoundConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(self)
    }

    /// Whether `name` is one of the configured categories.
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| (*c).to_string()).collect(),
            reverb_level: DEFAULT_REVERB_LEVEL,
            gain_ramp_time: DEFAULT_GAIN_RAMP_TIME,
            ducking: DuckingSettings::default(),
            compressor: CompressorSettings::default(),
        }
    }
}

/// Ducking attenuation and its asymmetric timing.
///
/// Engaging is fast so the ducked audio does not overlap the condition that
/// caused it; releasing is slow so the return is not jarring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DuckingSettings {
    /// Gain applied to the ducking stage while any condition is active.
    pub level: f32,
    /// Time constant in seconds when engaging.
    pub engage_time_constant: f32,
    /// Time constant in seconds when releasing.
    pub release_time_constant: f32,
}

impl Default for DuckingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_DUCKING_LEVEL,
            engage_time_constant: 0.05,
            release_time_constant: 0.5,
        }
    }
}

/// Settings for the fixed dynamics compressor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompressorSettings {
    /// Level above which compression starts, in dB.
    pub threshold_db: f32,
    /// Width of the soft knee, in dB.
    pub knee_db: f32,
    /// Input/output ratio above the threshold.
    pub ratio: f32,
    /// Attack time in seconds.
    pub attack: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -6.0,
            knee_db: 5.0,
            ratio: 12.0,
            attack: 0.0,
            release: 0.25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SoundConfig::default();
        assert_eq!(config.categories, vec!["sim-specific", "user-interface"]);
        assert_eq!(config.reverb_level, 0.02);
        assert_eq!(config.gain_ramp_time, 0.1);
        assert_eq!(config.ducking.level, 0.15);
        assert_eq!(config.ducking.engage_time_constant, 0.05);
        assert_eq!(config.ducking.release_time_constant, 0.5);
        assert_eq!(config.compressor.ratio, 12.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SoundConfig::new()
            .with_categories(["ui", "sim"])
            .with_reverb_level(0.3)
            .with_gain_ramp_time(0.05);

        assert_eq!(config.categories, vec!["ui", "sim"]);
        assert!(config.has_category("sim"));
        assert!(!config.has_category("sim-specific"));
        assert_eq!(config.reverb_level, 0.3);
        assert_eq!(config.gain_ramp_time, 0.05);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SoundConfig::from_toml("").unwrap();
        assert_eq!(config, SoundConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
categories = ["ui", "sim"]

[ducking]
level = 0.3
"#;
        let config = SoundConfig::from_toml(toml).unwrap();
        assert_eq!(config.categories, vec!["ui", "sim"]);
        assert_eq!(config.ducking.level, 0.3);
        // Unspecified ducking fields keep their defaults.
        assert_eq!(config.ducking.release_time_constant, 0.5);
        assert_eq!(config.reverb_level, DEFAULT_REVERB_LEVEL);
    }

    #[test]
    fn test_toml_roundtrip() {
        let original = SoundConfig::new()
            .with_categories(["a", "b", "c"])
            .with_reverb_level(0.5);
        let toml = original.to_toml().unwrap();
        assert!(toml.contains("categories"));
        let parsed = SoundConfig::from_toml(&toml).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_invalid_toml_rejected_by_validation() {
        let err = SoundConfig::from_toml("reverb_level = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn test_malformed_toml() {
        let err = SoundConfig::from_toml("categories = [").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }
}
