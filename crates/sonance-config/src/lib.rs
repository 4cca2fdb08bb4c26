//! Configuration for the sonance sound output engine.
//!
//! A [`SoundConfig`] carries everything the engine reads once at
//! initialization: the category list, the initial reverb blend, ramp timing,
//! ducking attenuation, and compressor settings. Configurations are plain TOML
//! and every field has a default.
//!
//! # Example
//!
//! ```rust
//! use sonance_config::SoundConfig;
//!
//! let config = SoundConfig::from_toml(r#"
//! categories = ["ui", "sim"]
//! reverb_level = 0.1
//! "#).unwrap();
//!
//! assert_eq!(config.categories, vec!["ui", "sim"]);
//! assert_eq!(config.ducking.level, 0.15);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

/// Configuration validation.
pub mod validation;

pub use config::{
    CompressorSettings, DEFAULT_CATEGORIES, DEFAULT_DUCKING_LEVEL, DEFAULT_GAIN_RAMP_TIME,
    DEFAULT_REVERB_LEVEL, DuckingSettings, SoundConfig,
};
pub use error::ConfigError;
pub use paths::{default_config_path, ensure_user_config_dir, find_config, user_config_dir};
pub use validation::{ValidationError, ValidationResult, validate_categories, validate_config};
