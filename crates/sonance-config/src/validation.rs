//! Configuration validation.
//!
//! Checks category names and every numeric field of a [`SoundConfig`], and
//! that ducking engages faster than it releases. All problems are collected;
//! a configuration with more than one problem reports
//! [`ValidationError::Multiple`].
//!
//! # Example
//!
//! ```rust
//! use sonance_config::{SoundConfig, ValidationError};
//!
//! let config = SoundConfig::new().with_categories(["ui", "ui"]);
//! assert_eq!(
//!     config.validate(),
//!     Err(ValidationError::DuplicateCategory("ui".to_string()))
//! );
//! ```

use std::collections::HashSet;
use thiserror::Error;

use crate::config::SoundConfig;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A category name appears more than once.
    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    /// A category name is empty or whitespace.
    #[error("category names must not be empty")]
    EmptyCategoryName,

    /// Field value out of range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field name, e.g. `ducking.level`.
        field: String,
        /// The offending value.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Ducking would release as fast as (or faster than) it engages.
    #[error("ducking engage time constant {engage} must be shorter than release {release}")]
    DuckingTiming {
        /// `ducking.engage_time_constant`.
        engage: f32,
        /// `ducking.release_time_constant`.
        release: f32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate category names: non-empty and unique.
pub fn validate_categories(categories: &[String]) -> ValidationResult<()> {
    let mut errors = Vec::new();
    check_categories(categories, &mut errors);
    collapse(errors)
}

/// Validate a full configuration.
pub fn validate_config(config: &SoundConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    check_categories(&config.categories, &mut errors);

    check_range(&mut errors, "reverb_level", config.reverb_level, 0.0, 1.0);
    check_range(&mut errors, "gain_ramp_time", config.gain_ramp_time, 0.0, 10.0);
    check_range(&mut errors, "ducking.level", config.ducking.level, 0.0, 1.0);
    check_range(
        &mut errors,
        "ducking.engage_time_constant",
        config.ducking.engage_time_constant,
        0.0,
        10.0,
    );
    check_range(
        &mut errors,
        "ducking.release_time_constant",
        config.ducking.release_time_constant,
        0.0,
        10.0,
    );
    let (engage, release) = (
        config.ducking.engage_time_constant,
        config.ducking.release_time_constant,
    );
    // Only meaningful once both are individually in range.
    if (0.0..=10.0).contains(&engage) && (0.0..=10.0).contains(&release) && engage >= release {
        errors.push(ValidationError::DuckingTiming { engage, release });
    }
    check_range(
        &mut errors,
        "compressor.threshold_db",
        config.compressor.threshold_db,
        -100.0,
        0.0,
    );
    check_range(&mut errors, "compressor.knee_db", config.compressor.knee_db, 0.0, 40.0);
    check_range(&mut errors, "compressor.ratio", config.compressor.ratio, 1.0, 20.0);
    check_range(&mut errors, "compressor.attack", config.compressor.attack, 0.0, 1.0);
    check_range(&mut errors, "compressor.release", config.compressor.release, 0.0, 1.0);

    collapse(errors)
}

fn check_categories(categories: &[String], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for name in categories {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyCategoryName);
        } else if !seen.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateCategory(name.clone()));
        }
    }
}

fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: f32, min: f32, max: f32) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

fn collapse(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(validate_config(&SoundConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_category_list_is_valid() {
        let config = SoundConfig::new().with_categories(Vec::<String>::new());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_category_name() {
        let result = validate_categories(&["ui".to_string(), "  ".to_string()]);
        assert_eq!(result, Err(ValidationError::EmptyCategoryName));
    }

    #[test]
    fn test_reverb_out_of_range() {
        let config = SoundConfig::new().with_reverb_level(-0.1);
        match validate_config(&config) {
            Err(ValidationError::OutOfRange { field, .. }) => assert_eq!(field, "reverb_level"),
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_ducking_must_engage_faster_than_release() {
        let mut config = SoundConfig::default();
        config.ducking.engage_time_constant = 0.5;
        config.ducking.release_time_constant = 0.5;
        assert_eq!(
            validate_config(&config),
            Err(ValidationError::DuckingTiming {
                engage: 0.5,
                release: 0.5
            })
        );

        config.ducking.engage_time_constant = 2.0;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::DuckingTiming { .. })
        ));

        config.ducking.engage_time_constant = 0.1;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_ducking_timing_not_reported_twice() {
        let mut config = SoundConfig::default();
        config.ducking.release_time_constant = f32::NAN;
        match validate_config(&config) {
            Err(ValidationError::OutOfRange { field, .. }) => {
                assert_eq!(field, "ducking.release_time_constant");
            }
            other => panic!("expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_nan_rejected() {
        let config = SoundConfig::new().with_gain_ramp_time(f32::NAN);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_multiple_errors_collected() {
        let mut config = SoundConfig::new().with_categories(["x", "x"]);
        config.ducking.level = 2.0;
        match validate_config(&config) {
            Err(ValidationError::Multiple(errors)) => {
                assert_eq!(errors.len(), 2);
                let msg = ValidationError::Multiple(errors).to_string();
                assert!(msg.contains("duplicate category: x"), "got: {msg}");
                assert!(msg.contains("ducking.level"), "got: {msg}");
            }
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::OutOfRange {
            field: "ducking.level".to_string(),
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(err.to_string(), "'ducking.level' value 1.5 out of range [0, 1]");
    }
}
