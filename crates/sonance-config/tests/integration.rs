//! Integration tests for sonance-config.
//!
//! These tests exercise file round trips and error reporting end to end.

use sonance_config::{ConfigError, DuckingSettings, SoundConfig, ValidationError};
use tempfile::TempDir;

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sonance.toml");

    let config = SoundConfig::new()
        .with_categories(["ui", "sim", "alerts"])
        .with_reverb_level(0.25)
        .with_ducking(DuckingSettings {
            level: 0.3,
            engage_time_constant: 0.02,
            release_time_constant: 1.0,
        });

    // Parent directory does not exist yet; save creates it.
    config.save(&path).expect("save should succeed");
    assert!(path.is_file());

    let loaded = SoundConfig::load(&path).expect("load should succeed");
    assert_eq!(loaded, config);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    match SoundConfig::load(&path) {
        Err(ConfigError::ReadFile { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected ReadFile, got {other:?}"),
    }
}

#[test]
fn test_load_rejects_duplicate_categories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dup.toml");
    std::fs::write(&path, "categories = [\"ui\", \"ui\"]\n").unwrap();

    match SoundConfig::load(&path) {
        Err(ConfigError::Validation(ValidationError::DuplicateCategory(name))) => {
            assert_eq!(name, "ui");
        }
        other => panic!("expected duplicate category error, got {other:?}"),
    }
}

#[test]
fn test_written_file_is_readable_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("defaults.toml");
    SoundConfig::default().save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[ducking]"), "got:\n{text}");
    assert!(text.contains("[compressor]"), "got:\n{text}");
    assert!(text.contains("sim-specific"), "got:\n{text}");
}
