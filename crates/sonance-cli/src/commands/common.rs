//! Shared CLI helpers used across multiple commands.

use sonance_config::{ConfigError, SoundConfig, default_config_path, find_config};

/// Load the engine configuration.
///
/// Uses, in order:
/// 1. The explicit `--config` value, as a file path or a name in the user
///    config directory
/// 2. The default user configuration file, if present
/// 3. Built-in defaults
pub fn load_config(explicit: Option<&str>) -> anyhow::Result<SoundConfig> {
    if let Some(name) = explicit {
        let path = find_config(name).ok_or_else(|| ConfigError::NotFound(name.to_string()))?;
        tracing::debug!(path = %path.display(), "loading configuration");
        return SoundConfig::load(&path).map_err(|e| anyhow::anyhow!("{}", e));
    }

    let path = default_config_path();
    if path.exists() {
        tracing::debug!(path = %path.display(), "loading user configuration");
        return SoundConfig::load(&path).map_err(|e| anyhow::anyhow!("{}", e));
    }

    tracing::debug!("no configuration file, using defaults");
    Ok(SoundConfig::default())
}
