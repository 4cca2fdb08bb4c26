//! Platform-specific configuration paths.
//!
//! - **User config dir**: `~/.config/sonance/` (Linux), `~/Library/Application Support/sonance/` (macOS), `%APPDATA%\sonance\` (Windows)
//! - **Default config file**: `<user config dir>/sonance.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use sonance_config::paths;
//!
//! if let Some(path) = paths::find_config("studio") {
//!     println!("Found config at: {:?}", path);
//! }
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "sonance";

/// File name of the default configuration.
const DEFAULT_CONFIG_FILE: &str = "sonance.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the default configuration file in the user config directory.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(DEFAULT_CONFIG_FILE)
}

/// Find a configuration file by path or name.
///
/// `name` is first tried as a file path; otherwise it is looked up in the
/// user config directory, with `.toml` appended when missing.
pub fn find_config(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    let user_path = user_config_dir().join(filename);
    user_path.is_file().then_some(user_path)
}

/// Ensure the user config directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}
