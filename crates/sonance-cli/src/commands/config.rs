//! Configuration file commands.

use clap::{Args, Subcommand};
use sonance_config::{SoundConfig, default_config_path, ensure_user_config_dir, user_config_dir};
use std::path::PathBuf;

use super::common::load_config;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file path or name
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Write the built-in defaults to a configuration file
    Init {
        /// Destination (default: the user configuration file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Check {
        /// Configuration file path or name
        config: String,
    },

    /// Show configuration locations
    Path,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { config } => show(config.as_deref()),
        ConfigCommand::Init { path, force } => init(path, force),
        ConfigCommand::Check { config } => check(&config),
        ConfigCommand::Path => show_paths(),
    }
}

fn show(name: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(name)?;
    let toml = config.to_toml().map_err(|e| anyhow::anyhow!("{}", e))?;
    print!("{toml}");
    Ok(())
}

fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => {
            ensure_user_config_dir().map_err(|e| anyhow::anyhow!("{}", e))?;
            default_config_path()
        }
    };

    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite.",
            path.display()
        );
    }

    SoundConfig::default()
        .save(&path)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn check(name: &str) -> anyhow::Result<()> {
    let config = load_config(Some(name))?;
    println!(
        "OK: {} categor{}, reverb {:.3}, ramp {:.3}s",
        config.categories.len(),
        if config.categories.len() == 1 { "y" } else { "ies" },
        config.reverb_level,
        config.gain_ramp_time
    );
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("Config directory: {}", user_config_dir().display());
    let path = default_config_path();
    let status = if path.exists() { "" } else { " (not present)" };
    println!("Default config:   {}{status}", path.display());
    Ok(())
}
