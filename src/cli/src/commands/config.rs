//! Configuration management commands.
//!
//! The CLI reads `~/.facts-total/config.toml` when no `--config` file is
//! given. Environment variables prefixed with `FACTS_TOTAL__` override both.

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use facts_total_core::config::Config;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::output::Printer;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print which configuration file is in use
    Path,

    /// Write the default configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Return the path to the default configuration file
/// (`~/.facts-total/config.toml`).
fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".facts-total").join("config.toml"))
}

/// The configuration file to read: the explicit one, else the default file
/// when it exists.
fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path().ok().filter(|path| path.exists()),
    }
}

/// Load the effective settings.
pub fn load_settings(explicit: Option<&Path>) -> Result<Config> {
    match config_path(explicit) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration from the environment"),
    }
}

#[derive(Serialize)]
struct ConfigLocation {
    path: Option<String>,
}

pub fn execute(
    cmd: ConfigCommands,
    explicit: Option<&Path>,
    settings: &Config,
    printer: &Printer,
) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            if printer.format().is_document() {
                printer.document(settings)?;
            } else {
                let content =
                    toml::to_string_pretty(settings).context("Failed to serialize config")?;
                printer.section("Configuration");
                println!("{}", content);
            }
        }

        ConfigCommands::Path => {
            let path = config_path(explicit);
            printer.document(&ConfigLocation {
                path: path.as_ref().map(|p| p.display().to_string()),
            })?;
            match &path {
                Some(path) if !printer.format().is_document() => println!("{}", path.display()),
                Some(_) => {}
                None => printer.note("No configuration file; using defaults"),
            }
        }

        ConfigCommands::Init { force } => {
            let path = match explicit {
                Some(path) => path.to_path_buf(),
                None => default_config_path()?,
            };
            write_default(&path, force)?;
            printer.document(&ConfigLocation {
                path: Some(path.display().to_string()),
            })?;
            printer.done(&format!("Wrote default configuration to {}", path.display()));
        }
    }

    Ok(())
}

/// Save the default configuration, creating the directory if needed.
fn write_default(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists; use --force to overwrite", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
