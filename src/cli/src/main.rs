//! FACTS Total CLI - combines component projection files into a total.
//!
//! Provides commands for totaling, inspecting cube files, and configuration.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use facts_total_core::{telemetry, TotalError};
use std::path::PathBuf;

use commands::{config, inspect, total};
use output::{OutputFormat, Printer};

/// FACTS Total - sums component projections into a total projection
#[derive(Parser)]
#[command(
    name = "facts-total",
    version,
    about = "FACTS Total - sums component projections into a total projection",
    long_about = "Totals aligned projection cubes, merging their attributes and recording \
                  the full path of every contributing file in the `source` attribute.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Configuration file (defaults to ~/.facts-total/config.toml when present)
    #[arg(short, long, global = true, env = "FACTS_TOTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level or filter directive, overriding the configured one
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Total component projection files into one file
    Total(total::TotalArgs),

    /// Show the dimensions and attributes of cube files
    Inspect(inspect::InspectArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        if let Some(error) = e.downcast_ref::<TotalError>() {
            error.log();
        }
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        settings.logging.level = level;
    }
    telemetry::init_logging(&settings.logging)?;

    let printer = Printer::new(cli.output);
    match cli.command {
        Commands::Total(args) => total::execute(args, &settings, &printer),
        Commands::Inspect(args) => inspect::execute(args, &printer),
        Commands::Config(cmd) => config::execute(cmd, cli.config.as_deref(), &settings, &printer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_total_accepts_repeated_items() {
        let cli = Cli::try_parse_from([
            "facts-total",
            "total",
            "--item",
            "ais.json",
            "--item",
            "gis.json",
            "--output-path",
            "total.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Total(args) => {
                assert_eq!(args.items.len(), 2);
                assert_eq!(args.name, "my_workflow_name");
            }
            _ => panic!("expected total command"),
        }
    }

    #[test]
    fn test_total_requires_an_item() {
        let result = Cli::try_parse_from(["facts-total", "total", "--output-path", "total.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_output_flag() {
        let cli = Cli::try_parse_from(["facts-total", "inspect", "a.json", "-o", "json"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
    }
}
