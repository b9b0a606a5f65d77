//! CLI argument parsing and command dispatch

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;

/// ln-sync - Keep linked files in sync across repositories
#[derive(Parser, Debug)]
#[command(name = "ln-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Update stale linked files and open pull requests
    Run(commands::run::RunArgs),

    /// Resolve a local configuration and list its links
    Check(commands::check::CheckArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging()?;

        match self.command {
            Commands::Run(args) => commands::run::execute(args, &self.color),
            Commands::Check(args) => commands::check::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }

    fn init_logging(&self) -> Result<()> {
        let level: LevelFilter = self
            .log_level
            .parse()
            .map_err(|_| anyhow!("Invalid log level: {}", self.log_level))?;

        let level = match &self.command {
            Commands::Run(args) if args.debug => level.max(LevelFilter::Debug),
            _ => level,
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .filter_level(level)
            .target(env_logger::Target::Stderr)
            .try_init()?;
        Ok(())
    }
}
