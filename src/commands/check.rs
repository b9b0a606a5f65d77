//! # Check Command Implementation
//!
//! This module implements the `check` subcommand. It parses and resolves a
//! local configuration file exactly as a run would, without reading or
//! writing anything on a forge, and lists the resulting links grouped by
//! destination repository together with any warnings.
//!
//! Since no file is read, source and destination refs are shown as written
//! in the configuration; empty refs are only resolved during a run.

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;

use ln_sync::config::Config;
use ln_sync::defaults::DEFAULT_CONFIG_PATH;
use ln_sync::environment::Environment;
use ln_sync::output::{emoji, status_marker, warning_marker, OutputConfig};
use ln_sync::sync;

/// Resolve a local configuration and list its links
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the configuration file to check.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// The repository the configuration belongs to, as owner/repo. Links that
    /// name no repository default to it.
    #[arg(long, value_name = "OWNER/REPO", env = "GITHUB_REPOSITORY")]
    pub repo: String,
}

/// Execute the `check` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: CheckArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    println!(
        "{} Checking configuration: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.config.display()
    );

    let environment = Environment::new(&args.repo)?;
    let source = sync::read_local_config(&args.config).map_err(|e| {
        anyhow!(
            "Failed to read config from {}: {}",
            args.config.display(),
            e
        )
    })?;
    let (config, warnings) = sync::resolve_config(source, &environment)
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    for warning in &warnings {
        println!("{} {}", warning_marker(&out), warning);
    }

    print_groups(&out, &config);
    Ok(())
}

fn print_groups(out: &OutputConfig, config: &Config) {
    let groups = config.groups();
    if groups.is_empty() {
        println!("{} No links configured", emoji(out, "✅", "[OK]"));
        return;
    }

    println!(
        "{} {} link(s) in {} repository group(s)",
        emoji(out, "✅", "[OK]"),
        config.links.len(),
        groups.len()
    );
    for group in groups.iter() {
        println!("\n{} {}", emoji(out, "📦", "[REPO]"), group.repo);
        for link in &group.links {
            println!("   {} {}", status_marker(out, link.status), link);
        }
    }
}
