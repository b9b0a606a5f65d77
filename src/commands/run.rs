//! # Run Command Implementation
//!
//! This module implements the `run` subcommand, which performs a full
//! synchronization against a directory-backed forge:
//!
//! - **Configuration**: read from the current repository's default branch, or
//!   from a local file with `--local-config`.
//! - **Synchronization**: stale destinations are updated on the integration
//!   branch of their repository and a pull request is opened or reused.
//! - **Dry runs**: with `--noop` (or `INPUT_NOOP`), reads still reach the
//!   forge but every write is only logged.
//!
//! Every option can also come from the variables a CI runner sets, so the
//! command runs unchanged inside a workflow.

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::{self, PathBuf};

use ln_sync::defaults::{DEFAULT_CONFIG_PATH, DEFAULT_SERVER};
use ln_sync::environment::Environment;
use ln_sync::forge::local::LocalForge;
use ln_sync::forge::noop::NoopForge;
use ln_sync::forge::Forge;
use ln_sync::link::Status;
use ln_sync::output::{emoji, status_marker, warning_marker, OutputConfig};
use ln_sync::sync::{self, RunReport};

/// Update stale linked files and open pull requests
#[derive(Args, Debug)]
pub struct RunArgs {
    /// The current repository, as owner/repo.
    #[arg(long, value_name = "OWNER/REPO", env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// Path of the configuration file in the current repository.
    #[arg(long, value_name = "PATH", env = "INPUT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Read the configuration from this local file instead of the forge.
    #[arg(long, value_name = "FILE", env = "INPUT_LOCAL_CONFIG")]
    pub local_config: Option<PathBuf>,

    /// Web root of the forge, used for links in generated texts.
    #[arg(long, value_name = "URL", env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER)]
    pub server: String,

    /// Id of the CI run, used for the execution link in pull requests.
    #[arg(long, value_name = "ID", env = "GITHUB_RUN_ID")]
    pub run_id: Option<String>,

    /// Only log what would be written.
    #[arg(long, env = "INPUT_NOOP")]
    pub noop: bool,

    /// Log at debug level.
    #[arg(long, env = "RUNNER_DEBUG")]
    pub debug: bool,

    /// Root directory of the forge (one `<owner>/<repo>` directory per
    /// repository).
    #[arg(long, value_name = "DIR", env = "LN_SYNC_FORGE_ROOT")]
    pub forge_root: PathBuf,
}

impl RunArgs {
    fn environment(&self) -> Result<Environment> {
        let mut environment = Environment::new(&self.repo)?;
        environment.set_server(&self.server)?;
        environment.set_run_id(self.run_id.clone());
        environment.config = self.config.clone();
        environment.local_config = self.local_config.clone();
        environment.noop = self.noop;
        environment.debug = self.debug;
        Ok(environment)
    }
}

/// Execute the `run` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: RunArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let environment = args.environment()?;

    if !args.forge_root.is_dir() {
        return Err(anyhow!(
            "Forge root {} is not a directory",
            args.forge_root.display()
        ));
    }
    let forge = LocalForge::new(path::absolute(&args.forge_root)?);

    let report = if environment.noop {
        println!(
            "{} Dry run: nothing will be written",
            emoji(&out, "🧪", "[NOOP]")
        );
        run_with(&NoopForge::new(forge), &environment)?
    } else {
        run_with(&forge, &environment)?
    };

    print_report(&out, &report);
    Ok(())
}

fn run_with<F: Forge>(forge: &F, environment: &Environment) -> Result<RunReport> {
    sync::run(forge, environment).map_err(|e| anyhow!("Sync failed: {}", e))
}

fn print_report(out: &OutputConfig, report: &RunReport) {
    for warning in &report.warnings {
        println!("{} {}", warning_marker(out), warning);
    }

    if report.groups.is_empty() {
        println!("{} No links to synchronize", emoji(out, "✅", "[OK]"));
        return;
    }

    for group in &report.groups {
        println!("\n{} {}: {}", emoji(out, "📦", "[REPO]"), group.repo, group.outcome);
        for link in &group.links {
            println!("   {} {} ({})", status_marker(out, link.status), link, link.status);
        }
    }

    let failed = report.count(Status::FailedToCheck) + report.count(Status::FailedToUpdate);
    println!(
        "\n{} updated, {} up to date, {} failed",
        report.count(Status::Updated),
        report.count(Status::UpdateNotNeeded),
        failed
    );
}
