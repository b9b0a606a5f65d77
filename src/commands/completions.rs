//! `ln-sync completions <shell>` prints a completion script for the whole
//! command tree, including the CI variable fallbacks of `run` and `check`.

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

const BIN_NAME: &str = "ln-sync";

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the script for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    generate(args.shell, &mut Cli::command(), BIN_NAME, &mut io::stdout());
    Ok(())
}
