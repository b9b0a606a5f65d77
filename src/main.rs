//! # ln-sync CLI
//!
//! This is the binary entry point for the `ln-sync` command-line tool.
//!
//! It parses the command line with `clap`, sets up logging and hands over to
//! the selected command. All synchronization logic lives in the library
//! crate; the binary only builds the run environment and prints results.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
