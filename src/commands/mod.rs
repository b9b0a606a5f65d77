//! # CLI Command Implementations
//!
//! Each subcommand of `ln-sync` lives in its own file, with an `Args` struct
//! derived with `clap` and an `execute` function that calls into the
//! `ln_sync` library.

pub mod check;
pub mod completions;
pub mod run;
