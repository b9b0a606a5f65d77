//! # Output Configuration
//!
//! Controls how the CLI decorates what it prints: status markers are emoji
//! when colors are enabled and bracketed words otherwise.
//!
//! Colors follow, in order:
//! - `--color=always|never|auto`
//! - `NO_COLOR` (any value, including empty) disables them
//! - `CLICOLOR=0` disables them
//! - `CLICOLOR_FORCE=1` forces them even without a TTY
//! - `TERM=dumb` disables them
//! - otherwise, whether stdout supports colors

use crate::link::Status;
use std::env;

#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Builds the configuration from the value of `--color` and the
    /// environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled and `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// The marker printed in front of a link with `status`.
pub fn status_marker(config: &OutputConfig, status: Status) -> &'static str {
    match status {
        Status::Unchecked => emoji(config, "🔗", "[LINK]"),
        Status::UpdateNotNeeded => emoji(config, "✅", "[OK]"),
        Status::Updated => emoji(config, "📝", "[UPDATED]"),
        Status::FailedToCheck | Status::FailedToUpdate => emoji(config, "❌", "[FAILED]"),
    }
}

pub fn warning_marker(config: &OutputConfig) -> &'static str {
    emoji(config, "⚠️", "[WARN]")
}
