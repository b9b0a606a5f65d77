//! # Error Handling
//!
//! This module defines the centralized error type for `ln-sync`. It uses the
//! `thiserror` library to create a single `Error` enum covering every failure
//! the engine can report, from configuration parsing down to the forge
//! collaborators.
//!
//! ## Error Classes
//!
//! The variants fall into the three classes the engine distinguishes:
//!
//! - **Parse errors** (`ConfigParse`, `InvalidFileType`, `InvalidLinkFormat`,
//!   `Template`): the configuration is malformed. These abort the run before
//!   any forge call is made.
//! - **Resolution errors** (`Resolution`): a link's source or destination could
//!   not be populated. These also abort the whole run.
//! - **Forge errors** (`MissingFile`, `Forge`): a single collaborator call
//!   failed. During synchronization they are recorded on the link as a status
//!   and never abort the batch.
//!
//! The `Result` type alias is used throughout the library.

use thiserror::Error;

/// Main error type for ln-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing the configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A `from` or `to` declaration has a shape the parser does not accept.
    #[error("Invalid file type: {value}")]
    InvalidFileType { value: String },

    /// A link string did not have the `from -> to` shape.
    #[error("Link format invalid, want 'from -> to', got {input:?}")]
    InvalidLinkFormat { input: String },

    /// An error occurred during template processing.
    ///
    /// Includes the name of the link field being resolved when applicable.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The field that was being templated, if applicable
        variable: Option<String>,
    },

    /// The forge reported that a file does not exist.
    #[error("File does not exist: {file}")]
    MissingFile { file: String },

    /// The forge reported that a branch does not exist.
    #[error("Branch {branch} not found in {repo}")]
    MissingBranch { repo: String, branch: String },

    /// A forge operation failed for any other reason.
    #[error("Forge operation error: {operation} - {message}")]
    Forge { operation: String, message: String },

    /// A link's source or destination could not be populated.
    #[error("Failed to resolve link {link}: {message}")]
    Resolution { link: String, message: String },

    /// The run environment is incomplete or invalid.
    #[error("Invalid environment: {message}")]
    Environment { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Returns true when the error means "the file is not there", as opposed
    /// to any other failure to read it.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Error::MissingFile { .. })
    }

    /// Returns true when a branch lookup failed only because the branch is
    /// not there.
    pub fn is_missing_branch(&self) -> bool {
        matches!(self, Error::MissingBranch { .. })
    }

    pub(crate) fn missing_branch(repo: &crate::file::Repo, branch: &str) -> Self {
        Error::MissingBranch {
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }

    pub(crate) fn forge(operation: &str, message: impl ToString) -> Self {
        Error::Forge {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
