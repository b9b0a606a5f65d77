//! # ln-sync Library
//!
//! This library keeps files in sync across repositories hosted on a code
//! forge. A configuration lists "links" from a source file to a destination
//! file; a run finds the destinations that are stale and proposes updates
//! through one pull request per destination repository.
//!
//! ## Quick Example
//!
//! ```
//! use ln_sync::environment::Environment;
//! use ln_sync::file::Repo;
//! use ln_sync::forge::memory::MemoryForge;
//! use ln_sync::link::Status;
//!
//! let forge = MemoryForge::new();
//! let current = Repo::new("o", "current");
//! let src = Repo::new("a", "b");
//! let dst = Repo::new("c", "d");
//! for repo in [&current, &src, &dst] {
//!     forge.add_repo(repo, "main").unwrap();
//! }
//!
//! let config = "links:\n  - from: a/b:src.txt\n    to: c/d:dst.txt\n";
//! forge.add_file(&current, "main", ".ln-config.yaml", config).unwrap();
//! forge.add_file(&src, "main", "src.txt", "X").unwrap();
//! forge.add_file(&dst, "main", "dst.txt", "Y").unwrap();
//!
//! let environment = Environment::new("o/current").unwrap();
//! let report = ln_sync::sync::run(&forge, &environment).unwrap();
//!
//! assert_eq!(report.count(Status::Updated), 1);
//! assert_eq!(
//!     forge.file(&dst, "auto-action-ln", "dst.txt").unwrap().as_deref(),
//!     Some("X")
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **File references (`file`, `parse`)**: a `FileRef` names one file in one
//!   repository at one revision. Declarations accept several shorthand forms.
//! - **Links (`link`, `links`)**: a source/destination pair, how declarations
//!   expand into links, defaulting, moot-link filtering and grouping.
//! - **Templates (`template`)**: derived fields and generated texts are small
//!   templates evaluated against the link, the configuration and the run
//!   environment.
//! - **Configuration (`config`)**: the YAML document and its resolution into
//!   links.
//! - **Forges (`forge`)**: the narrow traits the engine uses to read files and
//!   manage branches and pull requests, with in-memory, directory-backed and
//!   dry-run implementations.
//!
//! ## Execution Flow
//!
//! `sync::run` executes the following steps:
//!
//! 1.  **Read**: fetch the configuration from the current repository, or from
//!     the local filesystem.
//! 2.  **Resolve**: parse declarations, expand, default, template and filter.
//! 3.  **Populate**: read the source and destination of every link.
//! 4.  **Synchronize**: per destination repository, update stale files on the
//!     integration branch and open or reuse a pull request.

pub mod config;
pub mod defaults;
pub mod environment;
pub mod error;
pub mod file;
pub mod forge;
pub mod format;
pub mod link;
pub mod links;
pub mod output;
pub mod parse;
pub mod sync;
pub mod template;

#[cfg(test)]
mod parse_proptest;
