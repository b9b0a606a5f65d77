//! # Forge Collaborators
//!
//! The engine never talks to a code forge directly. Everything it needs from
//! one goes through four narrow traits:
//!
//! - **`FileStore`**: read a file at a revision, write a file on a branch.
//! - **`RepoStore`**: look up a repository's default branch.
//! - **`BranchStore`**: look up, create and delete branches.
//! - **`PullRequestStore`**: find or open a pull request.
//!
//! `Forge` bundles the four and is implemented for any type implementing all
//! of them. Every method is a single blocking round trip; none of them retry.
//!
//! Implementations shipped with the crate:
//!
//! - `memory::MemoryForge`, an in-memory forge for tests and embedding.
//! - `local::LocalForge`, a forge backed by a directory tree.
//! - `noop::NoopForge`, a wrapper that lets reads through and fakes writes.

pub mod local;
pub mod memory;
pub mod noop;

use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A branch and the commit it points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub sha: String,
    /// Whether the branch was created by the call that returned it.
    #[serde(default)]
    pub is_new: bool,
}

/// An open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub repo: Repo,
    pub number: u64,
    /// Whether the pull request was opened by the call that returned it.
    #[serde(default)]
    pub is_new: bool,
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Reads and writes file contents.
pub trait FileStore {
    /// Returns `file` with its content, hashes, name and URL filled in.
    ///
    /// Fails with `Error::MissingFile` when the file does not exist at
    /// `file.r#ref`, which callers treat differently from other failures.
    fn read(&self, file: &FileRef) -> Result<FileRef>;

    /// Writes `file.content` to `file.path` on `branch`, returning the file as
    /// it now exists on the forge.
    fn write(&self, file: &FileRef, branch: &str, message: &str) -> Result<FileRef>;
}

/// Looks up repositories.
pub trait RepoStore {
    fn default_branch(&self, repo: &Repo) -> Result<String>;
}

/// Manages branches.
pub trait BranchStore {
    /// Looks up an existing branch.
    fn branch(&self, repo: &Repo, name: &str) -> Result<Branch>;

    /// Returns the branch `name`, creating it at `base_sha` when missing.
    fn get_or_create_branch(&self, repo: &Repo, name: &str, base_sha: &str) -> Result<Branch>;

    fn delete_branch(&self, repo: &Repo, name: &str) -> Result<()>;
}

/// Manages pull requests.
pub trait PullRequestStore {
    /// Returns the open pull request from `head` into `base`, opening one with
    /// `title` and `body` when there is none.
    fn get_or_create_pull(
        &self,
        repo: &Repo,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;
}

/// Everything the synchronization run needs from a forge.
pub trait Forge: FileStore + RepoStore + BranchStore + PullRequestStore {}

impl<T: FileStore + RepoStore + BranchStore + PullRequestStore + ?Sized> Forge for T {}

/// A pull request as recorded by the bundled forges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRecord {
    pub number: u64,
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
}

/// A file write as recorded by the bundled forges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub branch: String,
    pub path: String,
    pub message: String,
}

/// Hex SHA-256 over `parts`, each terminated by a NUL byte.
pub(crate) fn digest(parts: &[&str]) -> String {
    let parts: Vec<&[u8]> = parts.iter().map(|p| p.as_bytes()).collect();
    digest_bytes(&parts)
}

/// Like `digest`, for content that need not be UTF-8.
pub(crate) fn digest_bytes(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// The base name of a path, used as a file's display name.
pub(crate) fn base_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

pub(crate) fn missing(file: &FileRef) -> Error {
    Error::MissingFile {
        file: file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.txt"), "c.txt");
        assert_eq!(base_name("c.txt"), "c.txt");
        assert_eq!(base_name(""), "");
    }

    #[test]
    fn test_digest_is_stable_and_separated() {
        assert_eq!(digest(&["a", "b"]), digest(&["a", "b"]));
        assert_ne!(digest(&["ab", ""]), digest(&["a", "b"]));
        assert_eq!(digest(&[""]).len(), 64);
    }

    #[test]
    fn test_digest_bytes_matches_digest() {
        let binary: &[u8] = &[0xff, 0xfe];
        assert_eq!(digest_bytes(&["a".as_bytes(), "b".as_bytes()]), digest(&["a", "b"]));
        assert_ne!(digest_bytes(&[binary]), digest(&[""]));
    }

    #[test]
    fn test_pull_request_display() {
        let pull = PullRequest {
            repo: Repo::new("o", "r"),
            number: 3,
            is_new: true,
        };
        assert_eq!(pull.to_string(), "o/r#3");
    }
}
