//! # File References
//!
//! A `FileRef` identifies one file in one repository at one revision. The
//! first half of its fields comes from the configuration (`repo`, `path`,
//! `ref`); the second half is filled in by the forge when the file is read
//! (`content`, `sha`, `commit`, `name`, `html_url`).
//!
//! Empty strings mean "not specified" everywhere: an empty repository is
//! inherited during defaulting, an empty ref means the default branch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A repository on the forge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repo {
    pub owner: String,
    pub repo: String,
    /// Filled in by the forge; never read from the configuration.
    #[serde(default)]
    pub default_branch: String,
}

impl Repo {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            default_branch: String::new(),
        }
    }

    /// A repository identity is empty only when nothing at all is known about
    /// it, including its default branch.
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty() && self.repo.is_empty() && self.default_branch.is_empty()
    }

    /// The `owner/repo` key used for grouping and display.
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl PartialEq for Repo {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.repo == other.repo
    }
}

impl Eq for Repo {}

impl fmt::Display for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// One file in one repository at one revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRef {
    pub repo: Repo,
    pub path: String,
    /// Branch, tag or commit; empty means the default branch.
    pub r#ref: String,

    /// Display name, usually the file's base name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    /// Blob hash.
    #[serde(default)]
    pub sha: String,
    /// Commit hash.
    #[serde(default)]
    pub commit: String,
    /// Canonical URL of the file.
    #[serde(default)]
    pub html_url: String,
}

impl FileRef {
    pub fn new(repo: Repo, path: impl Into<String>, r#ref: impl Into<String>) -> Self {
        Self {
            repo,
            path: path.into(),
            r#ref: r#ref.into(),
            ..Self::default()
        }
    }

    /// Path of the file at its commit, relative to the forge's web root.
    pub fn html_path(&self) -> String {
        format!("/{}/blob/{}/{}", self.repo, self.commit, self.path)
    }

    /// The same file at another revision, without any retrieved data.
    pub fn at(&self, r#ref: &str) -> Self {
        Self::new(self.repo.clone(), self.path.clone(), r#ref)
    }
}

/// Content is fetched lazily, so it takes no part in equality.
impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        self.repo == other.repo
            && self.path == other.path
            && self.sha == other.sha
            && self.commit == other.commit
            && self.r#ref == other.r#ref
    }
}

impl Eq for FileRef {}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.repo, self.path, self.r#ref)
    }
}
