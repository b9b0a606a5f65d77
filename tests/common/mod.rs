//! Shared test utilities for integration and E2E tests.
//!
//! `TestFixture` lays out a directory-backed forge in a temporary directory
//! and builds `ln-sync` commands pointed at it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_repo("o/current", "main")
//!         .with_file("o/current", "main", ".ln-config.yaml", configs::SINGLE_LINK);
//!     fixture.run_command().assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use ln_sync::environment::parse_repo;
use ln_sync::forge::local::LocalForge;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    pub use super::configs;
    pub use super::TestFixture;
}

/// Variables a CI runner may set that would leak into the commands under
/// test.
const CI_VARIABLES: &[&str] = &[
    "GITHUB_REPOSITORY",
    "GITHUB_SERVER_URL",
    "GITHUB_RUN_ID",
    "INPUT_CONFIG",
    "INPUT_LOCAL_CONFIG",
    "INPUT_NOOP",
    "RUNNER_DEBUG",
    "LN_SYNC_FORGE_ROOT",
];

/// Configuration snippets shared by the tests.
pub mod configs {
    /// One link between two other repositories.
    pub const SINGLE_LINK: &str = "links:\n  - from: a/b:src.txt\n    to: c/d:dst.txt\n";

    /// One source copied into two repositories.
    pub const FAN_OUT: &str = r#"
links:
  - from: a/b:src.txt
    to:
      - c/d:dst.txt
      - e/f:dst.txt
"#;

    /// Only a moot link.
    pub const MOOT: &str = "links:\n  - from: p1\n    to: p1\n";

    /// A key the configuration does not know.
    pub const UNKNOWN_KEY: &str = "linkz: []\n";
}

/// A temporary directory holding a forge under `forge/`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("forge")
            .create_dir_all()
            .expect("Failed to create forge directory");
        Self { temp_dir }
    }

    /// Root of the forge.
    pub fn forge_root(&self) -> PathBuf {
        self.temp_dir.path().join("forge")
    }

    pub fn forge(&self) -> LocalForge {
        LocalForge::new(self.forge_root())
    }

    /// Adds a repository (`owner/repo`) with an empty default branch.
    pub fn with_repo(self, repo: &str, default_branch: &str) -> Self {
        let repo = parse_repo(repo).expect("Invalid repository");
        self.forge()
            .init_repo(&repo, default_branch)
            .expect("Failed to create repository");
        self
    }

    /// Adds a file on a branch of a repository.
    pub fn with_file(self, repo: &str, branch: &str, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("forge/{}/branches/{}/{}", repo, branch, path))
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Adds a file outside the forge.
    pub fn with_local_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Reads a file from a branch, if present.
    pub fn file(&self, repo: &str, branch: &str, path: &str) -> Option<String> {
        let path = self
            .forge_root()
            .join(repo)
            .join("branches")
            .join(branch)
            .join(path);
        std::fs::read_to_string(path).ok()
    }

    pub fn has_branch(&self, repo: &str, branch: &str) -> bool {
        self.forge_root()
            .join(repo)
            .join("branches")
            .join(branch)
            .is_dir()
    }

    /// The recorded pull requests of a repository, as raw YAML.
    pub fn pulls(&self, repo: &str) -> Option<String> {
        std::fs::read_to_string(self.forge_root().join(repo).join("pulls.yaml")).ok()
    }

    /// A command running in the fixture's directory, isolated from CI
    /// variables, with colors off.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ln-sync");
        cmd.current_dir(self.path());
        for variable in CI_VARIABLES {
            cmd.env_remove(variable);
        }
        cmd.arg("--color").arg("never");
        cmd
    }

    /// A `run` command for the current repository `o/current` against the
    /// fixture's forge.
    pub fn run_command(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("run")
            .arg("--repo")
            .arg("o/current")
            .arg("--forge-root")
            .arg(self.forge_root());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
