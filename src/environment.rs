//! # Run Environment
//!
//! Everything a run knows about where it executes: the current repository,
//! where the configuration lives, the forge's web root and the CI run. The
//! CLI fills it from flags and the usual CI variables (`GITHUB_REPOSITORY`,
//! `GITHUB_SERVER_URL`, `GITHUB_RUN_ID`, `INPUT_CONFIG`, `INPUT_LOCAL_CONFIG`,
//! `INPUT_NOOP`, `RUNNER_DEBUG`).
//!
//! The environment is serialized into template contexts as `Environment`,
//! so its field names are part of the template surface.

use crate::defaults::{DEFAULT_CONFIG_PATH, DEFAULT_SERVER};
use crate::error::{Error, Result};
use crate::file::Repo;
use serde::Serialize;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    repo: Repo,
    server: String,
    run_id: Option<String>,
    /// Whether the run executes inside CI, i.e. has a run id.
    on_action: bool,
    /// `<server>/<repo>/actions/runs/<run_id>`
    exec_url: String,

    /// Path of the configuration in the current repository.
    pub config: String,
    /// When set, the configuration is read from this local file instead.
    pub local_config: Option<PathBuf>,
    /// Reads go to the forge, writes are only logged.
    pub noop: bool,
    pub debug: bool,
}

impl Environment {
    /// An environment for `repo` (`owner/repo`) with every other value at its
    /// default.
    pub fn new(repo: &str) -> Result<Self> {
        let mut environment = Self {
            repo: parse_repo(repo)?,
            server: DEFAULT_SERVER.to_string(),
            run_id: None,
            on_action: false,
            exec_url: String::new(),
            config: DEFAULT_CONFIG_PATH.to_string(),
            local_config: None,
            noop: false,
            debug: false,
        };
        environment.refresh();
        Ok(environment)
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn on_action(&self) -> bool {
        self.on_action
    }

    pub fn exec_url(&self) -> &str {
        &self.exec_url
    }

    /// Sets the forge's web root, which must be an absolute URL.
    pub fn set_server(&mut self, server: &str) -> Result<()> {
        Url::parse(server)?;
        self.server = server.trim_end_matches('/').to_string();
        self.refresh();
        Ok(())
    }

    /// Sets the CI run id; empty ids count as none.
    pub fn set_run_id(&mut self, run_id: Option<String>) {
        self.run_id = run_id.filter(|id| !id.is_empty());
        self.refresh();
    }

    fn refresh(&mut self) {
        self.on_action = self.run_id.is_some();
        self.exec_url = format!(
            "{}/{}/actions/runs/{}",
            self.server,
            self.repo,
            self.run_id.as_deref().unwrap_or_default()
        );
    }
}

/// Parses an `owner/repo` string.
pub fn parse_repo(s: &str) -> Result<Repo> {
    match s.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok(Repo::new(owner, repo))
        }
        _ => Err(Error::Environment {
            message: format!("repository {:?} invalid: want owner/repo", s),
        }),
    }
}
