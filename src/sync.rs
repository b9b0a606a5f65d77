//! # Synchronization Run
//!
//! `run` is the whole job end to end:
//!
//! 1. Read the configuration, from the local filesystem when the environment
//!    names a local file, otherwise from the current repository's default
//!    branch.
//! 2. Resolve it into links and read both ends of every link.
//! 3. For each destination repository, bring its links up to date on the
//!    integration branch and open (or reuse) a pull request.
//!
//! Parse and resolution failures abort the run before anything is written.
//! Per-link failures are recorded on the link and never abort. A failure in
//! a repository's branch or pull request handling aborts the remaining
//! repositories; updates already made elsewhere are kept.

use crate::config::{log_warnings, Config, Warning};
use crate::defaults::{local_source, HEAD_BRANCH, PULL_TITLE};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use crate::format::Formatter;
use crate::forge::{Forge, PullRequest};
use crate::link::{Link, Status};
use crate::links::update_all;
use crate::template::Context;
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::Path;
use url::Url;

/// What happened to one destination repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// The integration branch carries updates and this pull request proposes
    /// them.
    PullRequest(PullRequest),
    /// Nothing was updated and the integration branch, created by this run,
    /// was deleted again.
    BranchDeleted(String),
}

impl fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOutcome::PullRequest(pull) if pull.is_new => write!(f, "opened {}", pull),
            GroupOutcome::PullRequest(pull) => write!(f, "updated {}", pull),
            GroupOutcome::BranchDeleted(branch) => {
                write!(f, "nothing to update, deleted branch {}", branch)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub repo: Repo,
    pub links: Vec<Link>,
    pub outcome: GroupOutcome,
}

/// Everything a run did, in processing order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub warnings: Vec<Warning>,
    pub groups: Vec<GroupReport>,
}

impl RunReport {
    /// Number of links that ended with `status`.
    pub fn count(&self, status: Status) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.links)
            .filter(|l| l.status == status)
            .count()
    }
}

/// Reads, resolves and synchronizes the configuration described by
/// `environment`.
pub fn run<F: Forge + ?Sized>(forge: &F, environment: &Environment) -> Result<RunReport> {
    let (config, warnings) = load_config(forge, environment)?;
    log_warnings(&warnings);

    let formatter = Formatter::new(&config, environment)?;
    let groups = config.groups();
    debug!("Processing groups\n{}", groups);

    let mut report = RunReport {
        warnings,
        groups: Vec::with_capacity(groups.len()),
    };

    for group in groups {
        let mut links = group.links;
        let outcome = process_group(forge, &formatter, &group.repo, &mut links)?;
        info!("{}: {}", group.repo, outcome);
        report.groups.push(GroupReport {
            repo: group.repo,
            links,
            outcome,
        });
    }

    Ok(report)
}

/// Synchronizes the links of one destination repository.
pub fn process_group<F: Forge + ?Sized>(
    forge: &F,
    formatter: &Formatter,
    repo: &Repo,
    links: &mut [Link],
) -> Result<GroupOutcome> {
    info!("Processing links for {}", repo);

    let base_name = forge.default_branch(repo)?;
    let base = forge.branch(repo, &base_name)?;
    let head = forge.get_or_create_branch(repo, HEAD_BRANCH, &base.sha)?;
    debug!("Branches for {}: base {:?}, head {:?}", repo, base, head);

    let updated = update_all(links, forge, formatter, &head.name);
    if !updated && head.is_new {
        info!("No link was updated, cleaning up {} in {}", head.name, repo);
        forge.delete_branch(repo, &head.name)?;
        return Ok(GroupOutcome::BranchDeleted(head.name));
    }

    let body = formatter.pull_body(links)?;
    debug!("Pull body:\n{}", body);

    let pull = forge.get_or_create_pull(repo, &base.name, &head.name, PULL_TITLE, &body)?;
    Ok(GroupOutcome::PullRequest(pull))
}

/// Reads and resolves the configuration, then reads both ends of every link.
pub fn load_config<F: Forge + ?Sized>(
    forge: &F,
    environment: &Environment,
) -> Result<(Config, Vec<Warning>)> {
    let source = read_config(forge, environment)?;
    let (mut config, warnings) = resolve_config(source, environment)?;
    config.populate(forge, HEAD_BRANCH)?;
    debug!("Populated {} links", config.links.len());
    Ok((config, warnings))
}

/// Parses `source` into a configuration without touching any forge.
pub fn resolve_config(
    source: FileRef,
    environment: &Environment,
) -> Result<(Config, Vec<Warning>)> {
    let content = source.content.clone();
    let mut config = Config::new(source, environment.repo().clone());
    let extras = Context::new().with("Environment", environment)?;
    let warnings = config.parse(&content, &extras)?;
    Ok((config, warnings))
}

/// Reads the configuration file the environment points at.
pub fn read_config<F: Forge + ?Sized>(forge: &F, environment: &Environment) -> Result<FileRef> {
    match &environment.local_config {
        Some(path) => read_local_config(path),
        None => {
            let repo = environment.repo();
            info!("Read config from {}", repo);

            let branch = forge.branch(repo, &forge.default_branch(repo)?)?;
            let mut file = FileRef::new(repo.clone(), environment.config.clone(), branch.name);
            file.commit = branch.sha;
            forge.read(&file)
        }
    }
}

/// Reads a configuration from the filesystem. The file gets placeholder
/// repository and revision metadata since it has none.
pub fn read_local_config(path: &Path) -> Result<FileRef> {
    info!("Read config from {}", path.display());

    let content = fs::read_to_string(path)?;
    let absolute = std::path::absolute(path)?;
    let url = Url::from_file_path(&absolute).map_err(|_| Error::Environment {
        message: format!("cannot build a URL for {}", absolute.display()),
    })?;

    Ok(FileRef {
        repo: Repo::new(local_source::OWNER, local_source::REPO),
        path: path.display().to_string(),
        r#ref: local_source::REF.to_string(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content,
        sha: local_source::SHA.to_string(),
        commit: local_source::COMMIT.to_string(),
        html_url: url.to_string(),
    })
}
