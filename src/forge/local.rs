//! # Directory-Backed Forge
//!
//! `LocalForge` serves repositories from a directory tree, which makes the
//! binary usable end to end without a network:
//!
//! ```text
//! <root>/<owner>/<repo>/repo.yaml            default_branch: main
//! <root>/<owner>/<repo>/branches/<branch>/…  the branch's files
//! <root>/<owner>/<repo>/pulls.yaml           opened pull requests
//! <root>/<owner>/<repo>/commits.yaml         file writes
//! ```
//!
//! Blob SHAs are SHA-256 digests of the content. A branch's SHA is a digest
//! of its whole tree, so it changes whenever a file on the branch does, and a
//! ref naming that SHA resolves to the branch.

use super::{
    base_name, digest, digest_bytes, missing, Branch, BranchStore, CommitRecord, FileStore, PullRecord,
    PullRequest, PullRequestStore, RepoStore,
};
use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

const REPO_FILE: &str = "repo.yaml";
const PULLS_FILE: &str = "pulls.yaml";
const COMMITS_FILE: &str = "commits.yaml";
const BRANCHES_DIR: &str = "branches";

/// Contents of `repo.yaml`.
#[derive(Debug, Serialize, Deserialize)]
struct RepoMeta {
    default_branch: String,
}

/// A forge rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalForge {
    root: PathBuf,
}

impl LocalForge {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates `repo` with an empty `default_branch` if it does not exist.
    pub fn init_repo(&self, repo: &Repo, default_branch: &str) -> Result<()> {
        let dir = self.repo_dir(repo)?;
        fs::create_dir_all(dir.join(BRANCHES_DIR).join(checked_name("branch", default_branch)?))?;
        let meta = RepoMeta {
            default_branch: default_branch.to_string(),
        };
        fs::write(dir.join(REPO_FILE), serde_yaml::to_string(&meta)?)?;
        Ok(())
    }

    fn repo_dir(&self, repo: &Repo) -> Result<PathBuf> {
        Ok(self
            .root
            .join(checked_name("owner", &repo.owner)?)
            .join(checked_name("repo", &repo.repo)?))
    }

    fn branches_dir(&self, repo: &Repo) -> Result<PathBuf> {
        Ok(self.repo_dir(repo)?.join(BRANCHES_DIR))
    }

    fn branch_dir(&self, repo: &Repo, branch: &str) -> Result<PathBuf> {
        Ok(self.branches_dir(repo)?.join(checked_name("branch", branch)?))
    }

    fn meta(&self, repo: &Repo) -> Result<RepoMeta> {
        let path = self.repo_dir(repo)?.join(REPO_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::forge("repository", format!("{}: {}", path.display(), e))
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Names of all branches of `repo`.
    fn branch_names(&self, repo: &Repo) -> Result<Vec<String>> {
        let dir = self.branches_dir(repo)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolves `r#ref` to a branch name, by name or by tree SHA.
    fn resolve_ref(&self, repo: &Repo, r#ref: &str) -> Result<Option<String>> {
        self.repo_dir(repo)?;
        let name = if r#ref.is_empty() {
            match self.meta(repo) {
                Ok(meta) => meta.default_branch,
                Err(_) => return Ok(None),
            }
        } else {
            r#ref.to_string()
        };

        if self.branch_dir(repo, &name)?.is_dir() {
            return Ok(Some(name));
        }

        for branch in self.branch_names(repo)? {
            if tree_sha(&self.branch_dir(repo, &branch)?)? == r#ref {
                return Ok(Some(branch));
            }
        }

        Ok(None)
    }

    fn retrieved(
        &self,
        file: &FileRef,
        full_path: &Path,
        content: String,
        commit: String,
    ) -> Result<FileRef> {
        let url = Url::from_file_path(full_path).map_err(|_| {
            Error::forge("url", format!("{} is not an absolute path", full_path.display()))
        })?;

        let mut out = file.clone();
        out.sha = digest(&["blob", &content]);
        out.content = content;
        out.commit = commit;
        out.name = base_name(&file.path);
        out.html_url = url.to_string();
        Ok(out)
    }
}

/// Digest of every file below `dir`, in path order. Contents are hashed as
/// raw bytes, so binary files are fine.
fn tree_sha(dir: &Path) -> Result<String> {
    let mut parts: Vec<Vec<u8>> = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::forge("walk", e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::forge("walk", e))?
            .to_string_lossy()
            .replace('\\', "/");
        parts.push(relative.into_bytes());
        parts.push(fs::read(entry.path())?);
    }

    let parts: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
    Ok(digest_bytes(&parts))
}

/// Rejects owner, repository and branch names that are not a single plain
/// path component.
fn checked_name<'a>(kind: &str, name: &'a str) -> Result<&'a str> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    );
    if !plain {
        return Err(Error::forge(kind, format!("invalid {} name {:?}", kind, name)));
    }
    Ok(name)
}

/// Rejects paths that would escape the branch directory.
fn checked_path(path: &str) -> Result<&Path> {
    let p = Path::new(path);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if path.is_empty() || escapes {
        return Err(Error::forge("path", format!("invalid file path {:?}", path)));
    }
    Ok(p)
}

fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
        Ok(content) => Ok(serde_yaml::from_str(&content)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn save_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    fs::write(path, serde_yaml::to_string(items)?)?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| Error::forge("walk", e))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| Error::forge("walk", e))?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

impl FileStore for LocalForge {
    fn read(&self, file: &FileRef) -> Result<FileRef> {
        let relative = checked_path(&file.path)?;
        let Some(branch) = self.resolve_ref(&file.repo, &file.r#ref)? else {
            return Err(missing(file));
        };

        let branch_dir = self.branch_dir(&file.repo, &branch)?;
        let full_path = branch_dir.join(relative);
        let content = match fs::read_to_string(&full_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(missing(file)),
            Err(e) => return Err(Error::forge("read", format!("{}: {}", file, e))),
        };

        debug!("Read {} from {}", file, full_path.display());
        self.retrieved(file, &full_path, content, tree_sha(&branch_dir)?)
    }

    fn write(&self, file: &FileRef, branch: &str, message: &str) -> Result<FileRef> {
        let relative = checked_path(&file.path)?;
        let branch_dir = self.branch_dir(&file.repo, branch)?;
        if !branch_dir.is_dir() {
            return Err(Error::forge(
                "write",
                format!("branch {} not found in {}", branch, file.repo),
            ));
        }

        let full_path = branch_dir.join(relative);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, &file.content)?;

        let commits_path = self.repo_dir(&file.repo)?.join(COMMITS_FILE);
        let mut commits: Vec<CommitRecord> = load_list(&commits_path)?;
        commits.push(CommitRecord {
            branch: branch.to_string(),
            path: file.path.clone(),
            message: message.to_string(),
        });
        save_list(&commits_path, &commits)?;

        debug!("Wrote {} on {}", file, branch);
        self.retrieved(
            &file.at(branch),
            &full_path,
            file.content.clone(),
            tree_sha(&branch_dir)?,
        )
    }
}

impl RepoStore for LocalForge {
    fn default_branch(&self, repo: &Repo) -> Result<String> {
        Ok(self.meta(repo)?.default_branch)
    }
}

impl BranchStore for LocalForge {
    fn branch(&self, repo: &Repo, name: &str) -> Result<Branch> {
        let dir = self.branch_dir(repo, name)?;
        if !dir.is_dir() {
            return Err(Error::missing_branch(repo, name));
        }

        Ok(Branch {
            name: name.to_string(),
            sha: tree_sha(&dir)?,
            is_new: false,
        })
    }

    fn get_or_create_branch(&self, repo: &Repo, name: &str, base_sha: &str) -> Result<Branch> {
        let dir = self.branch_dir(repo, name)?;
        if dir.is_dir() {
            return self.branch(repo, name);
        }

        let Some(base) = self.resolve_ref(repo, base_sha)? else {
            return Err(Error::forge(
                "create branch",
                format!("commit {} not found in {}", base_sha, repo),
            ));
        };

        copy_tree(&self.branch_dir(repo, &base)?, &dir)?;
        debug!("Created branch {} in {} from {}", name, repo, base);

        Ok(Branch {
            name: name.to_string(),
            sha: base_sha.to_string(),
            is_new: true,
        })
    }

    fn delete_branch(&self, repo: &Repo, name: &str) -> Result<()> {
        let dir = self.branch_dir(repo, name)?;
        fs::remove_dir_all(&dir).map_err(|e| {
            Error::forge("delete branch", format!("{} in {}: {}", name, repo, e))
        })
    }
}

impl PullRequestStore for LocalForge {
    fn get_or_create_pull(
        &self,
        repo: &Repo,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let dir = self.repo_dir(repo)?;
        if !dir.is_dir() {
            return Err(Error::forge("pull", format!("{} not found", repo)));
        }

        let path = dir.join(PULLS_FILE);
        let mut pulls: Vec<PullRecord> = load_list(&path)?;

        if let Some(pull) = pulls.iter().find(|p| p.base == base && p.head == head) {
            return Ok(PullRequest {
                repo: repo.clone(),
                number: pull.number,
                is_new: false,
            });
        }

        let number = pulls.iter().map(|p| p.number).max().unwrap_or(0) + 1;
        pulls.push(PullRecord {
            number,
            base: base.to_string(),
            head: head.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        save_list(&path, &pulls)?;

        Ok(PullRequest {
            repo: repo.clone(),
            number,
            is_new: true,
        })
    }
}
