//! # In-Memory Forge
//!
//! `MemoryForge` keeps repositories, branches, pull requests and commits in a
//! `Mutex`-guarded map. It backs the library's tests and lets embedders drive
//! a run without a network.
//!
//! Repositories must be seeded with `add_repo` before anything can be read
//! from or written to them. Individual reads and writes can be made to fail
//! with `fail_reads_of` and `fail_writes_to`, which is how the per-link
//! failure statuses are exercised.

use super::{
    base_name, digest, missing, Branch, BranchStore, CommitRecord, FileStore, PullRecord,
    PullRequest, PullRequestStore, RepoStore,
};
use crate::error::{Error, Result};
use crate::file::{FileRef, Repo};
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct BranchState {
    sha: String,
    files: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct RepoState {
    default_branch: String,
    branches: BTreeMap<String, BranchState>,
    pulls: Vec<PullRecord>,
    commits: Vec<CommitRecord>,
}

#[derive(Debug, Default)]
struct State {
    repos: BTreeMap<String, RepoState>,
    /// `(owner/repo, path, ref)`
    failing_reads: HashSet<(String, String, String)>,
    /// `(owner/repo, path)`
    failing_writes: HashSet<(String, String)>,
}

/// A forge that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryForge {
    state: Mutex<State>,
}

impl MemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "memory forge state".to_string(),
        })
    }

    /// Creates `repo` with `default_branch` holding no files.
    pub fn add_repo(&self, repo: &Repo, default_branch: &str) -> Result<()> {
        let mut state = self.lock()?;
        let entry = state.repos.entry(repo.key()).or_default();
        entry.default_branch = default_branch.to_string();
        entry
            .branches
            .entry(default_branch.to_string())
            .or_insert_with(|| BranchState {
                sha: digest(&["branch", &repo.key(), default_branch]),
                files: BTreeMap::new(),
            });
        Ok(())
    }

    /// Stores `content` at `path` on `branch`, creating the branch if needed.
    pub fn add_file(&self, repo: &Repo, branch: &str, path: &str, content: &str) -> Result<()> {
        let mut state = self.lock()?;
        let repo_state = repo_mut(&mut state, repo)?;
        let branch_state = repo_state.branches.entry(branch.to_string()).or_default();
        branch_state.files.insert(path.to_string(), content.to_string());
        branch_state.sha = digest(&["commit", &branch_state.sha, path, content]);
        Ok(())
    }

    /// Makes every read of `path` at `r#ref` in `repo` fail with a forge error.
    pub fn fail_reads_of(&self, repo: &Repo, path: &str, r#ref: &str) -> Result<()> {
        self.lock()?
            .failing_reads
            .insert((repo.key(), path.to_string(), r#ref.to_string()));
        Ok(())
    }

    /// Makes every write of `path` in `repo` fail with a forge error.
    pub fn fail_writes_to(&self, repo: &Repo, path: &str) -> Result<()> {
        self.lock()?
            .failing_writes
            .insert((repo.key(), path.to_string()));
        Ok(())
    }

    /// The content of `path` on `branch`, if it exists.
    pub fn file(&self, repo: &Repo, branch: &str, path: &str) -> Result<Option<String>> {
        let state = self.lock()?;
        Ok(state
            .repos
            .get(&repo.key())
            .and_then(|r| r.branches.get(branch))
            .and_then(|b| b.files.get(path))
            .cloned())
    }

    pub fn has_branch(&self, repo: &Repo, branch: &str) -> Result<bool> {
        let state = self.lock()?;
        Ok(state
            .repos
            .get(&repo.key())
            .is_some_and(|r| r.branches.contains_key(branch)))
    }

    /// Pull requests opened so far, oldest first.
    pub fn pulls(&self, repo: &Repo) -> Result<Vec<PullRecord>> {
        let state = self.lock()?;
        Ok(state
            .repos
            .get(&repo.key())
            .map(|r| r.pulls.clone())
            .unwrap_or_default())
    }

    /// File writes made so far, oldest first.
    pub fn commits(&self, repo: &Repo) -> Result<Vec<CommitRecord>> {
        let state = self.lock()?;
        Ok(state
            .repos
            .get(&repo.key())
            .map(|r| r.commits.clone())
            .unwrap_or_default())
    }
}

fn repo_mut<'a>(state: &'a mut State, repo: &Repo) -> Result<&'a mut RepoState> {
    state
        .repos
        .get_mut(&repo.key())
        .ok_or_else(|| Error::forge("repository", format!("{} not found", repo)))
}

/// Resolves `r#ref` to a branch, by name or by commit.
fn find_branch<'a>(repo: &'a RepoState, r#ref: &str) -> Option<&'a BranchState> {
    let name = if r#ref.is_empty() {
        repo.default_branch.as_str()
    } else {
        r#ref
    };

    repo.branches
        .get(name)
        .or_else(|| repo.branches.values().find(|b| b.sha == r#ref))
}

fn retrieved(file: &FileRef, content: &str, commit: &str) -> FileRef {
    let mut out = file.clone();
    out.content = content.to_string();
    out.sha = digest(&["blob", content]);
    out.commit = commit.to_string();
    out.name = base_name(&file.path);
    out.html_url = format!("memory://forge{}", out.html_path());
    out
}

impl FileStore for MemoryForge {
    fn read(&self, file: &FileRef) -> Result<FileRef> {
        let state = self.lock()?;

        let key = (file.repo.key(), file.path.clone(), file.r#ref.clone());
        if state.failing_reads.contains(&key) {
            return Err(Error::forge("read", format!("injected failure for {}", file)));
        }

        let Some(repo) = state.repos.get(&file.repo.key()) else {
            return Err(missing(file));
        };
        let Some(branch) = find_branch(repo, &file.r#ref) else {
            return Err(missing(file));
        };
        let Some(content) = branch.files.get(&file.path) else {
            return Err(missing(file));
        };

        debug!("Read {}", file);
        Ok(retrieved(file, content, &branch.sha))
    }

    fn write(&self, file: &FileRef, branch: &str, message: &str) -> Result<FileRef> {
        let mut state = self.lock()?;

        if state
            .failing_writes
            .contains(&(file.repo.key(), file.path.clone()))
        {
            return Err(Error::forge("write", format!("injected failure for {}", file)));
        }

        let repo = repo_mut(&mut state, &file.repo)?;
        let Some(branch_state) = repo.branches.get_mut(branch) else {
            return Err(Error::forge(
                "write",
                format!("branch {} not found in {}", branch, file.repo),
            ));
        };

        branch_state
            .files
            .insert(file.path.clone(), file.content.clone());
        branch_state.sha = digest(&["commit", &branch_state.sha, &file.path, &file.content]);
        let commit = branch_state.sha.clone();

        repo.commits.push(CommitRecord {
            branch: branch.to_string(),
            path: file.path.clone(),
            message: message.to_string(),
        });

        debug!("Wrote {} on {}", file, branch);
        Ok(retrieved(&file.at(branch), &file.content, &commit))
    }
}

impl RepoStore for MemoryForge {
    fn default_branch(&self, repo: &Repo) -> Result<String> {
        let mut state = self.lock()?;
        Ok(repo_mut(&mut state, repo)?.default_branch.clone())
    }
}

impl BranchStore for MemoryForge {
    fn branch(&self, repo: &Repo, name: &str) -> Result<Branch> {
        let mut state = self.lock()?;
        let repo_state = repo_mut(&mut state, repo)?;
        let branch = repo_state
            .branches
            .get(name)
            .ok_or_else(|| Error::missing_branch(repo, name))?;

        Ok(Branch {
            name: name.to_string(),
            sha: branch.sha.clone(),
            is_new: false,
        })
    }

    fn get_or_create_branch(&self, repo: &Repo, name: &str, base_sha: &str) -> Result<Branch> {
        let mut state = self.lock()?;
        let repo_state = repo_mut(&mut state, repo)?;

        if let Some(branch) = repo_state.branches.get(name) {
            return Ok(Branch {
                name: name.to_string(),
                sha: branch.sha.clone(),
                is_new: false,
            });
        }

        let files = repo_state
            .branches
            .values()
            .find(|b| b.sha == base_sha)
            .map(|b| b.files.clone())
            .ok_or_else(|| {
                Error::forge(
                    "create branch",
                    format!("commit {} not found in {}", base_sha, repo),
                )
            })?;

        repo_state.branches.insert(
            name.to_string(),
            BranchState {
                sha: base_sha.to_string(),
                files,
            },
        );

        debug!("Created branch {} in {} at {}", name, repo, base_sha);
        Ok(Branch {
            name: name.to_string(),
            sha: base_sha.to_string(),
            is_new: true,
        })
    }

    fn delete_branch(&self, repo: &Repo, name: &str) -> Result<()> {
        let mut state = self.lock()?;
        let repo_state = repo_mut(&mut state, repo)?;
        repo_state.branches.remove(name).ok_or_else(|| {
            Error::forge("delete branch", format!("branch {} not found in {}", name, repo))
        })?;
        Ok(())
    }
}

impl PullRequestStore for MemoryForge {
    fn get_or_create_pull(
        &self,
        repo: &Repo,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let mut state = self.lock()?;
        let repo_state = repo_mut(&mut state, repo)?;

        if let Some(pull) = repo_state
            .pulls
            .iter()
            .find(|p| p.base == base && p.head == head)
        {
            return Ok(PullRequest {
                repo: repo.clone(),
                number: pull.number,
                is_new: false,
            });
        }

        let number = repo_state.pulls.len() as u64 + 1;
        repo_state.pulls.push(PullRecord {
            number,
            base: base.to_string(),
            head: head.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });

        Ok(PullRequest {
            repo: repo.clone(),
            number,
            is_new: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryForge, Repo) {
        let forge = MemoryForge::new();
        let repo = Repo::new("o", "r");
        forge.add_repo(&repo, "main").unwrap();
        forge.add_file(&repo, "main", "a/b.txt", "hello").unwrap();
        (forge, repo)
    }

    #[test]
    fn test_read_fills_retrieved_fields() {
        let (forge, repo) = seeded();
        let file = forge
            .read(&FileRef::new(repo.clone(), "a/b.txt", "main"))
            .unwrap();

        assert_eq!(file.content, "hello");
        assert_eq!(file.name, "b.txt");
        assert_eq!(file.sha, digest(&["blob", "hello"]));
        assert_eq!(file.commit, forge.branch(&repo, "main").unwrap().sha);
        assert!(file.html_url.starts_with("memory://forge/o/r/blob/"));
        assert!(file.html_url.ends_with("/a/b.txt"));
    }

    #[test]
    fn test_read_empty_ref_uses_default_branch() {
        let (forge, repo) = seeded();
        let file = forge.read(&FileRef::new(repo, "a/b.txt", "")).unwrap();
        assert_eq!(file.content, "hello");
    }

    #[test]
    fn test_read_by_commit() {
        let (forge, repo) = seeded();
        let sha = forge.branch(&repo, "main").unwrap().sha;
        let file = forge.read(&FileRef::new(repo, "a/b.txt", &sha)).unwrap();
        assert_eq!(file.content, "hello");
    }

    #[test]
    fn test_read_missing_is_missing_file() {
        let (forge, repo) = seeded();
        for file in [
            FileRef::new(repo.clone(), "nope", "main"),
            FileRef::new(repo.clone(), "a/b.txt", "dev"),
            FileRef::new(Repo::new("x", "y"), "a/b.txt", "main"),
        ] {
            assert!(forge.read(&file).unwrap_err().is_missing_file(), "{}", file);
        }
    }

    #[test]
    fn test_injected_read_failure() {
        let (forge, repo) = seeded();
        forge.fail_reads_of(&repo, "a/b.txt", "main").unwrap();
        let err = forge
            .read(&FileRef::new(repo, "a/b.txt", "main"))
            .unwrap_err();
        assert!(!err.is_missing_file());
    }

    #[test]
    fn test_branch_lifecycle() {
        let (forge, repo) = seeded();
        let base = forge.branch(&repo, "main").unwrap();

        let head = forge.get_or_create_branch(&repo, "work", &base.sha).unwrap();
        assert!(head.is_new);
        assert_eq!(head.sha, base.sha);
        assert_eq!(
            forge.file(&repo, "work", "a/b.txt").unwrap().as_deref(),
            Some("hello")
        );

        let again = forge.get_or_create_branch(&repo, "work", &base.sha).unwrap();
        assert!(!again.is_new);

        forge.delete_branch(&repo, "work").unwrap();
        assert!(!forge.has_branch(&repo, "work").unwrap());
        assert!(forge.delete_branch(&repo, "work").is_err());
    }

    #[test]
    fn test_create_branch_from_unknown_sha_fails() {
        let (forge, repo) = seeded();
        assert!(forge.get_or_create_branch(&repo, "work", "nope").is_err());
    }

    #[test]
    fn test_write_updates_branch_and_records_commit() {
        let (forge, repo) = seeded();
        let before = forge.branch(&repo, "main").unwrap().sha;

        let mut file = FileRef::new(repo.clone(), "c.txt", "");
        file.content = "new".to_string();
        let written = forge.write(&file, "main", "add c").unwrap();

        assert_eq!(written.r#ref, "main");
        assert_eq!(written.content, "new");
        assert_ne!(written.commit, before);
        assert_eq!(forge.file(&repo, "main", "c.txt").unwrap().as_deref(), Some("new"));
        assert_eq!(
            forge.commits(&repo).unwrap(),
            vec![CommitRecord {
                branch: "main".to_string(),
                path: "c.txt".to_string(),
                message: "add c".to_string(),
            }]
        );
    }

    #[test]
    fn test_write_failures() {
        let (forge, repo) = seeded();
        let file = FileRef::new(repo.clone(), "a/b.txt", "");
        assert!(forge.write(&file, "missing", "m").is_err());

        forge.fail_writes_to(&repo, "a/b.txt").unwrap();
        assert!(forge.write(&file, "main", "m").is_err());
        assert!(forge.commits(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_get_or_create_pull() {
        let (forge, repo) = seeded();
        let first = forge
            .get_or_create_pull(&repo, "main", "work", "title", "body")
            .unwrap();
        assert!(first.is_new);
        assert_eq!(first.number, 1);

        let second = forge
            .get_or_create_pull(&repo, "main", "work", "other", "other")
            .unwrap();
        assert!(!second.is_new);
        assert_eq!(second.number, 1);

        let pulls = forge.pulls(&repo).unwrap();
        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].title, "title");
    }

    #[test]
    fn test_unknown_repo_default_branch_fails() {
        let forge = MemoryForge::new();
        assert!(forge.default_branch(&Repo::new("x", "y")).is_err());
    }
}
