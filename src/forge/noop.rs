//! A forge wrapper for dry runs: reads go to the wrapped forge, everything
//! that would change it is logged and answered with a plausible fake.

use super::{Branch, BranchStore, FileStore, PullRequest, PullRequestStore, RepoStore};
use crate::error::Result;
use crate::file::{FileRef, Repo};
use log::info;

const NOOP_SHA: &str = "noop_sha_1234";

#[derive(Debug, Clone)]
pub struct NoopForge<F> {
    inner: F,
}

impl<F> NoopForge<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F: FileStore> FileStore for NoopForge<F> {
    fn read(&self, file: &FileRef) -> Result<FileRef> {
        self.inner.read(file)
    }

    fn write(&self, file: &FileRef, branch: &str, message: &str) -> Result<FileRef> {
        info!("[NOOP] write {} on {}: {:?}", file, branch, message);
        let mut out = file.at(branch);
        out.content = file.content.clone();
        out.sha = NOOP_SHA.to_string();
        Ok(out)
    }
}

impl<F: RepoStore> RepoStore for NoopForge<F> {
    fn default_branch(&self, repo: &Repo) -> Result<String> {
        self.inner.default_branch(repo)
    }
}

impl<F: BranchStore> BranchStore for NoopForge<F> {
    fn branch(&self, repo: &Repo, name: &str) -> Result<Branch> {
        self.inner.branch(repo, name)
    }

    /// Returns the real branch when it exists, otherwise pretends to create it.
    fn get_or_create_branch(&self, repo: &Repo, name: &str, base_sha: &str) -> Result<Branch> {
        match self.inner.branch(repo, name) {
            Ok(branch) => return Ok(branch),
            Err(e) if e.is_missing_branch() => {}
            Err(e) => return Err(e),
        }

        info!("[NOOP] create branch {} in {} at {}", name, repo, base_sha);
        Ok(Branch {
            name: name.to_string(),
            sha: base_sha.to_string(),
            is_new: true,
        })
    }

    fn delete_branch(&self, repo: &Repo, name: &str) -> Result<()> {
        info!("[NOOP] delete branch {} in {}", name, repo);
        Ok(())
    }
}

impl<F> PullRequestStore for NoopForge<F> {
    fn get_or_create_pull(
        &self,
        repo: &Repo,
        base: &str,
        head: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        info!("[NOOP] pull {} -> {} in {}: {:?}", head, base, repo, title);
        Ok(PullRequest {
            repo: repo.clone(),
            number: 0,
            is_new: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::memory::MemoryForge;

    fn wrapped() -> (NoopForge<MemoryForge>, Repo) {
        let forge = MemoryForge::new();
        let repo = Repo::new("o", "r");
        forge.add_repo(&repo, "main").unwrap();
        forge.add_file(&repo, "main", "a.txt", "A").unwrap();
        (NoopForge::new(forge), repo)
    }

    #[test]
    fn test_reads_pass_through() {
        let (noop, repo) = wrapped();
        let file = noop.read(&FileRef::new(repo.clone(), "a.txt", "")).unwrap();
        assert_eq!(file.content, "A");
        assert_eq!(noop.default_branch(&repo).unwrap(), "main");
    }

    #[test]
    fn test_writes_are_faked() {
        let (noop, repo) = wrapped();
        let base = noop.branch(&repo, "main").unwrap();

        let head = noop.get_or_create_branch(&repo, "work", &base.sha).unwrap();
        assert!(head.is_new);

        let mut file = FileRef::new(repo.clone(), "a.txt", "");
        file.content = "B".to_string();
        let written = noop.write(&file, "main", "msg").unwrap();
        assert_eq!(written.sha, NOOP_SHA);

        noop.delete_branch(&repo, "main").unwrap();
        let pull = noop
            .get_or_create_pull(&repo, "main", "work", "t", "b")
            .unwrap();
        assert_eq!(pull.number, 0);

        let inner = noop.into_inner();
        assert_eq!(inner.file(&repo, "main", "a.txt").unwrap().as_deref(), Some("A"));
        assert!(!inner.has_branch(&repo, "work").unwrap());
        assert!(inner.commits(&repo).unwrap().is_empty());
        assert!(inner.pulls(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_lookup_failures_are_not_faked() {
        let (noop, _repo) = wrapped();
        let unknown = Repo::new("x", "y");
        let err = noop
            .get_or_create_branch(&unknown, "work", "sha")
            .unwrap_err();
        assert!(!err.is_missing_branch());
    }

    #[test]
    fn test_existing_branch_is_reported_as_is() {
        let (noop, repo) = wrapped();
        let sha = noop.branch(&repo, "main").unwrap().sha;
        let branch = noop.get_or_create_branch(&repo, "main", &sha).unwrap();
        assert!(!branch.is_new);
    }
}
