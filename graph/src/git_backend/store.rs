use chrono::{TimeZone, Utc};
use git2::{ErrorCode, Oid, Repository};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::core::{Commit, CommitMeta};
use crate::error::{GraphError, Result};

/// Source of commits for history building.
///
/// A loaded commit carries its whole ancestry: every parent reachable from
/// it is materialised, and an ancestor shared by several commits is the
/// same shared value.
pub trait CommitStore {
    fn load(&mut self, id: &str) -> Result<Commit>;
}

/// Commit store backed by a git repository
pub struct GitStore {
    pub(crate) repo: Repository,
    cache: HashMap<Oid, Commit>,
}

impl GitStore {
    pub fn open(repo_path: Option<&Path>) -> Result<Self> {
        let repo = match repo_path {
            Some(path) => Repository::open(path)?,
            None => Repository::open_from_env()?,
        };

        Ok(Self::from_repository(repo))
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self {
            repo,
            cache: HashMap::new(),
        }
    }

    /// Number of commits loaded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a revision expression (`HEAD~2`, a branch name, an abbreviated
    /// id...) and load the commit it names.
    pub fn resolve(&mut self, spec: &str) -> Result<Commit> {
        // The peeled objects borrow the repository; only the id may outlive them
        let oid = {
            let object = self.repo.revparse_single(spec).map_err(|e| match e.code() {
                ErrorCode::NotFound => GraphError::MissingCommit(spec.to_string()),
                _ => GraphError::Git(e),
            })?;
            let commit = object.peel_to_commit()?;
            commit.id()
        };
        self.load_oid(oid)
    }

    /// Load a commit and all of its ancestors.
    ///
    /// Ancestors are loaded with an explicit stack: a commit is built once
    /// all of its parents are in the cache.
    pub fn load_oid(&mut self, oid: Oid) -> Result<Commit> {
        if let Some(commit) = self.cache.get(&oid) {
            return Ok(commit.clone());
        }

        let before = self.cache.len();
        let mut stack = vec![oid];

        while let Some(&next) = stack.last() {
            if self.cache.contains_key(&next) {
                stack.pop();
                continue;
            }

            let git_commit = self.repo.find_commit(next).map_err(|e| match e.code() {
                ErrorCode::NotFound => GraphError::MissingCommit(next.to_string()),
                _ => GraphError::Git(e),
            })?;

            let missing: Vec<Oid> = git_commit
                .parent_ids()
                .filter(|id| !self.cache.contains_key(id))
                .collect();
            if !missing.is_empty() {
                stack.extend(missing);
                continue;
            }

            let parents = git_commit
                .parent_ids()
                .map(|id| {
                    self.cache
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| GraphError::MissingCommit(id.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            let commit = Commit::with_meta(next.to_string(), parents, commit_meta(&git_commit));
            self.cache.insert(next, commit);
            stack.pop();
        }

        debug!("loaded {} commits for {}", self.cache.len() - before, oid);
        self.cache
            .get(&oid)
            .cloned()
            .ok_or_else(|| GraphError::MissingCommit(oid.to_string()))
    }
}

impl CommitStore for GitStore {
    fn load(&mut self, id: &str) -> Result<Commit> {
        let oid = Oid::from_str(id).map_err(|_| GraphError::InvalidId(id.to_string()))?;
        self.load_oid(oid)
    }
}

fn commit_meta(commit: &git2::Commit) -> CommitMeta {
    CommitMeta {
        author: commit.author().name().unwrap_or("Unknown").to_string(),
        summary: commit.summary().unwrap_or("").to_string(),
        time: Utc.timestamp_opt(commit.time().seconds(), 0).single(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::CommitHistory;
    use anyhow::Result;
    use git2::Signature;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    pub(crate) fn create_test_repo() -> Result<(TempDir, Repository)> {
        let dir = TempDir::new()?;
        let repo = Repository::init(dir.path())?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok((dir, repo))
    }

    pub(crate) fn commit_to_repo(
        repo: &Repository,
        message: &str,
        parents: &[Oid],
        update_ref: Option<&str>,
    ) -> Result<Oid> {
        let sig = Signature::now("Test User", "test@example.com")?;
        let tree_id = {
            let mut index = repo.index()?;
            index.write_tree()?
        };
        let tree = repo.find_tree(tree_id)?;
        let parents = parents
            .iter()
            .map(|oid| repo.find_commit(*oid))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        Ok(repo.commit(update_ref, &sig, &sig, message, &tree, &parent_refs)?)
    }

    #[test]
    fn loads_linear_history() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let first = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let second = commit_to_repo(&repo, "Second commit", &[first], Some("HEAD"))?;
        let third = commit_to_repo(&repo, "Third commit", &[second], Some("HEAD"))?;

        let mut store = GitStore::open(Some(dir.path()))?;
        let head = store.load(&third.to_string())?;

        assert_eq!(store.cached(), 3);
        assert_eq!(head.meta().summary, "Third commit");
        assert_eq!(head.meta().author, "Test User");
        assert!(head.meta().time.is_some());

        let mut history = CommitHistory::new();
        history.process(&head, None);
        let ids: Vec<String> = history.ids().map(str::to_string).collect();
        assert_eq!(ids, vec![third.to_string(), second.to_string(), first.to_string()]);
        Ok(())
    }

    #[test]
    fn shared_ancestor_is_one_value() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let base = commit_to_repo(&repo, "Base commit", &[], Some("HEAD"))?;
        let branch1 = commit_to_repo(&repo, "Branch 1", &[base], Some("HEAD"))?;
        let branch2 = commit_to_repo(&repo, "Branch 2", &[base], None)?;
        let merge = commit_to_repo(&repo, "Merge", &[branch1, branch2], Some("HEAD"))?;

        let mut store = GitStore::open(Some(dir.path()))?;
        let head = store.load_oid(merge)?;

        assert!(head.is_merge());
        let via_first = &head.parents()[0].parents()[0];
        let via_second = &head.parents()[1].parents()[0];
        assert_eq!(via_first.id(), base.to_string());
        assert!(Commit::ptr_eq(via_first, via_second));

        let mut history = CommitHistory::new();
        history.process(&head, None);
        let ids: Vec<String> = history.ids().map(str::to_string).collect();
        assert_eq!(
            ids,
            vec![merge.to_string(), branch1.to_string(), base.to_string(), branch2.to_string()]
        );
        Ok(())
    }

    #[test]
    fn loading_again_uses_cache() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let first = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let second = commit_to_repo(&repo, "Second commit", &[first], Some("HEAD"))?;

        let mut store = GitStore::open(Some(dir.path()))?;
        let a = store.load_oid(second)?;
        let b = store.load_oid(second)?;
        let parent = store.load_oid(first)?;

        assert!(Commit::ptr_eq(&a, &b));
        assert!(Commit::ptr_eq(&a.parents()[0], &parent));
        assert_eq!(store.cached(), 2);
        Ok(())
    }

    #[test]
    fn resolves_revisions() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let first = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let _second = commit_to_repo(&repo, "Second commit", &[first], Some("HEAD"))?;

        let mut store = GitStore::open(Some(dir.path()))?;
        let commit = store.resolve("HEAD~1")?;
        assert_eq!(commit.id(), first.to_string());
        Ok(())
    }

    #[test]
    fn resolve_shares_cache_with_load() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        let first = commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;
        let second = commit_to_repo(&repo, "Second commit", &[first], Some("HEAD"))?;
        repo.branch("feature", &repo.find_commit(second)?, false)?;
        repo.tag_lightweight("v1", &repo.find_object(second, None)?, false)?;

        let mut store = GitStore::open(Some(dir.path()))?;
        let by_branch = store.resolve("feature")?;
        let by_tag = store.resolve("v1")?;
        let by_id = store.load(&second.to_string())?;

        assert_eq!(by_branch.id(), second.to_string());
        assert!(Commit::ptr_eq(&by_branch, &by_tag));
        assert!(Commit::ptr_eq(&by_branch, &by_id));
        assert_eq!(store.cached(), 2);
        Ok(())
    }

    #[test]
    fn reports_bad_ids() -> Result<()> {
        let (dir, repo) = create_test_repo()?;
        commit_to_repo(&repo, "First commit", &[], Some("HEAD"))?;

        let mut store = GitStore::open(Some(dir.path()))?;
        assert!(matches!(store.load("not-a-hash"), Err(GraphError::InvalidId(_))));
        assert!(matches!(
            store.load("0123456789012345678901234567890123456789"),
            Err(GraphError::MissingCommit(_))
        ));
        assert!(matches!(store.resolve("no-such-branch"), Err(GraphError::MissingCommit(_))));
        Ok(())
    }
}
