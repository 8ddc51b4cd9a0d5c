use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Descriptive data carried alongside a commit. Never part of its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitMeta {
    pub author: String,
    pub summary: String,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct CommitInner {
    id: String,
    parents: Vec<Commit>,
    meta: CommitMeta,
}

/// A commit in the history graph.
///
/// Commits are immutable and shared: the same ancestor may be the parent of
/// many commits, so cloning a `Commit` only bumps a reference count.
/// Equality and hashing look at the id alone.
#[derive(Clone)]
pub struct Commit(Arc<CommitInner>);

impl Commit {
    pub fn new(id: impl Into<String>, parents: Vec<Commit>) -> Self {
        Self::with_meta(id, parents, CommitMeta::default())
    }

    pub fn with_meta(id: impl Into<String>, parents: Vec<Commit>, meta: CommitMeta) -> Self {
        Self(Arc::new(CommitInner {
            id: id.into(),
            parents,
            meta,
        }))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// Abbreviated id for display
    pub fn short_id(&self) -> &str {
        let id = self.id();
        match id.char_indices().nth(7) {
            Some((end, _)) => &id[..end],
            None => id,
        }
    }

    pub fn parents(&self) -> &[Commit] {
        &self.0.parents
    }

    pub fn primary_parent(&self) -> Option<&Commit> {
        self.0.parents.first()
    }

    /// Parents after the first one
    pub fn merge_parents(&self) -> &[Commit] {
        self.0.parents.get(1..).unwrap_or(&[])
    }

    pub fn meta(&self) -> &CommitMeta {
        &self.0.meta
    }

    /// Check if both values share the same allocation, not just the same id
    pub fn ptr_eq(this: &Commit, other: &Commit) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.0.parents.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.0.parents.len() > 1
    }
}

// Long first-parent chains would otherwise be released recursively, one
// stack frame per ancestor.
impl Drop for CommitInner {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.parents);
        while let Some(parent) = stack.pop() {
            if let Ok(mut inner) = Arc::try_unwrap(parent.0) {
                stack.append(&mut inner.parents);
            }
        }
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Commit {}

impl Hash for Commit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

// Parents are printed by id only; the full ancestry would be unbounded.
impl fmt::Debug for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parents: Vec<&str> = self.parents().iter().map(Commit::short_id).collect();
        f.debug_struct("Commit")
            .field("id", &self.id())
            .field("parents", &parents)
            .finish()
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_id())
    }
}
