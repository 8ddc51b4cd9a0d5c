use super::{commit::Commit, entry::CommitEntry};
use crate::config::{HistoryConfig, MergeOrder};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A merge parent waiting to be walked, with the commit that pointed at it
type Deferred = (Commit, Option<Commit>);

/// Ordered, deduplicated history of every commit reachable from the
/// commits it has processed.
///
/// `entries` is append-only and holds commits in visitation order: each
/// primary-parent chain is laid down contiguously, and merge branches
/// follow once the chain that deferred them has reached a root or a commit
/// already in the history. `lookup` is the only authority on whether a
/// commit has been seen.
#[derive(Debug, Clone, Default)]
pub struct CommitHistory {
    config: HistoryConfig,
    /// Commit ID -> index into `entries`
    lookup: HashMap<String, usize>,
    entries: Vec<CommitEntry>,
}

impl CommitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Register a commit.
    ///
    /// `child_of` is the commit that was being visited when `commit` was
    /// reached as one of its parents; it becomes the first recorded child of
    /// the new entry. Returns false, leaving the history untouched, if the
    /// commit is already present.
    pub fn insert(&mut self, commit: &Commit, child_of: Option<&Commit>) -> bool {
        if self.lookup.contains_key(commit.id()) {
            return false;
        }

        let mut entry = CommitEntry::new(commit.clone());
        if let Some(child) = child_of {
            entry.add_child(child);
        }

        self.lookup.insert(commit.id().to_string(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Add a commit and all of its ancestors.
    ///
    /// The primary-parent chain is followed in a loop until it reaches a root
    /// or a commit that is already present. Secondary parents of merges on
    /// that chain are deferred and walked afterwards, each one's own deferred
    /// parents before its siblings.
    pub fn process(&mut self, start: &Commit, as_child_of: Option<&Commit>) {
        let mut pending: Vec<Deferred> = vec![(start.clone(), as_child_of.cloned())];

        while let Some((commit, child)) = pending.pop() {
            let deferred = self.walk_chain(commit, child);

            // `pending` is popped from the back
            match self.config.merge_order {
                MergeOrder::Discovery => pending.extend(deferred.into_iter().rev()),
                MergeOrder::Reverse => pending.extend(deferred),
            }
        }
    }

    fn walk_chain(&mut self, start: Commit, child: Option<Commit>) -> Vec<Deferred> {
        let first = self.entries.len();
        let mut deferred = Vec::new();
        let mut current = start;
        let mut child = child;

        loop {
            if !self.insert(&current, child.as_ref()) {
                // Convergence: keep the edge, but the ancestors are already here
                if let Some(child) = &child {
                    self.link_child(current.id(), child);
                }
                break;
            }

            let Some(primary) = current.primary_parent().cloned() else {
                break;
            };

            for parent in current.merge_parents() {
                trace!("deferring {} (merge parent of {})", parent, current);
                deferred.push((parent.clone(), Some(current.clone())));
            }

            child = Some(current);
            current = primary;
        }

        debug!(
            "chain added {} commits, deferred {} merge parents",
            self.entries.len() - first,
            deferred.len()
        );
        deferred
    }

    fn link_child(&mut self, id: &str, child: &Commit) {
        if let Some(&index) = self.lookup.get(id) {
            self.entries[index].add_child(child);
        }
    }

    /// Manually append a commit without walking its parents.
    /// Returns false if the commit is already present.
    pub fn append_commit(&mut self, commit: &Commit) -> bool {
        self.insert(commit, None)
    }

    /// Clear the history list
    pub fn reset(&mut self) {
        self.lookup.clear();
        self.entries.clear();
    }

    pub fn entries(&self) -> &[CommitEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CommitEntry> {
        self.position(id).map(|index| &self.entries[index])
    }

    /// Index of a commit in `entries`
    pub fn position(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// Commit IDs in history order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(CommitEntry::id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get statistics about the history
    pub fn stats(&self) -> HistoryStats {
        let commits = self.entries.iter().map(|e| &e.commit);

        HistoryStats {
            total_commits: self.entries.len(),
            merge_commits: commits.clone().filter(|c| c.is_merge()).count(),
            root_commits: commits.filter(|c| c.is_root()).count(),
            head_commits: self.entries.iter().filter(|e| e.is_head()).count(),
            total_child_links: self.entries.iter().map(|e| e.children.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total_commits: usize,
    pub merge_commits: usize,
    pub root_commits: usize,
    /// Commits with no recorded children
    pub head_commits: usize,
    pub total_child_links: usize,
}
