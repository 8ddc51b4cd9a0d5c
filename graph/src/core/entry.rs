use super::commit::Commit;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The builder's record of a visited commit
#[derive(Debug, Clone)]
pub struct CommitEntry {
    /// The commit this entry wraps
    pub commit: Commit,
    /// Commits found to have this one as a parent, in discovery order
    pub children: Vec<Commit>,
}

impl CommitEntry {
    pub fn new(commit: Commit) -> Self {
        Self {
            commit,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.commit.id()
    }

    /// Record a child link. Returns false if the child was already recorded.
    pub fn add_child(&mut self, child: &Commit) -> bool {
        if self.children.contains(child) {
            return false;
        }
        self.children.push(child.clone());
        true
    }

    /// Check if nothing in the history points at this commit
    pub fn is_head(&self) -> bool {
        self.children.is_empty()
    }
}

impl PartialEq for CommitEntry {
    fn eq(&self, other: &Self) -> bool {
        self.commit == other.commit
    }
}

impl Eq for CommitEntry {}

/// Flattened, serializable form of an entry for consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub id: String,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub author: String,
    pub summary: String,
    pub time: Option<DateTime<Utc>>,
}

impl From<&CommitEntry> for EntryView {
    fn from(entry: &CommitEntry) -> Self {
        let meta = entry.commit.meta();
        Self {
            id: entry.id().to_string(),
            parents: entry.commit.parents().iter().map(|p| p.id().to_string()).collect(),
            children: entry.children.iter().map(|c| c.id().to_string()).collect(),
            author: meta.author.clone(),
            summary: meta.summary.clone(),
            time: meta.time,
        }
    }
}
