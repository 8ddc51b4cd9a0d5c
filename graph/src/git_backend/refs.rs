use git2::{BranchType, Oid};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

use super::store::GitStore;
use crate::core::Commit;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RefKind {
    Head,
    Branch,
    Remote,
    Tag,
}

/// A reference whose target commit starts a history build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadRef {
    pub name: String,
    pub kind: RefKind,
    /// Target commit ID, with tags peeled
    pub target: String,
}

impl GitStore {
    /// List the references a build starts from: HEAD alone, or HEAD followed
    /// by local branches, remote branches and tags.
    pub fn heads(&self, include_all: bool) -> Result<Vec<HeadRef>> {
        let mut heads = Vec::new();

        // Unborn or detached-to-nothing HEAD contributes no start point
        if let Ok(head) = self.repo.head() {
            if let Ok(commit) = head.peel_to_commit() {
                heads.push(HeadRef {
                    name: "HEAD".to_string(),
                    kind: RefKind::Head,
                    target: commit.id().to_string(),
                });
            }
        }

        if !include_all {
            return Ok(heads);
        }

        let branch_kinds = [
            (BranchType::Local, RefKind::Branch),
            (BranchType::Remote, RefKind::Remote),
        ];
        for (branch_type, kind) in branch_kinds {
            for branch in self.repo.branches(Some(branch_type))? {
                let (branch, _) = branch?;
                let Some(name) = branch.name()? else { continue };
                match branch.get().peel_to_commit() {
                    Ok(commit) => heads.push(HeadRef {
                        name: name.to_string(),
                        kind,
                        target: commit.id().to_string(),
                    }),
                    Err(e) => warn!("skipping branch {}: {}", name, e),
                }
            }
        }

        let mut tags: Vec<(String, Oid)> = Vec::new();
        self.repo.tag_foreach(|oid, name| {
            if let Ok(name_str) = std::str::from_utf8(name) {
                let tag_name = name_str.strip_prefix("refs/tags/").unwrap_or(name_str);
                tags.push((tag_name.to_string(), oid));
            }
            true
        })?;
        for (name, oid) in tags {
            match self.repo.find_object(oid, None).and_then(|o| o.peel_to_commit()) {
                Ok(commit) => heads.push(HeadRef {
                    name,
                    kind: RefKind::Tag,
                    target: commit.id().to_string(),
                }),
                Err(e) => warn!("skipping tag {}: {}", name, e),
            }
        }

        let mut seen = HashSet::new();
        heads.retain(|head| seen.insert((head.kind, head.name.clone())));
        Ok(heads)
    }

    /// Load the commits named by `heads`, dropping repeated targets while
    /// keeping the order of first appearance.
    pub fn load_heads(&mut self, include_all: bool) -> Result<Vec<Commit>> {
        let mut seen = HashSet::new();
        let mut commits = Vec::new();

        for head in self.heads(include_all)? {
            if !seen.insert(head.target.clone()) {
                continue;
            }
            let oid = Oid::from_str(&head.target)?;
            commits.push(self.load_oid(oid)?);
        }

        Ok(commits)
    }
}
