pub mod build;
pub mod config;
pub mod core;
pub mod error;
pub mod git_backend;

pub use build::{
    build_history, build_history_with_progress, BuildProgress, BuildWorker, Cancellation, Snapshot,
};
pub use config::{HistoryConfig, MergeOrder};
pub use core::{Commit, CommitEntry, CommitHistory, CommitMeta, EntryView, HistoryStats};
pub use error::{GraphError, Result};
pub use git_backend::{CommitStore, GitStore, HeadRef, RefKind};
