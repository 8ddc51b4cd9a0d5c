pub mod commit;
pub mod entry;
pub mod history;

pub use commit::{Commit, CommitMeta};
pub use entry::{CommitEntry, EntryView};
pub use history::{CommitHistory, HistoryStats};
