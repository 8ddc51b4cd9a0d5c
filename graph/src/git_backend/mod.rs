pub mod refs;
pub mod store;

pub use refs::{HeadRef, RefKind};
pub use store::{CommitStore, GitStore};
