//! mdflow Store
//!
//! Remembers submitted experiments for a fixed retention window. There is no
//! persistence: once an entry expires it is gone, and references to it read
//! as [`ExperimentStatus::Unknown`].
//!
//! The store keeps two kinds of entries with the same retention:
//! - one [`ExperimentRecord`] per experiment id
//! - one index entry listing the ids, most recent first
//!
//! The index can outlive some of the records it names; those ids are skipped
//! when the experiment list is rebuilt.

mod cache;
mod store;
mod types;

pub use cache::TtlCache;
pub use store::ExperimentStore;
pub use types::{ExperimentRecord, ExperimentStatus};
