//! Package synchronization engine.
//!
//! Ties the feed client and the store together: normalizes raw feed
//! records, applies them as idempotent upserts, and drives whole runs
//! with checkpointed, resumable progress.

pub mod error;

mod depspec;
mod normalize;
mod record;
mod sync;

pub use crate::depspec::parse_dependency_spec;
pub use crate::normalize::{MAX_NAME_LEN, MAX_VERSION_LEN, normalize, split_authors, split_tags};
pub use crate::record::Upserter;
pub use crate::sync::{DEFAULT_BATCH_SIZE, RunOutcome, RunSummary, Syncer};
