//! Remote package feed client.
//!
//! The feed is a paginated query surface over package records, filterable
//! by modification time. This crate defines the record/window types, the
//! [`PackageFeed`] trait the orchestrator drives, an HTTP implementation,
//! and (behind the `mock` feature) an in-memory feed for tests.

pub mod error;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod models;

pub use crate::http::HttpFeed;
#[cfg(feature = "mock")]
pub use crate::mock::MockFeed;
pub use crate::models::{FeedRecord, FeedWindow, UNLISTED_PUBLISHED};

use crate::error::Result;
use async_trait::async_trait;

/// Paginated, window-filtered access to the remote package feed.
///
/// Both operations see the same window for the whole run; paging is
/// numeric skip/take over records ordered ascending by modification time.
/// A page shorter than the requested `take` means the window is exhausted.
#[async_trait]
pub trait PackageFeed: Send + Sync {
    /// Total number of records whose modification time falls in `window`.
    async fn count(&self, window: FeedWindow) -> Result<u64>;

    /// Fetch up to `take` records from `window`, skipping the first `skip`,
    /// ordered ascending by modification time.
    async fn page(&self, window: FeedWindow, skip: u64, take: u32) -> Result<Vec<FeedRecord>>;
}
