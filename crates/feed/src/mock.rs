//! In-memory package feed for testing.

use crate::error::Result;
use crate::models::{FeedRecord, FeedWindow};
use crate::PackageFeed;
use async_trait::async_trait;

/// In-memory feed for testing.
///
/// Records are held in a `Vec` and served with the same semantics the
/// trait promises from a real feed: window filtering on the modification
/// timestamp, ascending modification order, numeric skip/take. Ideal for
/// unit tests that need a [`PackageFeed`] without a network dependency.
#[derive(Debug, Default, Clone)]
pub struct MockFeed {
    records: Vec<FeedRecord>,
}

impl MockFeed {
    /// Create a mock feed pre-populated with records.
    ///
    /// Input order does not matter; paging always serves ascending
    /// modification time.
    pub fn with_records(records: impl IntoIterator<Item = FeedRecord>) -> Self {
        let mut records: Vec<FeedRecord> = records.into_iter().collect();
        records.sort_by_key(|record| record.last_edited);
        Self { records }
    }

    fn matching(&self, window: FeedWindow) -> impl Iterator<Item = &FeedRecord> {
        self.records.iter().filter(move |record| window.contains(record.last_edited))
    }
}

#[async_trait]
impl PackageFeed for MockFeed {
    async fn count(&self, window: FeedWindow) -> Result<u64> {
        Ok(self.matching(window).count() as u64)
    }

    async fn page(&self, window: FeedWindow, skip: u64, take: u32) -> Result<Vec<FeedRecord>> {
        Ok(self
            .matching(window)
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(take as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).unwrap()
    }

    fn record(id: &str, edited: i64) -> FeedRecord {
        FeedRecord {
            id: id.to_string(),
            version: "1.0.0".to_string(),
            published: ts(1_500_000_000),
            download_count: 0,
            is_latest: true,
            is_absolute_latest: true,
            is_prerelease: false,
            created: ts(1_500_000_000),
            last_edited: ts(edited),
            authors: None,
            dependencies: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_window_filtering_and_order() {
        // Deliberately unsorted input.
        let feed = MockFeed::with_records([record("c", 300), record("a", 100), record("b", 200)]);
        let window = FeedWindow { since: ts(100), until: ts(300) };
        assert_eq!(feed.count(window).await.unwrap(), 2);
        let page = feed.page(window, 0, 10).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_skip_take() {
        let feed = MockFeed::with_records((0..10).map(|i| record(&format!("p{i}"), 100 + i)));
        let window = FeedWindow { since: ts(0), until: ts(1_000) };
        let page = feed.page(window, 4, 3).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["p4", "p5", "p6"]);
        // Past the end yields an empty page, not an error.
        assert!(feed.page(window, 100, 3).await.unwrap().is_empty());
    }
}
