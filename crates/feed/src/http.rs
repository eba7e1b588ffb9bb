//! HTTP implementation of the package feed.
//!
//! Talks JSON to two endpoints under a base URL:
//!
//! - `GET {base}/packages/count?since=&until=` → `{"count": N}`
//! - `GET {base}/packages?since=&until=&skip=&take=` → `[record, ...]`
//!
//! Timestamps cross the wire as unix seconds and are converted to
//! [`UtcDateTime`] at this boundary, explicitly.

use crate::error::{ErrorKind, Result};
use crate::models::{FeedRecord, FeedWindow};
use crate::PackageFeed;
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use time::UtcDateTime;
use tracing::instrument;

/// JSON-over-HTTP package feed client.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeed {
    /// Create a client for the feed rooted at `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn window_params(window: FeedWindow) -> [(&'static str, String); 2] {
        [
            ("since", window.since.unix_timestamp().to_string()),
            ("until", window.until.unix_timestamp().to_string()),
        ]
    }
}

#[derive(Deserialize)]
struct CountBody {
    count: u64,
}

#[derive(Deserialize)]
struct WireRecord {
    id: String,
    version: String,
    published: i64,
    download_count: i64,
    is_latest: bool,
    is_absolute_latest: bool,
    is_prerelease: bool,
    created: i64,
    last_edited: i64,
    authors: Option<String>,
    dependencies: Option<String>,
    tags: Option<String>,
}

impl TryFrom<WireRecord> for FeedRecord {
    type Error = crate::error::Error;
    fn try_from(wire: WireRecord) -> Result<Self> {
        Ok(Self {
            id: wire.id,
            version: wire.version,
            published: UtcDateTime::from_unix_timestamp(wire.published)
                .or_raise(|| ErrorKind::InvalidRecord("published timestamp"))?,
            download_count: wire.download_count,
            is_latest: wire.is_latest,
            is_absolute_latest: wire.is_absolute_latest,
            is_prerelease: wire.is_prerelease,
            created: UtcDateTime::from_unix_timestamp(wire.created)
                .or_raise(|| ErrorKind::InvalidRecord("created timestamp"))?,
            last_edited: UtcDateTime::from_unix_timestamp(wire.last_edited)
                .or_raise(|| ErrorKind::InvalidRecord("last edited timestamp"))?,
            authors: wire.authors,
            dependencies: wire.dependencies,
            tags: wire.tags,
        })
    }
}

#[async_trait]
impl PackageFeed for HttpFeed {
    #[instrument(skip(self))]
    async fn count(&self, window: FeedWindow) -> Result<u64> {
        let response = self
            .client
            .get(format!("{}/packages/count", self.base_url))
            .query(&Self::window_params(window))
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?
            .error_for_status()
            .or_raise(|| ErrorKind::Http)?;
        let body: CountBody = response.json().await.or_raise(|| ErrorKind::Decode)?;
        Ok(body.count)
    }

    #[instrument(skip(self))]
    async fn page(&self, window: FeedWindow, skip: u64, take: u32) -> Result<Vec<FeedRecord>> {
        let response = self
            .client
            .get(format!("{}/packages", self.base_url))
            .query(&Self::window_params(window))
            .query(&[("skip", skip.to_string()), ("take", take.to_string())])
            .send()
            .await
            .or_raise(|| ErrorKind::Http)?
            .error_for_status()
            .or_raise(|| ErrorKind::Http)?;
        let body: Vec<WireRecord> = response.json().await.or_raise(|| ErrorKind::Decode)?;
        body.into_iter().map(FeedRecord::try_from).collect()
    }
}
