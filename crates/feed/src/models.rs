use time::UtcDateTime;

/// The publish timestamp a feed reports for an unlisted package-version.
///
/// 1900-01-01T00:00:00Z. A record published "then" is the feed's way of
/// saying the package-version was withdrawn and must not appear in any
/// downstream store.
pub const UNLISTED_PUBLISHED: i64 = -2_208_988_800;

/// Half-open window `[since, until)` over record modification time.
///
/// The orchestrator fixes the window once per run so a long sync doesn't
/// chase packages modified while it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedWindow {
    /// Inclusive lower bound.
    pub since: UtcDateTime,
    /// Exclusive upper bound.
    pub until: UtcDateTime,
}

impl FeedWindow {
    /// Whether a modification timestamp falls inside the window.
    pub fn contains(&self, at: UtcDateTime) -> bool {
        self.since <= at && at < self.until
    }
}

/// One package record as projected by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub id: String,
    pub version: String,
    pub published: UtcDateTime,
    pub download_count: i64,
    pub is_latest: bool,
    pub is_absolute_latest: bool,
    pub is_prerelease: bool,
    pub created: UtcDateTime,
    /// Modification timestamp; the feed orders and filters by this.
    pub last_edited: UtcDateTime,
    /// Comma-separated author names, as the feed flattens them.
    pub authors: Option<String>,
    /// Flattened dependency spec string (`id:range[:framework]` entries
    /// joined with `|`).
    pub dependencies: Option<String>,
    /// Whitespace-separated tag list.
    pub tags: Option<String>,
}

impl FeedRecord {
    /// Whether the feed reports this package-version as unlisted.
    pub fn is_unlisted(&self) -> bool {
        self.published.unix_timestamp() == UNLISTED_PUBLISHED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let window = FeedWindow { since: ts(100), until: ts(200) };
        assert!(window.contains(ts(100)));
        assert!(window.contains(ts(199)));
        assert!(!window.contains(ts(200)));
        assert!(!window.contains(ts(99)));
    }

    #[test]
    fn test_unlisted_sentinel() {
        let mut record = FeedRecord {
            id: "Foo".to_string(),
            version: "1.0.0".to_string(),
            published: ts(UNLISTED_PUBLISHED),
            download_count: 0,
            is_latest: false,
            is_absolute_latest: false,
            is_prerelease: false,
            created: ts(1_600_000_000),
            last_edited: ts(1_600_000_000),
            authors: None,
            dependencies: None,
            tags: None,
        };
        assert!(record.is_unlisted());
        record.published = ts(1_600_000_000);
        assert!(!record.is_unlisted());
    }
}
