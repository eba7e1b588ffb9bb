//! Bounded retry around store units of work.
//!
//! One feed record is one unit of work; if its write fails on something
//! transient the policy refreshes the query planner statistics once, then
//! re-attempts on a fixed interval until the attempt budget runs out. The
//! final error propagates to the orchestrator, which treats it as fatal
//! for the whole run.

use crate::Database;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// Whether an error kind is worth retrying.
///
/// Implemented by each crate's `ErrorKind` so the policy can wrap units of
/// work regardless of which crate's errors they surface.
pub trait Retryable {
    /// Returns `true` if retrying might succeed.
    fn is_retryable(&self) -> bool;
}

/// Fixed-interval retry with a pre-retry statistics refresh.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget and backoff interval.
    ///
    /// `max_attempts` counts the first try; it is clamped to at least 1.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run one unit of work under this policy.
    ///
    /// Only errors whose kind reports [`Retryable::is_retryable`] are
    /// re-attempted. Before the first retry the database statistics are
    /// refreshed ([`Database::refresh_statistics`]), so later attempts plan
    /// against current data. Exhausting the budget returns the last error.
    pub async fn run<T, K, F, Fut>(&self, db: &Database, op: F) -> Result<T, exn::Exn<K>>
    where
        K: Retryable + std::error::Error + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, exn::Exn<K>>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !(&*err).is_retryable() {
                        return Err(err);
                    }
                    if attempt == 1 {
                        // Keep the query planner honest before the first
                        // re-attempt; a failed refresh must not mask the
                        // original error.
                        if let Err(refresh_err) = db.refresh_statistics().await {
                            warn!("statistics refresh before retry failed: {refresh_err:?}");
                        }
                    }
                    warn!(attempt, max = self.max_attempts, "unit of work failed, retrying");
                    tokio::time::sleep(self.backoff).await;
                    attempt += 1;
                },
            }
        }
    }
}
