//! Engine Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use pkgsync_store::Retryable;

/// An engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The feed could not be queried. Fatal for the run; the feed is never
    /// retried at the record level.
    #[display("feed error")]
    Feed,
    /// A store write failed. Individually wrapped by the retry policy;
    /// surviving errors end the run.
    #[display("store error")]
    Store,
    /// The run ledger could not be read or written.
    #[display("run ledger error")]
    Ledger,
}

impl Retryable for ErrorKind {
    fn is_retryable(&self) -> bool {
        // Only the per-record store unit of work sits inside the retry
        // policy; feed and ledger failures are handled at run level.
        matches!(self, ErrorKind::Store)
    }
}
