//! Feed Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A feed error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The feed endpoint could not be reached or answered with a failure
    /// status. Run-fatal: the orchestrator aborts the run, it does not
    /// retry the feed.
    #[display("feed request failed")]
    Http,
    /// The response body was not the shape this client expects.
    #[display("feed response could not be decoded")]
    Decode,
    /// A record carried a timestamp outside the representable range.
    #[display("invalid feed record: {_0}")]
    InvalidRecord(#[error(not(source))] &'static str),
}
