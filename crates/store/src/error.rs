//! Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong
/// internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A column value could not be converted to its domain type.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl crate::retry::Retryable for ErrorKind {
    fn is_retryable(&self) -> bool {
        // Lock contention and busy timeouts surface as generic database
        // errors; a second attempt against a quieter connection can succeed.
        // Bad data never fixes itself.
        matches!(self, ErrorKind::Database)
    }
}
