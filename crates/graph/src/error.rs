//! Graph Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A graph error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An edge query against the store failed.
    #[display("database error")]
    Database,
}
