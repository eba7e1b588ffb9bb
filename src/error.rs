//! CLI Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configuration could not be loaded or is invalid.
    #[display("configuration error")]
    Config,
    /// The package store could not be opened or queried.
    #[display("database error")]
    Database,
    /// A synchronization run failed.
    #[display("synchronization error")]
    Sync,
    /// Dependency graph construction or serialization failed.
    #[display("graph error")]
    Graph,
}
