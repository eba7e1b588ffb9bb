//! SQLite store for synchronized package metadata.
//!
//! This crate owns everything that touches the database: the connection
//! pool, the package repository (packages with their author/tag/dependency
//! child rows), the run ledger used for checkpointing and operational
//! visibility, and the retry policy that wraps individual write units.
//!
//! # Architecture
//! - **Packages** are keyed by the composite `(id, version)`. Child rows
//!   belong to exactly one package-version and are rewritten atomically
//!   with it, which keeps reprocessing idempotent.
//! - **Runs** are append-only ledger rows; the most recent non-null cursor
//!   is the resume point for the next synchronization.

mod db;
pub mod error;
mod ledger;
mod models;
mod repo;
mod retry;

pub use crate::db::Database;
pub use crate::ledger::RunLedger;
pub use crate::models::{DependencyEdge, Package, RunRecord};
pub use crate::repo::PackageRepository;
pub use crate::retry::{RetryPolicy, Retryable};
