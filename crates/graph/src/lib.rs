//! Dependency graph construction over the package store.
//!
//! Walks the synchronized dependency table outward from a single package,
//! in both directions, producing depth-tagged node sets plus the edges
//! between them, and optionally a deterministic force-directed placement
//! of the result.

pub mod error;

mod builder;
mod layout;
mod source;

pub use crate::builder::{DEFAULT_CHUNK_SIZE, DependencyGraph, Edge, EdgeSource, GraphBuilder};
pub use crate::layout::{NodePosition, layout};
