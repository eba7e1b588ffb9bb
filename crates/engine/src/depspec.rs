//! Flattened dependency spec parsing.
//!
//! The feed collapses a package's dependency groups into one string:
//! entries separated by `|`, each entry `id:versionRange[:targetFramework]`.
//! A group without dependencies appears as an entry with an empty id and
//! only a framework segment (`::net6.0`); those carry no edge. The same
//! dependency may appear in several groups, so edges are deduplicated on
//! their full composite value.

use crate::normalize::{MAX_NAME_LEN, MAX_VERSION_LEN, normalize};
use pkgsync_store::DependencyEdge;
use std::collections::HashSet;

/// Parse a flattened dependency spec into deduplicated edges.
///
/// Entries with an empty identifier (group markers, corrupt fragments)
/// are dropped; everything else is normalized like any other feed value.
pub fn parse_dependency_spec(raw: &str) -> Vec<DependencyEdge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for entry in raw.split('|') {
        let mut segments = entry.splitn(3, ':');
        let dependency_id = normalize(segments.next().unwrap_or_default(), MAX_NAME_LEN);
        if dependency_id.is_empty() {
            continue;
        }
        let dependency_version = normalize(segments.next().unwrap_or_default(), MAX_VERSION_LEN);
        // The third segment is the target framework; it qualifies the
        // group, not the edge, so it plays no part in identity.
        if seen.insert((dependency_id.clone(), dependency_version.clone())) {
            edges.push(DependencyEdge { dependency_id, dependency_version });
        }
    }
    edges
}
