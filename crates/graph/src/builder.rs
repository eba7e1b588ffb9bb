//! Bidirectional dependency graph traversal.
//!
//! Starting from one package identifier, the builder walks the dependency
//! edges both upstream (who depends on this) and downstream (what this
//! depends on), breadth-first. Each discovered node is tagged with its
//! minimum distance from the root, and each traversal level batches its
//! edge queries in identifier chunks so an arbitrarily wide level never
//! produces an unbounded SQL statement.

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument};

/// Upper bound on identifiers per edge query.
///
/// SQLite caps bound parameters per statement; staying well under that
/// cap keeps each IN-list query cheap to plan.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// A single directed dependency edge: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

/// Supplies dependency edges for a set of package identifiers.
///
/// Both queries return whole edges so the traversal can report them; the
/// builder decides which endpoint is the newly discovered node.
#[async_trait]
pub trait EdgeSource: Send + Sync {
    /// Edges whose target is one of `ids` (packages depending on them).
    async fn dependents_of(&self, ids: &[String]) -> Result<Vec<Edge>>;

    /// Edges whose origin is one of `ids` (packages they depend on).
    async fn dependencies_of(&self, ids: &[String]) -> Result<Vec<Edge>>;
}

/// The neighbourhood of one package, in both directions.
///
/// The root itself appears in neither depth map; depth 1 is a direct
/// dependent or dependency. A node reachable over several paths carries
/// its minimum depth. Cycles are fine; a node on a cycle through the
/// root simply shows up in both maps.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyGraph {
    pub root: String,
    /// Packages that (transitively) depend on the root, by minimum depth.
    pub dependents: BTreeMap<String, u32>,
    /// Packages the root (transitively) depends on, by minimum depth.
    pub dependencies: BTreeMap<String, u32>,
    /// Every edge encountered during traversal, deduplicated and sorted.
    pub edges: Vec<Edge>,
}

impl DependencyGraph {
    /// All node identifiers, root included, in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        let mut set: BTreeSet<&str> = self.dependents.keys().map(String::as_str).collect();
        set.extend(self.dependencies.keys().map(String::as_str));
        set.insert(self.root.as_str());
        set.into_iter()
    }

    /// Number of distinct nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Dependents,
    Dependencies,
}

/// Breadth-first builder over an [`EdgeSource`].
pub struct GraphBuilder<S> {
    source: S,
    chunk_size: usize,
}

impl<S: EdgeSource> GraphBuilder<S> {
    pub fn new(source: S) -> Self {
        Self { source, chunk_size: DEFAULT_CHUNK_SIZE }
    }

    /// Change the per-query identifier chunk size (clamped to at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Build the full bidirectional graph around `root`.
    ///
    /// A root with no edges (or absent from the store entirely) yields a
    /// graph with empty maps; there is no existence check.
    #[instrument(skip(self))]
    pub async fn build(&self, root: &str) -> Result<DependencyGraph> {
        let mut edges = BTreeSet::new();
        let dependents = self.traverse(root, Direction::Dependents, &mut edges).await?;
        let dependencies = self.traverse(root, Direction::Dependencies, &mut edges).await?;
        debug!(
            root,
            dependents = dependents.len(),
            dependencies = dependencies.len(),
            edges = edges.len(),
            "graph traversal complete"
        );
        Ok(DependencyGraph {
            root: root.to_string(),
            dependents,
            dependencies,
            edges: edges.into_iter().collect(),
        })
    }

    async fn traverse(
        &self,
        root: &str,
        direction: Direction,
        edges: &mut BTreeSet<Edge>,
    ) -> Result<BTreeMap<String, u32>> {
        // Seeding the root at depth 0 is what terminates cycles back to it.
        let mut visited: HashMap<String, u32> = HashMap::from([(root.to_string(), 0)]);
        let mut frontier = vec![root.to_string()];
        let mut depth = 0u32;
        while !frontier.is_empty() {
            depth += 1;
            let mut discovered = Vec::new();
            for chunk in frontier.chunks(self.chunk_size) {
                let found = match direction {
                    Direction::Dependents => self.source.dependents_of(chunk).await?,
                    Direction::Dependencies => self.source.dependencies_of(chunk).await?,
                };
                for edge in found {
                    let next = match direction {
                        Direction::Dependents => edge.from.clone(),
                        Direction::Dependencies => edge.to.clone(),
                    };
                    edges.insert(edge);
                    // First sighting is the minimum depth; breadth-first
                    // order guarantees it.
                    if !visited.contains_key(&next) {
                        visited.insert(next.clone(), depth);
                        discovered.push(next);
                    }
                }
            }
            frontier = discovered;
        }
        visited.remove(root);
        Ok(visited.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Edge source over a fixed edge list, counting queries.
    #[derive(Default)]
    struct FixedEdges {
        edges: Vec<Edge>,
        dependent_calls: AtomicU32,
        dependency_calls: AtomicU32,
    }

    impl FixedEdges {
        fn new(edges: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
            Self {
                edges: edges
                    .into_iter()
                    .map(|(from, to)| Edge { from: from.to_string(), to: to.to_string() })
                    .collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl EdgeSource for FixedEdges {
        async fn dependents_of(&self, ids: &[String]) -> Result<Vec<Edge>> {
            self.dependent_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.edges.iter().filter(|e| ids.contains(&e.to)).cloned().collect())
        }

        async fn dependencies_of(&self, ids: &[String]) -> Result<Vec<Edge>> {
            self.dependency_calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.edges.iter().filter(|e| ids.contains(&e.from)).cloned().collect())
        }
    }

    fn depths(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(id, depth)| (id.to_string(), *depth)).collect()
    }

    #[tokio::test]
    async fn test_chain_in_both_directions() {
        // a -> b -> c, built around b.
        let source = FixedEdges::new([("a", "b"), ("b", "c")]);
        let graph = GraphBuilder::new(source).build("b").await.unwrap();
        assert_eq!(graph.root, "b");
        assert_eq!(graph.dependents, depths(&[("a", 1)]));
        assert_eq!(graph.dependencies, depths(&[("c", 1)]));
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.node_count(), 3);
    }

    #[tokio::test]
    async fn test_transitive_depths() {
        // r -> a -> b -> c downstream; y -> x -> r upstream.
        let source = FixedEdges::new([("r", "a"), ("a", "b"), ("b", "c"), ("x", "r"), ("y", "x")]);
        let graph = GraphBuilder::new(source).build("r").await.unwrap();
        assert_eq!(graph.dependencies, depths(&[("a", 1), ("b", 2), ("c", 3)]));
        assert_eq!(graph.dependents, depths(&[("x", 1), ("y", 2)]));
    }

    #[tokio::test]
    async fn test_multiple_paths_keep_minimum_depth() {
        // c is reachable at depth 2 via a and b, and directly at depth 1.
        let source = FixedEdges::new([("r", "a"), ("r", "b"), ("r", "c"), ("a", "c"), ("b", "c")]);
        let graph = GraphBuilder::new(source).build("r").await.unwrap();
        assert_eq!(graph.dependencies, depths(&[("a", 1), ("b", 1), ("c", 1)]));
        // Every traversed edge is reported even when its target was known.
        assert_eq!(graph.edges.len(), 5);
    }

    #[tokio::test]
    async fn test_cycle_terminates_and_root_is_excluded() {
        let source = FixedEdges::new([("a", "b"), ("b", "a")]);
        let graph = GraphBuilder::new(source).build("a").await.unwrap();
        assert_eq!(graph.dependents, depths(&[("b", 1)]));
        assert_eq!(graph.dependencies, depths(&[("b", 1)]));
        assert!(!graph.dependents.contains_key("a"));
        assert!(!graph.dependencies.contains_key("a"));
        assert_eq!(graph.node_count(), 2);
    }

    #[tokio::test]
    async fn test_isolated_root() {
        let source = FixedEdges::new([]);
        let graph = GraphBuilder::new(source).build("lonely").await.unwrap();
        assert!(graph.dependents.is_empty());
        assert!(graph.dependencies.is_empty());
        assert!(graph.edges.is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[tokio::test]
    async fn test_wide_level_is_chunked() {
        // The root depends on 4001 packages, each of which depends on "b".
        // With the default chunk size of 2000 that is one query for the
        // root's level, three for the wide level, and one for b's level.
        let mut edges: Vec<(String, String)> = Vec::new();
        for index in 0..4001 {
            edges.push(("r".to_string(), format!("d{index}")));
            edges.push((format!("d{index}"), "b".to_string()));
        }
        let fixed: Vec<Edge> = edges.into_iter().map(|(from, to)| Edge { from, to }).collect();
        let source = FixedEdges { edges: fixed.clone(), ..FixedEdges::default() };
        let graph_builder = GraphBuilder::new(source);
        let graph = graph_builder.build("r").await.unwrap();
        assert_eq!(graph.dependencies.len(), 4002);
        assert_eq!(graph.dependencies.get("b"), Some(&2));
        assert_eq!(graph.dependencies.get("d0"), Some(&1));
        // Levels of width 1, 4001 and 1: one query, then three, then one.
        assert_eq!(graph_builder.source.dependency_calls.load(Ordering::Relaxed), 5);

        // Chunking changes the query count, never the result.
        let wide_source = FixedEdges { edges: fixed, ..FixedEdges::default() };
        let unchunked = GraphBuilder::new(wide_source).with_chunk_size(10_000).build("r").await.unwrap();
        assert_eq!(unchunked.dependencies, graph.dependencies);
        assert_eq!(unchunked.edges, graph.edges);
    }

    #[tokio::test]
    async fn test_chunk_size_controls_query_count() {
        let source = FixedEdges::new([("r", "a"), ("r", "b"), ("r", "c")]);
        let graph_builder = GraphBuilder::new(source).with_chunk_size(1);
        let graph = graph_builder.build("r").await.unwrap();
        assert_eq!(graph.dependencies.len(), 3);
        // One query for [r], then one per discovered node.
        assert_eq!(graph_builder.source.dependency_calls.load(Ordering::Relaxed), 4);
        assert_eq!(graph_builder.source.dependent_calls.load(Ordering::Relaxed), 1);
    }
}
