//! Force-directed node placement.
//!
//! A Fruchterman-Reingold pass over the traversed graph: every node pair
//! repels, every edge attracts, displacement per round is capped by a
//! cooling temperature. Nodes start on a golden-angle spiral instead of
//! random positions, so the same graph always lays out identically.

use crate::builder::DependencyGraph;
use serde::Serialize;
use std::collections::HashMap;

/// A placed node.
#[derive(Debug, Clone, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f32,
    pub y: f32,
}

// Golden angle in radians; successive spiral points never line up.
const GOLDEN_ANGLE: f32 = 2.399_963;
// Target spacing between neighbouring nodes, in layout units.
const NODE_SPACING: f32 = 40.0;
// Canvas ceiling; past this the layout gets denser instead of wider.
const MAX_SIDE: f32 = 4_000.0;
// Iteration count grows with the graph but stays bounded.
const BASE_ITERATIONS: usize = 50;
const MAX_ITERATIONS: usize = 300;
// Floor on pairwise distance to keep forces finite.
const MIN_DISTANCE: f32 = 0.01;

/// Compute positions for every node of the graph.
///
/// Purely deterministic: node order is the graph's sorted node order and
/// the initial placement is a fixed spiral.
pub fn layout(graph: &DependencyGraph) -> Vec<NodePosition> {
    let nodes: Vec<&str> = graph.nodes().collect();
    let count = nodes.len();
    if count == 0 {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    // Both edge endpoints were visited during traversal, so the lookups
    // always hit.
    let edges: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .filter_map(|edge| Some((*index.get(edge.from.as_str())?, *index.get(edge.to.as_str())?)))
        .collect();

    let side = canvas_side(count);
    // Ideal pairwise distance for this many nodes on this much area.
    let k = (side * side / count as f32).sqrt().max(MIN_DISTANCE);

    let mut positions: Vec<(f32, f32)> = (0..count)
        .map(|i| {
            let radius = NODE_SPACING * (i as f32).sqrt();
            let angle = i as f32 * GOLDEN_ANGLE;
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    let iterations = (BASE_ITERATIONS + count).min(MAX_ITERATIONS);
    let mut temperature = side / 10.0;
    let cooling = temperature / iterations as f32;

    for _ in 0..iterations {
        let mut displacement = vec![(0f32, 0f32); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let dx = positions[i].0 - positions[j].0;
                let dy = positions[i].1 - positions[j].1;
                let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
                let repulsion = k * k / distance;
                let fx = dx / distance * repulsion;
                let fy = dy / distance * repulsion;
                displacement[i].0 += fx;
                displacement[i].1 += fy;
                displacement[j].0 -= fx;
                displacement[j].1 -= fy;
            }
        }

        for &(from, to) in &edges {
            if from == to {
                continue;
            }
            let dx = positions[from].0 - positions[to].0;
            let dy = positions[from].1 - positions[to].1;
            let distance = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let attraction = distance * distance / k;
            let fx = dx / distance * attraction;
            let fy = dy / distance * attraction;
            displacement[from].0 -= fx;
            displacement[from].1 -= fy;
            displacement[to].0 += fx;
            displacement[to].1 += fy;
        }

        for i in 0..count {
            let (dx, dy) = displacement[i];
            let length = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let step = length.min(temperature);
            positions[i].0 += dx / length * step;
            positions[i].1 += dy / length * step;
        }

        temperature = (temperature - cooling).max(0.0);
    }

    nodes
        .into_iter()
        .zip(positions)
        .map(|(id, (x, y))| NodePosition { id: id.to_string(), x, y })
        .collect()
}

/// Canvas edge length for a node count: grows with the square root of
/// the count up to [`MAX_SIDE`].
fn canvas_side(count: usize) -> f32 {
    ((count as f32).sqrt() * NODE_SPACING).min(MAX_SIDE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Edge;
    use std::collections::BTreeMap;

    fn graph(root: &str, dependencies: &[(&str, u32)], edges: &[(&str, &str)]) -> DependencyGraph {
        DependencyGraph {
            root: root.to_string(),
            dependents: BTreeMap::new(),
            dependencies: dependencies.iter().map(|(id, d)| (id.to_string(), *d)).collect(),
            edges: edges
                .iter()
                .map(|(from, to)| Edge { from: from.to_string(), to: to.to_string() })
                .collect(),
        }
    }

    #[test]
    fn test_root_only_graph_is_a_single_origin_point() {
        let placed = layout(&graph("r", &[], &[]));
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].id, "r");
        assert!(placed[0].x.is_finite() && placed[0].y.is_finite());
    }

    #[test]
    fn test_every_node_is_placed_once() {
        let g = graph("r", &[("a", 1), ("b", 1), ("c", 2)], &[("r", "a"), ("r", "b"), ("a", "c")]);
        let placed = layout(&g);
        let mut ids: Vec<_> = placed.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, ["a", "b", "c", "r"]);
    }

    #[test]
    fn test_positions_are_finite_and_distinct() {
        let g = graph("r", &[("a", 1), ("b", 1)], &[("r", "a"), ("r", "b")]);
        let placed = layout(&g);
        for position in &placed {
            assert!(position.x.is_finite());
            assert!(position.y.is_finite());
        }
        for (i, left) in placed.iter().enumerate() {
            for right in &placed[i + 1..] {
                let dx = left.x - right.x;
                let dy = left.y - right.y;
                assert!(dx * dx + dy * dy > 0.0, "{} and {} collapsed", left.id, right.id);
            }
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let g = graph(
            "r",
            &[("a", 1), ("b", 1), ("c", 2), ("d", 2)],
            &[("r", "a"), ("r", "b"), ("a", "c"), ("b", "d")],
        );
        let first = layout(&g);
        let second = layout(&g);
        for (left, right) in first.iter().zip(&second) {
            assert_eq!(left.id, right.id);
            assert_eq!(left.x, right.x);
            assert_eq!(left.y, right.y);
        }
    }

    #[test]
    fn test_canvas_growth_is_capped() {
        assert_eq!(canvas_side(1), NODE_SPACING);
        assert_eq!(canvas_side(100), 400.0);
        // Square-root growth up to the ceiling, flat beyond it.
        assert_eq!(canvas_side(10_000), MAX_SIDE);
        assert_eq!(canvas_side(1_000_000), MAX_SIDE);
    }

    #[test]
    fn test_connected_nodes_sit_closer_than_strangers() {
        // A tight pair plus one unconnected node.
        let g = graph("r", &[("a", 1), ("far", 1)], &[("r", "a")]);
        let placed = layout(&g);
        let pos = |id: &str| placed.iter().find(|p| p.id == id).unwrap();
        let dist = |left: &NodePosition, right: &NodePosition| {
            let dx = left.x - right.x;
            let dy = left.y - right.y;
            (dx * dx + dy * dy).sqrt()
        };
        assert!(dist(pos("r"), pos("a")) < dist(pos("r"), pos("far")) * 2.0);
    }
}
