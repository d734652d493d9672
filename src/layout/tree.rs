//! Two-pass tree placement over the containment forest.
//!
//! Bottom-up, every node gets the width of its subtree:
//! `max(own width, sum of child subtree widths + gaps)`. Top-down, each node
//! is centered in the span it was allotted and its children are packed left
//! to right below it, each centered in its own share. Independent roots are
//! packed left to right as whole trees.

use super::grid::{place_row, row_width};
use crate::config::TreeLayoutConfig;
use crate::ir::{Position, SchemaGraph, Size};

pub(super) struct Forest {
    pub children: Vec<Vec<usize>>,
    pub roots: Vec<usize>,
}

/// Parent/child structure implied by containment edges. When a node has
/// several incoming containment edges the first one wins; edges that would
/// close a cycle are ignored.
pub(super) fn build_forest(graph: &SchemaGraph) -> Forest {
    let index = graph.index_by_id();
    let count = graph.nodes.len();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut parent: Vec<Option<usize>> = vec![None; count];

    for edge in graph.edges.iter().filter(|edge| edge.kind.is_containment()) {
        let (Some(&source), Some(&target)) =
            (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        if source == target || parent[target].is_some() || is_ancestor(&parent, target, source) {
            continue;
        }
        parent[target] = Some(source);
        children[source].push(target);
    }

    let roots = (0..count).filter(|idx| parent[*idx].is_none()).collect();
    Forest { children, roots }
}

fn is_ancestor(parent: &[Option<usize>], candidate: usize, node: usize) -> bool {
    let mut current = Some(node);
    while let Some(idx) = current {
        if idx == candidate {
            return true;
        }
        current = parent[idx];
    }
    false
}

fn subtree_widths(forest: &Forest, sizes: &[Size], gap: f32) -> Vec<f32> {
    let mut widths = vec![0.0f32; sizes.len()];
    for root in &forest.roots {
        fill_width(*root, forest, sizes, gap, &mut widths);
    }
    widths
}

fn fill_width(node: usize, forest: &Forest, sizes: &[Size], gap: f32, widths: &mut [f32]) -> f32 {
    let child_widths: Vec<f32> = forest.children[node]
        .iter()
        .map(|child| fill_width(*child, forest, sizes, gap, widths))
        .collect();
    let width = sizes[node].width.max(row_width(&child_widths, gap));
    widths[node] = width;
    width
}

#[allow(clippy::too_many_arguments)]
fn place(
    node: usize,
    left: f32,
    top: f32,
    forest: &Forest,
    sizes: &[Size],
    widths: &[f32],
    config: &TreeLayoutConfig,
    positions: &mut [Position],
) -> f32 {
    let span = widths[node];
    let own = sizes[node];
    positions[node] = Position::new(left + (span - own.width) / 2.0, top);

    let children = &forest.children[node];
    let mut bottom = top + own.height;
    if children.is_empty() {
        return bottom;
    }
    let child_widths: Vec<f32> = children.iter().map(|child| widths[*child]).collect();
    let total = row_width(&child_widths, config.horizontal_gap);
    let lefts = place_row(
        &child_widths,
        config.horizontal_gap,
        left + (span - total) / 2.0,
    );
    let child_top = top + own.height + config.vertical_gap;
    for (child, child_left) in children.iter().zip(lefts) {
        let child_bottom = place(
            *child, child_left, child_top, forest, sizes, widths, config, positions,
        );
        bottom = bottom.max(child_bottom);
    }
    bottom
}

/// Tree positions for every node, indexed like `graph.nodes`.
///
/// Anchored nodes keep the position they came in with; their non-anchored
/// descendants move with them by the same displacement.
pub(super) fn layout_tree(
    graph: &SchemaGraph,
    sizes: &[Size],
    config: &TreeLayoutConfig,
) -> Vec<Position> {
    let count = graph.nodes.len();
    if count == 0 {
        return Vec::new();
    }
    let forest = build_forest(graph);
    let widths = subtree_widths(&forest, sizes, config.horizontal_gap);

    let mut computed = vec![Position::default(); count];
    let root_widths: Vec<f32> = forest.roots.iter().map(|root| widths[*root]).collect();
    let lefts = place_row(&root_widths, config.root_gap, 0.0);
    for (root, left) in forest.roots.iter().zip(lefts) {
        place(*root, left, 0.0, &forest, sizes, &widths, config, &mut computed);
    }

    let mut positions = computed.clone();
    let mut stack: Vec<(usize, f32, f32)> = forest
        .roots
        .iter()
        .rev()
        .map(|root| (*root, 0.0, 0.0))
        .collect();
    while let Some((node, dx, dy)) = stack.pop() {
        let (dx, dy) = if graph.nodes[node].anchored {
            let anchor = graph.nodes[node].position;
            positions[node] = anchor;
            (anchor.x - computed[node].x, anchor.y - computed[node].y)
        } else {
            positions[node] = Position::new(computed[node].x + dx, computed[node].y + dy);
            (dx, dy)
        };
        for child in forest.children[node].iter().rev() {
            stack.push((*child, dx, dy));
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{DocumentKind, Edge, EdgeKind, GraphNode, NodeKind, PathsData};

    fn node(id: &str) -> GraphNode {
        GraphNode::new(
            id.to_string(),
            NodeKind::Paths(PathsData { path_count: 0 }),
            id.to_string(),
        )
    }

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> SchemaGraph {
        SchemaGraph {
            document_kind: DocumentKind::JsonSchema,
            nodes: ids.iter().map(|id| node(id)).collect(),
            edges: edges
                .iter()
                .map(|(source, target)| Edge::new(*source, *target, EdgeKind::Structural))
                .collect(),
        }
    }

    fn config() -> TreeLayoutConfig {
        TreeLayoutConfig {
            horizontal_gap: 10.0,
            vertical_gap: 20.0,
            root_gap: 50.0,
        }
    }

    #[test]
    fn children_are_centered_under_parent() {
        let graph = graph(&["p", "a", "b"], &[("p", "a"), ("p", "b")]);
        let sizes = vec![Size::new(40.0, 10.0); 3];
        let positions = layout_tree(&graph, &sizes, &config());
        // Children span 40 + 10 + 40 = 90; parent centered in that span.
        assert_eq!(positions[1], Position::new(0.0, 30.0));
        assert_eq!(positions[2], Position::new(50.0, 30.0));
        assert_eq!(positions[0], Position::new(25.0, 0.0));
    }

    #[test]
    fn wide_parent_centers_narrow_children() {
        let graph = graph(&["p", "a"], &[("p", "a")]);
        let sizes = vec![Size::new(100.0, 10.0), Size::new(20.0, 10.0)];
        let positions = layout_tree(&graph, &sizes, &config());
        assert_eq!(positions[0].x, 0.0);
        assert_eq!(positions[1].x, 40.0);
    }

    #[test]
    fn independent_roots_are_packed_left_to_right() {
        let graph = graph(&["a", "b"], &[]);
        let sizes = vec![Size::new(30.0, 10.0); 2];
        let positions = layout_tree(&graph, &sizes, &config());
        assert_eq!(positions[1].x - positions[0].x, 80.0);
    }

    #[test]
    fn anchored_nodes_carry_their_subtree() {
        let mut graph = graph(&["p", "a", "c"], &[("p", "a"), ("a", "c")]);
        graph.nodes[1].anchored = true;
        graph.nodes[1].position = Position::new(500.0, 500.0);
        let sizes = vec![Size::new(40.0, 10.0); 3];
        let positions = layout_tree(&graph, &sizes, &config());
        assert_eq!(positions[1], Position::new(500.0, 500.0));
        assert_eq!(positions[2], Position::new(500.0, 530.0));
        assert_eq!(positions[0], Position::new(0.0, 0.0));
    }

    #[test]
    fn first_incoming_edge_wins_and_cycles_are_cut() {
        let graph = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("c", "b"), ("b", "a")],
        );
        let forest = build_forest(&graph);
        assert_eq!(forest.children[0], vec![1]);
        assert!(forest.children[1].is_empty());
        assert!(forest.children[2].is_empty());
        assert_eq!(forest.roots, vec![0, 2]);
    }
}
