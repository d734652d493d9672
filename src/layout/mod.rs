mod collision;
mod grid;
mod size;
mod text;
mod tree;

pub use collision::{Bounds, ResolveOutcome, count_collisions, resolve};
pub use grid::{place_grid, place_row};
pub use size::{estimate_size, node_rows};

use crate::config::{LayoutConfig, LayoutMode, SizeConfig};
use crate::ir::{GraphNode, Position, SchemaGraph, Size};

/// Rendered size when the surface has measured the node, estimate otherwise.
pub fn node_size(node: &GraphNode, config: &SizeConfig) -> Size {
    node.measured
        .filter(|size| size.width > 0.0 && size.height > 0.0)
        .unwrap_or_else(|| estimate_size(node, config))
}

/// Positions every node of `graph`: tree (or grid) placement first, then
/// collision resolution. Anchored nodes keep their positions throughout.
pub fn compute_layout(mut graph: SchemaGraph, config: &LayoutConfig) -> SchemaGraph {
    if graph.nodes.is_empty() {
        return graph;
    }
    let sizes: Vec<Size> = graph
        .nodes
        .iter()
        .map(|node| node_size(node, &config.size))
        .collect();

    let positions = match config.mode {
        LayoutMode::Tree => tree::layout_tree(&graph, &sizes, &config.tree),
        LayoutMode::Grid => grid_positions(&graph, &sizes, config),
    };
    for (node, position) in graph.nodes.iter_mut().zip(positions) {
        node.position = position;
    }

    if config.collision.enabled {
        let mut bounds = bounds_for(&graph, &sizes);
        let outcome = resolve(&mut bounds, &config.collision);
        if !outcome.converged {
            tracing::debug!(
                passes = outcome.passes,
                "collision resolution hit the iteration cap"
            );
        }
        for (node, bound) in graph.nodes.iter_mut().zip(bounds) {
            node.position = Position::new(bound.x, bound.y);
        }
    }
    graph
}

fn grid_positions(graph: &SchemaGraph, sizes: &[Size], config: &LayoutConfig) -> Vec<Position> {
    let free: Vec<usize> = (0..graph.nodes.len())
        .filter(|idx| !graph.nodes[*idx].anchored)
        .collect();
    let free_sizes: Vec<Size> = free.iter().map(|idx| sizes[*idx]).collect();
    let placed = place_grid(&free_sizes, &config.grid);

    let mut positions: Vec<Position> = graph.nodes.iter().map(|node| node.position).collect();
    for (idx, position) in free.into_iter().zip(placed) {
        positions[idx] = position;
    }
    positions
}

pub fn bounds_for(graph: &SchemaGraph, sizes: &[Size]) -> Vec<Bounds> {
    graph
        .nodes
        .iter()
        .zip(sizes)
        .map(|(node, size)| Bounds {
            id: node.id.clone(),
            x: node.position.x,
            y: node.position.y,
            width: size.width,
            height: size.height,
            fixed: node.anchored,
        })
        .collect()
}
