pub mod animation;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod config;
pub mod document;
pub mod graph_dump;
pub mod grouping;
pub mod ir;
pub mod layout;
pub mod path;
pub mod references;
pub mod text_metrics;
pub mod truncation;
pub mod visibility;

pub use animation::{AnimationPhase, AnimationToken, Frame, LayoutAnimator};
pub use cache::GraphCache;
#[cfg(feature = "cli")]
pub use cli::run;
pub use compiler::compile;
pub use config::{CompileOptions, Config, LayoutConfig, TruncationPolicy};
pub use ir::{DocumentKind, Edge, EdgeKind, GraphNode, NodeKind, Position, SchemaGraph, Size};
pub use layout::compute_layout;
pub use visibility::{DepthMode, ExpandState, VisibilityState};

use serde_json::Value;

/// Compiles `document` under `visibility` and positions the result.
pub fn build_graph(document: &Value, visibility: &VisibilityState, config: &Config) -> SchemaGraph {
    let graph = compile(document, visibility, &config.compile);
    compute_layout(graph, &config.layout)
}
