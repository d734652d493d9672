use super::text::{ellipsize, text_width};
use crate::config::SizeConfig;
use crate::ir::{GraphNode, NodeKind, Size};

/// Room reserved next to the header for the expand/collapse toggle.
const TOGGLE_WIDTH: f32 = 20.0;

fn header_text(node: &GraphNode) -> String {
    let label = node.label();
    let required = match &node.kind {
        NodeKind::SchemaProperty(data) => data.required,
        NodeKind::ObjectGroup(data) => data.required,
        _ => false,
    };
    if required { format!("{label} *") } else { label }
}

/// Body rows of a node, capped at `max_rows` with a trailing "+N more" row.
/// Rows wider than the node can get are ellipsized.
pub fn node_rows(node: &GraphNode, config: &SizeConfig) -> Vec<String> {
    let mut rows = node.kind.detail_lines();
    rows.extend(
        node.elided
            .iter()
            .map(|entry| format!("via {}: {}", entry.label, entry.type_label)),
    );
    let max_rows = config.max_rows.max(1);
    if rows.len() > max_rows {
        let hidden = rows.len() - (max_rows - 1);
        rows.truncate(max_rows - 1);
        rows.push(format!("+{hidden} more"));
    }
    let max_text = (config.max_width - config.padding_x * 2.0).max(0.0);
    rows.iter()
        .map(|row| ellipsize(row, max_text, config))
        .collect()
}

/// Estimated rendered size: a header row plus one row per payload line,
/// padded and clamped to the configured width range.
pub fn estimate_size(node: &GraphNode, config: &SizeConfig) -> Size {
    let rows = node_rows(node, config);
    let mut content_width = text_width(&header_text(node), config);
    if node.has_children {
        content_width += TOGGLE_WIDTH;
    }
    for row in &rows {
        content_width = content_width.max(text_width(row, config));
    }
    let width = (content_width + config.padding_x * 2.0).clamp(
        config.min_width,
        config.max_width.max(config.min_width),
    );
    let height = config.header_height + rows.len() as f32 * config.row_height + config.padding_y * 2.0;
    Size::new(width, height)
}
