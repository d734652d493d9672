use crate::config::SizeConfig;
use crate::ir::{EdgeKind, SchemaGraph};
use crate::layout::{node_rows, node_size};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct GraphDump {
    pub kind: String,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub path: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rows: Vec<String>,
    pub collapsed: bool,
    pub has_children: bool,
    pub more_levels: bool,
    pub anchored: bool,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl GraphDump {
    pub fn from_graph(graph: &SchemaGraph, config: &SizeConfig) -> Self {
        let mut max_x: f32 = 0.0;
        let mut max_y: f32 = 0.0;
        let nodes = graph
            .nodes
            .iter()
            .map(|node| {
                let size = node_size(node, config);
                max_x = max_x.max(node.position.x + size.width);
                max_y = max_y.max(node.position.y + size.height);
                NodeDump {
                    id: node.id.clone(),
                    kind: node.kind.tag().to_string(),
                    label: node.label(),
                    path: node.source_path.clone(),
                    x: node.position.x,
                    y: node.position.y,
                    width: size.width,
                    height: size.height,
                    rows: node_rows(node, config),
                    collapsed: node.collapsed,
                    has_children: node.has_children,
                    more_levels: node.more_levels,
                    anchored: node.anchored,
                }
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.source.clone(),
                to: edge.target.clone(),
                kind: edge.kind,
            })
            .collect();

        GraphDump {
            kind: format!("{:?}", graph.document_kind),
            width: max_x,
            height: max_y,
            nodes,
            edges,
        }
    }
}

/// Writes the dump as pretty JSON to `path`, or stdout when `None`.
pub fn write_graph_dump(
    path: Option<&Path>,
    graph: &SchemaGraph,
    config: &SizeConfig,
) -> anyhow::Result<()> {
    let dump = GraphDump::from_graph(graph, config);
    match path {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dump)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
