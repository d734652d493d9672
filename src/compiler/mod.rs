//! Document + visibility in, `(nodes, edges)` out.
//!
//! The walk is pure: it reads the document and the visibility map, never
//! writes to either, and produces a fresh [`SchemaGraph`] on every call.
//! Fragments that cannot be interpreted drop only their own branch.

mod openapi;
mod schema;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::CompileOptions;
use crate::document::{self, detect_kind};
use crate::grouping::{self, GroupingDecision};
use crate::ir::{
    DocumentKind, Edge, EdgeKind, GraphNode, NodeKind, OverflowData, OverflowEntry, RootData,
    SchemaGraph,
};
use crate::path;
use crate::references::{self, PendingReference};
use crate::truncation;
use crate::visibility::{Gate, VisibilityModel, VisibilityState};

#[derive(Debug, Error)]
pub(crate) enum FragmentError {
    #[error("fragment at {path} is not an object")]
    NotAnObject { path: String },
    #[error("`{keyword}` at {path} has an unexpected shape")]
    Malformed { path: String, keyword: &'static str },
}

/// Compiles `document` into a graph honoring `visibility`, then applies the
/// configured truncation policy. Never fails: unrecognized input yields a
/// root-only graph.
pub fn compile(
    document: &Value,
    visibility: &VisibilityState,
    options: &CompileOptions,
) -> SchemaGraph {
    let kind = detect_kind(document);
    let model = VisibilityModel::new(
        visibility,
        options.max_depth,
        options.depth_mode,
        options.cascade,
    );
    let mut builder = GraphBuilder::new(kind, model, options);
    match kind {
        DocumentKind::OpenApi => openapi::walk(&mut builder, document),
        DocumentKind::JsonSchema => schema::walk(&mut builder, document),
        DocumentKind::Unrecognized => root_only(&mut builder, document),
    }
    let graph = builder.finish();
    truncation::truncate(graph, options.truncation, options.min_chain_length)
}

fn root_only(builder: &mut GraphBuilder<'_>, document: &Value) {
    let kind = NodeKind::Root(RootData {
        document_kind: DocumentKind::Unrecognized,
        title: None,
        version: None,
        type_label: value_kind(document).to_string(),
    });
    builder.emit(None, EdgeKind::Structural, kind, path::ROOT.to_string(), false);
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A node that was just added, with the gate decision for its children.
#[derive(Debug, Clone)]
pub(crate) struct Emitted {
    pub id: String,
    pub path: String,
    pub gate: Gate,
}

impl Emitted {
    pub fn is_open(&self) -> bool {
        self.gate.open
    }
}

pub(crate) struct GraphBuilder<'a> {
    graph: SchemaGraph,
    visibility: VisibilityModel<'a>,
    options: &'a CompileOptions,
    id_counts: HashMap<String, usize>,
    pending: Vec<PendingReference>,
    /// Document path of a materialized component schema -> its node id.
    targets: HashMap<String, String>,
}

impl<'a> GraphBuilder<'a> {
    fn new(kind: DocumentKind, visibility: VisibilityModel<'a>, options: &'a CompileOptions) -> Self {
        Self {
            graph: SchemaGraph::empty(kind),
            visibility,
            options,
            id_counts: HashMap::new(),
            pending: Vec::new(),
            targets: HashMap::new(),
        }
    }

    pub fn visibility(&self) -> &VisibilityModel<'a> {
        &self.visibility
    }

    fn allocate_id(&mut self, tag: &str, path: &str) -> String {
        let base = format!("{tag}:{path}");
        let count = self.id_counts.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}#{count}")
        }
    }

    /// Depth counter handed to children of `parent`; the root starts at zero.
    pub fn child_depth(parent: Option<&Emitted>) -> usize {
        parent.map(|parent| parent.gate.child_depth).unwrap_or(0)
    }

    /// Adds a node under `parent`, consulting the visibility model for
    /// whether its own children are generated.
    pub fn emit(
        &mut self,
        parent: Option<&Emitted>,
        edge_kind: EdgeKind,
        kind: NodeKind,
        path: String,
        has_children: bool,
    ) -> Emitted {
        let depth = Self::child_depth(parent);
        let gate = self.visibility.gate(&path, depth, has_children);
        let id = self.allocate_id(kind.tag(), &path);
        let mut node = GraphNode::new(id.clone(), kind, path.clone());
        node.has_children = has_children;
        node.collapsed = has_children && !gate.open;
        node.more_levels = gate.more_levels;
        self.graph.nodes.push(node);
        if let Some(parent) = parent {
            self.graph
                .edges
                .push(Edge::new(parent.id.clone(), id.clone(), edge_kind));
        }
        Emitted { id, path, gate }
    }

    /// Splits a sibling set, pinning entries whose path is explicitly expanded.
    pub fn group<T>(&self, entries: &[T], path_of: impl Fn(&T) -> String) -> GroupingDecision {
        self.group_weighted(entries, path_of, |_| 1)
    }

    /// [`GraphBuilder::group`] for entries that may occupy several boxes.
    pub fn group_weighted<T>(
        &self,
        entries: &[T],
        path_of: impl Fn(&T) -> String,
        weight: impl Fn(&T) -> usize,
    ) -> GroupingDecision {
        if !self.options.grouping {
            return GroupingDecision::all_individual(entries.len());
        }
        grouping::group_weighted(entries, self.options.max_individual, weight, |entry| {
            self.visibility.is_explicitly_expanded(&path_of(entry))
        })
    }

    /// One summary node for the overflowed part of the sibling set rooted at
    /// `container_path`. The overflowed entries have no nodes of their own, so
    /// the summary node carries their references.
    pub fn emit_overflow(
        &mut self,
        parent: &Emitted,
        container_path: &str,
        entries: Vec<OverflowEntry>,
        references: Vec<String>,
    ) -> Emitted {
        let overflow_path = path::join_synthetic(container_path, path::OVERFLOW_SEGMENT);
        let node = self.emit(
            Some(parent),
            EdgeKind::Structural,
            NodeKind::GroupedOverflow(OverflowData { entries }),
            overflow_path,
            false,
        );
        self.record_reference_names(&node, references);
        node
    }

    /// Records `$ref` pointers carried by `fragment` for the node `source`.
    /// Open nodes only report their own pointers; their children report the rest.
    pub fn record_references(&mut self, source: &Emitted, fragment: &Value) {
        let names = references::collect_references(fragment, !source.is_open());
        self.record_reference_names(source, names);
    }

    pub fn record_reference_names(&mut self, source: &Emitted, targets: Vec<String>) {
        if targets.is_empty() {
            return;
        }
        self.pending.push(PendingReference {
            source: source.id.clone(),
            targets,
        });
    }

    /// Makes `node` the target of pointers to its document path.
    pub fn register_target(&mut self, node: &Emitted) {
        self.targets.insert(node.path.clone(), node.id.clone());
    }

    fn finish(mut self) -> SchemaGraph {
        let added = references::resolve_references(&mut self.graph, &self.pending, &self.targets);
        tracing::debug!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            references = added,
            "compiled schema graph"
        );
        self.graph
    }
}

/// Logs and swallows a failed entry so its siblings still compile.
pub(crate) fn contain(result: Result<(), FragmentError>) {
    if let Err(err) = result {
        tracing::debug!(%err, "dropping fragment");
    }
}

/// Treats boolean schemas (`true` / `false`) as empty objects.
pub(crate) fn schema_object<'v>(
    fragment: &'v Value,
    path: &str,
) -> Result<&'v Value, FragmentError> {
    match fragment {
        Value::Object(_) => Ok(fragment),
        Value::Bool(_) => Ok(&EMPTY_SCHEMA),
        _ => Err(FragmentError::NotAnObject {
            path: path.to_string(),
        }),
    }
}

pub(crate) fn extend_unique(targets: &mut Vec<String>, more: Vec<String>) {
    for target in more {
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
}

static EMPTY_SCHEMA: Lazy<Value> = Lazy::new(|| Value::Object(Map::new()));

pub(crate) fn summarize_overflow(
    name: &str,
    fragment: &Value,
    required: bool,
    entry_path: String,
) -> OverflowEntry {
    OverflowEntry {
        name: name.to_string(),
        type_label: if fragment.is_object() {
            document::type_label(fragment)
        } else {
            value_kind(fragment).to_string()
        },
        required,
        path: entry_path,
    }
}
