//! `$ref` pointers become reference edges between materialized nodes.
//!
//! References are never followed inline: a pointer only produces an edge
//! when a node for its target already exists in the pass being built. That
//! is what keeps self-referential schemas finite.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ir::{Edge, EdgeKind, SchemaGraph};
use crate::path;

static LOCAL_SCHEMA_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#/(components/schemas|definitions|\$defs)/([^/]+)$").unwrap()
});

/// Container and schema name of a local pointer, with JSON-pointer escapes
/// undone in the name.
fn split_pointer(pointer: &str) -> Option<(&str, String)> {
    let captures = LOCAL_SCHEMA_REF.captures(pointer.trim())?;
    let container = captures.get(1)?.as_str();
    let raw = captures.get(2)?.as_str();
    Some((container, raw.replace("~1", "/").replace("~0", "~")))
}

/// Name of the schema a local pointer targets.
pub fn reference_name(pointer: &str) -> Option<String> {
    split_pointer(pointer).map(|(_, name)| name)
}

/// Document path of the schema a local pointer targets, e.g.
/// `#/components/schemas/User` is `root.components.schemas.User`.
pub fn reference_path(pointer: &str) -> Option<String> {
    let (container, name) = split_pointer(pointer)?;
    let mut segments: Vec<&str> = container.split('/').collect();
    segments.push(&name);
    Some(path::join_all(path::ROOT, &segments))
}

/// Target schema paths referenced by `fragment`, in first-seen order.
///
/// With `descend` the scan continues into `properties` and `items`; callers
/// turn it off for nodes whose children are materialized, since those
/// children report their own references. Composition members never get
/// nodes of their own, so they are always scanned in full.
pub fn collect_references(fragment: &Value, descend: bool) -> Vec<String> {
    let mut targets = Vec::new();
    let mut seen = HashSet::new();
    scan(fragment, descend, &mut targets, &mut seen);
    targets
}

fn scan(fragment: &Value, descend: bool, targets: &mut Vec<String>, seen: &mut HashSet<String>) {
    let Some(map) = fragment.as_object() else {
        return;
    };
    if let Some(target) = map
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(reference_path)
        && seen.insert(target.clone())
    {
        targets.push(target);
    }
    for keyword in ["allOf", "anyOf"] {
        if let Some(members) = map.get(keyword).and_then(Value::as_array) {
            for member in members {
                scan(member, true, targets, seen);
            }
        }
    }
    // Only the first oneOf branch is considered the primary shape.
    if let Some(first) = map
        .get("oneOf")
        .and_then(Value::as_array)
        .and_then(|members| members.first())
    {
        scan(first, true, targets, seen);
    }
    if !descend {
        return;
    }
    if let Some(props) = map.get("properties").and_then(Value::as_object) {
        for child in props.values() {
            scan(child, true, targets, seen);
        }
    }
    if let Some(items) = map.get("items") {
        scan(items, true, targets, seen);
    }
}

/// A node that carries `$ref` pointers, recorded during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReference {
    pub source: String,
    pub targets: Vec<String>,
}

/// Appends one reference edge per pending pointer whose target node exists.
/// `targets` maps a schema's document path to the id of its node.
/// Runs after the walk, so forward references resolve regardless of order.
pub fn resolve_references(
    graph: &mut SchemaGraph,
    pending: &[PendingReference],
    targets: &HashMap<String, String>,
) -> usize {
    let existing: HashSet<&str> = graph.nodes.iter().map(|node| node.id.as_str()).collect();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut added = Vec::new();
    for reference in pending {
        if !existing.contains(reference.source.as_str()) {
            continue;
        }
        for target_path in &reference.targets {
            let Some(target) = targets.get(target_path) else {
                continue;
            };
            if *target == reference.source || !existing.contains(target.as_str()) {
                continue;
            }
            if seen.insert((reference.source.clone(), target.clone())) {
                added.push(Edge::new(
                    reference.source.clone(),
                    target.clone(),
                    EdgeKind::Reference,
                ));
            }
        }
    }
    let count = added.len();
    graph.edges.extend(added);
    count
}
