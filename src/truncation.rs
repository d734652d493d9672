//! Elides single-child pass-through chains from a compiled graph.
//!
//! A node qualifies when it is a plain schema waypoint (property, object
//! group or array item), has exactly one incoming and one outgoing
//! containment edge, takes part in no reference edge, is not pinned by the
//! editor, is not a named component schema, and its sole child is not itself
//! collapsed. Maximal runs of qualifying nodes are replaced according to the
//! [`TruncationPolicy`].

use std::collections::{HashMap, HashSet};

use crate::config::TruncationPolicy;
use crate::ir::{ChainData, Edge, EdgeKind, ElidedEntry, GraphNode, NodeKind, SchemaGraph};

#[derive(Debug, Clone, PartialEq)]
struct Chain {
    parent: usize,
    members: Vec<usize>,
    child: usize,
    /// Index into `graph.edges` of the parent -> first member edge.
    entry_edge: usize,
    entry_kind: EdgeKind,
    exit_kind: EdgeKind,
}

pub fn truncate(graph: SchemaGraph, policy: TruncationPolicy, min_chain: usize) -> SchemaGraph {
    if policy == TruncationPolicy::Off || graph.nodes.len() < 3 {
        return graph;
    }
    let chains = find_chains(&graph, min_chain.max(1));
    if chains.is_empty() {
        return graph;
    }
    tracing::debug!(chains = chains.len(), ?policy, "eliding pass-through chains");
    apply(graph, &chains, policy)
}

fn elided_entry(node: &GraphNode) -> ElidedEntry {
    ElidedEntry {
        label: node.label(),
        type_label: node.kind.type_label().unwrap_or_default().to_string(),
    }
}

fn find_chains(graph: &SchemaGraph, min_chain: usize) -> Vec<Chain> {
    let index = graph.index_by_id();
    let count = graph.nodes.len();
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut referenced = vec![false; count];

    for (edge_idx, edge) in graph.edges.iter().enumerate() {
        let (Some(&source), Some(&target)) =
            (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        if edge.kind.is_containment() {
            outgoing[source].push(edge_idx);
            incoming[target].push(edge_idx);
        } else {
            referenced[source] = true;
            referenced[target] = true;
        }
    }

    let endpoint = |edge_idx: usize, source: bool| -> Option<usize> {
        let edge = &graph.edges[edge_idx];
        let id = if source { &edge.source } else { &edge.target };
        index.get(id.as_str()).copied()
    };

    let qualifies = |idx: usize| -> bool {
        let node = &graph.nodes[idx];
        if !node.kind.is_structural_waypoint() || node.anchored || referenced[idx] {
            return false;
        }
        if incoming[idx].len() != 1 || outgoing[idx].len() != 1 {
            return false;
        }
        let Some(parent) = endpoint(incoming[idx][0], true) else {
            return false;
        };
        if matches!(graph.nodes[parent].kind, NodeKind::ComponentsContainer(_)) {
            return false;
        }
        let Some(child) = endpoint(outgoing[idx][0], false) else {
            return false;
        };
        child != idx && !graph.nodes[child].collapsed
    };

    let qualifying: Vec<bool> = (0..count).map(qualifies).collect();
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut chains = Vec::new();

    for head in 0..count {
        if !qualifying[head] || claimed.contains(&head) {
            continue;
        }
        let entry_edge = incoming[head][0];
        let Some(parent) = endpoint(entry_edge, true) else {
            continue;
        };
        // Only start at the top of a run.
        if qualifying[parent] {
            continue;
        }

        let mut members = vec![head];
        let mut seen: HashSet<usize> = HashSet::from([head]);
        let mut current = head;
        let (child, exit_edge) = loop {
            let exit_edge = outgoing[current][0];
            let Some(next) = endpoint(exit_edge, false) else {
                break (None, exit_edge);
            };
            if qualifying[next] && seen.insert(next) {
                members.push(next);
                current = next;
                continue;
            }
            break (Some(next), exit_edge);
        };
        let Some(child) = child else {
            continue;
        };
        if members.len() < min_chain || members.contains(&child) {
            continue;
        }
        claimed.extend(members.iter().copied());
        chains.push(Chain {
            parent,
            members,
            child,
            entry_edge,
            entry_kind: graph.edges[entry_edge].kind,
            exit_kind: graph.edges[exit_edge].kind,
        });
    }
    chains
}

fn apply(graph: SchemaGraph, chains: &[Chain], policy: TruncationPolicy) -> SchemaGraph {
    let SchemaGraph {
        document_kind,
        nodes,
        edges,
    } = graph;

    let removed: HashSet<usize> = chains
        .iter()
        .flat_map(|chain| chain.members.iter().copied())
        .collect();
    let removed_ids: HashSet<&str> = removed.iter().map(|idx| nodes[*idx].id.as_str()).collect();
    let by_entry_edge: HashMap<usize, &Chain> =
        chains.iter().map(|chain| (chain.entry_edge, chain)).collect();

    let mut replacement_nodes: HashMap<usize, GraphNode> = HashMap::new();
    let mut child_annotations: HashMap<usize, Vec<ElidedEntry>> = HashMap::new();
    let mut new_edges = Vec::with_capacity(edges.len());

    for (edge_idx, edge) in edges.iter().enumerate() {
        if let Some(chain) = by_entry_edge.get(&edge_idx) {
            let entries: Vec<ElidedEntry> = chain
                .members
                .iter()
                .map(|idx| elided_entry(&nodes[*idx]))
                .collect();
            let parent_id = nodes[chain.parent].id.clone();
            let child_id = nodes[chain.child].id.clone();
            match policy {
                TruncationPolicy::Reconnect => {
                    new_edges.push(Edge::new(parent_id, child_id, chain.exit_kind));
                    child_annotations
                        .entry(chain.child)
                        .or_default()
                        .extend(entries);
                }
                TruncationPolicy::Representative => {
                    let head = &nodes[chain.members[0]];
                    let mut node = GraphNode::new(
                        format!("chain:{}", head.source_path),
                        NodeKind::TruncatedChain(ChainData { entries }),
                        head.source_path.clone(),
                    );
                    node.position = head.position;
                    node.has_children = true;
                    new_edges.push(Edge::new(parent_id, node.id.clone(), chain.entry_kind));
                    new_edges.push(Edge::new(node.id.clone(), child_id, chain.exit_kind));
                    replacement_nodes.insert(chain.members[0], node);
                }
                TruncationPolicy::Off => new_edges.push(edge.clone()),
            }
            continue;
        }
        if removed_ids.contains(edge.source.as_str()) || removed_ids.contains(edge.target.as_str())
        {
            continue;
        }
        new_edges.push(edge.clone());
    }

    let mut new_nodes = Vec::with_capacity(nodes.len());
    for (idx, mut node) in nodes.into_iter().enumerate() {
        if let Some(replacement) = replacement_nodes.remove(&idx) {
            new_nodes.push(replacement);
            continue;
        }
        if removed.contains(&idx) {
            continue;
        }
        if let Some(entries) = child_annotations.remove(&idx) {
            node.elided.extend(entries);
        }
        new_nodes.push(node);
    }

    SchemaGraph {
        document_kind,
        nodes: new_nodes,
        edges: new_edges,
    }
}
