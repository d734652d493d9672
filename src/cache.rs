//! Memoizes complete pipeline results by a structural hash of their inputs.

use std::collections::VecDeque;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::config::Config;
use crate::ir::SchemaGraph;
use crate::visibility::VisibilityState;

const DEFAULT_CAPACITY: usize = 16;

/// Structural hash of `(document, visibility, config)`. Object keys keep
/// document order, so reordering keys in the source changes the hash.
pub fn structural_hash(document: &Value, visibility: &VisibilityState, config: &Config) -> u64 {
    let mut hasher = DefaultHasher::new();
    document.to_string().hash(&mut hasher);
    visibility.hash(&mut hasher);
    // JSON writes every non-finite float as null; Debug keeps them apart.
    format!("{config:?}").hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone)]
pub struct GraphCache {
    capacity: usize,
    /// Most recently used last.
    entries: VecDeque<(u64, SchemaGraph)>,
    hits: u64,
    misses: u64,
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl GraphCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the cached graph for these inputs, running `build` on a miss.
    pub fn get_or_insert_with(
        &mut self,
        document: &Value,
        visibility: &VisibilityState,
        config: &Config,
        build: impl FnOnce() -> SchemaGraph,
    ) -> SchemaGraph {
        let key = structural_hash(document, visibility, config);
        if let Some(pos) = self.entries.iter().position(|(hash, _)| *hash == key)
            && let Some(entry) = self.entries.remove(pos)
        {
            self.hits += 1;
            let graph = entry.1.clone();
            self.entries.push_back(entry);
            return graph;
        }
        self.misses += 1;
        let graph = build();
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, graph.clone()));
        graph
    }

    /// Full pipeline through the cache.
    pub fn build_graph(
        &mut self,
        document: &Value,
        visibility: &VisibilityState,
        config: &Config,
    ) -> SchemaGraph {
        self.get_or_insert_with(document, visibility, config, || {
            crate::build_graph(document, visibility, config)
        })
    }
}
