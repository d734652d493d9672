//! Path-keyed expand/collapse resolution.
//!
//! The editor owns a [`VisibilityState`] and hands it to the compiler as an
//! immutable map. The compiler never writes to it; toggles produce a new
//! state through [`VisibilityState::toggled`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::{GraphNode, NodeKind};
use crate::path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpandState {
    Expanded,
    Collapsed,
    Unset,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateOrBool {
    State(ExpandState),
    /// `true` means collapsed, mirroring `onToggleCollapse(path, nextCollapsed)`.
    Collapsed(bool),
}

impl StateOrBool {
    fn as_state(&self) -> ExpandState {
        match self {
            StateOrBool::State(state) => *state,
            StateOrBool::Collapsed(true) => ExpandState::Collapsed,
            StateOrBool::Collapsed(false) => ExpandState::Expanded,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "BTreeMap<String, StateOrBool>")]
pub struct VisibilityState {
    entries: BTreeMap<String, ExpandState>,
}

impl From<BTreeMap<String, StateOrBool>> for VisibilityState {
    fn from(raw: BTreeMap<String, StateOrBool>) -> Self {
        let mut state = VisibilityState::new();
        for (path, value) in raw {
            state.set(path, value.as_state());
        }
        state
    }
}

impl Serialize for VisibilityState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl VisibilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, state: ExpandState) {
        let path = path.into();
        if state == ExpandState::Unset {
            self.entries.remove(&path);
        } else {
            self.entries.insert(path, state);
        }
    }

    pub fn expand(mut self, path: impl Into<String>) -> Self {
        self.set(path, ExpandState::Expanded);
        self
    }

    pub fn collapse(mut self, path: impl Into<String>) -> Self {
        self.set(path, ExpandState::Collapsed);
        self
    }

    pub fn state(&self, path: &str) -> ExpandState {
        self.entries
            .get(path)
            .copied()
            .unwrap_or(ExpandState::Unset)
    }

    /// Explicit entry wins; otherwise collapsed, except the synthetic root.
    pub fn is_expanded(&self, path: &str) -> bool {
        match self.state(path) {
            ExpandState::Expanded => true,
            ExpandState::Collapsed => false,
            ExpandState::Unset => path == path::ROOT,
        }
    }

    pub fn is_explicitly_expanded(&self, path: &str) -> bool {
        self.state(path) == ExpandState::Expanded
    }

    pub fn is_explicitly_collapsed(&self, path: &str) -> bool {
        self.state(path) == ExpandState::Collapsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ExpandState)> {
        self.entries.iter().map(|(path, state)| (path.as_str(), *state))
    }

    /// New state after the editor's `onToggleCollapse(path, next_collapsed)`.
    pub fn toggled(&self, path: &str, next_collapsed: bool) -> Self {
        let mut next = self.clone();
        let state = if next_collapsed {
            ExpandState::Collapsed
        } else {
            ExpandState::Expanded
        };
        next.set(path, state);
        next
    }

    /// New state after `onExpandGroupedEntry(group_id, entry_name)`: the entry
    /// is pinned as explicitly expanded so grouping promotes it out of the
    /// overflow node. Returns `None` when `group` is not an overflow node or
    /// holds no entry with that name.
    pub fn with_grouped_entry_expanded(&self, group: &GraphNode, entry_name: &str) -> Option<Self> {
        let NodeKind::GroupedOverflow(data) = &group.kind else {
            return None;
        };
        let entry = data.entries.iter().find(|entry| entry.name == entry_name)?;
        Some(self.toggled(&entry.path, false))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthMode {
    /// Depth counts from the nearest explicitly expanded ancestor.
    #[default]
    Relative,
    /// Depth counts from the root.
    Absolute,
}

/// Outcome of consulting the visibility model for one materialized node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    /// Children of the node are generated in this pass.
    pub open: bool,
    /// The depth budget stopped traversal at this node.
    pub more_levels: bool,
    /// Depth counter handed to the node's children.
    pub child_depth: usize,
}

impl Gate {
    pub const CLOSED: Gate = Gate {
        open: false,
        more_levels: false,
        child_depth: 0,
    };
}

/// Visibility state plus the depth budget, consulted once per node.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityModel<'a> {
    state: &'a VisibilityState,
    max_depth: usize,
    mode: DepthMode,
    cascade: bool,
}

impl<'a> VisibilityModel<'a> {
    pub fn new(state: &'a VisibilityState, max_depth: usize, mode: DepthMode, cascade: bool) -> Self {
        Self {
            state,
            max_depth: max_depth.max(1),
            mode,
            cascade,
        }
    }

    pub fn state(&self) -> &'a VisibilityState {
        self.state
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.state.is_expanded(path)
    }

    pub fn is_explicitly_expanded(&self, path: &str) -> bool {
        self.state.is_explicitly_expanded(path)
    }

    /// Decides whether the node at `path` opens, given the depth counter it
    /// was reached with. Only nodes under an open parent are ever asked, which
    /// is what makes a collapsed container veto its whole subtree.
    pub fn gate(&self, path: &str, depth: usize, has_children: bool) -> Gate {
        if !has_children {
            return Gate::CLOSED;
        }
        let explicit = self.state.state(path);
        if explicit == ExpandState::Collapsed {
            return Gate::CLOSED;
        }
        let anchored = explicit == ExpandState::Expanded || path == path::ROOT;
        if anchored && self.mode == DepthMode::Relative {
            return Gate {
                open: true,
                more_levels: false,
                child_depth: 1,
            };
        }
        if !anchored && !self.cascade {
            return Gate::CLOSED;
        }
        if depth >= self.max_depth {
            return Gate {
                open: false,
                more_levels: true,
                child_depth: depth,
            };
        }
        Gate {
            open: true,
            more_levels: false,
            child_depth: depth + 1,
        }
    }
}
