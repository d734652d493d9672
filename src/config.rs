use crate::visibility::DepthMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Leave pass-through chains in place.
    Off,
    /// Drop the chain and connect parent to child directly; the child lists
    /// the elided labels.
    Reconnect,
    /// Replace the chain with one synthetic node carrying the elided entries.
    #[default]
    Representative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileOptions {
    pub grouping: bool,
    pub max_individual: usize,
    pub max_depth: usize,
    pub depth_mode: DepthMode,
    pub cascade: bool,
    pub truncation: TruncationPolicy,
    pub min_chain_length: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            grouping: true,
            max_individual: 10,
            max_depth: 3,
            depth_mode: DepthMode::Relative,
            cascade: false,
            truncation: TruncationPolicy::Representative,
            min_chain_length: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Tree,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeLayoutConfig {
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    pub root_gap: f32,
}

impl Default for TreeLayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_gap: 40.0,
            vertical_gap: 80.0,
            root_gap: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionConfig {
    pub enabled: bool,
    pub iterations: usize,
    pub min_distance: f32,
    pub damping: f32,
    /// Fraction of any upward push that is blocked and handed to the partner
    /// as downward movement instead.
    pub upward_resistance: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            iterations: 60,
            min_distance: 16.0,
            damping: 0.8,
            upward_resistance: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeConfig {
    pub font_size: f32,
    pub font_family: String,
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub header_height: f32,
    pub row_height: f32,
    pub max_rows: usize,
    pub min_width: f32,
    pub max_width: f32,
    pub fast_text_metrics: bool,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            font_size: 13.0,
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            line_height: 1.5,
            padding_x: 12.0,
            padding_y: 8.0,
            header_height: 28.0,
            row_height: 20.0,
            max_rows: 12,
            min_width: 120.0,
            max_width: 320.0,
            fast_text_metrics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Zero picks a roughly square grid.
    pub columns: usize,
    pub gap_x: f32,
    pub gap_y: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 0,
            gap_x: 40.0,
            gap_y: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub mode: LayoutMode,
    pub tree: TreeLayoutConfig,
    pub collision: CollisionConfig,
    pub size: SizeConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    pub duration_ms: f32,
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 300.0,
            easing: Easing::EaseOutCubic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    pub compile: CompileOptions,
    pub layout: LayoutConfig,
    pub animation: AnimationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().trim_end_matches("px").parse::<f32>().ok(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CompileConfigFile {
    grouping: Option<bool>,
    max_individual: Option<usize>,
    max_depth: Option<usize>,
    depth_mode: Option<DepthMode>,
    cascade: Option<bool>,
    truncation: Option<TruncationPolicy>,
    min_chain_length: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TreeConfigFile {
    horizontal_gap: Option<f32>,
    vertical_gap: Option<f32>,
    root_gap: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CollisionConfigFile {
    enabled: Option<bool>,
    iterations: Option<usize>,
    min_distance: Option<f32>,
    damping: Option<f32>,
    upward_resistance: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SizeConfigFile {
    font_size: Option<NumberOrString>,
    font_family: Option<String>,
    line_height: Option<f32>,
    padding_x: Option<f32>,
    padding_y: Option<f32>,
    header_height: Option<f32>,
    row_height: Option<f32>,
    max_rows: Option<usize>,
    min_width: Option<f32>,
    max_width: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GridConfigFile {
    columns: Option<usize>,
    gap_x: Option<f32>,
    gap_y: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnimationConfigFile {
    duration_ms: Option<f32>,
    easing: Option<Easing>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    compile: Option<CompileConfigFile>,
    layout_mode: Option<LayoutMode>,
    tree: Option<TreeConfigFile>,
    collision: Option<CollisionConfigFile>,
    size: Option<SizeConfigFile>,
    grid: Option<GridConfigFile>,
    animation: Option<AnimationConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Overlays a camelCase JSON config onto the defaults; absent keys keep them.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(compile) = parsed.compile {
        let target = &mut config.compile;
        if let Some(v) = compile.grouping {
            target.grouping = v;
        }
        if let Some(v) = compile.max_individual {
            target.max_individual = v.max(1);
        }
        if let Some(v) = compile.max_depth {
            target.max_depth = v.max(1);
        }
        if let Some(v) = compile.depth_mode {
            target.depth_mode = v;
        }
        if let Some(v) = compile.cascade {
            target.cascade = v;
        }
        if let Some(v) = compile.truncation {
            target.truncation = v;
        }
        if let Some(v) = compile.min_chain_length {
            target.min_chain_length = v.max(1);
        }
    }

    if let Some(mode) = parsed.layout_mode {
        config.layout.mode = mode;
    }

    if let Some(tree) = parsed.tree {
        let target = &mut config.layout.tree;
        if let Some(v) = tree.horizontal_gap {
            target.horizontal_gap = v;
        }
        if let Some(v) = tree.vertical_gap {
            target.vertical_gap = v;
        }
        if let Some(v) = tree.root_gap {
            target.root_gap = v;
        }
    }

    if let Some(collision) = parsed.collision {
        let target = &mut config.layout.collision;
        if let Some(v) = collision.enabled {
            target.enabled = v;
        }
        if let Some(v) = collision.iterations {
            target.iterations = v;
        }
        if let Some(v) = collision.min_distance {
            target.min_distance = v.max(0.0);
        }
        if let Some(v) = collision.damping {
            target.damping = v.clamp(0.05, 1.0);
        }
        if let Some(v) = collision.upward_resistance {
            target.upward_resistance = v.clamp(0.0, 1.0);
        }
    }

    if let Some(size) = parsed.size {
        let target = &mut config.layout.size;
        if let Some(v) = size.font_size.as_ref().and_then(NumberOrString::as_f32) {
            target.font_size = v;
        }
        if let Some(v) = size.font_family {
            target.font_family = v;
        }
        if let Some(v) = size.line_height {
            target.line_height = v;
        }
        if let Some(v) = size.padding_x {
            target.padding_x = v;
        }
        if let Some(v) = size.padding_y {
            target.padding_y = v;
        }
        if let Some(v) = size.header_height {
            target.header_height = v;
        }
        if let Some(v) = size.row_height {
            target.row_height = v;
        }
        if let Some(v) = size.max_rows {
            target.max_rows = v;
        }
        if let Some(v) = size.min_width {
            target.min_width = v;
        }
        if let Some(v) = size.max_width {
            target.max_width = v;
        }
        if let Some(v) = size.fast_text_metrics {
            target.fast_text_metrics = v;
        }
    }

    if let Some(grid) = parsed.grid {
        let target = &mut config.layout.grid;
        if let Some(v) = grid.columns {
            target.columns = v;
        }
        if let Some(v) = grid.gap_x {
            target.gap_x = v;
        }
        if let Some(v) = grid.gap_y {
            target.gap_y = v;
        }
    }

    if let Some(animation) = parsed.animation {
        if let Some(v) = animation.duration_ms {
            config.animation.duration_ms = v.max(0.0);
        }
        if let Some(v) = animation.easing {
            config.animation.easing = v;
        }
    }

    Ok(config)
}
