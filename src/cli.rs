use crate::build_graph;
use crate::config::{Config, TruncationPolicy, load_config};
use crate::document::{DocumentFormat, load_document, parse_document};
use crate::graph_dump::write_graph_dump;
use crate::visibility::VisibilityState;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sgraph",
    version,
    about = "Compile JSON Schema / OpenAPI documents into positioned node graphs"
)]
pub struct Args {
    /// Input document (.json, .json5, .yaml/.yml) or '-' for stdin (JSON)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Visibility JSON: path -> "expanded" | "collapsed" | bool (true = collapsed)
    #[arg(short = 's', long = "visibility")]
    pub visibility: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Graph dump output. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[arg(long = "maxDepth")]
    pub max_depth: Option<usize>,

    #[arg(long = "maxIndividual")]
    pub max_individual: Option<usize>,

    /// Emit every sibling individually
    #[arg(long = "noGrouping")]
    pub no_grouping: bool,

    #[arg(long = "truncate", value_enum)]
    pub truncate: Option<Truncate>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Truncate {
    Off,
    Reconnect,
    Representative,
}

impl From<Truncate> for TruncationPolicy {
    fn from(value: Truncate) -> Self {
        match value {
            Truncate::Off => TruncationPolicy::Off,
            Truncate::Reconnect => TruncationPolicy::Reconnect,
            Truncate::Representative => TruncationPolicy::Representative,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref()).context("failed to load config")?;
    apply_overrides(&mut config, &args);

    let document = read_document(args.input.as_deref())?;
    let visibility = read_visibility(args.visibility.as_deref())?;

    let graph = build_graph(&document, &visibility, &config);
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "graph built"
    );
    write_graph_dump(args.output.as_deref(), &graph, &config.layout.size)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    // An embedding host may have installed its own subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) {
    let compile = &mut config.compile;
    if let Some(max_depth) = args.max_depth {
        compile.max_depth = max_depth.max(1);
    }
    if let Some(max_individual) = args.max_individual {
        compile.max_individual = max_individual.max(1);
    }
    if args.no_grouping {
        compile.grouping = false;
    }
    if let Some(truncate) = args.truncate {
        compile.truncation = truncate.into();
    }
}

fn read_document(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) if path != Path::new("-") => Ok(load_document(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(parse_document(&buf, DocumentFormat::Json)?)
        }
    }
}

fn read_visibility(path: Option<&Path>) -> Result<VisibilityState> {
    let Some(path) = path else {
        return Ok(VisibilityState::new());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_visibility(&contents)
}

fn parse_visibility(contents: &str) -> Result<VisibilityState> {
    serde_json::from_str(contents).context("invalid visibility JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "sgraph",
            "-i",
            "api.yaml",
            "--maxDepth",
            "0",
            "--maxIndividual",
            "4",
            "--noGrouping",
            "--truncate",
            "reconnect",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);

        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.compile.max_depth, 1);
        assert_eq!(config.compile.max_individual, 4);
        assert!(!config.compile.grouping);
        assert_eq!(config.compile.truncation, TruncationPolicy::Reconnect);
    }

    #[test]
    fn absent_flags_keep_config() {
        let args = Args::try_parse_from(["sgraph"]).unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn visibility_accepts_states_and_bools() {
        let state = parse_visibility(
            r#"{"root.properties.a": "expanded", "root.properties.b": true, "root.paths": false}"#,
        )
        .unwrap();
        assert!(state.is_explicitly_expanded("root.properties.a"));
        assert!(state.is_explicitly_collapsed("root.properties.b"));
        assert!(state.is_explicitly_expanded("root.paths"));
        assert!(parse_visibility("[1, 2]").is_err());
    }
}
