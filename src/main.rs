mod viewer;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use aop_layout::engine::{analyze, find_nodes};
use aop_layout::{
    GroupingMode, HighlightSet, Layout, LayoutConfig, LayoutError, RawGraph, load_graph_file,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hypernode layout and pathway highlighting for AOP graphs")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG still applies.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    overrides: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// JSON file with layout settings; keys it omits keep their defaults
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    max_group_size: Option<usize>,

    #[arg(long, global = true, value_enum)]
    grouping: Option<GroupingArg>,

    /// Give every chemical its own standalone container
    #[arg(long, global = true)]
    no_chemicals: bool,

    /// Keep nodes without incident edges
    #[arg(long, global = true)]
    keep_isolated: bool,

    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GroupingArg {
    ByType,
    ByConnectedComponent,
}

impl From<GroupingArg> for GroupingMode {
    fn from(value: GroupingArg) -> Self {
        match value {
            GroupingArg::ByType => Self::ByType,
            GroupingArg::ByConnectedComponent => Self::ByConnectedComponent,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the layout and write it as JSON
    Layout {
        graph: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the pathway highlight for one node
    Highlight {
        graph: PathBuf,
        #[arg(long, conflicts_with = "query", required_unless_present = "query")]
        node: Option<String>,
        /// Select the best fuzzy match for this text
        #[arg(long)]
        query: Option<String>,
    },
    /// Print whole-network statistics
    Analyze { graph: PathBuf },
    /// Fuzzy search node ids and labels
    Search {
        graph: PathBuf,
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Open the interactive viewer
    View { graph: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli.overrides)?;
    config.validate()?;

    match cli.command {
        Command::Layout { graph, output } => {
            let layout = compute_layout(&graph, &config)?;
            match output {
                Some(path) => {
                    let json = serde_json::to_string_pretty(&layout.result)
                        .context("failed to serialize layout")?;
                    fs::write(&path, json)
                        .with_context(|| format!("failed to write layout to {}", path.display()))?;
                    info!(path = %path.display(), "layout written");
                }
                None => print_json(&layout.result)?,
            }
        }
        Command::Highlight { graph, node, query } => {
            let raw = load_graph_file(&graph)?;
            let highlight = highlight_graph(&raw, &config, node.as_deref(), query.as_deref())
                .with_context(|| format!("failed to highlight {}", graph.display()))?;
            print_json(&highlight)?;
        }
        Command::Analyze { graph } => {
            let layout = compute_layout(&graph, &config)?;
            print_json(&analyze(&layout.model, &layout.centrality))?;
        }
        Command::Search {
            graph,
            query,
            limit,
        } => {
            let layout = compute_layout(&graph, &config)?;
            print_json(&find_nodes(&layout.model, &query, limit))?;
        }
        Command::View { graph } => run_viewer(graph, config)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(overrides: &ConfigArgs) -> Result<LayoutConfig> {
    let mut config = match &overrides.config {
        Some(path) => read_config(path)?,
        None => LayoutConfig::default(),
    };

    if let Some(max_group_size) = overrides.max_group_size {
        config.max_group_size = max_group_size;
    }
    if let Some(grouping) = overrides.grouping {
        config.grouping_mode = grouping.into();
    }
    if overrides.no_chemicals {
        config.include_chemicals = false;
    }
    if overrides.keep_isolated {
        config.drop_isolated = false;
    }
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }

    Ok(config)
}

fn read_config(path: &Path) -> Result<LayoutConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn compute_layout(path: &Path, config: &LayoutConfig) -> Result<Layout> {
    let graph = load_graph_file(path)?;
    Layout::compute_seeded(&graph.nodes, &graph.edges, config)
        .with_context(|| format!("failed to lay out {}", path.display()))
}

/// Selects a node by id or fuzzy query and highlights its pathways. The
/// layout keeps isolated nodes so that any valid id can be selected.
fn highlight_graph(
    graph: &RawGraph,
    config: &LayoutConfig,
    node: Option<&str>,
    query: Option<&str>,
) -> Result<HighlightSet> {
    let config = LayoutConfig {
        drop_isolated: false,
        ..config.clone()
    };
    let layout = Layout::compute_seeded(&graph.nodes, &graph.edges, &config)?;

    let selected = match (node, query) {
        (Some(id), _) => {
            if layout.model.index_of(id).is_none() {
                return Err(LayoutError::UnknownNode(id.to_string()).into());
            }
            id.to_string()
        }
        (None, Some(text)) => find_nodes(&layout.model, text, 1)
            .into_iter()
            .next()
            .map(|hit| hit.id)
            .ok_or_else(|| anyhow!("no node matches `{text}`"))?,
        (None, None) => return Err(anyhow!("either --node or --query is required")),
    };
    Ok(layout.highlight(&selected))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn run_viewer(path: PathBuf, config: LayoutConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "aop-layout",
        options,
        Box::new(move |cc| Ok(Box::new(viewer::AopViewerApp::new(cc, path, config)))),
    )
    .map_err(|error| anyhow!("viewer failed: {error}"))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use aop_layout::{RawEdge, RawNode};

    use super::*;

    fn graph_with_unlinked_event() -> RawGraph {
        RawGraph {
            nodes: vec![
                RawNode::new("m", "MIE"),
                RawNode::new("k", "KE"),
                RawNode::new("a", "AO"),
                RawNode::new("w", "KE"),
            ],
            edges: vec![RawEdge::new("m", "k"), RawEdge::new("k", "a")],
        }
    }

    #[test]
    fn highlight_selects_nodes_the_default_filter_drops() {
        let graph = graph_with_unlinked_event();
        let config = LayoutConfig::default();
        assert!(config.drop_isolated);

        let layout = Layout::compute_seeded(&graph.nodes, &graph.edges, &config).unwrap();
        assert!(layout.model.index_of("w").is_none());

        let highlight = highlight_graph(&graph, &config, Some("w"), None).unwrap();
        assert_eq!(highlight.selected.as_deref(), Some("w"));
        assert_eq!(highlight.nodes, BTreeSet::from(["w".to_string()]));
        assert_eq!(highlight.faded_nodes.len(), 3);
    }

    #[test]
    fn highlight_rejects_unknown_ids() {
        let graph = graph_with_unlinked_event();
        let error = highlight_graph(&graph, &LayoutConfig::default(), Some("nope"), None)
            .unwrap_err();
        assert_eq!(
            error.downcast_ref::<LayoutError>(),
            Some(&LayoutError::UnknownNode("nope".into()))
        );
    }
}
