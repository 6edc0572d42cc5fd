use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::parse::{RawGraph, parse_graph_document};

pub fn load_graph_file(path: &Path) -> Result<RawGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph document {}", path.display()))?;

    let graph = parse_graph_document(&raw)
        .with_context(|| format!("failed to parse graph document {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "loaded graph document"
    );
    Ok(graph)
}
