use std::collections::BTreeMap;

use serde::Serialize;

use super::centrality::CentralityTable;
use super::graph::GraphModel;

/// Whole-network statistics over the undirected view of the graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub connected_components: usize,
    pub average_clustering: f64,
    pub transitivity: f64,
    pub average_degree: f64,
    pub min_degree: usize,
    pub max_degree: usize,
    pub degree_std: f64,
    /// Mean betweenness, normalized by the number of pairs excluding the node.
    pub average_betweenness: f64,
    pub type_distribution: BTreeMap<String, usize>,
}

pub fn analyze(model: &GraphModel, centrality: &CentralityTable) -> NetworkSummary {
    let adjacency = model.adjacency();
    let node_count = model.node_count();
    if node_count == 0 {
        return NetworkSummary::default();
    }

    let degrees = adjacency.iter().map(|neighbors| neighbors.len()).collect::<Vec<_>>();
    let undirected_links = degrees.iter().sum::<usize>() / 2;
    let n = node_count as f64;

    let density = if node_count > 1 {
        2.0 * undirected_links as f64 / (n * (n - 1.0))
    } else {
        0.0
    };

    let average_degree = degrees.iter().sum::<usize>() as f64 / n;
    let degree_std = (degrees
        .iter()
        .map(|&degree| (degree as f64 - average_degree).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    let mut clustering_total = 0.0;
    let mut closed = 0usize;
    let mut triples = 0usize;
    for (node, neighbors) in adjacency.iter().enumerate() {
        let degree = neighbors.len();
        if degree < 2 {
            continue;
        }

        let links = neighbors
            .iter()
            .map(|&neighbor| {
                adjacency[neighbor]
                    .iter()
                    .filter(|&&other| other > neighbor && other != node && neighbors.contains(&other))
                    .count()
            })
            .sum::<usize>();
        let possible = degree * (degree - 1) / 2;
        clustering_total += links as f64 / possible as f64;
        closed += links;
        triples += possible;
    }

    let pair_count = if node_count > 2 {
        (n - 1.0) * (n - 2.0) / 2.0
    } else {
        1.0
    };
    let average_betweenness = centrality
        .records()
        .iter()
        .map(|record| record.betweenness / pair_count)
        .sum::<f64>()
        / n;

    let mut type_distribution = BTreeMap::new();
    for node in model.nodes() {
        *type_distribution.entry(node.group_key().to_string()).or_insert(0) += 1;
    }

    NetworkSummary {
        nodes: node_count,
        edges: model.edge_count(),
        density,
        connected_components: count_components(model),
        average_clustering: clustering_total / n,
        transitivity: if triples == 0 {
            0.0
        } else {
            closed as f64 / triples as f64
        },
        average_degree,
        min_degree: degrees.iter().copied().min().unwrap_or(0),
        max_degree: degrees.iter().copied().max().unwrap_or(0),
        degree_std,
        average_betweenness,
        type_distribution,
    }
}

fn count_components(model: &GraphModel) -> usize {
    let adjacency = model.adjacency();
    let mut visited = vec![false; adjacency.len()];
    let mut components = 0;

    for start in 0..adjacency.len() {
        if visited[start] {
            continue;
        }
        components += 1;
        visited[start] = true;
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            for &next in &adjacency[current] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
    }

    components
}
