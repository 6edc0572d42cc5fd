use std::collections::{BTreeSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::aop::{NodeKind, RawEdge, RawNode};

use super::graph::GraphModel;
use super::grouping::Grouping;

/// Nodes, edges and containers on a complete pathway through the selection.
/// Everything else lands in the `faded_*` sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HighlightSet {
    pub selected: Option<String>,
    pub nodes: BTreeSet<String>,
    pub edges: BTreeSet<String>,
    pub hypernodes: BTreeSet<String>,
    pub hyperedges: BTreeSet<String>,
    pub faded_nodes: BTreeSet<String>,
    pub faded_edges: BTreeSet<String>,
    pub faded_hypernodes: BTreeSet<String>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_node_faded(&self, id: &str) -> bool {
        self.faded_nodes.contains(id)
    }

    pub fn is_edge_faded(&self, id: &str) -> bool {
        self.faded_edges.contains(id)
    }

    pub fn is_hypernode_faded(&self, id: &str) -> bool {
        self.faded_hypernodes.contains(id)
    }
}

/// Builds a model that keeps isolated nodes and highlights `selected` in it.
/// Inputs without a single valid node give an empty set.
pub fn highlight_from(nodes: &[RawNode], edges: &[RawEdge], selected: &str) -> HighlightSet {
    match GraphModel::build(nodes, edges, false) {
        Ok(model) => highlight_in(&model, selected, None),
        Err(error) => {
            debug!(%error, "nothing to highlight");
            HighlightSet::default()
        }
    }
}

pub fn highlight_in(model: &GraphModel, selected: &str, grouping: Option<&Grouping>) -> HighlightSet {
    let Some(start) = model.index_of(selected) else {
        debug!(node = selected, "selection is not in the graph");
        return HighlightSet::default();
    };

    let on_path = pathway_nodes(model, start);

    let mut highlight = HighlightSet {
        selected: Some(model.nodes()[start].id.clone()),
        ..HighlightSet::default()
    };

    for (index, node) in model.nodes().iter().enumerate() {
        if on_path[index] {
            highlight.nodes.insert(node.id.clone());
        } else {
            highlight.faded_nodes.insert(node.id.clone());
        }
    }

    let mut edge_on_path = vec![false; model.edge_count()];
    for (edge_index, (edge, &(from, to))) in model
        .edges()
        .iter()
        .zip(model.edge_endpoints())
        .enumerate()
    {
        if on_path[from] && on_path[to] {
            edge_on_path[edge_index] = true;
            highlight.edges.insert(edge.id.clone());
        } else {
            highlight.faded_edges.insert(edge.id.clone());
        }
    }

    if let Some(grouping) = grouping {
        let mut hypernode_on_path = vec![false; grouping.hypernodes.len()];
        for (index, _) in on_path.iter().enumerate().filter(|(_, lit)| **lit) {
            if let Some(&hypernode) = grouping.membership.get(index) {
                hypernode_on_path[hypernode] = true;
            }
        }

        for (hypernode, lit) in grouping.hypernodes.iter().zip(&hypernode_on_path) {
            if *lit {
                highlight.hypernodes.insert(hypernode.id.clone());
            } else {
                highlight.faded_hypernodes.insert(hypernode.id.clone());
            }
        }

        for hyperedge in &grouping.hyperedges {
            let lit = if hyperedge.edge_indices.is_empty() {
                // Edgeless stressor links follow their endpoints.
                [hyperedge.source_index, hyperedge.target_index]
                    .iter()
                    .all(|&index| hypernode_on_path.get(index).copied().unwrap_or(false))
            } else {
                hyperedge
                    .edge_indices
                    .iter()
                    .any(|&edge| edge_on_path.get(edge).copied().unwrap_or(false))
            };
            if lit {
                highlight.hyperedges.insert(hyperedge.id.clone());
            }
        }
    }

    highlight
}

/// Membership mask of the nodes lying on a complete causal chain through
/// `start`.
fn pathway_nodes(model: &GraphModel, start: usize) -> Vec<bool> {
    let node_count = model.node_count();
    let forward = |index: usize| model.outgoing(index);
    let backward = |index: usize| model.incoming(index);

    let mut on_path = match model.nodes()[start].kind {
        NodeKind::Mie => {
            let reached = reachable(node_count, &[start], forward, None);
            let outcomes = (0..node_count)
                .filter(|&index| reached[index] && model.nodes()[index].kind == NodeKind::Ao)
                .collect::<Vec<_>>();

            if outcomes.is_empty() {
                reached
            } else {
                reachable(node_count, &outcomes, backward, Some(reached.as_slice()))
            }
        }
        NodeKind::Ao => reachable(node_count, &[start], backward, None),
        NodeKind::Ke | NodeKind::Chemical | NodeKind::WeightOfEvidence | NodeKind::Other => {
            let descendants = reachable(node_count, &[start], forward, None);
            let ancestors = reachable(node_count, &[start], backward, None);
            descendants
                .into_iter()
                .zip(ancestors)
                .map(|(down, up)| down || up)
                .collect()
        }
    };

    on_path[start] = true;
    on_path
}

/// Breadth-first reachability from `sources`, optionally confined to the
/// nodes set in `within`.
fn reachable<'a>(
    node_count: usize,
    sources: &[usize],
    neighbors: impl Fn(usize) -> &'a [usize],
    within: Option<&[bool]>,
) -> Vec<bool> {
    let allowed = |index: usize| within.is_none_or(|mask| mask.get(index).copied().unwrap_or(false));

    let mut visited = vec![false; node_count];
    let mut queue = VecDeque::new();
    for &source in sources {
        if source < node_count && allowed(source) && !visited[source] {
            visited[source] = true;
            queue.push_back(source);
        }
    }

    while let Some(current) = queue.pop_front() {
        for &next in neighbors(current) {
            if next < node_count && !visited[next] && allowed(next) {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    visited
}
