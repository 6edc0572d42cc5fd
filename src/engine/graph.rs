use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::aop::{Edge, Node, NodeKind, RawEdge, RawNode};

use super::error::LayoutError;

/// Counts of records that did not make it into the model.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub nodes_without_id: usize,
    pub duplicate_nodes: usize,
    pub isolated_nodes_dropped: usize,
    pub dangling_edges: usize,
    pub duplicate_edges: usize,
}

/// Validated node/edge collection with index-based adjacency.
///
/// Node indices follow input order, so every derived structure (groups, BFS
/// orders, component numbering) is deterministic for a given input.
#[derive(Clone, Debug)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    index_by_id: HashMap<String, usize>,
    edge_endpoints: Vec<(usize, usize)>,
    adjacency: Vec<BTreeSet<usize>>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    report: BuildReport,
}

impl GraphModel {
    pub fn build(
        raw_nodes: &[RawNode],
        raw_edges: &[RawEdge],
        drop_isolated: bool,
    ) -> Result<Self, LayoutError> {
        let mut report = BuildReport::default();

        let mut candidates = Vec::with_capacity(raw_nodes.len());
        let mut seen_ids = HashSet::with_capacity(raw_nodes.len());
        for raw in raw_nodes {
            let Some(id) = raw.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
                report.nodes_without_id += 1;
                debug!("dropping node record without id");
                continue;
            };

            if !seen_ids.insert(id.to_string()) {
                report.duplicate_nodes += 1;
                debug!(node = id, "dropping duplicate node record");
                continue;
            }

            let type_name = raw.kind.clone().unwrap_or_default();
            candidates.push(Node {
                id: id.to_string(),
                kind: NodeKind::normalize(&type_name),
                type_name,
                label: raw
                    .label
                    .clone()
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(|| id.to_string()),
                metadata: raw.metadata.clone(),
            });
        }

        let mut incident = vec![0usize; candidates.len()];
        let candidate_index = candidates
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut seen_edges = HashSet::new();
        let mut kept_edges = Vec::new();
        for raw in raw_edges {
            let source = raw.source.as_deref().map(str::trim).unwrap_or_default();
            let target = raw.target.as_deref().map(str::trim).unwrap_or_default();
            let (Some(&source_index), Some(&target_index)) =
                (candidate_index.get(source), candidate_index.get(target))
            else {
                report.dangling_edges += 1;
                debug!(source, target, "dropping edge with unknown endpoint");
                continue;
            };

            let relationship = raw.relationship.clone().unwrap_or_default();
            if !seen_edges.insert((source_index, target_index, relationship.clone())) {
                report.duplicate_edges += 1;
                continue;
            }

            incident[source_index] += 1;
            if target_index != source_index {
                incident[target_index] += 1;
            }
            kept_edges.push((raw, source.to_string(), target.to_string(), relationship));
        }

        let mut nodes = Vec::with_capacity(candidates.len());
        for (node, incident_count) in candidates.into_iter().zip(incident) {
            if drop_isolated && incident_count == 0 && !node.kind.is_protected() {
                report.isolated_nodes_dropped += 1;
                debug!(node = node.id.as_str(), "dropping isolated node");
                continue;
            }
            nodes.push(node);
        }

        if nodes.is_empty() {
            return Err(LayoutError::EmptyGraph);
        }

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut edge_ids = HashSet::with_capacity(kept_edges.len());
        let mut edges = Vec::with_capacity(kept_edges.len());
        let mut edge_endpoints = Vec::with_capacity(kept_edges.len());
        let mut adjacency = vec![BTreeSet::new(); nodes.len()];
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];

        for (raw, source, target, relationship) in kept_edges {
            let (Some(&from), Some(&to)) = (index_by_id.get(&source), index_by_id.get(&target))
            else {
                continue;
            };

            let base_id = raw
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("{source}->{target}"));
            let mut id = base_id.clone();
            let mut suffix = 2usize;
            while !edge_ids.insert(id.clone()) {
                id = format!("{base_id}#{suffix}");
                suffix += 1;
            }

            if from != to {
                adjacency[from].insert(to);
                adjacency[to].insert(from);
                if !outgoing[from].contains(&to) {
                    outgoing[from].push(to);
                    incoming[to].push(from);
                }
            }

            edge_endpoints.push((from, to));
            edges.push(Edge {
                id,
                source,
                target,
                relationship,
                metadata: raw.metadata.clone(),
            });
        }

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            dangling_edges = report.dangling_edges,
            isolated_dropped = report.isolated_nodes_dropped,
            "built graph model"
        );

        Ok(Self {
            nodes,
            edges,
            index_by_id,
            edge_endpoints,
            adjacency,
            outgoing,
            incoming,
            report,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    /// `(source, target)` node indices, parallel to [`GraphModel::edges`].
    pub fn edge_endpoints(&self) -> &[(usize, usize)] {
        &self.edge_endpoints
    }

    /// Undirected neighbor sets, self-loops excluded.
    pub fn adjacency(&self) -> &[BTreeSet<usize>] {
        &self.adjacency
    }

    pub fn outgoing(&self, index: usize) -> &[usize] {
        &self.outgoing[index]
    }

    pub fn incoming(&self, index: usize) -> &[usize] {
        &self.incoming[index]
    }

    /// The undirected adjacency keyed by node id.
    pub fn adjacency_map(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.nodes
            .iter()
            .zip(&self.adjacency)
            .map(|(node, neighbors)| {
                let ids = neighbors
                    .iter()
                    .map(|&neighbor| self.nodes[neighbor].id.clone())
                    .collect();
                (node.id.clone(), ids)
            })
            .collect()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(model: &GraphModel) -> Vec<&str> {
        model.nodes().iter().map(|node| node.id.as_str()).collect()
    }

    #[test]
    fn drops_dangling_edges_and_isolated_nodes() {
        let nodes = vec![
            RawNode::new("a", "MIE"),
            RawNode::new("b", "KeyEvent"),
            RawNode::new("c", "KeyEvent"),
            RawNode::new("w", "WeightOfEvidence"),
            RawNode::new("s", "Stressor"),
        ];
        let edges = vec![RawEdge::new("a", "b"), RawEdge::new("b", "ghost")];

        let model = GraphModel::build(&nodes, &edges, true).unwrap();

        assert_eq!(ids(&model), vec!["a", "b", "w", "s"]);
        assert_eq!(model.edge_count(), 1);
        assert_eq!(model.report().dangling_edges, 1);
        assert_eq!(model.report().isolated_nodes_dropped, 1);
    }

    #[test]
    fn keeps_isolated_nodes_on_request() {
        let nodes = vec![RawNode::new("a", "MIE"), RawNode::new("c", "KeyEvent")];
        let model = GraphModel::build(&nodes, &[], false).unwrap();
        assert_eq!(ids(&model), vec!["a", "c"]);
    }

    #[test]
    fn empty_input_is_an_empty_graph() {
        assert_eq!(
            GraphModel::build(&[], &[], true).unwrap_err(),
            LayoutError::EmptyGraph
        );

        let lonely = vec![RawNode::new("c", "KeyEvent"), RawNode::default()];
        assert_eq!(
            GraphModel::build(&lonely, &[], true).unwrap_err(),
            LayoutError::EmptyGraph
        );
    }

    #[test]
    fn first_duplicate_node_wins() {
        let nodes = vec![
            RawNode::new("a", "MIE").with_label("first"),
            RawNode::new("a", "AO").with_label("second"),
        ];
        let model = GraphModel::build(&nodes, &[], false).unwrap();

        assert_eq!(model.node_count(), 1);
        assert_eq!(model.node("a").map(|node| node.label.as_str()), Some("first"));
        assert_eq!(model.report().duplicate_nodes, 1);
    }

    #[test]
    fn collapses_duplicate_edges_and_uniquifies_ids() {
        let nodes = vec![RawNode::new("a", "MIE"), RawNode::new("b", "KE")];
        let edges = vec![
            RawEdge::new("a", "b").with_relationship("r1"),
            RawEdge::new("a", "b").with_relationship("r1"),
            RawEdge::new("a", "b").with_relationship("r2"),
        ];

        let model = GraphModel::build(&nodes, &edges, true).unwrap();
        let edge_ids = model
            .edges()
            .iter()
            .map(|edge| edge.id.as_str())
            .collect::<Vec<_>>();

        assert_eq!(edge_ids, vec!["a->b", "a->b#2"]);
        assert_eq!(model.report().duplicate_edges, 1);
        assert_eq!(model.outgoing(0), &[1]);
        assert_eq!(model.incoming(1), &[0]);
    }

    #[test]
    fn adjacency_is_undirected_without_self_loops() {
        let nodes = vec![
            RawNode::new("a", "MIE"),
            RawNode::new("b", "KE"),
            RawNode::new("c", "AO"),
        ];
        let edges = vec![
            RawEdge::new("a", "b"),
            RawEdge::new("c", "b"),
            RawEdge::new("c", "c"),
        ];

        let model = GraphModel::build(&nodes, &edges, true).unwrap();
        let adjacency = model.adjacency_map();

        assert_eq!(adjacency["a"], BTreeSet::from(["b".to_string()]));
        assert_eq!(
            adjacency["b"],
            BTreeSet::from(["a".to_string(), "c".to_string()])
        );
        assert_eq!(adjacency["c"], BTreeSet::from(["b".to_string()]));
        assert_eq!(model.edge_count(), 3);
    }

    #[test]
    fn node_labels_fall_back_to_ids() {
        let nodes = vec![RawNode::new("Event:57", "KeyEvent")];
        let model = GraphModel::build(&nodes, &[], false).unwrap();
        assert_eq!(model.nodes()[0].label, "Event:57");
        assert_eq!(model.nodes()[0].kind, NodeKind::Ke);
    }
}
