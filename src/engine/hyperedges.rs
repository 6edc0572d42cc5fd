use std::collections::HashMap;

use serde::Serialize;

use crate::aop::NodeKind;

use super::graph::GraphModel;
use super::grouping::Hypernode;

/// Bundle of graph edges running from one hypernode to another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Hyperedge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Number of member edges.
    pub weight: usize,
    pub edges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip)]
    pub source_index: usize,
    #[serde(skip)]
    pub target_index: usize,
    #[serde(skip)]
    pub edge_indices: Vec<usize>,
}

/// Aggregates every edge whose endpoints sit in different hypernodes, keyed by
/// the directed hypernode pair, in first-seen edge order.
pub fn aggregate_hyperedges(
    model: &GraphModel,
    hypernodes: &[Hypernode],
    membership: &[usize],
) -> Vec<Hyperedge> {
    let mut by_pair: HashMap<(usize, usize), usize> = HashMap::new();
    let mut hyperedges: Vec<Hyperedge> = Vec::new();

    for (edge_index, &(from, to)) in model.edge_endpoints().iter().enumerate() {
        let (Some(&source), Some(&target)) = (membership.get(from), membership.get(to)) else {
            continue;
        };
        if source == target {
            continue;
        }

        let slot = *by_pair.entry((source, target)).or_insert_with(|| {
            let source_id = &hypernodes[source].id;
            let target_id = &hypernodes[target].id;
            hyperedges.push(Hyperedge {
                id: format!("hyperedge-{source_id}->{target_id}"),
                source: source_id.clone(),
                target: target_id.clone(),
                weight: 0,
                edges: Vec::new(),
                label: None,
                source_index: source,
                target_index: target,
                edge_indices: Vec::new(),
            });
            hyperedges.len() - 1
        });

        let hyperedge = &mut hyperedges[slot];
        hyperedge.weight += 1;
        hyperedge.edges.push(model.edges()[edge_index].id.clone());
        hyperedge.edge_indices.push(edge_index);
    }

    link_stressors(hypernodes, &by_pair, &mut hyperedges);
    hyperedges
}

/// Ties every AOP stressor container to the first adverse-outcome container,
/// labelling the link with the AOP. Existing bundles get the label; otherwise
/// an edgeless hyperedge is added.
fn link_stressors(
    hypernodes: &[Hypernode],
    by_pair: &HashMap<(usize, usize), usize>,
    hyperedges: &mut Vec<Hyperedge>,
) {
    let Some(outcome) = hypernodes
        .iter()
        .position(|hypernode| hypernode.kind == NodeKind::Ao)
    else {
        return;
    };

    for (source, hypernode) in hypernodes.iter().enumerate() {
        let Some(aop) = hypernode.aop.as_deref() else {
            continue;
        };
        let label = format!("AOP {aop}");

        if let Some(&slot) = by_pair.get(&(source, outcome)) {
            hyperedges[slot].label = Some(label);
            continue;
        }

        let target_id = &hypernodes[outcome].id;
        hyperedges.push(Hyperedge {
            id: format!("stressor-to-adverse-{}-{target_id}", hypernode.id),
            source: hypernode.id.clone(),
            target: target_id.clone(),
            weight: 0,
            edges: Vec::new(),
            label: Some(label),
            source_index: source,
            target_index: outcome,
            edge_indices: Vec::new(),
        });
    }
}
