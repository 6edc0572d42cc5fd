use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use crate::aop::NodeKind;
use crate::util::Point;

use super::config::{GroupingMode, LayoutConfig};
use super::error::LayoutDiagnostic;
use super::graph::GraphModel;
use super::hyperedges::{Hyperedge, aggregate_hyperedges};

/// A rendering-level container aggregating graph nodes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hypernode {
    pub id: String,
    pub label: String,
    pub original_type: String,
    pub kind: NodeKind,
    pub members: Vec<String>,
    #[serde(skip)]
    pub member_indices: Vec<usize>,
    pub split_index: Option<usize>,
    pub total_splits: Option<usize>,
    /// Chemicals left out of type grouping get a container of their own.
    pub standalone: bool,
    /// AOP a stressor container belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aop: Option<String>,
    pub center: Point,
    pub available_radius: f32,
    pub width: f32,
    pub height: f32,
    pub label_height: f32,
}

impl Hypernode {
    fn new(
        model: &GraphModel,
        id: String,
        label: String,
        original_type: &str,
        kind: NodeKind,
        member_indices: Vec<usize>,
    ) -> Self {
        let mut hypernode = Self {
            id,
            label,
            original_type: original_type.to_string(),
            kind,
            members: Vec::new(),
            member_indices: Vec::new(),
            split_index: None,
            total_splits: None,
            standalone: false,
            aop: None,
            center: Point::default(),
            available_radius: 0.0,
            width: 0.0,
            height: 0.0,
            label_height: 0.0,
        };
        hypernode.set_members(model, member_indices);
        hypernode
    }

    fn set_members(&mut self, model: &GraphModel, member_indices: Vec<usize>) {
        self.members = member_indices
            .iter()
            .map(|&index| model.nodes()[index].id.clone())
            .collect();
        self.member_indices = member_indices;
    }

    pub fn member_count(&self) -> usize {
        self.member_indices.len()
    }
}

/// Partition of a graph model into hypernodes covering every node once.
#[derive(Clone, Debug)]
pub struct Grouping {
    pub hypernodes: Vec<Hypernode>,
    /// Node index to hypernode index.
    pub membership: Vec<usize>,
    pub hyperedges: Vec<Hyperedge>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl Grouping {
    pub fn build(model: &GraphModel, config: &LayoutConfig) -> Self {
        let hypernodes = match config.grouping_mode {
            GroupingMode::ByType => group_by_type(model, config),
            GroupingMode::ByConnectedComponent => group_by_component(model, config),
        };

        let grouping = Self::from_hypernodes(model, hypernodes);
        info!(
            mode = config.grouping_mode.label(),
            hypernodes = grouping.hypernodes.len(),
            repaired = grouping.diagnostics.len(),
            "grouped nodes into hypernodes"
        );
        grouping
    }

    /// Verifies coverage of `hypernodes` against the model, repairing
    /// duplicates and orphans instead of failing.
    pub fn from_hypernodes(model: &GraphModel, mut hypernodes: Vec<Hypernode>) -> Self {
        let node_count = model.node_count();
        let mut assigned = vec![false; node_count];
        let mut diagnostics = Vec::new();

        for hypernode in &mut hypernodes {
            let mut kept = Vec::with_capacity(hypernode.member_indices.len());
            for &member in &hypernode.member_indices {
                if member >= node_count {
                    continue;
                }
                if assigned[member] {
                    let node = model.nodes()[member].id.clone();
                    warn!(
                        node = node.as_str(),
                        hypernode = hypernode.id.as_str(),
                        "node assigned to more than one hypernode"
                    );
                    diagnostics.push(LayoutDiagnostic::DuplicateAssignment {
                        node,
                        hypernode: hypernode.id.clone(),
                    });
                    continue;
                }
                assigned[member] = true;
                kept.push(member);
            }
            hypernode.set_members(model, kept);
        }
        hypernodes.retain(|hypernode| !hypernode.member_indices.is_empty());

        for (index, is_assigned) in assigned.iter().enumerate() {
            if *is_assigned {
                continue;
            }

            let node = &model.nodes()[index];
            let fallback = Hypernode::new(
                model,
                format!("orphan-hypernode-{}", node.id),
                format!("{} Group (1)", node.group_key()),
                node.group_key(),
                node.kind,
                vec![index],
            );
            warn!(
                node = node.id.as_str(),
                hypernode = fallback.id.as_str(),
                "node was left unassigned; created fallback hypernode"
            );
            diagnostics.push(LayoutDiagnostic::UnassignedNode {
                node: node.id.clone(),
                hypernode: fallback.id.clone(),
            });
            hypernodes.push(fallback);
        }
        dedup_ids(&mut hypernodes);

        let mut membership = vec![0usize; node_count];
        for (hypernode_index, hypernode) in hypernodes.iter().enumerate() {
            for &member in &hypernode.member_indices {
                membership[member] = hypernode_index;
            }
        }

        let hyperedges = aggregate_hyperedges(model, &hypernodes, &membership);

        Self {
            hypernodes,
            membership,
            hyperedges,
            diagnostics,
        }
    }

    pub fn hypernode_of(&self, node_index: usize) -> Option<&Hypernode> {
        self.membership
            .get(node_index)
            .and_then(|&index| self.hypernodes.get(index))
    }
}

/// Renames later hypernodes whose id is already taken, appending `#2`, `#3`
/// and so on. An unknown type named like a split bucket ("KeyEvent-1") would
/// otherwise share its id.
fn dedup_ids(hypernodes: &mut [Hypernode]) {
    let mut seen = HashSet::with_capacity(hypernodes.len());
    for hypernode in hypernodes.iter_mut() {
        if seen.insert(hypernode.id.clone()) {
            continue;
        }

        let base = hypernode.id.clone();
        let mut suffix = 2usize;
        let mut id = format!("{base}#{suffix}");
        while !seen.insert(id.clone()) {
            suffix += 1;
            id = format!("{base}#{suffix}");
        }
        warn!(hypernode = base.as_str(), renamed = id.as_str(), "duplicate hypernode id");
        hypernode.id = id;
    }
}

fn standalone_chemicals(model: &GraphModel, indices: &[usize]) -> Vec<Hypernode> {
    indices
        .iter()
        .map(|&index| {
            let node = &model.nodes()[index];
            let mut hypernode = Hypernode::new(
                model,
                format!("chemical-standalone-{}", node.id),
                node.label.clone(),
                node.group_key(),
                node.kind,
                vec![index],
            );
            hypernode.standalone = true;
            hypernode
        })
        .collect()
}

fn group_by_type(model: &GraphModel, config: &LayoutConfig) -> Vec<Hypernode> {
    let max_size = config.max_group_size.max(1);

    let mut bucket_by_key: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(&str, NodeKind, Vec<usize>)> = Vec::new();
    let mut stressor_by_aop: HashMap<String, usize> = HashMap::new();
    let mut stressors: Vec<StressorBucket<'_>> = Vec::new();
    let mut standalone = Vec::new();

    for (index, node) in model.nodes().iter().enumerate() {
        if node.kind == NodeKind::Chemical {
            if !config.include_chemicals {
                standalone.push(index);
                continue;
            }
            if let Some(aop) = node.aop_id() {
                let bucket = match stressor_by_aop.get(&aop) {
                    Some(&bucket) => bucket,
                    None => {
                        stressor_by_aop.insert(aop.clone(), stressors.len());
                        stressors.push(StressorBucket {
                            aop,
                            name: None,
                            members: Vec::new(),
                        });
                        stressors.len() - 1
                    }
                };
                let stressor = &mut stressors[bucket];
                stressor.name = stressor.name.or(node.aop_name());
                stressor.members.push(index);
                continue;
            }
        }

        let key = node.group_key();
        let bucket = *bucket_by_key.entry(key).or_insert_with(|| {
            buckets.push((key, node.kind, Vec::new()));
            buckets.len() - 1
        });
        buckets[bucket].2.push(index);
    }

    let mut hypernodes = Vec::new();
    for (key, kind, members) in buckets {
        let total = members.len();
        if total <= max_size {
            hypernodes.push(Hypernode::new(
                model,
                format!("type-hypernode-{key}"),
                format!("{key} Group ({total})"),
                key,
                kind,
                members,
            ));
            continue;
        }

        let total_splits = total.div_ceil(max_size);
        for (chunk_index, chunk) in members.chunks(max_size).enumerate() {
            let split_index = chunk_index + 1;
            let mut hypernode = Hypernode::new(
                model,
                format!("type-hypernode-{key}-{split_index}"),
                format!("{key} Group {split_index} ({})", chunk.len()),
                key,
                kind,
                chunk.to_vec(),
            );
            hypernode.split_index = Some(split_index);
            hypernode.total_splits = Some(total_splits);
            hypernodes.push(hypernode);
        }
    }

    for stressor in stressors {
        hypernodes.extend(stressor.into_hypernodes(model, max_size));
    }

    hypernodes.extend(standalone_chemicals(model, &standalone));
    hypernodes
}

/// Chemicals that name the same AOP.
struct StressorBucket<'a> {
    aop: String,
    name: Option<&'a str>,
    members: Vec<usize>,
}

impl StressorBucket<'_> {
    fn into_hypernodes(self, model: &GraphModel, max_size: usize) -> Vec<Hypernode> {
        let chemical = NodeKind::Chemical.label();
        let pathway = match self.name {
            Some(name) => format!("AOP {}: {name}", self.aop),
            None => format!("AOP {}", self.aop),
        };
        let base_id = format!("stressor-hypernode-aop-{}", self.aop);

        let total = self.members.len();
        let total_splits = total.div_ceil(max_size);
        self.members
            .chunks(max_size)
            .enumerate()
            .map(|(chunk_index, chunk)| {
                let (id, label) = if total_splits == 1 {
                    (base_id.clone(), format!("Stressors ({pathway})"))
                } else {
                    let split_index = chunk_index + 1;
                    (
                        format!("{base_id}-{split_index}"),
                        format!("Stressors {split_index} ({pathway})"),
                    )
                };
                let mut hypernode =
                    Hypernode::new(model, id, label, chemical, NodeKind::Chemical, chunk.to_vec());
                if total_splits > 1 {
                    hypernode.split_index = Some(chunk_index + 1);
                    hypernode.total_splits = Some(total_splits);
                }
                hypernode.aop = Some(self.aop.clone());
                hypernode
            })
            .collect()
    }
}

fn group_by_component(model: &GraphModel, config: &LayoutConfig) -> Vec<Hypernode> {
    let adjacency = model.adjacency();
    let mut visited = vec![false; model.node_count()];
    let mut hypernodes = Vec::new();
    let mut standalone = Vec::new();
    let mut component_number = 0usize;

    for start in 0..model.node_count() {
        if visited[start] {
            continue;
        }

        let mut component = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(current) = stack.pop() {
            component.push(current);
            for &next in adjacency[current].iter().rev() {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        component.sort_unstable();

        if !config.include_chemicals {
            component.retain(|&index| {
                let is_chemical = model.nodes()[index].kind == NodeKind::Chemical;
                if is_chemical {
                    standalone.push(index);
                }
                !is_chemical
            });
        }
        if component.is_empty() {
            continue;
        }

        component_number += 1;
        let (dominant_key, dominant_kind) = dominant_type(model, &component);
        let total = component.len();
        hypernodes.push(Hypernode::new(
            model,
            format!("component-hypernode-{component_number}"),
            format!("{dominant_key} Component {component_number} ({total})"),
            &dominant_key,
            dominant_kind,
            component,
        ));
    }

    standalone.sort_unstable();
    hypernodes.extend(standalone_chemicals(model, &standalone));
    hypernodes
}

/// Most frequent group key among `members`; ties go to the key seen first.
fn dominant_type(model: &GraphModel, members: &[usize]) -> (String, NodeKind) {
    let mut counts: Vec<(&str, NodeKind, usize)> = Vec::new();
    for &member in members {
        let node = &model.nodes()[member];
        let key = node.group_key();
        match counts.iter_mut().find(|(existing, _, _)| *existing == key) {
            Some(entry) => entry.2 += 1,
            None => counts.push((key, node.kind, 1)),
        }
    }

    let mut best: Option<(&str, NodeKind, usize)> = None;
    for entry in counts {
        if best.is_none_or(|(_, _, count)| entry.2 > count) {
            best = Some(entry);
        }
    }

    best.map(|(key, kind, _)| (key.to_string(), kind))
        .unwrap_or_else(|| (NodeKind::Other.label().to_string(), NodeKind::Other))
}
