mod analysis;
mod centrality;
mod collide;
mod config;
mod error;
mod graph;
mod grouping;
mod highlight;
mod hyperedges;
mod planner;
mod search;
mod simulate;

use std::collections::BTreeMap;

use eframe::egui::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::aop::{RawEdge, RawNode};
use crate::util::Point;

pub use analysis::{NetworkSummary, analyze};
pub use centrality::{CentralityRecord, CentralityTable, brandes_betweenness};
pub use collide::{
    CollisionReport, child_pitch, hypernode_bounds, repack_children, resolve_collisions,
    size_container,
};
pub use config::{CollisionConfig, GeometryConfig, GroupingMode, LayoutConfig, SimulationConfig};
pub use error::{LayoutDiagnostic, LayoutError};
pub use graph::{BuildReport, GraphModel};
pub use grouping::{Grouping, Hypernode};
pub use highlight::{HighlightSet, highlight_from, highlight_in};
pub use hyperedges::{Hyperedge, aggregate_hyperedges};
pub use planner::{placement_order, plan_grid};
pub use search::{SearchMatch, find_nodes};
pub use simulate::{Body, GroupSimulation, SimulationOutcome, Spring, available_radius, simulate_group};

/// Render-ready snapshot of one pipeline run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LayoutResult {
    pub hypernodes: Vec<Hypernode>,
    pub hyperedges: Vec<Hyperedge>,
    pub node_positions: BTreeMap<String, Point>,
    pub node_radii: BTreeMap<String, f32>,
    pub centrality: BTreeMap<String, CentralityRecord>,
    pub diagnostics: Vec<LayoutDiagnostic>,
}

impl LayoutResult {
    /// True for the result returned when the input had no valid nodes.
    pub fn is_empty(&self) -> bool {
        self.hypernodes.is_empty() && self.node_positions.is_empty()
    }

    pub fn hypernode(&self, id: &str) -> Option<&Hypernode> {
        self.hypernodes.iter().find(|hypernode| hypernode.id == id)
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.node_positions.get(id).copied()
    }
}

/// A finished layout together with the model and grouping it came from, so
/// callers can run highlight queries against the same snapshot.
#[derive(Clone, Debug)]
pub struct Layout {
    pub model: GraphModel,
    pub centrality: CentralityTable,
    pub grouping: Grouping,
    pub result: LayoutResult,
}

impl Layout {
    pub fn compute<R: Rng + ?Sized>(
        nodes: &[RawNode],
        edges: &[RawEdge],
        config: &LayoutConfig,
        rng: &mut R,
    ) -> Result<Self, LayoutError> {
        config.validate()?;

        let model = GraphModel::build(nodes, edges, config.drop_isolated)?;
        let centrality = CentralityTable::compute(&model);
        let mut grouping = Grouping::build(&model, config);
        let mut diagnostics = grouping.diagnostics.clone();

        for hypernode in &mut grouping.hypernodes {
            hypernode.available_radius = available_radius(hypernode.member_count(), config);
            size_container(hypernode, config);
        }
        plan_grid(&mut grouping.hypernodes, &config.geometry);

        let mut positions = vec![Vec2::ZERO; model.node_count()];
        let links = group_links(&model, &grouping);
        for (hypernode, links) in grouping.hypernodes.iter().zip(&links) {
            let outcome = simulate_group(
                hypernode.center.into(),
                hypernode.member_count(),
                links,
                config,
                rng,
            );

            for &local in &outcome.diverged {
                let node = hypernode.members[local].clone();
                warn!(
                    node = node.as_str(),
                    hypernode = hypernode.id.as_str(),
                    "reset diverging body to hypernode center"
                );
                diagnostics.push(LayoutDiagnostic::SimulationDivergence {
                    node,
                    hypernode: hypernode.id.clone(),
                });
            }
            for (&member, position) in hypernode.member_indices.iter().zip(outcome.positions) {
                positions[member] = position;
            }
        }

        let collisions = resolve_collisions(&mut grouping.hypernodes, config);
        for &(first, second) in &collisions.unresolved {
            diagnostics.push(LayoutDiagnostic::UnresolvedOverlap {
                hypernode: grouping.hypernodes[first].id.clone(),
                other: grouping.hypernodes[second].id.clone(),
            });
        }

        for hypernode in &grouping.hypernodes {
            let mut seats = hypernode
                .member_indices
                .iter()
                .map(|&member| positions[member])
                .collect::<Vec<_>>();
            repack_children(hypernode, &mut seats, config);
            for (&member, seat) in hypernode.member_indices.iter().zip(seats) {
                positions[member] = seat;
            }
        }

        let geometry = &config.geometry;
        let node_positions = model
            .nodes()
            .iter()
            .zip(&positions)
            .map(|(node, &position)| (node.id.clone(), Point::from(position)))
            .collect();
        let node_radii = model
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let boost = 1.0 + geometry.size_boost * centrality.betweenness_scale(index);
                (node.id.clone(), geometry.node_radius * boost)
            })
            .collect();

        info!(
            nodes = model.node_count(),
            hypernodes = grouping.hypernodes.len(),
            hyperedges = grouping.hyperedges.len(),
            diagnostics = diagnostics.len(),
            "layout complete"
        );

        let result = LayoutResult {
            hypernodes: grouping.hypernodes.clone(),
            hyperedges: grouping.hyperedges.clone(),
            node_positions,
            node_radii,
            centrality: centrality.by_id(&model),
            diagnostics,
        };

        Ok(Self {
            model,
            centrality,
            grouping,
            result,
        })
    }

    /// [`Layout::compute`] with a PRNG seeded from `config.seed`.
    pub fn compute_seeded(
        nodes: &[RawNode],
        edges: &[RawEdge],
        config: &LayoutConfig,
    ) -> Result<Self, LayoutError> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self::compute(nodes, edges, config, &mut rng)
    }

    pub fn highlight(&self, selected: &str) -> HighlightSet {
        highlight_in(&self.model, selected, Some(&self.grouping))
    }
}

/// Intra-group edges per hypernode, as local member index pairs.
fn group_links(model: &GraphModel, grouping: &Grouping) -> Vec<Vec<(usize, usize)>> {
    let mut local_index = vec![0usize; model.node_count()];
    for hypernode in &grouping.hypernodes {
        for (local, &member) in hypernode.member_indices.iter().enumerate() {
            local_index[member] = local;
        }
    }

    let mut links = vec![Vec::new(); grouping.hypernodes.len()];
    for &(from, to) in model.edge_endpoints() {
        let (Some(&source), Some(&target)) =
            (grouping.membership.get(from), grouping.membership.get(to))
        else {
            continue;
        };
        if from != to && source == target {
            links[source].push((local_index[from], local_index[to]));
        }
    }
    links
}

pub fn try_build_layout_with_rng<R: Rng + ?Sized>(
    nodes: &[RawNode],
    edges: &[RawEdge],
    config: &LayoutConfig,
    rng: &mut R,
) -> Result<LayoutResult, LayoutError> {
    Layout::compute(nodes, edges, config, rng).map(|layout| layout.result)
}

/// Runs the pipeline with a PRNG seeded from `config.seed`.
pub fn try_build_layout(
    nodes: &[RawNode],
    edges: &[RawEdge],
    config: &LayoutConfig,
) -> Result<LayoutResult, LayoutError> {
    Layout::compute_seeded(nodes, edges, config).map(|layout| layout.result)
}

/// Like [`try_build_layout_with_rng`], but every error yields an empty result.
pub fn build_layout_with_rng<R: Rng + ?Sized>(
    nodes: &[RawNode],
    edges: &[RawEdge],
    config: &LayoutConfig,
    rng: &mut R,
) -> LayoutResult {
    match try_build_layout_with_rng(nodes, edges, config, rng) {
        Ok(result) => result,
        Err(LayoutError::EmptyGraph) => {
            info!("graph has no valid nodes; returning empty layout");
            LayoutResult::default()
        }
        Err(error) => {
            warn!(%error, "layout failed; returning empty layout");
            LayoutResult::default()
        }
    }
}

pub fn build_layout(nodes: &[RawNode], edges: &[RawEdge], config: &LayoutConfig) -> LayoutResult {
    let mut rng = StdRng::seed_from_u64(config.seed);
    build_layout_with_rng(nodes, edges, config, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Vec<RawNode>, Vec<RawEdge>) {
        let nodes = vec![
            RawNode::new("m", "MIE"),
            RawNode::new("k1", "KE"),
            RawNode::new("k2", "KE"),
            RawNode::new("k3", "KE"),
            RawNode::new("a", "AO"),
        ];
        let edges = vec![
            RawEdge::new("m", "k1"),
            RawEdge::new("k1", "k2"),
            RawEdge::new("k2", "k3"),
            RawEdge::new("k3", "a"),
        ];
        (nodes, edges)
    }

    #[test]
    fn every_node_gets_a_position_and_radius() {
        let (nodes, edges) = sample();
        let result = build_layout(&nodes, &edges, &LayoutConfig::default());

        assert!(!result.is_empty());
        assert_eq!(result.node_positions.len(), 5);
        assert_eq!(result.node_radii.len(), 5);
        assert_eq!(result.centrality.len(), 5);
        assert_eq!(result.hyperedges.len(), 2);
        assert!(result.diagnostics.is_empty());
        for position in result.node_positions.values() {
            assert!(position.x.is_finite() && position.y.is_finite());
        }
    }

    #[test]
    fn central_nodes_are_drawn_larger() {
        let (nodes, edges) = sample();
        let config = LayoutConfig::default();
        let result = build_layout(&nodes, &edges, &config);

        let radius_of = |id: &str| result.node_radii[id];
        assert!((radius_of("m") - config.geometry.node_radius).abs() < 1e-5);
        assert!((radius_of("k2") - config.geometry.max_node_radius()).abs() < 1e-5);
        assert!(radius_of("k1") > radius_of("m"));
    }

    #[test]
    fn children_end_inside_their_container() {
        let (nodes, edges) = sample();
        let result = build_layout(&nodes, &edges, &LayoutConfig::default());

        for hypernode in &result.hypernodes {
            let bounds = hypernode_bounds(hypernode);
            for member in &hypernode.members {
                let position = result.position(member).unwrap();
                assert!(bounds.contains(eframe::egui::pos2(position.x, position.y)));
            }
        }
    }

    #[test]
    fn empty_and_invalid_inputs() {
        let (nodes, edges) = sample();
        assert!(build_layout(&[], &[], &LayoutConfig::default()).is_empty());
        assert_eq!(
            try_build_layout(&[], &[], &LayoutConfig::default()),
            Err(LayoutError::EmptyGraph)
        );

        let config = LayoutConfig {
            max_group_size: 0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            try_build_layout(&nodes, &edges, &config),
            Err(LayoutError::InvalidConfig(_))
        ));
        assert!(build_layout(&nodes, &edges, &config).is_empty());
    }

    #[test]
    fn snapshot_highlight_marks_hypernodes() {
        let (nodes, edges) = sample();
        let mut rng = StdRng::seed_from_u64(9);
        let layout = Layout::compute(&nodes, &edges, &LayoutConfig::default(), &mut rng).unwrap();

        let highlight = layout.highlight("k2");
        assert_eq!(highlight.nodes.len(), 5);
        assert_eq!(highlight.hypernodes.len(), 3);
        assert_eq!(highlight.hyperedges.len(), 2);
        assert!(highlight.faded_hypernodes.is_empty());
    }
}
