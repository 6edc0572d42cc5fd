//! End-to-end pipeline scenarios: grouping, separation, highlighting.

use std::collections::{BTreeMap, BTreeSet};

use aop_layout::engine::{GraphModel, Grouping, LayoutDiagnostic};
use aop_layout::{
    GroupingMode, Layout, LayoutConfig, LayoutError, RawEdge, RawNode, build_layout,
    highlight_from, try_build_layout,
};
use proptest::prelude::*;

fn pathway() -> (Vec<RawNode>, Vec<RawEdge>) {
    let nodes = vec![
        RawNode::new("A", "MIE"),
        RawNode::new("B", "KE"),
        RawNode::new("C", "KE"),
        RawNode::new("D", "AO"),
        RawNode::new("E", "KE"),
    ];
    let edges = vec![RawEdge::new("A", "B"), RawEdge::new("B", "D")];
    (nodes, edges)
}

fn pathway_config() -> LayoutConfig {
    LayoutConfig {
        max_group_size: 2,
        drop_isolated: false,
        ..LayoutConfig::default()
    }
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn pathway_scenario_groups_by_type_and_splits_key_events() {
    let (nodes, edges) = pathway();
    let result = build_layout(&nodes, &edges, &pathway_config());

    let groups = result
        .hypernodes
        .iter()
        .map(|hypernode| (hypernode.id.as_str(), hypernode.members.clone()))
        .collect::<BTreeMap<_, _>>();

    assert_eq!(groups.len(), 4);
    assert_eq!(groups["type-hypernode-MolecularInitiatingEvent"], ["A"]);
    assert_eq!(groups["type-hypernode-KeyEvent-1"], ["B", "C"]);
    assert_eq!(groups["type-hypernode-KeyEvent-2"], ["E"]);
    assert_eq!(groups["type-hypernode-AdverseOutcome"], ["D"]);

    let split = result.hypernode("type-hypernode-KeyEvent-1").unwrap();
    assert_eq!(split.split_index, Some(1));
    assert_eq!(split.total_splits, Some(2));
    assert_eq!(split.label, "KeyEvent Group 1 (2)");
}

#[test]
fn pathway_scenario_highlights_the_complete_chain() {
    let (nodes, edges) = pathway();
    let highlight = highlight_from(&nodes, &edges, "A");

    assert_eq!(highlight.selected.as_deref(), Some("A"));
    assert_eq!(highlight.nodes, ids(&["A", "B", "D"]));
    assert_eq!(highlight.edges, ids(&["A->B", "B->D"]));
    assert_eq!(highlight.faded_nodes, ids(&["C", "E"]));
    assert!(highlight.faded_edges.is_empty());
}

#[test]
fn pathway_highlight_marks_containers_of_the_chain() {
    let (nodes, edges) = pathway();
    let layout = Layout::compute_seeded(&nodes, &edges, &pathway_config()).unwrap();
    let highlight = layout.highlight("A");

    assert_eq!(
        highlight.hypernodes,
        ids(&[
            "type-hypernode-AdverseOutcome",
            "type-hypernode-KeyEvent-1",
            "type-hypernode-MolecularInitiatingEvent",
        ])
    );
    assert_eq!(highlight.faded_hypernodes, ids(&["type-hypernode-KeyEvent-2"]));
    assert_eq!(
        highlight.hyperedges,
        ids(&[
            "hyperedge-type-hypernode-KeyEvent-1->type-hypernode-AdverseOutcome",
            "hyperedge-type-hypernode-MolecularInitiatingEvent->type-hypernode-KeyEvent-1",
        ])
    );
}

#[test]
fn highlight_is_a_pure_function_of_its_inputs() {
    let (nodes, edges) = pathway();
    for selected in ["A", "B", "C", "D", "E", "missing"] {
        assert_eq!(
            highlight_from(&nodes, &edges, selected),
            highlight_from(&nodes, &edges, selected)
        );
    }
    assert!(highlight_from(&nodes, &edges, "missing").is_empty());
}

#[test]
fn path_graph_middle_node_is_most_between() {
    let nodes = ["A", "B", "C", "D", "E"]
        .into_iter()
        .map(|id| RawNode::new(id, "KE"))
        .collect::<Vec<_>>();
    let edges = vec![
        RawEdge::new("A", "B"),
        RawEdge::new("B", "C"),
        RawEdge::new("C", "D"),
        RawEdge::new("D", "E"),
    ];
    let result = build_layout(&nodes, &edges, &LayoutConfig::default());

    let betweenness = |id: &str| result.centrality[id].betweenness;
    assert!(betweenness("C") > betweenness("A"));
    assert!(betweenness("C") > betweenness("E"));
    assert_eq!(betweenness("A"), 0.0);
    assert_eq!(result.centrality["C"].degree, 2);
}

fn crowded_graph() -> (Vec<RawNode>, Vec<RawEdge>) {
    let mut nodes = vec![RawNode::new("mie", "MIE"), RawNode::new("ao", "AO")];
    let mut edges = Vec::new();
    for index in 0..14 {
        let id = format!("ke{index}");
        nodes.push(RawNode::new(id.clone(), "KE"));
        edges.push(RawEdge::new("mie", id.clone()));
        if index % 3 == 0 {
            edges.push(RawEdge::new(id, "ao"));
        }
    }
    nodes.push(RawNode::new("woe", "WOE"));
    nodes.push(RawNode::new("chem", "Chemical"));
    edges.push(RawEdge::new("chem", "mie"));
    (nodes, edges)
}

fn assert_siblings_separated(config: &LayoutConfig) {
    let (nodes, edges) = crowded_graph();
    let result = build_layout(&nodes, &edges, config);
    let min_distance = config.geometry.min_distance();

    assert!(!result.is_empty());
    for hypernode in &result.hypernodes {
        for (position, first) in hypernode.members.iter().enumerate() {
            for second in &hypernode.members[position + 1..] {
                let a = result.position(first).unwrap();
                let b = result.position(second).unwrap();
                let distance = (a.x - b.x).hypot(a.y - b.y);
                assert!(
                    distance >= min_distance - 1e-3,
                    "{first} and {second} in {} are {distance} apart",
                    hypernode.id
                );
            }
        }
    }
}

#[test]
fn siblings_keep_their_minimum_distance() {
    assert_siblings_separated(&LayoutConfig::default());
    assert_siblings_separated(&LayoutConfig {
        max_group_size: 16,
        ..LayoutConfig::default()
    });
    assert_siblings_separated(&LayoutConfig {
        grouping_mode: GroupingMode::ByConnectedComponent,
        ..LayoutConfig::default()
    });
}

#[test]
fn same_seed_reproduces_the_layout() {
    let (nodes, edges) = crowded_graph();
    let config = LayoutConfig::default();

    let first = build_layout(&nodes, &edges, &config);
    let second = build_layout(&nodes, &edges, &config);
    assert_eq!(first, second);

    let reseeded = build_layout(
        &nodes,
        &edges,
        &LayoutConfig {
            seed: config.seed + 1,
            ..config.clone()
        },
    );
    let assignment = |result: &aop_layout::LayoutResult| {
        result
            .hypernodes
            .iter()
            .map(|hypernode| (hypernode.id.clone(), hypernode.members.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(assignment(&first), assignment(&reseeded));
}

#[test]
fn overlap_left_after_the_pass_budget_is_reported() {
    let nodes = vec![RawNode::new("m", "MIE"), RawNode::new("a", "AO")];
    let edges = vec![RawEdge::new("m", "a")];
    let mut config = LayoutConfig::default();
    config.collision.passes = 0;
    config.geometry.grid_x_pad = 1.0;
    config.geometry.grid_y_pad = 1.0;

    let result = try_build_layout(&nodes, &edges, &config).unwrap();
    assert_eq!(
        result.diagnostics,
        vec![LayoutDiagnostic::UnresolvedOverlap {
            hypernode: "type-hypernode-MolecularInitiatingEvent".into(),
            other: "type-hypernode-AdverseOutcome".into(),
        }]
    );

    let settled = try_build_layout(&nodes, &edges, &LayoutConfig::default()).unwrap();
    assert!(settled.diagnostics.is_empty());
}

#[test]
fn protected_isolated_nodes_survive_the_default_filter() {
    let (nodes, edges) = crowded_graph();
    let result = build_layout(&nodes, &edges, &LayoutConfig::default());

    assert!(result.node_positions.contains_key("woe"));
    assert!(result.node_positions.contains_key("chem"));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn chemicals_stand_alone_when_grouping_is_off() {
    let (nodes, edges) = crowded_graph();
    let config = LayoutConfig {
        include_chemicals: false,
        ..LayoutConfig::default()
    };
    let result = build_layout(&nodes, &edges, &config);

    let chemical = result.hypernode("chemical-standalone-chem").unwrap();
    assert!(chemical.standalone);
    assert_eq!(chemical.members, ["chem"]);
}

#[test]
fn empty_graph_and_bad_config_are_reported() {
    assert_eq!(
        try_build_layout(&[], &[], &LayoutConfig::default()),
        Err(LayoutError::EmptyGraph)
    );

    let only_dangling = vec![RawEdge::new("x", "y")];
    let nameless = vec![RawNode::default()];
    assert!(build_layout(&nameless, &only_dangling, &LayoutConfig::default()).is_empty());

    let (nodes, edges) = pathway();
    let config = LayoutConfig {
        max_group_size: 0,
        ..LayoutConfig::default()
    };
    assert!(matches!(
        try_build_layout(&nodes, &edges, &config),
        Err(LayoutError::InvalidConfig(_))
    ));
}

#[test]
fn diagnostics_serialize_with_a_kind_tag() {
    let diagnostic = LayoutDiagnostic::UnassignedNode {
        node: "n1".into(),
        hypernode: "orphan-hypernode-n1".into(),
    };
    let json = serde_json::to_value(&diagnostic).unwrap();

    assert_eq!(json["kind"], "unassigned_node");
    assert_eq!(json["node"], "n1");
}

const KINDS: [&str; 6] = ["MIE", "KE", "AO", "Chemical", "WOE", "Assay"];

fn arbitrary_graph() -> impl Strategy<Value = (Vec<RawNode>, Vec<RawEdge>)> {
    (1usize..40).prop_flat_map(|count| {
        (
            prop::collection::vec(0..KINDS.len(), count),
            prop::collection::vec((0..count, 0..count), 0..count * 2),
        )
            .prop_map(|(kinds, links)| {
                let nodes = kinds
                    .iter()
                    .enumerate()
                    .map(|(index, &kind)| RawNode::new(format!("n{index}"), KINDS[kind]))
                    .collect::<Vec<_>>();
                let edges = links
                    .into_iter()
                    .map(|(from, to)| RawEdge::new(format!("n{from}"), format!("n{to}")))
                    .collect::<Vec<_>>();
                (nodes, edges)
            })
    })
}

proptest! {
    #[test]
    fn grouping_covers_every_node_exactly_once(
        (nodes, edges) in arbitrary_graph(),
        max_group_size in 1usize..6,
        by_component in any::<bool>(),
        include_chemicals in any::<bool>(),
    ) {
        let config = LayoutConfig {
            max_group_size,
            grouping_mode: if by_component {
                GroupingMode::ByConnectedComponent
            } else {
                GroupingMode::ByType
            },
            include_chemicals,
            drop_isolated: false,
            ..LayoutConfig::default()
        };
        let model = GraphModel::build(&nodes, &edges, config.drop_isolated).unwrap();
        let grouping = Grouping::build(&model, &config);

        let mut assigned = grouping
            .hypernodes
            .iter()
            .flat_map(|hypernode| hypernode.members.iter().cloned())
            .collect::<Vec<_>>();
        assigned.sort();
        let mut expected = model.nodes().iter().map(|node| node.id.clone()).collect::<Vec<_>>();
        expected.sort();

        prop_assert_eq!(assigned, expected);
        prop_assert!(grouping.diagnostics.is_empty());
    }

    #[test]
    fn type_buckets_split_into_bounded_groups(
        (nodes, edges) in arbitrary_graph(),
        max_group_size in 1usize..6,
    ) {
        let config = LayoutConfig {
            max_group_size,
            drop_isolated: false,
            ..LayoutConfig::default()
        };
        let model = GraphModel::build(&nodes, &edges, false).unwrap();
        let grouping = Grouping::build(&model, &config);

        let mut bucket_sizes = BTreeMap::<String, usize>::new();
        for node in model.nodes() {
            *bucket_sizes.entry(node.group_key().to_string()).or_default() += 1;
        }

        for (key, size) in bucket_sizes {
            let groups = grouping
                .hypernodes
                .iter()
                .filter(|hypernode| hypernode.original_type == key)
                .collect::<Vec<_>>();

            prop_assert_eq!(groups.len(), size.div_ceil(max_group_size));
            prop_assert!(groups.iter().all(|group| group.member_count() <= max_group_size));
            prop_assert_eq!(groups.iter().map(|group| group.member_count()).sum::<usize>(), size);
            if groups.len() > 1 {
                prop_assert!(groups.iter().all(|group| group.total_splits == Some(groups.len())));
            }
        }
    }

    #[test]
    fn grouping_is_idempotent((nodes, edges) in arbitrary_graph()) {
        let config = LayoutConfig {
            drop_isolated: false,
            ..LayoutConfig::default()
        };
        let model = GraphModel::build(&nodes, &edges, false).unwrap();
        let first = Grouping::build(&model, &config);
        let second = Grouping::build(&model, &config);

        prop_assert_eq!(first.hypernodes, second.hypernodes);
        prop_assert_eq!(first.membership, second.membership);
    }
}
