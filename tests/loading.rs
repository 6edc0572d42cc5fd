//! Graph documents read from disk feed the same pipeline as in-memory records.

use std::fs;

use aop_layout::{LayoutConfig, RawEdge, RawNode, build_layout, load_graph_file};

const DOCUMENT: &str = r#"{
  "nodes": [
    { "id": "mie-1", "type": "MolecularInitiatingEvent", "label": "Receptor binding" },
    { "id": "ke-1", "type": "KeyEvent", "label": "Gene expression" },
    { "id": "ke-2", "type": "key_event", "label": "Cell proliferation" },
    { "id": 7, "type": "AO", "label": "Liver tumours" },
    { "id": "woe-1", "type": "WOE" },
    "not a node"
  ],
  "edges": [
    { "source": "mie-1", "target": "ke-1", "relationship": "causes" },
    { "source": "ke-1", "target": "ke-2" },
    { "source": "ke-2", "target": 7, "type": "leads_to" },
    { "source": "ke-2", "target": "gone" }
  ]
}"#;

fn in_memory() -> (Vec<RawNode>, Vec<RawEdge>) {
    let nodes = vec![
        RawNode::new("mie-1", "MolecularInitiatingEvent").with_label("Receptor binding"),
        RawNode::new("ke-1", "KeyEvent").with_label("Gene expression"),
        RawNode::new("ke-2", "key_event").with_label("Cell proliferation"),
        RawNode::new("7", "AO").with_label("Liver tumours"),
        RawNode::new("woe-1", "WOE"),
    ];
    let edges = vec![
        RawEdge::new("mie-1", "ke-1").with_relationship("causes"),
        RawEdge::new("ke-1", "ke-2"),
        RawEdge::new("ke-2", "7").with_relationship("leads_to"),
        RawEdge::new("ke-2", "gone"),
    ];
    (nodes, edges)
}

#[test]
fn file_and_memory_give_the_same_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pathway.json");
    fs::write(&path, DOCUMENT).unwrap();

    let graph = load_graph_file(&path).unwrap();
    assert_eq!(graph.nodes.len(), 5);
    assert_eq!(graph.edges.len(), 4);

    let config = LayoutConfig::default();
    let (nodes, edges) = in_memory();
    let from_file = build_layout(&graph.nodes, &graph.edges, &config);
    let from_memory = build_layout(&nodes, &edges, &config);

    assert_eq!(from_file, from_memory);
    assert_eq!(from_file.node_positions.len(), 5);
    assert!(from_file.node_positions.contains_key("7"));
}

#[test]
fn nodes_keyed_by_id_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyed.json");
    fs::write(
        &path,
        r#"{ "nodes": { "a": { "type": "MIE" }, "b": { "type": "AO" } },
             "edges": [ { "source": "a", "target": "b" } ] }"#,
    )
    .unwrap();

    let graph = load_graph_file(&path).unwrap();
    let result = build_layout(&graph.nodes, &graph.edges, &LayoutConfig::default());

    assert_eq!(result.hypernodes.len(), 2);
    assert_eq!(result.hyperedges.len(), 1);
    assert_eq!(result.hyperedges[0].weight, 1);
}

#[test]
fn unreadable_documents_carry_their_path() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    let error = load_graph_file(&missing).unwrap_err();
    assert!(format!("{error:#}").contains("missing.json"));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ \"edges\": [] }").unwrap();
    let error = load_graph_file(&broken).unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("broken.json"));
    assert!(message.contains("nodes"));
}
