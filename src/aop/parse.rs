use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value};
use tracing::debug;

use super::model::{RawEdge, RawNode};

/// Unvalidated node and edge records as read from a graph document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

pub fn parse_graph_document(raw: &str) -> Result<RawGraph> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in graph document")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("graph document must be a JSON object"))?;

    let nodes_value = object
        .get("nodes")
        .ok_or_else(|| anyhow!("graph document has no `nodes` collection"))?;

    let nodes = match nodes_value {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| parse_node(entry, None))
            .collect(),
        Value::Object(entries) => entries
            .iter()
            .filter_map(|(key, entry)| parse_node(entry, Some(key)))
            .collect(),
        _ => return Err(anyhow!("`nodes` must be an array or an object keyed by id")),
    };

    let edges = match object.get("edges") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries.iter().filter_map(parse_edge).collect(),
        Some(_) => return Err(anyhow!("`edges` must be an array")),
    };

    Ok(RawGraph { nodes, edges })
}

fn parse_node(value: &Value, key: Option<&String>) -> Option<RawNode> {
    let Some(object) = value.as_object() else {
        debug!("skipping node record that is not an object: {value}");
        return None;
    };

    let id = object
        .get("id")
        .and_then(scalar_string)
        .or_else(|| key.cloned());
    let kind = object.get("type").and_then(scalar_string);
    let (label, label_key) = with_alias(object, "label", "name");

    Some(RawNode {
        id,
        kind,
        label,
        metadata: remaining_fields(object, &["id", "type", "label", label_key]),
    })
}

fn parse_edge(value: &Value) -> Option<RawEdge> {
    let Some(object) = value.as_object() else {
        debug!("skipping edge record that is not an object: {value}");
        return None;
    };

    let (relationship, relationship_key) = with_alias(object, "relationship", "type");

    Some(RawEdge {
        id: object.get("id").and_then(scalar_string),
        source: object.get("source").and_then(scalar_string),
        target: object.get("target").and_then(scalar_string),
        relationship,
        metadata: remaining_fields(
            object,
            &["id", "source", "target", "relationship", relationship_key],
        ),
    })
}

/// Reads `key`, falling back to `alias`, and returns the key that supplied
/// the value. An alias that was used is not kept again as metadata.
fn with_alias<'k>(
    object: &Map<String, Value>,
    key: &'k str,
    alias: &'k str,
) -> (Option<String>, &'k str) {
    match object.get(key).and_then(scalar_string) {
        Some(value) => (Some(value), key),
        None => match object.get(alias).and_then(scalar_string) {
            Some(value) => (Some(value), alias),
            None => (None, key),
        },
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn remaining_fields(object: &Map<String, Value>, consumed: &[&str]) -> BTreeMap<String, Value> {
    object
        .iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
