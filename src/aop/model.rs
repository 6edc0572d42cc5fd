use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical node kinds of an AOP network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "MolecularInitiatingEvent")]
    Mie,
    #[serde(rename = "KeyEvent")]
    Ke,
    #[serde(rename = "AdverseOutcome")]
    Ao,
    Chemical,
    WeightOfEvidence,
    Other,
}

impl NodeKind {
    /// Maps a loosely spelled type name onto a canonical kind. Case, spaces,
    /// dashes and underscores are ignored.
    pub fn normalize(raw: &str) -> Self {
        let folded = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect::<String>();

        match folded.as_str() {
            "mie" | "molecularinitiatingevent" => Self::Mie,
            "ke" | "keyevent" => Self::Ke,
            "ao" | "adverseoutcome" => Self::Ao,
            "chemical" | "chem" | "stressor" => Self::Chemical,
            "woe" | "weightofevidence" | "evidence" => Self::WeightOfEvidence,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mie => "MolecularInitiatingEvent",
            Self::Ke => "KeyEvent",
            Self::Ao => "AdverseOutcome",
            Self::Chemical => "Chemical",
            Self::WeightOfEvidence => "WeightOfEvidence",
            Self::Other => "Other",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Self::Mie => "MIE",
            Self::Ke => "KE",
            Self::Ao => "AO",
            Self::Chemical => "CHEM",
            Self::WeightOfEvidence => "WOE",
            Self::Other => "OTHER",
        }
    }

    /// Ordering used when placing groups on the macro grid: MIE < KE < AO < rest.
    pub fn priority(self) -> u8 {
        match self {
            Self::Mie => 0,
            Self::Ke => 1,
            Self::Ao => 2,
            Self::Chemical | Self::WeightOfEvidence | Self::Other => 3,
        }
    }

    /// Protected kinds survive the isolated-node filter.
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Chemical | Self::WeightOfEvidence)
    }
}

/// Node record as supplied by the data-retrieval layer. Every field is
/// optional because upstream data is not trusted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawNode {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub label: Option<String>,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl RawNode {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(kind.into()),
            label: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawEdge {
    pub id: Option<String>,
    pub source: Option<String>,
    pub target: Option<String>,
    pub relationship: Option<String>,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, Value>,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: Some(source.into()),
            target: Some(target.into()),
            relationship: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }
}

/// A validated node owned by the graph model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// The type name as supplied, kept so unknown kinds stay distinguishable.
    pub type_name: String,
    pub label: String,
    pub metadata: BTreeMap<String, Value>,
}

impl Node {
    /// Bucket key for type grouping: canonical name for known kinds, the raw
    /// type name for everything else.
    pub fn group_key(&self) -> &str {
        match self.kind {
            NodeKind::Other if !self.type_name.trim().is_empty() => self.type_name.trim(),
            kind => kind.label(),
        }
    }

    /// Numeric AOP id from the `aop_id` or `aop` field, so `"Aop:315"`,
    /// `"AOP:315"`, `"315"` and `315` all give `"315"`.
    pub fn aop_id(&self) -> Option<String> {
        let raw = ["aop_id", "aop"]
            .iter()
            .find_map(|key| match self.metadata.get(*key)? {
                Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })?;

        let tail = raw.rsplit(':').next().unwrap_or(raw.as_str());
        let digits = tail.chars().filter(char::is_ascii_digit).collect::<String>();
        (!digits.is_empty()).then_some(digits)
    }

    pub fn aop_name(&self) -> Option<&str> {
        self.metadata
            .get("aop_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship: String,
    pub metadata: BTreeMap<String, Value>,
}
