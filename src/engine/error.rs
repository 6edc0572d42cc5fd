use serde::Serialize;

/// Failures surfaced to callers of the pipeline. Everything else is recovered
/// locally and reported as a [`LayoutDiagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("graph has no valid nodes after filtering")]
    EmptyGraph,
    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown node id `{0}`")]
    UnknownNode(String),
}

/// Recovered defects recorded while producing a layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutDiagnostic {
    /// A node was missing from every hypernode and received a fallback group.
    UnassignedNode { node: String, hypernode: String },
    /// A node was listed in more than one hypernode; later copies were removed.
    DuplicateAssignment { node: String, hypernode: String },
    /// A body produced a non-finite position and was reset to its group center.
    SimulationDivergence { node: String, hypernode: String },
    /// Two containers still overlapped beyond the tolerance when the
    /// collision pass budget ran out.
    UnresolvedOverlap { hypernode: String, other: String },
}
