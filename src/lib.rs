//! Hypernode clustering and force-directed layout for Adverse Outcome
//! Pathway graphs.
//!
//! The pipeline runs graph validation, centrality, grouping, macro grid
//! planning, intra-group simulation and collision resolution in one pass
//! ([`build_layout`]). Pathway highlighting ([`highlight_from`]) works on the
//! validated graph independently of any layout.

pub mod aop;
pub mod engine;
pub mod util;

pub use aop::{NodeKind, RawEdge, RawGraph, RawNode, load_graph_file, parse_graph_document};
pub use engine::{
    GroupingMode, HighlightSet, Layout, LayoutConfig, LayoutError, LayoutResult, build_layout,
    build_layout_with_rng, highlight_from, highlight_in, try_build_layout,
};
pub use util::Point;
