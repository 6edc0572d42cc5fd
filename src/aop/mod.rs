mod load;
mod model;
mod parse;

pub use load::load_graph_file;
pub use model::{Edge, Node, NodeKind, RawEdge, RawNode};
pub use parse::{RawGraph, parse_graph_document};
