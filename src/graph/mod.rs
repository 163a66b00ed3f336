//! Interaction graph representation and construction

pub mod builder;
pub mod compressed;

pub use builder::{build_graph, GraphBuilder};
pub use compressed::{Link, PeerGraph};

/// Canonical key of an unordered node pair: smaller index first
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
