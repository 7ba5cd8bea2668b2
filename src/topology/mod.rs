//! Network topology module.
//!
//! This module generates the hierarchical data-center topology used by the
//! aggregation experiments and renders it into the simulator's text format.

pub mod types;
pub mod generator;
pub mod writer;

// Re-export key types and functions for easier access
pub use types::{
    Link, LinkAttributes, LinkProfile, Node, NodeRole, TopologyDescription, TopologyError,
    TopologyParams, DEFAULT_NUM_CORE_FORWARDERS,
};
pub use generator::{
    edge_forwarder_for_producer, expected_link_count, generate, num_edge_forwarders, MAX_TOPOLOGY_LINKS,
};
pub use writer::{render_topology, write_topology_file};
