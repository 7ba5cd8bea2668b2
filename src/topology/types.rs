//! Topology type definitions.
//!
//! Nodes, links and the parameter struct consumed by the data-center
//! topology generator.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::bitrate::RateValue;

/// Core forwarder count used by the reference topologies
pub const DEFAULT_NUM_CORE_FORWARDERS: u32 = 3;

/// Errors raised while generating or checking a topology
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Inconsistent topology: {0}")]
    Inconsistent(String),
}

/// Role a node plays in the data-center hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Consumer,
    Producer,
    EdgeForwarder,
    Aggregator,
    CoreForwarder,
}

impl NodeRole {
    /// Name prefix the simulator expects for this role
    pub fn prefix(self) -> &'static str {
        match self {
            NodeRole::Consumer => "con",
            NodeRole::Producer => "pro",
            NodeRole::EdgeForwarder | NodeRole::CoreForwarder => "forwarder",
            NodeRole::Aggregator => "agg",
        }
    }
}

/// A named node. Edge and core forwarders share one index space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub role: NodeRole,
    pub index: u32,
}

impl Node {
    pub fn new(role: NodeRole, index: u32) -> Self {
        Self {
            name: node_name(role, index),
            role,
            index,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Build the simulator-facing name of a node, e.g. `forwarder3`
pub fn node_name(role: NodeRole, index: u32) -> String {
    format!("{}{}", role.prefix(), index)
}

/// Non-rate attributes shared by every generated link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkProfile {
    pub queue_size: u32,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// Loss/error parameter; opaque to this crate, interpreted by the simulator
    pub loss: u32,
}

impl Default for LinkProfile {
    fn default() -> Self {
        Self {
            queue_size: 1,
            delay: Duration::from_millis(2),
            loss: 50,
        }
    }
}

/// Attributes carried by a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkAttributes {
    pub rate: RateValue,
    pub queue_size: u32,
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    pub loss: u32,
}

impl LinkAttributes {
    pub fn new(rate: RateValue, profile: &LinkProfile) -> Self {
        Self {
            rate,
            queue_size: profile.queue_size,
            delay: profile.delay,
            loss: profile.loss,
        }
    }
}

/// A point-to-point link between two named nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub endpoint_a: String,
    pub endpoint_b: String,
    pub attributes: LinkAttributes,
}

/// Explicit inputs to the generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyParams {
    pub num_producers: u32,
    pub num_aggregators: u32,
    /// Producers attached to one edge forwarder
    pub num_producers_per_edge: u32,
    pub bitrate: RateValue,
    pub num_core_forwarders: u32,
    pub link: LinkProfile,
}

impl TopologyParams {
    /// Parameters with the reference core forwarder count and link profile
    pub fn new(
        num_producers: u32,
        num_aggregators: u32,
        num_producers_per_edge: u32,
        bitrate: RateValue,
    ) -> Self {
        Self {
            num_producers,
            num_aggregators,
            num_producers_per_edge,
            bitrate,
            num_core_forwarders: DEFAULT_NUM_CORE_FORWARDERS,
            link: LinkProfile::default(),
        }
    }

    pub fn with_core_forwarders(mut self, count: u32) -> Self {
        self.num_core_forwarders = count;
        self
    }

    pub fn with_link_profile(mut self, link: LinkProfile) -> Self {
        self.link = link;
        self
    }
}

/// Generated topology: ordered nodes and ordered links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyDescription {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub num_edge_forwarders: u32,
    pub num_core_forwarders: u32,
}

impl TopologyDescription {
    /// Nodes with the given role, in output order
    pub fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.role == role)
    }

    /// Check name uniqueness and that every link endpoint is a known node
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut names = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(TopologyError::Inconsistent(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }
        }

        for link in &self.links {
            for endpoint in [&link.endpoint_a, &link.endpoint_b] {
                if !names.contains(endpoint.as_str()) {
                    return Err(TopologyError::Inconsistent(format!(
                        "link {} -- {} references unknown node '{}'",
                        link.endpoint_a, link.endpoint_b, endpoint
                    )));
                }
            }
        }

        Ok(())
    }
}
