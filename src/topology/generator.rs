//! Data-center topology generation.
//!
//! Expands producer/aggregator/fan-in counts into the fixed hierarchical
//! wiring used by the aggregation experiments:
//!
//! ```text
//!   forwarder{E}..forwarder{E+C-1}    core forwarders
//!              \   |   /
//!           agg0 .. agg{A-1}          aggregators (full bipartite both ways)
//!              /   |   \
//!   forwarder0..forwarder{E-1}        edge forwarders
//!      |                 |
//!   con0, pro0..     pro{P-1}         consumer and producers
//! ```

use crate::topology::types::*;
use crate::utils::validation::validate_positive_count;

/// Number of edge forwarders for `num_producers` producers with fan-in `per_edge`.
///
/// This is `floor(P / k) + 1`, which keeps one surplus forwarder even when the
/// division is exact.
pub fn num_edge_forwarders(num_producers: u32, per_edge: u32) -> u32 {
    num_producers / per_edge + 1
}

/// Edge forwarder index a producer is attached to
pub fn edge_forwarder_for_producer(producer: u32, per_edge: u32) -> u32 {
    producer / per_edge
}

/// Largest topology `generate` will build, in links
pub const MAX_TOPOLOGY_LINKS: u128 = 50_000_000;

/// Total link count for a generated topology.
///
/// Computed in `u128` so any `u32` inputs are representable; `per_edge` must
/// be positive.
pub fn expected_link_count(params: &TopologyParams) -> u128 {
    let producers = params.num_producers as u128;
    let aggregators = params.num_aggregators as u128;
    let edges = (params.num_producers / params.num_producers_per_edge) as u128 + 1;
    let cores = params.num_core_forwarders as u128;

    producers + 1 + edges * aggregators + cores * aggregators
}

fn check_params(params: &TopologyParams) -> Result<(), TopologyError> {
    let counts = [
        ("numProducer", params.num_producers),
        ("numAggregator", params.num_aggregators),
        ("numEdgeForwarder", params.num_producers_per_edge),
    ];
    for (name, value) in counts {
        validate_positive_count(name, value)
            .map_err(|reason| TopologyError::InvalidParameter { name, reason })?;
    }

    // Edge and core forwarders share one index space
    let forwarders = (params.num_producers / params.num_producers_per_edge)
        .checked_add(1)
        .and_then(|edges| edges.checked_add(params.num_core_forwarders));
    if forwarders.is_none() {
        return Err(TopologyError::InvalidParameter {
            name: "numProducer",
            reason: format!(
                "{} producers with {} per edge forwarder overflow the forwarder numbering",
                params.num_producers, params.num_producers_per_edge
            ),
        });
    }

    let links = expected_link_count(params);
    if links > MAX_TOPOLOGY_LINKS {
        return Err(TopologyError::InvalidParameter {
            name: "numAggregator",
            reason: format!(
                "{} producers, {} aggregators and {} core forwarders need {} links, more than the supported {}",
                params.num_producers, params.num_aggregators, params.num_core_forwarders, links, MAX_TOPOLOGY_LINKS
            ),
        });
    }
    Ok(())
}

/// Generate the data-center topology description.
///
/// The output is a pure function of `params`: the same parameters always
/// yield the same node and link order.
///
/// # Errors
/// `TopologyError::InvalidParameter` when a producer, aggregator or fan-in
/// count is zero, or the topology would exceed `MAX_TOPOLOGY_LINKS` links.
///
/// # Examples
/// ```
/// use aggsim::topology::{generate, TopologyParams};
/// use aggsim::utils::parse_bitrate;
///
/// let params = TopologyParams::new(4, 2, 2, parse_bitrate("100Mbps").unwrap());
/// let topology = generate(&params).unwrap();
/// assert_eq!(topology.num_edge_forwarders, 3);
/// assert_eq!(topology.links.len(), 17);
/// ```
pub fn generate(params: &TopologyParams) -> Result<TopologyDescription, TopologyError> {
    check_params(params)?;

    let per_edge = params.num_producers_per_edge;
    let edges = num_edge_forwarders(params.num_producers, per_edge);
    let cores = params.num_core_forwarders;
    let attributes = LinkAttributes::new(params.bitrate, &params.link);

    let capacity = [params.num_producers, edges, params.num_aggregators, cores]
        .iter()
        .map(|&n| n as usize)
        .sum::<usize>()
        + 1;
    let mut nodes = Vec::with_capacity(capacity);

    nodes.push(Node::new(NodeRole::Consumer, 0));
    nodes.extend((0..params.num_producers).map(|i| Node::new(NodeRole::Producer, i)));
    nodes.extend((0..edges).map(|i| Node::new(NodeRole::EdgeForwarder, i)));
    nodes.extend((0..params.num_aggregators).map(|i| Node::new(NodeRole::Aggregator, i)));
    // Core forwarders continue the edge forwarder numbering
    nodes.extend((0..cores).map(|i| Node::new(NodeRole::CoreForwarder, edges + i)));

    let link = |a: String, b: String| Link {
        endpoint_a: a,
        endpoint_b: b,
        attributes,
    };

    // Bounded by MAX_TOPOLOGY_LINKS in check_params
    let mut links = Vec::with_capacity(expected_link_count(params) as usize);

    for i in 0..params.num_producers {
        links.push(link(
            node_name(NodeRole::Producer, i),
            node_name(NodeRole::EdgeForwarder, edge_forwarder_for_producer(i, per_edge)),
        ));
    }

    links.push(link(
        node_name(NodeRole::Consumer, 0),
        node_name(NodeRole::EdgeForwarder, 0),
    ));

    for i in 0..edges {
        for j in 0..params.num_aggregators {
            links.push(link(
                node_name(NodeRole::EdgeForwarder, i),
                node_name(NodeRole::Aggregator, j),
            ));
        }
    }

    for i in 0..cores {
        for j in 0..params.num_aggregators {
            links.push(link(
                node_name(NodeRole::CoreForwarder, edges + i),
                node_name(NodeRole::Aggregator, j),
            ));
        }
    }

    log::debug!(
        "Generated topology: {} nodes, {} links ({} edge forwarders, {} core forwarders)",
        nodes.len(),
        links.len(),
        edges,
        cores
    );

    Ok(TopologyDescription {
        nodes,
        links,
        num_edge_forwarders: edges,
        num_core_forwarders: cores,
    })
}
