//! # aggsim - Experiment tooling for in-network aggregation simulations
//!
//! This library generates data-center topologies for an NDN-style aggregation
//! simulator and analyzes the throughput logs the simulator produces.
//!
//! ## Overview
//!
//! A topology connects one consumer and many producers through a layer of edge
//! forwarders to a set of aggregators, which in turn hang off a small group of
//! core forwarders. After a run, the simulator logs per-flow byte counts and
//! timings; the analysis side turns those into global throughput and bandwidth
//! utilization against the theoretical link capacity.
//!
//! ## Architecture
//!
//! - `config`: Type-safe configuration structures and YAML parsing
//! - `config_loader`: Configuration file loading, CLI overrides and INI migration
//! - `topology`: Topology generation and the simulator's topology file format
//! - `analysis`: Throughput log parsing, aggregation, utilization and reports
//! - `utils`: Bitrate and delay parsing, validation helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use aggsim::{config_loader, topology};
//! use std::path::Path;
//!
//! let config = config_loader::load_config(Path::new("config.yaml"))?;
//! let params = config.topology_params()?;
//!
//! let description = topology::generate(&params)?;
//! topology::write_topology_file(&description, Path::new("DataCenterTopology.txt"))?;
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   topology_type: DataCenter
//!
//! topologies:
//!   DataCenter:
//!     numProducer: 4
//!     numAggregator: 2
//!     numEdgeForwarder: 2   # producers per edge forwarder
//!     Bitrate: 100Mbps
//!
//! analysis:
//!   time_unit: microseconds
//! ```
//!
//! ## Error Handling
//!
//! Pure operations return typed `thiserror` errors (`BitrateError`,
//! `TopologyError`, `AnalysisError`, `ValidationError`). Anything touching the
//! filesystem returns `color_eyre::Result` with context attached.

pub mod config;
pub mod config_loader;
pub mod topology;
pub mod analysis;
pub mod utils;
