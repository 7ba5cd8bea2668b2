//! Throughput and bandwidth utilization analysis for simulation logs.
//!
//! This module reads the fixed-column throughput logs written by the
//! simulator, aggregates them into global throughput and compares the result
//! against the theoretical link capacity.

pub mod types;
pub mod log_parser;
pub mod throughput;
pub mod utilization;
pub mod report;

pub use types::*;
pub use log_parser::{aggregate_log_file, aggregate_shards};
pub use throughput::{aggregate_per_sample_rate, aggregate_pooled, aggregate_pooled_records, ThroughputAggregator};
pub use utilization::compute_utilization;
pub use report::{generate_json_report, generate_text_report, render_text_report, ThroughputReport};
