use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::types::{AggregationOptions, ByteAccounting, TimeUnit};
use crate::topology::types::{LinkProfile, TopologyParams, DEFAULT_NUM_CORE_FORWARDERS};
use crate::utils::bitrate::{parse_bitrate, RateValue};
use crate::utils::validation::validate_positive_count;

/// Topology type used when none is configured
pub const DEFAULT_TOPOLOGY_TYPE: &str = "DataCenter";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Top-level configuration file
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub general: GeneralConfig,
    /// Settings per topology type, keyed by type name (e.g. "DataCenter")
    pub topologies: BTreeMap<String, TopologySettings>,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.topology_type.is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "general.topology_type cannot be empty".to_string(),
            ));
        }

        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "general.log_level '{}' is not one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }

        self.topology_params()?;
        Ok(())
    }

    /// The topology section selected by `general.topology_type`
    pub fn active_topology(&self) -> Result<(&str, &TopologySettings), ValidationError> {
        let name = self.general.topology_type.as_str();
        self.topologies
            .get(name)
            .map(|settings| (name, settings))
            .ok_or_else(|| {
                ValidationError::InvalidTopology(format!(
                    "general.topology_type is '{}' but there is no topologies.{} section",
                    name, name
                ))
            })
    }

    /// Mutable access to the active topology section, creating it if missing
    pub fn active_topology_mut(&mut self) -> &mut TopologySettings {
        self.topologies
            .entry(self.general.topology_type.clone())
            .or_default()
    }

    /// Per-link bitrate of the active topology
    pub fn bitrate(&self) -> Result<RateValue, ValidationError> {
        let (name, settings) = self.active_topology()?;
        parse_bitrate(&settings.bitrate).map_err(|e| {
            ValidationError::InvalidTopology(format!("topologies.{}.Bitrate: {}", name, e))
        })
    }

    /// Build validated generator parameters for the active topology
    pub fn topology_params(&self) -> Result<TopologyParams, ValidationError> {
        let (name, settings) = self.active_topology()?;

        let counts = [
            ("numProducer", settings.num_producer),
            ("numAggregator", settings.num_aggregator),
            ("numEdgeForwarder", settings.num_edge_forwarder),
        ];
        for (field, value) in counts {
            validate_positive_count(&format!("topologies.{}.{}", name, field), value)
                .map_err(ValidationError::InvalidTopology)?;
        }

        let bitrate = self.bitrate()?;

        Ok(TopologyParams::new(
            settings.num_producer,
            settings.num_aggregator,
            settings.num_edge_forwarder,
            bitrate,
        )
        .with_core_forwarders(settings.core_forwarders.unwrap_or(DEFAULT_NUM_CORE_FORWARDERS))
        .with_link_profile(settings.link))
    }

    /// Aggregation options for the throughput analyzer
    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            time_unit: self.analysis.time_unit,
            accounting: self.analysis.accounting,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut topologies = BTreeMap::new();
        topologies.insert(DEFAULT_TOPOLOGY_TYPE.to_string(), TopologySettings::default());
        Self {
            general: GeneralConfig::default(),
            topologies,
            analysis: AnalysisSettings::default(),
        }
    }
}

/// Shared general configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(alias = "TopologyType")]
    pub topology_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            topology_type: DEFAULT_TOPOLOGY_TYPE.to_string(),
            log_level: Some("info".to_string()),
            results_dir: None,
        }
    }
}

/// Structural parameters of one topology type.
///
/// Key aliases accept the names used by the simulator's legacy settings file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TopologySettings {
    #[serde(alias = "numProducer")]
    pub num_producer: u32,
    #[serde(alias = "numAggregator")]
    pub num_aggregator: u32,
    /// Producers attached to one edge forwarder
    #[serde(alias = "numEdgeForwarder")]
    pub num_edge_forwarder: u32,
    #[serde(alias = "Bitrate")]
    pub bitrate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_forwarders: Option<u32>,
    #[serde(default)]
    pub link: LinkProfile,
    /// Where the generated topology file is written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Throughput analyzer settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AnalysisSettings {
    pub time_unit: TimeUnit,
    pub accounting: ByteAccounting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_log: Option<String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
}
