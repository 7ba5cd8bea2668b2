use crate::config::{Config, TopologySettings};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Suffix of per-topology sections in the legacy INI settings file
const INI_TOPOLOGY_SUFFIX: &str = "Topology";

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    check_config_compatibility(config_path)?;

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open config file {}", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse config file {}", config_path.display()))?;

    info!(
        "Using topology type '{}' ({} topology section(s))",
        config.general.topology_type,
        config.topologies.len()
    );

    config.validate()?;

    Ok(config)
}

/// Command-line values that override the active topology section
#[derive(Debug, Clone, Default)]
pub struct TopologyCliOverrides {
    pub producers: Option<u32>,
    pub aggregators: Option<u32>,
    pub producers_per_edge: Option<u32>,
    pub bitrate: Option<String>,
    pub core_forwarders: Option<u32>,
}

impl TopologyCliOverrides {
    pub fn is_empty(&self) -> bool {
        self.producers.is_none()
            && self.aggregators.is_none()
            && self.producers_per_edge.is_none()
            && self.bitrate.is_none()
            && self.core_forwarders.is_none()
    }
}

/// Apply CLI overrides to the active topology and re-validate
pub fn apply_topology_overrides(config: &mut Config, overrides: &TopologyCliOverrides) -> Result<()> {
    let topology = config.active_topology_mut();

    if let Some(producers) = overrides.producers {
        info!("Overriding numProducer: {} -> {}", topology.num_producer, producers);
        topology.num_producer = producers;
    }

    if let Some(aggregators) = overrides.aggregators {
        info!("Overriding numAggregator: {} -> {}", topology.num_aggregator, aggregators);
        topology.num_aggregator = aggregators;
    }

    if let Some(per_edge) = overrides.producers_per_edge {
        info!("Overriding numEdgeForwarder: {} -> {}", topology.num_edge_forwarder, per_edge);
        topology.num_edge_forwarder = per_edge;
    }

    if let Some(bitrate) = &overrides.bitrate {
        info!("Overriding Bitrate: {:?} -> {}", topology.bitrate, bitrate);
        topology.bitrate = bitrate.clone();
    }

    if let Some(core) = overrides.core_forwarders {
        info!("Overriding core_forwarders: {:?} -> {}", topology.core_forwarders, core);
        topology.core_forwarders = Some(core);
    }

    config.validate()?;

    Ok(())
}

/// Reject legacy INI settings files passed where YAML is expected
pub fn check_config_compatibility(config_path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(config_path)
        .wrap_err_with(|| format!("Failed to read config file {}", config_path.display()))?;

    let looks_like_ini = content
        .lines()
        .map(str::trim)
        .any(|line| line == "[General]");

    if looks_like_ini {
        bail!(
            "{} looks like a legacy INI settings file. Convert it with `aggsim --migrate-ini {} --migrate-output config.yaml`",
            config_path.display(),
            config_path.display()
        );
    }

    if content.contains("DataCenterTopology:") {
        warn!("Section 'DataCenterTopology' is keyed by INI section name; use the topology type ('DataCenter') instead");
    }

    Ok(())
}

/// Parse INI text into `section -> key -> value`.
///
/// Keys outside any section, comment lines (`;` or `#`) and blank lines are skipped.
fn parse_ini(content: &str) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
    let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    let mut current: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .or_else(|| line.split_once(':'))
            .ok_or_else(|| eyre!("line {}: expected 'key = value', found '{}'", idx + 1, line))?;

        match &current {
            Some(section) => {
                sections
                    .entry(section.clone())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            None => debug!("Ignoring key '{}' outside of any section", key.trim()),
        }
    }

    Ok(sections)
}

fn ini_count(section: &str, values: &BTreeMap<String, String>, key: &str) -> Result<u32> {
    match values.get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| eyre!("[{}] {} must be a non-negative integer, got '{}'", section, key, raw)),
        None => Ok(0),
    }
}

/// Convert legacy INI settings into a `Config`
pub fn config_from_ini(content: &str) -> Result<Config> {
    let sections = parse_ini(content)?;

    let mut config = Config::default();
    config.topologies.clear();

    let general = sections
        .get("General")
        .ok_or_else(|| eyre!("Missing [General] section"))?;
    config.general.topology_type = general
        .get("TopologyType")
        .cloned()
        .ok_or_else(|| eyre!("Missing TopologyType in [General]"))?;

    for (section, values) in &sections {
        let Some(name) = section.strip_suffix(INI_TOPOLOGY_SUFFIX) else {
            if section != "General" {
                debug!("Skipping section [{}]", section);
            }
            continue;
        };
        if name.is_empty() {
            continue;
        }

        let settings = TopologySettings {
            num_producer: ini_count(section, values, "numProducer")?,
            num_aggregator: ini_count(section, values, "numAggregator")?,
            num_edge_forwarder: ini_count(section, values, "numEdgeForwarder")?,
            bitrate: values.get("Bitrate").cloned().unwrap_or_default(),
            ..TopologySettings::default()
        };
        config.topologies.insert(name.to_string(), settings);
    }

    Ok(config)
}

/// Migrate a legacy INI settings file to the YAML format
pub fn migrate_ini_config(ini_path: &Path, yaml_path: &Path) -> Result<Config> {
    info!("Migrating configuration from {:?} to {:?}", ini_path, yaml_path);

    let content = std::fs::read_to_string(ini_path)
        .wrap_err_with(|| format!("Failed to read {}", ini_path.display()))?;

    let config = config_from_ini(&content)
        .wrap_err_with(|| format!("Failed to convert {}", ini_path.display()))?;

    if let Err(e) = config.validate() {
        warn!("Migrated configuration does not validate yet: {}", e);
    }

    let yaml = serde_yaml::to_string(&config).wrap_err("Failed to serialize migrated configuration")?;
    std::fs::write(yaml_path, yaml)
        .wrap_err_with(|| format!("Failed to write {}", yaml_path.display()))?;

    info!("Migration complete: {} topology section(s)", config.topologies.len());
    Ok(config)
}
