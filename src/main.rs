use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aggsim::config::Config;
use aggsim::config_loader::{self, TopologyCliOverrides};
use aggsim::topology::{self, TopologyDescription};
use aggsim::utils::duration::parse_delay;

/// Topology generator for in-network aggregation simulations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output path for the topology file (default: <results_dir>/<Type>Topology.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of producers (overrides numProducer)
    #[arg(short = 'p', long)]
    producers: Option<u32>,

    /// Number of aggregators (overrides numAggregator)
    #[arg(short = 'a', long)]
    aggregators: Option<u32>,

    /// Producers attached to one edge forwarder (overrides numEdgeForwarder)
    #[arg(short = 'k', long)]
    producers_per_edge: Option<u32>,

    /// Per-link bitrate, e.g. 100Mbps (overrides Bitrate)
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Number of core forwarders
    #[arg(long)]
    core_forwarders: Option<u32>,

    /// Link delay, e.g. 2ms or 500us
    #[arg(long, value_parser = parse_delay)]
    link_delay: Option<Duration>,

    /// Print the topology to stdout instead of writing a file
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Convert a legacy INI settings file to YAML and exit
    #[arg(long, value_name = "INI")]
    migrate_ini: Option<PathBuf>,

    /// Output path for the migrated configuration
    #[arg(long, requires = "migrate_ini")]
    migrate_output: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> TopologyCliOverrides {
        TopologyCliOverrides {
            producers: self.producers,
            aggregators: self.aggregators,
            producers_per_edge: self.producers_per_edge,
            bitrate: self.bitrate.clone(),
            core_forwarders: self.core_forwarders,
        }
    }
}

/// Resolve where the topology file goes
fn output_path(args: &Args, config: &Config) -> Result<PathBuf> {
    if let Some(path) = &args.output {
        return Ok(path.clone());
    }

    let (name, settings) = config.active_topology()?;
    if let Some(path) = &settings.output {
        return Ok(PathBuf::from(path));
    }

    let dir = config
        .general
        .results_dir
        .as_deref()
        .map(Path::new)
        .unwrap_or_else(|| Path::new("."));
    Ok(dir.join(format!("{}Topology.txt", name)))
}

fn log_summary(description: &TopologyDescription) {
    info!(
        "Generated {} nodes ({} edge forwarders, {} core forwarders) and {} links",
        description.nodes.len(),
        description.num_edge_forwarders,
        description.num_core_forwarders,
        description.links.len()
    );
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let level = args.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    if let Some(ini_path) = &args.migrate_ini {
        let output_path = args.migrate_output.clone().unwrap_or_else(|| ini_path.with_extension("yaml"));
        config_loader::migrate_ini_config(ini_path, &output_path)?;
        info!("Configuration migrated successfully to: {:?}", output_path);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => config_loader::load_config(path)?,
        None => {
            let overrides = args.overrides();
            if overrides.is_empty() {
                bail!("Either --config or the topology parameters (--producers, --aggregators, --producers-per-edge, --bitrate) are required");
            }
            info!("No configuration file given, using command-line parameters");
            Config::default()
        }
    };

    config_loader::apply_topology_overrides(&mut config, &args.overrides())?;

    if let Some(delay) = args.link_delay {
        info!("Overriding link delay: {:?}", delay);
        config.active_topology_mut().link.delay = delay;
    }

    let params = config.topology_params()?;
    info!(
        "Topology: {} producers, {} aggregators, {} producers per edge forwarder, {} per link",
        params.num_producers, params.num_aggregators, params.num_producers_per_edge, params.bitrate
    );

    let description = topology::generate(&params).wrap_err("Failed to generate topology")?;
    log_summary(&description);

    if args.dry_run {
        print!("{}", topology::render_topology(&description));
        return Ok(());
    }

    let path = output_path(&args, &config)?;
    topology::write_topology_file(&description, &path)?;

    info!("Topology file has been generated: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "aggsim",
            "--config", "test.yaml",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("test.yaml")));
        assert_eq!(args.output, None);
        assert!(args.overrides().is_empty());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_override_args() {
        let args = Args::parse_from([
            "aggsim",
            "-p", "4",
            "-a", "2",
            "-k", "2",
            "--bitrate", "100Mbps",
            "--link-delay", "500us",
            "--dry-run",
        ]);

        let overrides = args.overrides();
        assert_eq!(overrides.producers, Some(4));
        assert_eq!(overrides.aggregators, Some(2));
        assert_eq!(overrides.producers_per_edge, Some(2));
        assert_eq!(overrides.bitrate.as_deref(), Some("100Mbps"));
        assert_eq!(args.link_delay, Some(Duration::from_micros(500)));
        assert!(args.dry_run);
    }

    #[test]
    fn test_rejects_negative_count() {
        assert!(Args::try_parse_from(["aggsim", "--producers", "-4"]).is_err());
    }

    #[test]
    fn test_migration_args() {
        let args = Args::parse_from([
            "aggsim",
            "--migrate-ini", "config.ini",
            "--migrate-output", "config.yaml",
        ]);

        assert_eq!(args.migrate_ini, Some(PathBuf::from("config.ini")));
        assert_eq!(args.migrate_output, Some(PathBuf::from("config.yaml")));
    }

    #[test]
    fn test_default_output_path() {
        let args = Args::parse_from(["aggsim", "-p", "1"]);
        let mut config = Config::default();
        assert_eq!(output_path(&args, &config).unwrap(), PathBuf::from("./DataCenterTopology.txt"));

        config.general.results_dir = Some("results".to_string());
        assert_eq!(output_path(&args, &config).unwrap(), PathBuf::from("results/DataCenterTopology.txt"));
    }
}
