//! Throughput and bandwidth utilization analysis for aggregation simulations.
//!
//! Reads the simulator's throughput logs and reports global throughput, and
//! for the five-column layout, utilization against the theoretical capacity.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};

use aggsim::analysis::{
    self, compute_utilization, AccumulationMode, AggregationOptions, ByteAccounting, LogLayout,
    ThroughputReport, ThroughputTotals, TimeUnit,
};
use aggsim::config::Config;
use aggsim::config_loader;
use aggsim::utils::{parse_bitrate, validate_log_file, RateValue};

#[derive(Parser)]
#[command(name = "flow-analyzer")]
#[command(about = "Throughput and bandwidth utilization analysis for aggregation simulations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration supplying Bitrate and analysis settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Per-link bitrate, e.g. 100Mbps (overrides the configured Bitrate)
    #[arg(short, long, global = true)]
    bitrate: Option<String>,

    /// Time unit of the log's time columns (s, ms, us, ns)
    #[arg(long, global = true)]
    time_unit: Option<TimeUnit>,

    /// Count data bytes only, ignoring interest bytes
    #[arg(long, global = true)]
    data_only: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Bandwidth utilization from a five-column log (per-sample rates)
    Utilization {
        /// Throughput log(s); several files are parsed in parallel and merged
        logs: Vec<PathBuf>,
    },

    /// Pooled global throughput
    Throughput {
        /// Throughput log(s); several files are parsed in parallel and merged
        logs: Vec<PathBuf>,

        /// Column layout of the log
        #[arg(long, value_enum, default_value_t = Layout::Five)]
        layout: Layout,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layout {
    /// interestBytes dataBytes linkCount startTime stopTime
    Five,
    /// interestBytes dataBytes stopTimeTotal
    Three,
}

impl From<Layout> for LogLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Five => LogLayout::FiveColumn,
            Layout::Three => LogLayout::ThreeColumn,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    // Set thread pool size
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .wrap_err("Failed to configure thread pool")?;
    }

    let config = cli
        .config
        .as_deref()
        .map(config_loader::load_config)
        .transpose()?;
    let options = aggregation_options(&cli, config.as_ref());

    let report = match &cli.command {
        Commands::Utilization { logs } => {
            let logs = resolve_logs(logs, config.as_ref())?;
            let rate = per_link_rate(&cli, config.as_ref())?;

            let totals = aggregate(&logs, LogLayout::FiveColumn, AccumulationMode::PerSampleRate, &options)?;
            let result = compute_utilization(&totals, &rate)
                .wrap_err("Cannot compute bandwidth utilization")?;

            log::info!(
                "Utilization: {:.2}% of {:.0} bps",
                result.utilization_percent(),
                result.theoretical_max_throughput_bps
            );
            ThroughputReport::new(&logs, LogLayout::FiveColumn, &totals, Some((rate, result)))
        }
        Commands::Throughput { logs, layout } => {
            let logs = resolve_logs(logs, config.as_ref())?;
            let layout = LogLayout::from(*layout);

            let totals = aggregate(&logs, layout, AccumulationMode::Pooled, &options)?;
            log::info!("Total throughput: {:.0} bps", totals.observed_throughput_bps());
            ThroughputReport::new(&logs, layout, &totals, None)
        }
    };

    match (&cli.output, cli.format) {
        (Some(path), OutputFormat::Text) => analysis::generate_text_report(&report, path)?,
        (Some(path), OutputFormat::Json) => analysis::generate_json_report(&report, path)?,
        (None, OutputFormat::Text) => print!("{}", analysis::render_text_report(&report)),
        (None, OutputFormat::Json) => println!(
            "{}",
            serde_json::to_string_pretty(&report).wrap_err("Failed to serialize report to JSON")?
        ),
    }

    Ok(())
}

/// Analysis settings from the config file, with command-line overrides
fn aggregation_options(cli: &Cli, config: Option<&Config>) -> AggregationOptions {
    let mut options = config.map(Config::aggregation_options).unwrap_or_default();
    if let Some(unit) = cli.time_unit {
        options.time_unit = unit;
    }
    if cli.data_only {
        options.accounting = ByteAccounting::DataOnly;
    }
    options
}

fn per_link_rate(cli: &Cli, config: Option<&Config>) -> Result<RateValue> {
    match (&cli.bitrate, config) {
        (Some(raw), _) => parse_bitrate(raw).wrap_err("Invalid --bitrate"),
        (None, Some(config)) => Ok(config.bitrate()?),
        (None, None) => bail!("A per-link bitrate is required: pass --bitrate or --config"),
    }
}

/// Log paths from the command line, falling back to `analysis.throughput_log`
fn resolve_logs(logs: &[PathBuf], config: Option<&Config>) -> Result<Vec<PathBuf>> {
    let logs = if logs.is_empty() {
        let configured = config
            .and_then(|c| c.analysis.throughput_log.as_deref())
            .ok_or_else(|| eyre!("No throughput log given and analysis.throughput_log is not configured"))?;
        vec![PathBuf::from(configured)]
    } else {
        logs.to_vec()
    };

    for log in &logs {
        validate_log_file(log).map_err(|e| eyre!(e))?;
    }
    Ok(logs)
}

fn aggregate(
    logs: &[PathBuf],
    layout: LogLayout,
    mode: AccumulationMode,
    options: &AggregationOptions,
) -> Result<ThroughputTotals> {
    match logs {
        [single] => analysis::aggregate_log_file(single, layout, mode, options),
        _ => analysis::aggregate_shards(logs, layout, mode, options),
    }
}
