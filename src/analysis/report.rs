//! Report generation for throughput and utilization analysis.
//!
//! Generates both JSON and human-readable text reports.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::Serialize;

use super::types::*;
use crate::utils::bitrate::RateValue;

/// Run metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub analysis_timestamp: String,
    pub logs: Vec<String>,
    pub layout: LogLayout,
    pub mode: AccumulationMode,
    pub time_unit: TimeUnit,
    pub accounting: ByteAccounting,
}

/// Utilization section, present when a per-link rate was supplied
#[derive(Debug, Clone, Serialize)]
pub struct UtilizationSection {
    pub per_link_rate: RateValue,
    pub per_link_rate_bps: u64,
    #[serde(flatten)]
    pub result: UtilizationResult,
    pub utilization_percent: f64,
}

/// Full analysis report
#[derive(Debug, Clone, Serialize)]
pub struct ThroughputReport {
    pub metadata: ReportMetadata,
    pub samples: u64,
    pub total_interest_bits: u64,
    pub total_data_bits: u64,
    pub total_link_count: u64,
    pub total_elapsed_seconds: f64,
    pub observed_throughput_bps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization: Option<UtilizationSection>,
}

impl ThroughputReport {
    pub fn new(
        logs: &[PathBuf],
        layout: LogLayout,
        totals: &ThroughputTotals,
        utilization: Option<(RateValue, UtilizationResult)>,
    ) -> Self {
        let metadata = ReportMetadata {
            analysis_timestamp: chrono::Utc::now().to_rfc3339(),
            logs: logs.iter().map(|p| p.display().to_string()).collect(),
            layout,
            mode: totals.mode,
            time_unit: totals.time_unit,
            accounting: totals.accounting,
        };

        Self {
            metadata,
            samples: totals.samples,
            total_interest_bits: totals.sum_interest_bits,
            total_data_bits: totals.sum_data_bits,
            total_link_count: totals.sum_link_count,
            total_elapsed_seconds: totals.elapsed_seconds(),
            observed_throughput_bps: totals.observed_throughput_bps(),
            utilization: utilization.map(|(rate, result)| UtilizationSection {
                per_link_rate: rate,
                per_link_rate_bps: rate.bits_per_second(),
                utilization_percent: result.utilization_percent(),
                result,
            }),
        }
    }
}

/// Format an integer with thousands separators, e.g. `1,234,567`
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render the human-readable text report
pub fn render_text_report(report: &ThroughputReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    // Header
    lines.push("=".repeat(80));
    lines.push("                     AGGSIM THROUGHPUT ANALYSIS".to_string());
    lines.push("=".repeat(80));
    lines.push(String::new());

    // Metadata
    lines.push(format!("Analysis Date: {}", report.metadata.analysis_timestamp));
    lines.push(format!("Logs: {}", report.metadata.logs.join(", ")));
    lines.push(format!(
        "Mode: {:?} ({:?}, time unit {})",
        report.metadata.mode, report.metadata.layout, report.metadata.time_unit
    ));
    lines.push(format!("Samples: {}", report.samples));
    lines.push(String::new());

    lines.push(format!(
        "Total interest packet size: {} bits.",
        format_thousands(report.total_interest_bits)
    ));
    lines.push(format!(
        "Total data packet size: {} bits.",
        format_thousands(report.total_data_bits)
    ));
    lines.push(format!("Total elapsed time: {:.6} s", report.total_elapsed_seconds));
    lines.push(format!(
        "Total throughput: {} bits/s",
        format_thousands(report.observed_throughput_bps as u64)
    ));

    if let Some(ref util) = report.utilization {
        lines.push(String::new());
        lines.push(format!("Total links: {}", report.total_link_count));
        lines.push(format!("Bitrate per link: {} ({} bps)", util.per_link_rate, util.per_link_rate_bps));
        lines.push(format!("Total Throughput (bps): {}", util.result.observed_throughput_bps));
        lines.push(format!(
            "Theoretical Max Throughput (bps): {}",
            util.result.theoretical_max_throughput_bps
        ));
        lines.push(format!("Total Bandwidth Utilization (%): {}", util.utilization_percent));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Write the text report to a file
pub fn generate_text_report(report: &ThroughputReport, output_path: &Path) -> Result<()> {
    fs::write(output_path, render_text_report(report))
        .wrap_err_with(|| format!("Failed to write text report to {}", output_path.display()))?;

    log::info!("Text report written to {}", output_path.display());
    Ok(())
}

/// Write the JSON report to a file
pub fn generate_json_report(report: &ThroughputReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .wrap_err("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .wrap_err_with(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::throughput::aggregate_per_sample_rate;
    use crate::analysis::utilization::compute_utilization;
    use crate::utils::bitrate::parse_bitrate;

    fn sample_report() -> ThroughputReport {
        let samples = [
            FlowSample::new(100, 200, 3, 0, 1_000_000),
            FlowSample::new(50, 50, 2, 0, 500_000),
        ];
        let totals = aggregate_per_sample_rate(&samples, &AggregationOptions::default()).unwrap();
        let rate = parse_bitrate("1Kbps").unwrap();
        let result = compute_utilization(&totals, &rate).unwrap();
        ThroughputReport::new(&[PathBuf::from("throughput.txt")], LogLayout::FiveColumn, &totals, Some((rate, result)))
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_000), "1,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_text_report() {
        let text = render_text_report(&sample_report());
        assert!(text.contains("Total interest packet size: 1,200 bits."));
        assert!(text.contains("Total throughput: 4,000 bits/s"));
        assert!(text.contains("Theoretical Max Throughput (bps): 5000"));
        assert!(text.contains("Total Bandwidth Utilization (%): 80"));
    }

    #[test]
    fn test_json_report() {
        let json: serde_json::Value = serde_json::to_value(sample_report()).unwrap();
        assert_eq!(json["total_link_count"], 5);
        assert_eq!(json["utilization"]["per_link_rate"], "1Kbps");
        assert_eq!(json["utilization"]["utilization_ratio"], 0.8);
        assert_eq!(json["metadata"]["mode"], "per_sample_rate");
    }
}
