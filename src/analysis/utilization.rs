//! Bandwidth utilization against the theoretical link capacity.

use super::types::*;
use crate::utils::bitrate::RateValue;

/// Theoretical maximum throughput: every counted link running at `per_link_rate`
pub fn theoretical_max_throughput_bps(link_count: u64, per_link_rate: &RateValue) -> f64 {
    (link_count as u128 * per_link_rate.bits_per_second() as u128) as f64
}

/// Compare observed throughput with `sum_link_count × per_link_rate`.
///
/// The ratio is reported as-is; values above 1 are surfaced with a warning
/// rather than clamped.
///
/// # Errors
/// `AnalysisError::NoCapacityAvailable` when the theoretical maximum is 0
/// (no links counted, or a zero link rate).
pub fn compute_utilization(
    totals: &ThroughputTotals,
    per_link_rate: &RateValue,
) -> Result<UtilizationResult, AnalysisError> {
    let theoretical = theoretical_max_throughput_bps(totals.sum_link_count, per_link_rate);
    if theoretical <= 0.0 {
        return Err(AnalysisError::NoCapacityAvailable);
    }

    let observed = totals.observed_throughput_bps();
    let ratio = observed / theoretical;

    if ratio > 1.0 {
        log::warn!(
            "Observed throughput {:.0} bps exceeds theoretical maximum {:.0} bps (utilization {:.2})",
            observed,
            theoretical,
            ratio
        );
    }

    Ok(UtilizationResult {
        observed_throughput_bps: observed,
        theoretical_max_throughput_bps: theoretical,
        utilization_ratio: ratio,
    })
}
