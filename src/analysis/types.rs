//! Core data types for throughput and bandwidth utilization analysis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors raised while aggregating flow samples or computing utilization
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid total time on line {line}: stop time {stop} must be after start time {start}")]
    NonPositiveElapsedTime { line: u64, start: u64, stop: u64 },

    #[error("Total elapsed time across {samples} pooled records is 0; no consumer stop time was logged")]
    NoElapsedTime { samples: u64 },

    #[error("Throughput for node on line {line} is computed as 0 bps, please check input data")]
    ZeroThroughputSample { line: u64 },

    #[error("Theoretical maximum throughput is 0, indicating no links are available")]
    NoCapacityAvailable,

    #[error("Invalid sample on line {line}: {reason}")]
    InvalidSample { line: u64, reason: String },

    #[error("Malformed log line {line}: {reason}")]
    MalformedLine { line: u64, reason: String },

    #[error("No samples found in throughput log")]
    NoSamples,

    #[error("Cannot merge partial totals: {0}")]
    IncompatibleTotals(String),

    #[error("Merged {field} overflow")]
    TotalsOverflow { field: &'static str },
}

/// Time unit of the start/stop columns in a throughput log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    /// The simulator logs flow timing in microseconds
    #[default]
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Number of log time units per second
    pub fn per_second(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1e3,
            TimeUnit::Microseconds => 1e6,
            TimeUnit::Nanoseconds => 1e9,
        }
    }

    /// Convert a raw log duration to seconds
    pub fn to_seconds(self, raw: u64) -> f64 {
        raw as f64 / self.per_second()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "ms" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "us" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ns" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            _ => Err(format!("Unknown time unit '{}' (expected s, ms, us or ns)", s)),
        }
    }
}

/// Which byte counts contribute to throughput
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteAccounting {
    #[default]
    InterestAndData,
    /// Ignore interest packets and count returned data only
    DataOnly,
}

/// How per-sample measurements are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulationMode {
    /// Sum of `bits / elapsed` computed per sample
    PerSampleRate,
    /// `Σbits / Σelapsed` computed once over grand totals
    Pooled,
}

/// Column layout of a throughput log. Never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLayout {
    /// `interestBytes dataBytes linkCount startTime stopTime`
    FiveColumn,
    /// `interestBytes dataBytes stopTimeTotal`
    ThreeColumn,
}

impl LogLayout {
    pub fn columns(self) -> usize {
        match self {
            LogLayout::FiveColumn => 5,
            LogLayout::ThreeColumn => 3,
        }
    }
}

/// Aggregation settings passed explicitly into each analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationOptions {
    pub time_unit: TimeUnit,
    pub accounting: ByteAccounting,
}

/// One per-flow measurement from the five-column log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSample {
    pub interest_bytes: u64,
    pub data_bytes: u64,
    pub link_count: u64,
    pub start_time: u64,
    pub stop_time: u64,
}

impl FlowSample {
    pub fn new(interest_bytes: u64, data_bytes: u64, link_count: u64, start_time: u64, stop_time: u64) -> Self {
        Self {
            interest_bytes,
            data_bytes,
            link_count,
            start_time,
            stop_time,
        }
    }
}

/// One row of the three-column pooled log.
///
/// Only the consumer records the simulation stop time; aggregator rows carry 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PooledRecord {
    pub interest_bytes: u64,
    pub data_bytes: u64,
    pub stop_time_total: u64,
}

/// Running totals produced by the throughput aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputTotals {
    pub mode: AccumulationMode,
    pub time_unit: TimeUnit,
    pub accounting: ByteAccounting,
    pub samples: u64,
    pub sum_interest_bits: u64,
    pub sum_data_bits: u64,
    pub sum_link_count: u64,
    /// Accumulated elapsed time, in `time_unit`
    pub sum_elapsed: u64,
    /// Sum of per-sample rates; only meaningful in per-sample-rate mode
    pub sum_rate_bps: f64,
}

impl ThroughputTotals {
    pub fn empty(mode: AccumulationMode, options: &AggregationOptions) -> Self {
        Self {
            mode,
            time_unit: options.time_unit,
            accounting: options.accounting,
            samples: 0,
            sum_interest_bits: 0,
            sum_data_bits: 0,
            sum_link_count: 0,
            sum_elapsed: 0,
            sum_rate_bps: 0.0,
        }
    }

    /// Bits that count toward throughput under the configured accounting
    pub fn counted_bits(&self) -> u128 {
        match self.accounting {
            ByteAccounting::InterestAndData => self.sum_interest_bits as u128 + self.sum_data_bits as u128,
            ByteAccounting::DataOnly => self.sum_data_bits as u128,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.time_unit.to_seconds(self.sum_elapsed)
    }

    /// Observed global throughput in bits/second
    pub fn observed_throughput_bps(&self) -> f64 {
        match self.mode {
            AccumulationMode::PerSampleRate => self.sum_rate_bps,
            AccumulationMode::Pooled => {
                let secs = self.elapsed_seconds();
                if secs > 0.0 {
                    self.counted_bits() as f64 / secs
                } else {
                    0.0
                }
            }
        }
    }

    /// Combine two partial accumulators by field-wise summation.
    ///
    /// # Errors
    /// `AnalysisError::IncompatibleTotals` when the two sides were built with
    /// different mode, time unit or accounting; `AnalysisError::TotalsOverflow`
    /// when a running sum does not fit in `u64`.
    pub fn merge(self, other: &ThroughputTotals) -> Result<Self, AnalysisError> {
        if self.mode != other.mode {
            return Err(AnalysisError::IncompatibleTotals(format!(
                "mode {:?} vs {:?}",
                self.mode, other.mode
            )));
        }
        if self.time_unit != other.time_unit {
            return Err(AnalysisError::IncompatibleTotals(format!(
                "time unit {} vs {}",
                self.time_unit, other.time_unit
            )));
        }
        if self.accounting != other.accounting {
            return Err(AnalysisError::IncompatibleTotals(format!(
                "accounting {:?} vs {:?}",
                self.accounting, other.accounting
            )));
        }

        let sum = |field: &'static str, a: u64, b: u64| {
            a.checked_add(b).ok_or(AnalysisError::TotalsOverflow { field })
        };

        Ok(Self {
            samples: sum("samples", self.samples, other.samples)?,
            sum_interest_bits: sum("interest bits", self.sum_interest_bits, other.sum_interest_bits)?,
            sum_data_bits: sum("data bits", self.sum_data_bits, other.sum_data_bits)?,
            sum_link_count: sum("link count", self.sum_link_count, other.sum_link_count)?,
            sum_elapsed: sum("elapsed time", self.sum_elapsed, other.sum_elapsed)?,
            sum_rate_bps: self.sum_rate_bps + other.sum_rate_bps,
            ..self
        })
    }
}

/// Observed vs. theoretical throughput
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationResult {
    pub observed_throughput_bps: f64,
    pub theoretical_max_throughput_bps: f64,
    /// Not clamped: a value above 1 signals a modeling inconsistency
    pub utilization_ratio: f64,
}

impl UtilizationResult {
    pub fn utilization_percent(&self) -> f64 {
        self.utilization_ratio * 100.0
    }
}
