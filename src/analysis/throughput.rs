//! Throughput aggregation for flow logs.
//!
//! Reduces a stream of flow samples into `ThroughputTotals` in a single
//! forward pass. Two reductions are supported:
//!
//! - per-sample-rate: every sample contributes `bits / elapsed` and the rates
//!   are summed
//! - pooled: bits and elapsed time are summed separately and divided once

use super::types::*;

/// Incremental fold over flow samples
#[derive(Debug, Clone)]
pub struct ThroughputAggregator {
    totals: ThroughputTotals,
}

impl ThroughputAggregator {
    pub fn new(mode: AccumulationMode, options: &AggregationOptions) -> Self {
        Self {
            totals: ThroughputTotals::empty(mode, options),
        }
    }

    pub fn per_sample_rate(options: &AggregationOptions) -> Self {
        Self::new(AccumulationMode::PerSampleRate, options)
    }

    pub fn pooled(options: &AggregationOptions) -> Self {
        Self::new(AccumulationMode::Pooled, options)
    }

    pub fn mode(&self) -> AccumulationMode {
        self.totals.mode
    }

    /// Totals accumulated so far
    pub fn totals(&self) -> &ThroughputTotals {
        &self.totals
    }

    /// Add the next sample, numbering it by its position in the stream
    pub fn push(&mut self, sample: &FlowSample) -> Result<(), AnalysisError> {
        let line = self.totals.samples + 1;
        self.push_line(line, sample)
    }

    /// Add a sample read from the given log line
    pub fn push_line(&mut self, line: u64, sample: &FlowSample) -> Result<(), AnalysisError> {
        if sample.link_count == 0 {
            return Err(AnalysisError::InvalidSample {
                line,
                reason: "link count must be positive".to_string(),
            });
        }

        let elapsed = match sample.stop_time.checked_sub(sample.start_time) {
            Some(elapsed) if elapsed > 0 => elapsed,
            _ => {
                return Err(AnalysisError::NonPositiveElapsedTime {
                    line,
                    start: sample.start_time,
                    stop: sample.stop_time,
                })
            }
        };

        let interest_bits = to_bits(line, sample.interest_bytes)?;
        let data_bits = to_bits(line, sample.data_bytes)?;

        let rate = if self.totals.mode == AccumulationMode::PerSampleRate {
            let counted = match self.totals.accounting {
                ByteAccounting::InterestAndData => interest_bits as f64 + data_bits as f64,
                ByteAccounting::DataOnly => data_bits as f64,
            };
            let rate = counted / self.totals.time_unit.to_seconds(elapsed);
            if rate == 0.0 {
                return Err(AnalysisError::ZeroThroughputSample { line });
            }
            rate
        } else {
            0.0
        };

        let sum_interest_bits = add(line, self.totals.sum_interest_bits, interest_bits)?;
        let sum_data_bits = add(line, self.totals.sum_data_bits, data_bits)?;
        let sum_elapsed = add(line, self.totals.sum_elapsed, elapsed)?;
        let sum_link_count = add(line, self.totals.sum_link_count, sample.link_count)?;

        self.totals.sum_interest_bits = sum_interest_bits;
        self.totals.sum_data_bits = sum_data_bits;
        self.totals.sum_elapsed = sum_elapsed;
        self.totals.sum_link_count = sum_link_count;
        self.totals.sum_rate_bps += rate;
        self.totals.samples += 1;
        Ok(())
    }

    /// Add a three-column pooled record.
    ///
    /// Rows with a zero time column are legal; only the grand total is checked.
    pub fn push_pooled_record(&mut self, line: u64, record: &PooledRecord) -> Result<(), AnalysisError> {
        if self.totals.mode != AccumulationMode::Pooled {
            return Err(AnalysisError::InvalidSample {
                line,
                reason: "three-column records only support pooled accumulation".to_string(),
            });
        }

        let sum_interest_bits = add(line, self.totals.sum_interest_bits, to_bits(line, record.interest_bytes)?)?;
        let sum_data_bits = add(line, self.totals.sum_data_bits, to_bits(line, record.data_bytes)?)?;
        let sum_elapsed = add(line, self.totals.sum_elapsed, record.stop_time_total)?;

        self.totals.sum_interest_bits = sum_interest_bits;
        self.totals.sum_data_bits = sum_data_bits;
        self.totals.sum_elapsed = sum_elapsed;
        self.totals.samples += 1;
        Ok(())
    }

    /// Fold another partial pass (e.g. a separate log shard) into this one
    pub fn absorb(mut self, other: &ThroughputAggregator) -> Result<Self, AnalysisError> {
        self.totals = self.totals.merge(&other.totals)?;
        Ok(self)
    }

    /// Finish the pass and hand out the read-only totals
    pub fn finish(self) -> Result<ThroughputTotals, AnalysisError> {
        if self.totals.samples == 0 {
            return Err(AnalysisError::NoSamples);
        }
        if self.totals.sum_elapsed == 0 {
            return Err(AnalysisError::NoElapsedTime {
                samples: self.totals.samples,
            });
        }
        Ok(self.totals)
    }
}

fn to_bits(line: u64, bytes: u64) -> Result<u64, AnalysisError> {
    bytes.checked_mul(8).ok_or_else(|| AnalysisError::InvalidSample {
        line,
        reason: format!("byte count {} overflows when converted to bits", bytes),
    })
}

fn add(line: u64, total: u64, value: u64) -> Result<u64, AnalysisError> {
    total.checked_add(value).ok_or_else(|| AnalysisError::InvalidSample {
        line,
        reason: "running total overflows".to_string(),
    })
}

/// Sum per-sample rates `(interestBits + dataBits) / elapsed` over all samples
pub fn aggregate_per_sample_rate<'a, I>(samples: I, options: &AggregationOptions) -> Result<ThroughputTotals, AnalysisError>
where
    I: IntoIterator<Item = &'a FlowSample>,
{
    let mut aggregator = ThroughputAggregator::per_sample_rate(options);
    for sample in samples {
        aggregator.push(sample)?;
    }
    aggregator.finish()
}

/// Sum bits and elapsed time separately, dividing once at the end
pub fn aggregate_pooled<'a, I>(samples: I, options: &AggregationOptions) -> Result<ThroughputTotals, AnalysisError>
where
    I: IntoIterator<Item = &'a FlowSample>,
{
    let mut aggregator = ThroughputAggregator::pooled(options);
    for sample in samples {
        aggregator.push(sample)?;
    }
    aggregator.finish()
}

/// Pooled aggregation over the three-column layout
pub fn aggregate_pooled_records<'a, I>(records: I, options: &AggregationOptions) -> Result<ThroughputTotals, AnalysisError>
where
    I: IntoIterator<Item = &'a PooledRecord>,
{
    let mut aggregator = ThroughputAggregator::pooled(options);
    for (i, record) in records.into_iter().enumerate() {
        aggregator.push_pooled_record(i as u64 + 1, record)?;
    }
    aggregator.finish()
}
