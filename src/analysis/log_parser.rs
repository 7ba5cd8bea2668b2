//! Log parsing for simulator throughput logs.
//!
//! Reads the fixed-column throughput logs line by line and feeds them into a
//! `ThroughputAggregator`, so memory use does not grow with log size. Several
//! log shards can be parsed in parallel and merged.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{bail, Result, WrapErr};
use rayon::prelude::*;

use super::throughput::ThroughputAggregator;
use super::types::*;

/// Split a line into exactly `N` unsigned integer columns.
///
/// Returns `Ok(None)` for blank lines.
fn parse_columns<const N: usize>(line_no: u64, line: &str) -> Result<Option<[u64; N]>, AnalysisError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() != N {
        return Err(AnalysisError::MalformedLine {
            line: line_no,
            reason: format!("expected {} columns, found {}", N, fields.len()),
        });
    }

    let mut values = [0u64; N];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = field.parse().map_err(|_| AnalysisError::MalformedLine {
            line: line_no,
            reason: format!("'{}' is not a non-negative integer", field),
        })?;
    }
    Ok(Some(values))
}

/// Parse a five-column line: `interestBytes dataBytes linkCount startTime stopTime`
pub fn parse_flow_line(line_no: u64, line: &str) -> Result<Option<FlowSample>, AnalysisError> {
    Ok(parse_columns::<5>(line_no, line)?
        .map(|[interest, data, links, start, stop]| FlowSample::new(interest, data, links, start, stop)))
}

/// Parse a three-column line: `interestBytes dataBytes stopTimeTotal`
pub fn parse_pooled_line(line_no: u64, line: &str) -> Result<Option<PooledRecord>, AnalysisError> {
    Ok(parse_columns::<3>(line_no, line)?.map(|[interest, data, stop]| PooledRecord {
        interest_bytes: interest,
        data_bytes: data,
        stop_time_total: stop,
    }))
}

/// Feed every line of a log file into `aggregator`
pub fn fold_log_file(path: &Path, layout: LogLayout, aggregator: &mut ThroughputAggregator) -> Result<()> {
    if layout == LogLayout::ThreeColumn && aggregator.mode() != AccumulationMode::Pooled {
        bail!("The three-column log layout only supports pooled throughput");
    }

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open log file: {}", path.display()))?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    for (idx, line_result) in reader.lines().enumerate() {
        let line_no = idx as u64 + 1;
        let line = line_result
            .wrap_err_with(|| format!("Failed to read line {} of {}", line_no, path.display()))?;

        let pushed = match layout {
            LogLayout::FiveColumn => match parse_flow_line(line_no, &line) {
                Ok(Some(sample)) => aggregator.push_line(line_no, &sample),
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            },
            LogLayout::ThreeColumn => match parse_pooled_line(line_no, &line) {
                Ok(Some(record)) => {
                    if record.stop_time_total == 0 {
                        log::trace!("{}:{} carries no stop time", path.display(), line_no);
                    }
                    aggregator.push_pooled_record(line_no, &record)
                }
                Ok(None) => Ok(()),
                Err(e) => Err(e),
            },
        };
        pushed.wrap_err_with(|| format!("Invalid throughput log {}", path.display()))?;
    }

    log::debug!(
        "Parsed {}: {} samples, {} links",
        path.display(),
        aggregator.totals().samples,
        aggregator.totals().sum_link_count
    );
    Ok(())
}

/// Aggregate a single throughput log
pub fn aggregate_log_file(
    path: &Path,
    layout: LogLayout,
    mode: AccumulationMode,
    options: &AggregationOptions,
) -> Result<ThroughputTotals> {
    let mut aggregator = ThroughputAggregator::new(mode, options);
    fold_log_file(path, layout, &mut aggregator)?;
    aggregator
        .finish()
        .wrap_err_with(|| format!("Cannot compute throughput from {}", path.display()))
}

/// Aggregate several log shards in parallel.
///
/// Each shard is folded independently, then partial totals are merged in input
/// order so the result does not depend on scheduling. Per-run checks (empty
/// input, missing stop time) apply to the merged totals, not to each shard.
pub fn aggregate_shards(
    paths: &[PathBuf],
    layout: LogLayout,
    mode: AccumulationMode,
    options: &AggregationOptions,
) -> Result<ThroughputTotals> {
    log::info!("Parsing {} throughput log shard(s) in parallel...", paths.len());

    let partials: Vec<ThroughputAggregator> = paths
        .par_iter()
        .map(|path| -> Result<ThroughputAggregator> {
            let mut aggregator = ThroughputAggregator::new(mode, options);
            fold_log_file(path, layout, &mut aggregator)?;
            Ok(aggregator)
        })
        .collect::<Result<_>>()?;

    let merged = partials
        .iter()
        .try_fold(ThroughputAggregator::new(mode, options), |acc, part| acc.absorb(part))
        .wrap_err("Cannot merge throughput log shards")?;

    log::info!(
        "Parsed {} samples across {} shard(s)",
        merged.totals().samples,
        paths.len()
    );

    merged
        .finish()
        .wrap_err("Cannot compute throughput from the given logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_parse_flow_line() {
        assert_eq!(
            parse_flow_line(1, "100 200 3 0 1000000").unwrap(),
            Some(FlowSample::new(100, 200, 3, 0, 1_000_000))
        );
        assert_eq!(parse_flow_line(1, "  \t ").unwrap(), None);
        assert_eq!(parse_flow_line(1, "1\t2\t3\t4\t5").unwrap(), Some(FlowSample::new(1, 2, 3, 4, 5)));
    }

    #[test]
    fn test_parse_flow_line_malformed() {
        assert!(matches!(
            parse_flow_line(7, "100 200 3 0"),
            Err(AnalysisError::MalformedLine { line: 7, .. })
        ));
        assert!(matches!(
            parse_flow_line(8, "100 200 3 0 1.5"),
            Err(AnalysisError::MalformedLine { line: 8, .. })
        ));
        assert!(matches!(
            parse_flow_line(9, "100 -200 3 0 15"),
            Err(AnalysisError::MalformedLine { line: 9, .. })
        ));
    }

    #[test]
    fn test_three_column_is_not_five_column() {
        assert!(parse_flow_line(1, "100 200 10").is_err());
        assert!(parse_pooled_line(1, "100 200 3 0 10").is_err());
        assert_eq!(
            parse_pooled_line(1, "100 200 10").unwrap(),
            Some(PooledRecord { interest_bytes: 100, data_bytes: 200, stop_time_total: 10 })
        );
    }

    #[test]
    fn test_aggregate_log_file_skips_blank_lines() {
        let file = log_file("100 200 3 0 1000000\n\n50 50 2 0 500000\n");
        let totals = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .unwrap();

        assert_eq!(totals.samples, 2);
        assert_eq!(totals.sum_link_count, 5);
        assert_eq!(totals.observed_throughput_bps(), 4000.0);
    }

    #[test]
    fn test_aggregate_log_file_reports_line() {
        let file = log_file("100 200 3 0 1000000\n\n50 50 2 700 700\n");
        let err = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::Pooled,
            &AggregationOptions::default(),
        )
        .unwrap_err();

        let cause = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(cause, &AnalysisError::NonPositiveElapsedTime { line: 3, start: 700, stop: 700 });
    }

    #[test]
    fn test_three_column_rejects_per_sample_rate() {
        let file = log_file("100 200 10\n");
        assert!(aggregate_log_file(
            file.path(),
            LogLayout::ThreeColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(aggregate_log_file(
            Path::new("/nonexistent/throughput.txt"),
            LogLayout::FiveColumn,
            AccumulationMode::Pooled,
            &AggregationOptions::default(),
        )
        .is_err());
    }

    #[test]
    fn test_shard_overflow_matches_single_file() {
        // 2^60 bytes is 2^63 bits; two of them overflow u64
        let line = format!("0 {} 1 0 10\n", 1u64 << 60);
        let first = log_file(&line);
        let second = log_file(&line);
        let whole = log_file(&format!("{}{}", line, line));
        let options = AggregationOptions::default();

        assert!(aggregate_log_file(whole.path(), LogLayout::FiveColumn, AccumulationMode::Pooled, &options).is_err());

        let paths = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let err = aggregate_shards(&paths, LogLayout::FiveColumn, AccumulationMode::Pooled, &options).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::TotalsOverflow { .. })
        ));
    }

    #[test]
    fn test_shards_merge_consumer_stop_time() {
        // Aggregator shards log 0 in the time column; only the consumer shard has it
        let agg0 = log_file("1000 4000 0\n");
        let agg1 = log_file("500 2000 0\n");
        let con0 = log_file("500 2000 10\n");
        let options = AggregationOptions {
            time_unit: TimeUnit::Seconds,
            ..AggregationOptions::default()
        };

        let paths = vec![agg0.path().to_path_buf(), agg1.path().to_path_buf(), con0.path().to_path_buf()];
        let totals = aggregate_shards(&paths, LogLayout::ThreeColumn, AccumulationMode::Pooled, &options).unwrap();

        assert_eq!(totals.samples, 3);
        assert_eq!(totals.sum_elapsed, 10);
        assert_eq!(totals.observed_throughput_bps(), 8_000.0);

        // Without the consumer shard there is no elapsed time at all
        let err = aggregate_shards(&paths[..2], LogLayout::ThreeColumn, AccumulationMode::Pooled, &options)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::NoElapsedTime { samples: 2 })
        ));
    }
}
