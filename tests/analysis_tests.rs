#[cfg(test)]
mod analysis_tests {
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{tempdir, NamedTempFile};

    use aggsim::analysis::{
        aggregate_log_file, aggregate_shards, compute_utilization, generate_json_report,
        generate_text_report, AccumulationMode, AggregationOptions, AnalysisError, ByteAccounting,
        LogLayout, ThroughputReport,
    };
    use aggsim::utils::parse_bitrate;

    const FLOW_LOG: &str = "100 200 3 0 1000000\n50 50 2 0 500000\n";

    fn log_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_utilization_from_log_file() {
        let file = log_file(FLOW_LOG);
        let totals = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .unwrap();

        assert_eq!(totals.sum_interest_bits, 1_200);
        assert_eq!(totals.sum_data_bits, 2_000);
        assert_eq!(totals.sum_link_count, 5);

        let result = compute_utilization(&totals, &parse_bitrate("1Kbps").unwrap()).unwrap();
        assert_eq!(result.observed_throughput_bps, 4_000.0);
        assert_eq!(result.theoretical_max_throughput_bps, 5_000.0);
        assert_eq!(result.utilization_ratio, 0.8);
    }

    #[test]
    fn test_pooled_differs_from_per_sample_rate() {
        let file = log_file(FLOW_LOG);
        let pooled = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::Pooled,
            &AggregationOptions::default(),
        )
        .unwrap();

        // 3200 bits over 1.5 s
        let expected = 3_200.0 / 1.5;
        assert!((pooled.observed_throughput_bps() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_data_only_accounting() {
        let file = log_file(FLOW_LOG);
        let options = AggregationOptions {
            accounting: ByteAccounting::DataOnly,
            ..AggregationOptions::default()
        };
        let totals = aggregate_log_file(file.path(), LogLayout::FiveColumn, AccumulationMode::PerSampleRate, &options)
            .unwrap();

        // 1600 bits over 1 s plus 400 bits over 0.5 s
        assert_eq!(totals.observed_throughput_bps(), 2_400.0);
    }

    /// Splitting a log into shards does not change the totals
    #[test]
    fn test_shards_match_single_file() {
        let whole = log_file(FLOW_LOG);
        let first = log_file("100 200 3 0 1000000\n");
        let second = log_file("50 50 2 0 500000\n");
        let options = AggregationOptions::default();

        for mode in [AccumulationMode::PerSampleRate, AccumulationMode::Pooled] {
            let single = aggregate_log_file(whole.path(), LogLayout::FiveColumn, mode, &options).unwrap();
            let sharded = aggregate_shards(
                &[first.path().to_path_buf(), second.path().to_path_buf()],
                LogLayout::FiveColumn,
                mode,
                &options,
            )
            .unwrap();
            assert_eq!(single, sharded);
        }
    }

    #[test]
    fn test_error_names_line() {
        let file = log_file("100 200 3 0 1000000\n100 200 3 0 x\n");
        let err = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::MalformedLine { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_log() {
        let file = log_file("\n\n");
        let err = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .unwrap_err();

        assert_eq!(err.downcast_ref::<AnalysisError>(), Some(&AnalysisError::NoSamples));
    }

    #[test]
    fn test_reports_written() {
        let file = log_file(FLOW_LOG);
        let rate = parse_bitrate("1Kbps").unwrap();
        let totals = aggregate_log_file(
            file.path(),
            LogLayout::FiveColumn,
            AccumulationMode::PerSampleRate,
            &AggregationOptions::default(),
        )
        .unwrap();
        let result = compute_utilization(&totals, &rate).unwrap();
        let report = ThroughputReport::new(
            &[PathBuf::from(file.path())],
            LogLayout::FiveColumn,
            &totals,
            Some((rate, result)),
        );

        let dir = tempdir().unwrap();
        let json_path = dir.path().join("report.json");
        let text_path = dir.path().join("report.txt");
        generate_json_report(&report, &json_path).unwrap();
        generate_text_report(&report, &text_path).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["samples"], 2);
        assert_eq!(json["utilization"]["theoretical_max_throughput_bps"], 5000.0);

        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("Total Bandwidth Utilization (%): 80"));
    }
}
