#[cfg(test)]
mod topology_regression_tests {
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    use aggsim::config_loader::{apply_topology_overrides, load_config, TopologyCliOverrides};
    use aggsim::config::Config;
    use aggsim::topology::{generate, render_topology, write_topology_file, NodeRole, TopologyParams};
    use aggsim::utils::parse_bitrate;

    const CONFIG: &str = r#"
general:
  topology_type: DataCenter
topologies:
  DataCenter:
    numProducer: 4
    numAggregator: 2
    numEdgeForwarder: 2
    Bitrate: 100Mbps
"#;

    const EXPECTED: &str = "router

con0
pro0
pro1
pro2
pro3
forwarder0
forwarder1
forwarder2
agg0
agg1
forwarder3
forwarder4
forwarder5

link

pro0       forwarder0       100Mbps       1       2ms       50
pro1       forwarder0       100Mbps       1       2ms       50
pro2       forwarder1       100Mbps       1       2ms       50
pro3       forwarder1       100Mbps       1       2ms       50
con0       forwarder0       100Mbps       1       2ms       50
forwarder0       agg0       100Mbps       1       2ms       50
forwarder0       agg1       100Mbps       1       2ms       50
forwarder1       agg0       100Mbps       1       2ms       50
forwarder1       agg1       100Mbps       1       2ms       50
forwarder2       agg0       100Mbps       1       2ms       50
forwarder2       agg1       100Mbps       1       2ms       50
forwarder3       agg0       100Mbps       1       2ms       50
forwarder3       agg1       100Mbps       1       2ms       50
forwarder4       agg0       100Mbps       1       2ms       50
forwarder4       agg1       100Mbps       1       2ms       50
forwarder5       agg0       100Mbps       1       2ms       50
forwarder5       agg1       100Mbps       1       2ms       50
";

    fn config_file(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", contents).unwrap();
        temp_file
    }

    /// Reference data-center scenario, end to end from a config file
    #[test]
    fn test_reference_topology_from_config() {
        let temp_file = config_file(CONFIG);
        let config = load_config(temp_file.path()).unwrap();

        let description = generate(&config.topology_params().unwrap()).unwrap();
        assert_eq!(description.num_edge_forwarders, 3);
        assert_eq!(description.num_core_forwarders, 3);
        assert_eq!(description.nodes.len(), 13);
        assert_eq!(description.links.len(), 17);

        let dir = tempdir().unwrap();
        let path = dir.path().join("DataCenterTopology.txt");
        write_topology_file(&description, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), EXPECTED);
        assert!(!dir.path().join("DataCenterTopology.txt.tmp").exists());
    }

    /// Two runs with the same inputs produce byte-identical files
    #[test]
    fn test_output_is_deterministic() {
        let params = TopologyParams::new(37, 5, 4, parse_bitrate("1Gbps").unwrap());
        let dir = tempdir().unwrap();
        let first = dir.path().join("first.txt");
        let second = dir.path().join("second.txt");

        write_topology_file(&generate(&params).unwrap(), &first).unwrap();
        write_topology_file(&generate(&params).unwrap(), &second).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    /// Every link line has six fields and names declared nodes
    #[test]
    fn test_file_structure() {
        let params = TopologyParams::new(10, 3, 3, parse_bitrate("10Kbps").unwrap());
        let rendered = render_topology(&generate(&params).unwrap());

        let (routers, links) = rendered.split_once("\nlink\n\n").unwrap();
        let routers: Vec<&str> = routers
            .strip_prefix("router\n\n")
            .unwrap()
            .lines()
            .collect();

        let mut unique = routers.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), routers.len());

        let link_lines: Vec<&str> = links.lines().collect();
        // P + 1 + E*A + C*A with E = 10/3 + 1 = 4
        assert_eq!(link_lines.len(), 10 + 1 + 4 * 3 + 3 * 3);

        for line in link_lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(fields.len(), 6, "bad line: {}", line);
            assert!(routers.contains(&fields[0]));
            assert!(routers.contains(&fields[1]));
            assert_eq!(fields[2], "10Kbps");
        }
    }

    /// Command-line values alone are enough to generate a topology
    #[test]
    fn test_topology_from_overrides_only() {
        let mut config = Config::default();
        let overrides = TopologyCliOverrides {
            producers: Some(4),
            aggregators: Some(2),
            producers_per_edge: Some(2),
            bitrate: Some("100Mbps".to_string()),
            core_forwarders: None,
        };
        apply_topology_overrides(&mut config, &overrides).unwrap();

        let rendered = render_topology(&generate(&config.topology_params().unwrap()).unwrap());
        assert_eq!(rendered, EXPECTED);
    }

    /// Invalid input fails before anything is written
    #[test]
    fn test_invalid_config_writes_nothing() {
        let temp_file = config_file(&CONFIG.replace("Bitrate: 100Mbps", "Bitrate: 100mbps"));
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Bitrate"), "{}", err);

        let params = TopologyParams::new(4, 0, 2, parse_bitrate("100Mbps").unwrap());
        assert!(generate(&params).is_err());
    }

    #[test]
    fn test_core_forwarders_follow_aggregators() {
        let params = TopologyParams::new(4, 2, 2, parse_bitrate("100Mbps").unwrap()).with_core_forwarders(1);
        let description = generate(&params).unwrap();

        let core: Vec<&str> = description
            .nodes_with_role(NodeRole::CoreForwarder)
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(core, vec!["forwarder3"]);
        assert_eq!(description.links.len(), 4 + 1 + 3 * 2 + 2);
    }
}
