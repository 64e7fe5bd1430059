use clap::Parser;
use graph_bolt::BoltOpts;
use graph_sync::{KeyOpts, SourceOpts, TargetOpts};

#[test]
fn test_source_opts_conversion() {
    let opts = SourceOpts {
        source_uri: "bolt://localhost:7687".to_string(),
        source_username: "neo4j".to_string(),
        source_password: "secret".to_string(),
        source_database: "neo4j".to_string(),
    };

    let bolt: BoltOpts = (&opts).into();
    assert_eq!(bolt.uri, "bolt://localhost:7687");
    assert_eq!(bolt.username, "neo4j");
    assert_eq!(bolt.password, "secret");
    assert_eq!(bolt.database, "neo4j");
}

#[test]
fn test_target_opts_conversion() {
    let opts = TargetOpts {
        target_uri: "bolt://replica:7687".to_string(),
        target_username: "neo4j".to_string(),
        target_password: "secret".to_string(),
        target_database: "graph".to_string(),
    };

    let bolt: BoltOpts = (&opts).into();
    assert_eq!(bolt.uri, "bolt://replica:7687");
    assert_eq!(bolt.database, "graph");
}

#[test]
fn test_key_opts_defaults() {
    let keys = KeyOpts::try_parse_from(["graph-sync"]).unwrap();
    assert_eq!(keys.node_key, "name");
    assert_eq!(keys.relationship_key, "distance");
}

#[test]
fn test_key_opts_override() {
    let keys = KeyOpts::try_parse_from([
        "graph-sync",
        "--node-key",
        "code",
        "--relationship-key",
        "weight",
    ])
    .unwrap();
    assert_eq!(keys.node_key, "code");
    assert_eq!(keys.relationship_key, "weight");
}
