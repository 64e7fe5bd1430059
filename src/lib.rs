//! graph-sync library surface: the CLI argument structs.
//!
//! The engine itself lives in the `graph-engine` crate and the Bolt client
//! in `graph-bolt`; this crate only adapts parsed arguments into their
//! library types.

use clap::Parser;
use graph_bolt::BoltOpts;

/// Source store connection options.
#[derive(Parser, Clone, Debug)]
pub struct SourceOpts {
    /// Source store Bolt URI
    #[arg(long, env = "GRAPH_SYNC_SOURCE_URI")]
    pub source_uri: String,

    /// Source store username
    #[arg(long, default_value = "neo4j", env = "GRAPH_SYNC_SOURCE_USERNAME")]
    pub source_username: String,

    /// Source store password
    #[arg(long, env = "GRAPH_SYNC_SOURCE_PASSWORD")]
    pub source_password: String,

    /// Source store database name
    #[arg(long, default_value = "neo4j")]
    pub source_database: String,
}

/// Target store connection options.
#[derive(Parser, Clone, Debug)]
pub struct TargetOpts {
    /// Target store Bolt URI
    #[arg(long, env = "GRAPH_SYNC_TARGET_URI")]
    pub target_uri: String,

    /// Target store username
    #[arg(long, default_value = "neo4j", env = "GRAPH_SYNC_TARGET_USERNAME")]
    pub target_username: String,

    /// Target store password
    #[arg(long, env = "GRAPH_SYNC_TARGET_PASSWORD")]
    pub target_password: String,

    /// Target store database name
    #[arg(long, default_value = "neo4j")]
    pub target_database: String,
}

/// Identity property configuration for cross-store correlation.
#[derive(Parser, Clone, Debug)]
pub struct KeyOpts {
    /// Property key that uniquely identifies a node
    #[arg(long, default_value = "name")]
    pub node_key: String,

    /// Property key that uniquely identifies a relationship
    #[arg(long, default_value = "distance")]
    pub relationship_key: String,
}

// CLI type → Bolt client library type conversions
impl From<&SourceOpts> for BoltOpts {
    fn from(opts: &SourceOpts) -> Self {
        Self {
            uri: opts.source_uri.clone(),
            username: opts.source_username.clone(),
            password: opts.source_password.clone(),
            database: opts.source_database.clone(),
        }
    }
}

impl From<&TargetOpts> for BoltOpts {
    fn from(opts: &TargetOpts) -> Self {
        Self {
            uri: opts.target_uri.clone(),
            username: opts.target_username.clone(),
            password: opts.target_password.clone(),
            database: opts.target_database.clone(),
        }
    }
}
