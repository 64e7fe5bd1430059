//! Store connection and one-shot reads.

use crate::pipeline::BoltPipeline;
use async_trait::async_trait;
use graph_engine::GraphStore;
use neo4rs::{ConfigBuilder, Graph, Query};
use std::sync::Arc;

/// Connection options for one Bolt store (library type, clap-free).
#[derive(Clone, Debug)]
pub struct BoltOpts {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// One open Bolt store connection.
///
/// The driver owns the sockets; dropping the last handle closes them on
/// every exit path.
#[derive(Clone)]
pub struct BoltGraph {
    graph: Graph,
}

impl BoltGraph {
    pub fn connect(opts: &BoltOpts) -> anyhow::Result<Self> {
        let config = ConfigBuilder::default()
            .uri(&opts.uri)
            .user(opts.username.clone())
            .password(opts.password.clone())
            .db(opts.database.clone())
            .build()?;
        let graph = Graph::connect(config)?;
        tracing::debug!("bolt connection established to {}", opts.uri);
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for BoltGraph {
    type Pipeline = BoltPipeline;

    async fn pipeline(&self) -> anyhow::Result<Arc<BoltPipeline>> {
        Ok(Arc::new(BoltPipeline::spawn(self.graph.clone())))
    }

    async fn run_read(&self, query: &str) -> anyhow::Result<i64> {
        let mut result = self.graph.execute(Query::new(query.to_string())).await?;
        let row = result
            .next()
            .await?
            .ok_or_else(|| anyhow::anyhow!("count query returned no rows: {query}"))?;
        let count: i64 = row.get("count")?;
        Ok(count)
    }
}
