//! The store-facing abstractions: requests, response batches, and the
//! transfer pipeline / store traits implemented by concrete clients.

use async_trait::async_trait;
use graph_record::{PropertyValue, Record};
use std::sync::Arc;

/// A query plus its named parameters, immutable once built. Owned by the
/// feeder that enqueues it until handed to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub query: String,
    pub params: Vec<(String, PropertyValue)>,
}

impl Request {
    /// A parameterless request.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(query: impl Into<String>, params: Vec<(String, PropertyValue)>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}

/// One response batch. `None` models a driver returning a null batch, which
/// the flatten stage reports and skips.
pub type Batch = Option<Vec<Record>>;

/// A request/response channel over one store connection.
///
/// Responses come back in the same order requests were enqueued. The
/// client's internal buffering and flushing are its own business; the engine
/// only pushes and drains.
#[async_trait]
pub trait TransferPipeline: Send + Sync + 'static {
    /// Enqueue a request for eventual execution. May block while the
    /// pipeline applies backpressure.
    async fn push(&self, request: Request) -> anyhow::Result<()>;

    /// Drain whatever completed response batches are currently available,
    /// in submission order. May return nothing.
    async fn pull(&self) -> anyhow::Result<Vec<Batch>>;
}

/// One open store connection.
#[async_trait]
pub trait GraphStore: Send + Sync {
    type Pipeline: TransferPipeline;

    /// Open a new transfer pipeline over this connection.
    async fn pipeline(&self) -> anyhow::Result<Arc<Self::Pipeline>>;

    /// Run a one-shot read query returning a single integer scalar.
    async fn run_read(&self, query: &str) -> anyhow::Result<i64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors() {
        let plain = Request::new("MATCH (n) RETURN n");
        assert!(plain.params.is_empty());

        let keyed = Request::with_params(
            "MATCH (n { name: $n_key }) RETURN n",
            vec![("n_key".to_string(), PropertyValue::from("A"))],
        );
        assert_eq!(keyed.params.len(), 1);
    }
}
