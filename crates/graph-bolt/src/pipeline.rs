//! Request/response pipeline over one driver connection.

use crate::convert::{convert_row, to_bolt};
use async_trait::async_trait;
use graph_engine::{Batch, Request, TransferPipeline};
use neo4rs::{Graph, Query};
use tokio::sync::mpsc;

/// Requests and responses buffered per pipeline before backpressure.
const PIPELINE_BUFFER: usize = 256;

/// A FIFO request/response channel over one Bolt connection.
///
/// `push` enqueues a request and blocks while the buffer is full; a worker
/// task executes each query in submission order and emits one batch per
/// request; `pull` blocks for the first ready batch, then drains whatever
/// else is ready. A transport error is delivered through `pull` in the
/// failed request's slot, and ends the worker.
pub struct BoltPipeline {
    requests: mpsc::Sender<Request>,
    responses: tokio::sync::Mutex<mpsc::Receiver<anyhow::Result<Batch>>>,
}

impl BoltPipeline {
    pub(crate) fn spawn(graph: Graph) -> Self {
        let (request_tx, request_rx) = mpsc::channel(PIPELINE_BUFFER);
        let (response_tx, response_rx) = mpsc::channel(PIPELINE_BUFFER);
        tokio::spawn(worker(graph, request_rx, response_tx));
        Self {
            requests: request_tx,
            responses: tokio::sync::Mutex::new(response_rx),
        }
    }
}

#[async_trait]
impl TransferPipeline for BoltPipeline {
    async fn push(&self, request: Request) -> anyhow::Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| anyhow::anyhow!("pipeline worker is gone"))
    }

    async fn pull(&self) -> anyhow::Result<Vec<Batch>> {
        let mut receiver = self.responses.lock().await;
        let Some(first) = receiver.recv().await else {
            // Worker exited and every response was already drained.
            return Ok(Vec::new());
        };
        let mut batches = vec![first?];
        while let Ok(next) = receiver.try_recv() {
            batches.push(next?);
        }
        Ok(batches)
    }
}

async fn worker(
    graph: Graph,
    mut requests: mpsc::Receiver<Request>,
    responses: mpsc::Sender<anyhow::Result<Batch>>,
) {
    while let Some(request) = requests.recv().await {
        let result = execute(&graph, request).await;
        let failed = result.is_err();
        if responses.send(result).await.is_err() {
            // Consumer dropped the pipeline.
            break;
        }
        if failed {
            break;
        }
    }
    tracing::debug!("bolt pipeline worker exited");
}

async fn execute(graph: &Graph, request: Request) -> anyhow::Result<Batch> {
    let mut query = Query::new(request.query);
    for (name, value) in &request.params {
        query = query.param(name, to_bolt(value));
    }

    let mut result = graph.execute(query).await?;
    let mut records = Vec::new();
    while let Some(row) = result.next().await? {
        records.push(convert_row(&row)?);
    }
    Ok(Some(records))
}
