//! In-memory store fakes for exercising the engine without a live store.

use crate::pipeline::{Batch, GraphStore, Request, TransferPipeline};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Maps a pushed request to the response batches the store would return.
pub type RequestHandler = dyn Fn(&Request) -> Vec<Batch> + Send + Sync;

/// Scripted in-memory store. Every pushed request is answered synchronously
/// by the handler, responses come back FIFO per pipeline, and `run_read`
/// serves counts from a fixed table keyed by query text.
#[derive(Clone)]
pub struct MemoryGraph {
    handler: Arc<RequestHandler>,
    counts: Arc<HashMap<&'static str, i64>>,
}

impl MemoryGraph {
    pub fn new(handler: impl Fn(&Request) -> Vec<Batch> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            counts: Arc::new(HashMap::new()),
        }
    }

    /// Script the scalars `run_read` returns, keyed by query text.
    pub fn with_counts(mut self, counts: HashMap<&'static str, i64>) -> Self {
        self.counts = Arc::new(counts);
        self
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Pipeline = MemoryPipeline;

    async fn pipeline(&self) -> anyhow::Result<Arc<MemoryPipeline>> {
        Ok(Arc::new(MemoryPipeline {
            handler: Arc::clone(&self.handler),
            ready: Mutex::new(VecDeque::new()),
            pushed: Mutex::new(Vec::new()),
        }))
    }

    async fn run_read(&self, query: &str) -> anyhow::Result<i64> {
        self.counts
            .get(query)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no scripted count for query: {query}"))
    }
}

/// Pipeline half of [`MemoryGraph`].
pub struct MemoryPipeline {
    handler: Arc<RequestHandler>,
    ready: Mutex<VecDeque<Batch>>,
    pushed: Mutex<Vec<Request>>,
}

impl MemoryPipeline {
    /// Requests pushed so far, in order.
    pub fn pushed(&self) -> Vec<Request> {
        self.pushed.lock().expect("pushed lock poisoned").clone()
    }
}

#[async_trait]
impl TransferPipeline for MemoryPipeline {
    async fn push(&self, request: Request) -> anyhow::Result<()> {
        let batches = (self.handler)(&request);
        self.ready
            .lock()
            .expect("ready lock poisoned")
            .extend(batches);
        self.pushed.lock().expect("pushed lock poisoned").push(request);
        Ok(())
    }

    async fn pull(&self) -> anyhow::Result<Vec<Batch>> {
        Ok(self
            .ready
            .lock()
            .expect("ready lock poisoned")
            .drain(..)
            .collect())
    }
}
