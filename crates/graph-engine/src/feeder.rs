//! Producer task: streams requests into a transfer pipeline.

use crate::pipeline::{Request, TransferPipeline};
use crate::task::WorkerContext;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Consumes a request stream and enqueues each request into a pipeline,
/// counting what it sends. Stops on cancellation, input exhaustion, or the
/// first error; errors never escape the task, the controller polls for them.
pub struct Feeder {
    ctx: Arc<WorkerContext>,
    handle: JoinHandle<()>,
}

impl Feeder {
    pub fn spawn<P, S>(name: &'static str, pipeline: Arc<P>, source: S) -> Self
    where
        P: TransferPipeline,
        S: Stream<Item = anyhow::Result<Request>> + Send + 'static,
    {
        let ctx = Arc::new(WorkerContext::new());
        let task_ctx = Arc::clone(&ctx);
        let handle = tokio::spawn(async move {
            let mut source = Box::pin(source);
            loop {
                let item = match source.next().await {
                    Some(item) => item,
                    None => break,
                };
                if !task_ctx.is_running() {
                    break;
                }
                match item {
                    Ok(request) => match pipeline.push(request).await {
                        Ok(()) => task_ctx.increment(),
                        Err(error) => {
                            task_ctx.record_error(error);
                            break;
                        }
                    },
                    Err(error) => {
                        task_ctx.record_error(error);
                        break;
                    }
                }
            }
            tracing::debug!("{name} feeder loop exited after {} requests", task_ctx.count());
        });
        Self { ctx, handle }
    }

    /// Requests enqueued so far.
    pub fn count(&self) -> u64 {
        self.ctx.count()
    }

    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.ctx.take_error()
    }

    pub fn has_error(&self) -> bool {
        self.ctx.has_error()
    }

    /// Request cooperative cancellation.
    pub fn stop(&self) {
        self.ctx.stop();
    }

    /// True once the task has run its input dry, stopped, or failed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Best-effort join: wait up to `timeout` for the task to exit, then
    /// abandon it. The feeder is treated as dead either way.
    pub async fn join(mut self, timeout: Duration) {
        if tokio::time::timeout(timeout, &mut self.handle).await.is_err() {
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::GraphStore;
    use crate::testing::MemoryGraph;
    use futures::stream;

    async fn wait_until(condition: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while !condition() {
            assert!(tokio::time::Instant::now() < deadline, "timed out");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_feeder_pushes_every_request() {
        let store = MemoryGraph::new(|_| vec![]);
        let pipeline = store.pipeline().await.unwrap();

        let requests: Vec<anyhow::Result<Request>> = (0..100)
            .map(|i| Ok(Request::new(format!("q{i}"))))
            .collect();
        let feeder = Feeder::spawn("test", Arc::clone(&pipeline), stream::iter(requests));

        wait_until(|| feeder.is_finished()).await;
        assert_eq!(feeder.count(), 100);
        assert_eq!(pipeline.pushed().len(), 100);
        assert!(feeder.take_error().is_none());
        feeder.join(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_stop_halts_mid_stream() {
        let store = MemoryGraph::new(|_| vec![]);
        let pipeline = store.pipeline().await.unwrap();

        // A source that trickles requests forever.
        let source = stream::unfold(0u64, |i| async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            Some((anyhow::Ok(Request::new(format!("q{i}"))), i + 1))
        });
        let feeder = Feeder::spawn("test", Arc::clone(&pipeline), source);

        tokio::time::sleep(Duration::from_millis(20)).await;
        feeder.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let frozen = feeder.count();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(feeder.count(), frozen);
        assert!(feeder.take_error().is_none());
        feeder.join(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_source_error_is_recorded_not_raised() {
        let store = MemoryGraph::new(|_| vec![]);
        let pipeline = store.pipeline().await.unwrap();

        let source = stream::iter(vec![
            anyhow::Ok(Request::new("q0")),
            Err(anyhow::anyhow!("boom")),
            anyhow::Ok(Request::new("q2")),
        ]);
        let feeder = Feeder::spawn("test", Arc::clone(&pipeline), source);

        wait_until(|| feeder.is_finished()).await;
        assert_eq!(feeder.count(), 1);
        assert_eq!(feeder.take_error().unwrap().to_string(), "boom");
        feeder.join(Duration::from_millis(100)).await;
    }
}
