//! Consumer task: drains completed responses out of a transfer pipeline.

use crate::pipeline::TransferPipeline;
use crate::task::WorkerContext;
use graph_record::Record;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Callback the drainer forwards every response record to. Verification
/// phases install an equality assertion; the copy phase discards.
pub type Sink = Arc<dyn Fn(Record) -> anyhow::Result<()> + Send + Sync>;

/// Repeatedly drains a pipeline's completed responses, forwards each record
/// to the sink, and counts one response per drained batch: a replayed
/// statement with no result rows is still one response, which keeps the
/// backlog arithmetic honest. An empty drain idles for `idle_wait` rather
/// than spinning. Stop/join semantics mirror the feeder's.
pub struct Drainer {
    ctx: Arc<WorkerContext>,
    handle: JoinHandle<()>,
}

impl Drainer {
    pub fn spawn<P>(name: &'static str, pipeline: Arc<P>, sink: Sink, idle_wait: Duration) -> Self
    where
        P: TransferPipeline,
    {
        let ctx = Arc::new(WorkerContext::new());
        let task_ctx = Arc::clone(&ctx);
        let handle = tokio::spawn(async move {
            'outer: while task_ctx.is_running() {
                let batches = match pipeline.pull().await {
                    Ok(batches) => batches,
                    Err(error) => {
                        task_ctx.record_error(error);
                        break;
                    }
                };
                if batches.is_empty() {
                    tokio::time::sleep(idle_wait).await;
                    continue;
                }
                for batch in batches {
                    let Some(records) = batch else {
                        tracing::warn!("{name} drainer got a null response batch, skipping");
                        continue;
                    };
                    for record in records {
                        if let Err(error) = (sink)(record) {
                            task_ctx.record_error(error);
                            break 'outer;
                        }
                    }
                    task_ctx.increment();
                }
            }
            tracing::debug!("{name} drainer loop exited after {} responses", task_ctx.count());
        });
        Self { ctx, handle }
    }

    /// Responses drained so far.
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

    /// Best-effort join: wait up to `timeout` for the task to exit, then
    /// abandon it.
    pub async fn join(mut self, timeout: Duration) {
        if tokio::time::timeout(timeout, &mut self.handle).await.is_err() {
            self.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{GraphStore, Request};
    use crate::testing::MemoryGraph;
    use graph_record::PropertyValue;
    use std::sync::atomic::{AtomicU64, Ordering};

    async fn wait_until(condition: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        while !condition() {
            assert!(tokio::time::Instant::now() < deadline, "timed out");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_drainer_forwards_every_record() {
        let store =
            MemoryGraph::new(|_| vec![Some(vec![Record::scalar(PropertyValue::Null)])]);
        let pipeline = store.pipeline().await.unwrap();
        for i in 0..50 {
            pipeline.push(Request::new(format!("q{i}"))).await.unwrap();
        }

        let seen = Arc::new(AtomicU64::new(0));
        let sink: Sink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |_record| {
                seen.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
        };
        let drainer = Drainer::spawn("test", pipeline, sink, Duration::from_millis(1));

        wait_until(|| drainer.count() == 50).await;
        assert_eq!(seen.load(Ordering::Relaxed), 50);
        assert!(drainer.take_error().is_none());
        drainer.stop();
        drainer.join(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_sink_error_is_recorded_and_stops_the_loop() {
        let store =
            MemoryGraph::new(|_| vec![Some(vec![Record::scalar(PropertyValue::Null)])]);
        let pipeline = store.pipeline().await.unwrap();
        for i in 0..3 {
            pipeline.push(Request::new(format!("q{i}"))).await.unwrap();
        }

        let seen = Arc::new(AtomicU64::new(0));
        let sink: Sink = {
            let seen = Arc::clone(&seen);
            Arc::new(move |_record| {
                if seen.fetch_add(1, Ordering::Relaxed) == 1 {
                    anyhow::bail!("drifted");
                }
                Ok(())
            })
        };
        let drainer = Drainer::spawn("test", pipeline, sink, Duration::from_millis(1));

        wait_until(|| drainer.has_error()).await;
        // The failing record was not counted and nothing after it was seen.
        assert_eq!(drainer.count(), 1);
        assert_eq!(drainer.take_error().unwrap().to_string(), "drifted");
        drainer.stop();
        drainer.join(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn test_null_batches_are_skipped_not_fatal() {
        let store = MemoryGraph::new(|_| {
            vec![
                None,
                Some(vec![Record::scalar(PropertyValue::Null)]),
            ]
        });
        let pipeline = store.pipeline().await.unwrap();
        pipeline.push(Request::new("q")).await.unwrap();

        let drainer = Drainer::spawn(
            "test",
            pipeline,
            crate::verify::discard_sink(),
            Duration::from_millis(1),
        );

        wait_until(|| drainer.count() == 1).await;
        assert!(drainer.take_error().is_none());
        drainer.stop();
        drainer.join(Duration::from_millis(100)).await;
    }
}
