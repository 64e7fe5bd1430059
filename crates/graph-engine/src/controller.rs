//! The run controller: wires feeder/drainer pairs per phase, monitors
//! progress, and owns shutdown and error surfacing.

use crate::drainer::{Drainer, Sink};
use crate::error::EngineError;
use crate::feeder::Feeder;
use crate::pipeline::{GraphStore, Request, TransferPipeline};
use crate::progress::ProgressSnapshot;
use crate::transform::{self, VerifyTransform};
use crate::{queries, verify};
use futures::{stream, Stream};
use graph_record::{CorrelationMap, RecordCodec};
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Engine tuning knobs. Defaults fit an interactive foreground run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between monitoring polls.
    pub poll_interval: Duration,
    /// Bound on each task join during shutdown.
    pub join_timeout: Duration,
    /// Sleep between empty pipeline drains.
    pub idle_wait: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            join_timeout: Duration::from_secs(1),
            idle_wait: Duration::from_millis(25),
        }
    }
}

/// How a phase ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Complete,
    Cancelled,
}

/// Counters reported by a finished phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub outcome: PhaseOutcome,
    /// Requests enqueued against the target.
    pub sent: u64,
    /// Responses the drainer drained.
    pub received: u64,
    /// Expectations never resolved by a response. Nonzero after a completed
    /// verify phase means responses were lost or duplicated.
    pub unresolved: usize,
}

/// Authoritative record counts read from one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub nodes: i64,
    pub isolated_nodes: i64,
    pub relationships: i64,
}

/// Report of a full verify run.
#[derive(Debug, Clone)]
pub struct VerifyReport {
    pub counts: StoreCounts,
    pub relationships: PhaseReport,
    /// Absent when the pre-check found no isolated nodes or the
    /// relationship phase was cancelled.
    pub isolated_nodes: Option<PhaseReport>,
}

enum VerifyMode {
    Relationships,
    IsolatedNodes,
}

/// Runs the transfer/verification phases against a source and target store.
///
/// Phases run sequentially, never concurrently. Each phase starts exactly
/// one source feeder, one target feeder, and one target drainer, and always
/// shuts all three down in that order, whether the phase succeeded, failed,
/// or was cancelled, each join bounded by the configured timeout.
pub struct Controller<S: GraphStore> {
    source: S,
    target: S,
    codec: Arc<RecordCodec>,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl<S: GraphStore> Controller<S> {
    pub fn new(source: S, target: S, codec: RecordCodec, config: EngineConfig) -> Self {
        Self {
            source,
            target,
            codec: Arc::new(codec),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed by every monitoring loop; cancel it to request a
    /// graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Bulk-copy the source store into the target store.
    ///
    /// Clears the target, streams the source's plain-statement export, and
    /// replays each statement. Runs until operator cancellation, unless the
    /// export runs dry and the target catches up, in which case the phase
    /// completes on its own.
    pub async fn run_copy(&self) -> anyhow::Result<PhaseReport> {
        let source_pipeline = self.source.pipeline().await?;
        let target_pipeline = self.target.pipeline().await?;

        tracing::info!("resetting target store");
        target_pipeline
            .push(Request::new(queries::RESET_TARGET))
            .await?;
        loop {
            let drained = target_pipeline.pull().await?;
            if !drained.is_empty() {
                break;
            }
            tokio::time::sleep(self.config.idle_wait).await;
        }

        let source_feeder = Feeder::spawn(
            "source",
            Arc::clone(&source_pipeline),
            stream::iter([Ok(Request::new(queries::EXPORT_ALL_STATEMENTS))]),
        );
        let records = transform::flatten_batches(transform::response_stream(
            Arc::clone(&source_pipeline),
            self.config.idle_wait,
        ));
        let target_feeder = Feeder::spawn(
            "target",
            Arc::clone(&target_pipeline),
            transform::statement_requests(records),
        );
        let drainer = Drainer::spawn(
            "target",
            Arc::clone(&target_pipeline),
            verify::discard_sink(),
            self.config.idle_wait,
        );

        let outcome = self
            .monitor_copy(&source_feeder, &target_feeder, &drainer)
            .await;
        let (sent, received) = (target_feeder.count(), drainer.count());
        self.shutdown(source_feeder, target_feeder, drainer).await;

        Ok(PhaseReport {
            outcome: outcome?,
            sent,
            received,
            unresolved: 0,
        })
    }

    /// Verify that the target store is a faithful copy of the source store.
    ///
    /// A count pre-check gates the expensive per-record pass; the
    /// relationship phase always runs, the isolated-node phase only when the
    /// pre-check found isolated nodes.
    pub async fn run_verify(&self) -> anyhow::Result<VerifyReport> {
        let started = Instant::now();
        let counts = self.precheck().await?;

        tracing::info!("verifying {} relationships", counts.relationships);
        let relationships = self
            .run_verify_phase(VerifyMode::Relationships, counts.relationships as u64)
            .await?;

        let isolated_nodes = if relationships.outcome == PhaseOutcome::Complete
            && counts.isolated_nodes > 0
        {
            tracing::info!("verifying {} isolated nodes", counts.isolated_nodes);
            Some(
                self.run_verify_phase(VerifyMode::IsolatedNodes, counts.isolated_nodes as u64)
                    .await?,
            )
        } else {
            None
        };

        tracing::info!("verify run finished in {:?}", started.elapsed());
        Ok(VerifyReport {
            counts,
            relationships,
            isolated_nodes,
        })
    }

    /// Read authoritative counts from both stores and require agreement
    /// before any streaming begins.
    async fn precheck(&self) -> anyhow::Result<StoreCounts> {
        let source = self.read_counts(&self.source).await?;
        tracing::info!("source node count: {}", source.nodes);
        tracing::info!("source isolated node count: {}", source.isolated_nodes);
        tracing::info!("source relationship count: {}", source.relationships);

        let target = self.read_counts(&self.target).await?;
        tracing::info!("target node count: {}", target.nodes);
        tracing::info!("target isolated node count: {}", target.isolated_nodes);
        tracing::info!("target relationship count: {}", target.relationships);

        if source.nodes != target.nodes {
            return Err(EngineError::CountMismatch {
                kind: "node",
                source: source.nodes,
                target: target.nodes,
            }
            .into());
        }
        if source.isolated_nodes != target.isolated_nodes {
            return Err(EngineError::CountMismatch {
                kind: "isolated node",
                source: source.isolated_nodes,
                target: target.isolated_nodes,
            }
            .into());
        }
        if source.relationships != target.relationships {
            return Err(EngineError::CountMismatch {
                kind: "relationship",
                source: source.relationships,
                target: target.relationships,
            }
            .into());
        }
        Ok(source)
    }

    async fn read_counts(&self, store: &S) -> anyhow::Result<StoreCounts> {
        Ok(StoreCounts {
            nodes: store.run_read(queries::COUNT_NODES).await?,
            isolated_nodes: store.run_read(queries::COUNT_ISOLATED_NODES).await?,
            relationships: store.run_read(queries::COUNT_RELATIONSHIPS).await?,
        })
    }

    async fn run_verify_phase(
        &self,
        mode: VerifyMode,
        expected: u64,
    ) -> anyhow::Result<PhaseReport> {
        let source_pipeline = self.source.pipeline().await?;
        let target_pipeline = self.target.pipeline().await?;
        let map = Arc::new(CorrelationMap::new());
        let transform = VerifyTransform::new(Arc::clone(&self.codec), Arc::clone(&map));

        let source_query = match mode {
            VerifyMode::Relationships => queries::MATCH_ALL_RELATIONSHIPS,
            VerifyMode::IsolatedNodes => queries::MATCH_ISOLATED_NODES,
        };
        let source_feeder = Feeder::spawn(
            "source",
            Arc::clone(&source_pipeline),
            stream::iter([Ok(Request::new(source_query))]),
        );

        let records = transform::flatten_batches(transform::response_stream(
            Arc::clone(&source_pipeline),
            self.config.idle_wait,
        ));
        let requests: Pin<Box<dyn Stream<Item = anyhow::Result<Request>> + Send>> = match mode {
            VerifyMode::Relationships => {
                Box::pin(transform::relationship_requests(records, transform))
            }
            VerifyMode::IsolatedNodes => {
                Box::pin(transform::isolated_node_requests(records, transform))
            }
        };
        let target_feeder = Feeder::spawn("target", Arc::clone(&target_pipeline), requests);

        let sink: Sink = match mode {
            VerifyMode::Relationships => {
                verify::relationship_sink(Arc::clone(&self.codec), Arc::clone(&map))
            }
            VerifyMode::IsolatedNodes => {
                verify::isolated_node_sink(Arc::clone(&self.codec), Arc::clone(&map))
            }
        };
        let drainer = Drainer::spawn(
            "target",
            Arc::clone(&target_pipeline),
            sink,
            self.config.idle_wait,
        );

        let outcome = self
            .monitor_verify(&source_feeder, &target_feeder, &drainer, expected)
            .await;
        let (sent, received) = (target_feeder.count(), drainer.count());
        self.shutdown(source_feeder, target_feeder, drainer).await;

        let outcome = outcome?;
        if outcome == PhaseOutcome::Complete && !map.is_empty() {
            tracing::warn!(
                "{} expectations left unresolved at end of phase",
                map.len()
            );
        }
        Ok(PhaseReport {
            outcome,
            sent,
            received,
            unresolved: map.len(),
        })
    }

    /// Poll until the drainer has seen every expected response, a worker
    /// records an error, or cancellation is requested.
    async fn monitor_verify(
        &self,
        source_feeder: &Feeder,
        target_feeder: &Feeder,
        drainer: &Drainer,
        expected: u64,
    ) -> anyhow::Result<PhaseOutcome> {
        let started = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("cancellation requested, shutting down");
                return Ok(PhaseOutcome::Cancelled);
            }
            if let Some(error) = first_error(source_feeder, target_feeder, drainer) {
                return Err(error);
            }
            if drainer.count() >= expected {
                return Ok(PhaseOutcome::Complete);
            }
            self.report_progress(target_feeder, drainer, started);
            self.poll_sleep().await;
        }
    }

    /// Poll until cancellation, a worker error, or natural exhaustion: the
    /// export source ran dry and the target caught up.
    async fn monitor_copy(
        &self,
        source_feeder: &Feeder,
        target_feeder: &Feeder,
        drainer: &Drainer,
    ) -> anyhow::Result<PhaseOutcome> {
        let started = Instant::now();
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("cancellation requested, shutting down");
                return Ok(PhaseOutcome::Cancelled);
            }
            if let Some(error) = first_error(source_feeder, target_feeder, drainer) {
                return Err(error);
            }
            let sent = target_feeder.count();
            if source_feeder.is_finished() && sent > 0 && drainer.count() >= sent {
                // The transform may still be deriving statements out of a
                // drained batch; re-check after a short settle.
                tokio::time::sleep(self.config.idle_wait).await;
                if target_feeder.count() == sent && drainer.count() >= sent {
                    tracing::info!("export exhausted and backlog drained, copy complete");
                    return Ok(PhaseOutcome::Complete);
                }
            }
            self.report_progress(target_feeder, drainer, started);
            self.poll_sleep().await;
        }
    }

    fn report_progress(&self, target_feeder: &Feeder, drainer: &Drainer, started: Instant) {
        let progress =
            ProgressSnapshot::compute(target_feeder.count(), drainer.count(), started.elapsed());
        tracing::info!(
            "sent {}, received {}, backlog {}, speed {:.0}",
            progress.sent,
            progress.received,
            progress.backlog,
            progress.throughput
        );
    }

    async fn poll_sleep(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }

    /// Best-effort shutdown, executed on every exit path. Stops and joins
    /// the tasks in source feeder, target feeder, drainer order; a join
    /// timing out never aborts the rest of the sequence.
    async fn shutdown(&self, source_feeder: Feeder, target_feeder: Feeder, drainer: Drainer) {
        source_feeder.stop();
        source_feeder.join(self.config.join_timeout).await;
        tracing::info!("source feeder stopped");

        target_feeder.stop();
        target_feeder.join(self.config.join_timeout).await;
        tracing::info!("target feeder stopped");

        drainer.stop();
        drainer.join(self.config.join_timeout).await;
        tracing::info!("target drainer stopped");
    }
}

fn first_error(
    source_feeder: &Feeder,
    target_feeder: &Feeder,
    drainer: &Drainer,
) -> Option<anyhow::Error> {
    source_feeder
        .take_error()
        .or_else(|| target_feeder.take_error())
        .or_else(|| drainer.take_error())
}
