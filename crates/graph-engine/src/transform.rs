//! Lazy stream stages between a source pipeline and a target feeder.
//!
//! Everything here is pull-driven: batches leave the source pipeline only
//! when the target feeder asks for the next request, so an unbounded result
//! set never accumulates beyond one drained `pull`.

use crate::pipeline::{Batch, Request, TransferPipeline};
use crate::queries;
use futures::{stream, Stream, StreamExt};
use graph_record::{Column, CorrelationMap, IdentityKey, PropertyValue, Record, RecordCodec};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Stream of response batches pulled from a pipeline on demand.
///
/// Holds at most one drained `pull` result; an empty drain idles for
/// `idle_wait` before asking again. The stream itself never ends; phase
/// termination is the controller's job.
pub fn response_stream<P>(
    pipeline: Arc<P>,
    idle_wait: Duration,
) -> impl Stream<Item = anyhow::Result<Batch>>
where
    P: TransferPipeline,
{
    stream::unfold(
        (pipeline, VecDeque::new()),
        move |(pipeline, mut ready)| async move {
            loop {
                if let Some(batch) = ready.pop_front() {
                    return Some((Ok(batch), (pipeline, ready)));
                }
                match pipeline.pull().await {
                    Ok(batches) if batches.is_empty() => {
                        tokio::time::sleep(idle_wait).await;
                    }
                    Ok(batches) => ready.extend(batches),
                    Err(error) => return Some((Err(error), (pipeline, ready))),
                }
            }
        },
    )
}

/// Flatten batched results into individual records, in order.
///
/// A null batch is reported and skipped, never fatal. Errors pass through as
/// single stream items.
pub fn flatten_batches<S>(batches: S) -> impl Stream<Item = anyhow::Result<Record>>
where
    S: Stream<Item = anyhow::Result<Batch>>,
{
    batches.flat_map(|item| {
        let records: Vec<anyhow::Result<Record>> = match item {
            Ok(Some(records)) => records.into_iter().map(Ok).collect(),
            Ok(None) => {
                tracing::warn!("null response batch, skipping");
                Vec::new()
            }
            Err(error) => vec![Err(error)],
        };
        stream::iter(records)
    })
}

/// Split an exported statement blob on statement boundaries, dropping the
/// empty segments trailing delimiters leave behind.
pub fn split_statements(blob: &str) -> Vec<String> {
    blob.split(";\n")
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

/// Copy-phase request stream: each exported blob becomes one parameterless
/// replay request per statement. No correlation map involvement.
pub fn statement_requests<S>(records: S) -> impl Stream<Item = anyhow::Result<Request>>
where
    S: Stream<Item = anyhow::Result<Record>>,
{
    records.flat_map(|item| {
        let requests: Vec<anyhow::Result<Request>> = match item {
            Ok(record) => match export_blob(&record) {
                Ok(blob) => split_statements(blob)
                    .into_iter()
                    .map(|statement| Ok(Request::new(statement)))
                    .collect(),
                Err(error) => vec![Err(error)],
            },
            Err(error) => vec![Err(error)],
        };
        stream::iter(requests)
    })
}

fn export_blob(record: &Record) -> anyhow::Result<&str> {
    match record.columns.as_slice() {
        [Column::Scalar(PropertyValue::Text(blob))] => Ok(blob),
        other => anyhow::bail!(
            "expected an exported statement blob, got a {}-column row",
            other.len()
        ),
    }
}

/// Derive-and-record: decodes a source record, stores the expectation in the
/// correlation map, and emits the re-query against the target keyed by the
/// configured identity properties.
#[derive(Clone)]
pub struct VerifyTransform {
    codec: Arc<RecordCodec>,
    map: Arc<CorrelationMap>,
}

impl VerifyTransform {
    pub fn new(codec: Arc<RecordCodec>, map: Arc<CorrelationMap>) -> Self {
        Self { codec, map }
    }

    /// Build the target re-query for one `(n, m, r)` source row.
    pub fn relationship_request(&self, record: &Record) -> anyhow::Result<Request> {
        let (key, snapshot) = self.codec.decode_relationship(record)?;
        let request = match &key {
            IdentityKey::Relationship { start, end, rel } => Request::with_params(
                queries::relationship_by_key(self.codec.node_key(), self.codec.relationship_key()),
                vec![
                    ("n_key".to_string(), start.to_property()),
                    ("m_key".to_string(), end.to_property()),
                    ("r_key".to_string(), rel.to_property()),
                ],
            ),
            IdentityKey::Node(_) => unreachable!("decode_relationship yields relationship keys"),
        };
        self.record_expectation(key, snapshot);
        Ok(request)
    }

    /// Build the target re-query for one isolated-node source row.
    pub fn isolated_node_request(&self, record: &Record) -> anyhow::Result<Request> {
        let (key, snapshot) = self.codec.decode_node(record)?;
        let request = match &key {
            IdentityKey::Node(node_key) => Request::with_params(
                queries::isolated_node_by_key(self.codec.node_key()),
                vec![("n_key".to_string(), node_key.to_property())],
            ),
            IdentityKey::Relationship { .. } => unreachable!("decode_node yields node keys"),
        };
        self.record_expectation(key, snapshot);
        Ok(request)
    }

    fn record_expectation(&self, key: IdentityKey, snapshot: graph_record::Snapshot) {
        if self.map.insert(key.clone(), snapshot).is_some() {
            // Non-unique identity keys surface later as an unmatched
            // response for the overwritten expectation.
            tracing::warn!("duplicate identity key {key} while deriving verification request");
        }
    }
}

/// Verification request stream for the relationship phase.
pub fn relationship_requests<S>(
    records: S,
    transform: VerifyTransform,
) -> impl Stream<Item = anyhow::Result<Request>>
where
    S: Stream<Item = anyhow::Result<Record>>,
{
    records.map(move |item| item.and_then(|record| transform.relationship_request(&record)))
}

/// Verification request stream for the isolated-node phase.
pub fn isolated_node_requests<S>(
    records: S,
    transform: VerifyTransform,
) -> impl Stream<Item = anyhow::Result<Request>>
where
    S: Stream<Item = anyhow::Result<Record>>,
{
    records.map(move |item| item.and_then(|record| transform.isolated_node_request(&record)))
}
