//! Equality-assertion sinks for the verification phases.

use crate::drainer::Sink;
use crate::error::EngineError;
use graph_record::{CorrelationMap, IdentityKey, RecordCodec, Snapshot};
use std::sync::Arc;

/// Sink for the relationship phase: decode the `(n, m, r)` response and
/// assert it against the recorded expectation.
pub fn relationship_sink(codec: Arc<RecordCodec>, map: Arc<CorrelationMap>) -> Sink {
    Arc::new(move |record| {
        let (key, actual) = codec.decode_relationship(&record)?;
        assert_match(&map, key, actual)
    })
}

/// Sink for the isolated-node phase.
pub fn isolated_node_sink(codec: Arc<RecordCodec>, map: Arc<CorrelationMap>) -> Sink {
    Arc::new(move |record| {
        let (key, actual) = codec.decode_node(&record)?;
        assert_match(&map, key, actual)
    })
}

/// No-op sink for the copy phase; the drainer only keeps the count.
pub fn discard_sink() -> Sink {
    Arc::new(|_record| Ok(()))
}

/// Pop the expectation for `key` and require structural equality. The
/// mismatching pair is reported before the failure is returned, to aid
/// diagnosis.
fn assert_match(map: &CorrelationMap, key: IdentityKey, actual: Snapshot) -> anyhow::Result<()> {
    match map.pop(&key) {
        Some(expected) if expected == actual => Ok(()),
        Some(expected) => {
            tracing::error!("snapshot mismatch for {key}: expected {expected:?}, got {actual:?}");
            Err(EngineError::VerificationMismatch {
                key,
                reason: "source and target snapshots differ",
            }
            .into())
        }
        None => {
            tracing::error!("response for {key} had no matching expectation: {actual:?}");
            Err(EngineError::VerificationMismatch {
                key,
                reason: "no expectation recorded for this response",
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_record::{NodeRecord, Properties, PropertyValue, Record, RelationshipRecord};

    fn codec() -> Arc<RecordCodec> {
        Arc::new(RecordCodec::new("name", "distance"))
    }

    fn triple(start_extra: Option<(&str, PropertyValue)>) -> Record {
        let mut start = Properties::new();
        start.insert("name".to_string(), PropertyValue::from("A"));
        if let Some((k, v)) = start_extra {
            start.insert(k.to_string(), v);
        }
        let mut end = Properties::new();
        end.insert("name".to_string(), PropertyValue::from("B"));
        let mut rel = Properties::new();
        rel.insert("distance".to_string(), PropertyValue::Int(5));
        Record::triple(
            NodeRecord::new(start),
            NodeRecord::new(end),
            RelationshipRecord::new(rel),
        )
    }

    #[test]
    fn test_identical_snapshot_verifies() {
        let codec = codec();
        let map = Arc::new(CorrelationMap::new());

        let (key, snapshot) = codec.decode_relationship(&triple(None)).unwrap();
        map.insert(key, snapshot);

        let sink = relationship_sink(Arc::clone(&codec), Arc::clone(&map));
        sink(triple(None)).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_single_differing_property_fails_naming_key() {
        let codec = codec();
        let map = Arc::new(CorrelationMap::new());

        let (key, snapshot) = codec.decode_relationship(&triple(None)).unwrap();
        map.insert(key, snapshot);

        let sink = relationship_sink(Arc::clone(&codec), Arc::clone(&map));
        let drifted = triple(Some(("population", PropertyValue::Int(9))));
        let error = sink(drifted).unwrap_err();

        let engine_error = error.downcast::<EngineError>().unwrap();
        match engine_error {
            EngineError::VerificationMismatch { key, .. } => {
                assert_eq!(key.to_string(), "(A)-[5]->(B)");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
        // The expectation was consumed either way.
        assert!(map.is_empty());
    }

    #[test]
    fn test_response_without_expectation_fails() {
        let codec = codec();
        let map = Arc::new(CorrelationMap::new());

        let sink = relationship_sink(codec, map);
        let error = sink(triple(None)).unwrap_err();
        let engine_error = error.downcast::<EngineError>().unwrap();
        assert!(matches!(
            engine_error,
            EngineError::VerificationMismatch { .. }
        ));
    }
}
