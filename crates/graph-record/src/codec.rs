//! Extraction of identity keys and snapshots from raw records.

use crate::error::CodecError;
use crate::key::{IdentityKey, KeyValue, Snapshot};
use crate::record::{Column, NodeRecord, Record};

/// Decodes raw store records into `(IdentityKey, Snapshot)` pairs using the
/// user-configured identity property names.
///
/// Node identity is `properties[node_key]`; relationship identity is the
/// composite `(key(n), key(m), properties(r)[relationship_key])` of a
/// `(n, m, r)` triple row. Decoding has no side effects.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    node_key: String,
    relationship_key: String,
}

impl RecordCodec {
    pub fn new(node_key: impl Into<String>, relationship_key: impl Into<String>) -> Self {
        Self {
            node_key: node_key.into(),
            relationship_key: relationship_key.into(),
        }
    }

    /// The configured node identity property name.
    pub fn node_key(&self) -> &str {
        &self.node_key
    }

    /// The configured relationship identity property name.
    pub fn relationship_key(&self) -> &str {
        &self.relationship_key
    }

    /// Decode a single-node row (`RETURN n`).
    pub fn decode_node(&self, record: &Record) -> Result<(IdentityKey, Snapshot), CodecError> {
        match record.columns.as_slice() {
            [Column::Node(node)] => {
                let key = self.node_identity(node)?;
                Ok((
                    IdentityKey::Node(key),
                    Snapshot::Node(node.properties.clone()),
                ))
            }
            other => Err(CodecError::UnexpectedShape {
                expected: "a single node column",
                actual: describe(other),
            }),
        }
    }

    /// Decode a triple row (`RETURN n,m,r`).
    pub fn decode_relationship(
        &self,
        record: &Record,
    ) -> Result<(IdentityKey, Snapshot), CodecError> {
        match record.columns.as_slice() {
            [Column::Node(start), Column::Node(end), Column::Relationship(rel)] => {
                let start_key = self.node_identity(start)?;
                let end_key = self.node_identity(end)?;
                let rel_value = rel.properties.get(&self.relationship_key).ok_or_else(|| {
                    CodecError::MissingKey {
                        property: self.relationship_key.clone(),
                    }
                })?;
                let rel_key = KeyValue::from_property(&self.relationship_key, rel_value)?;
                Ok((
                    IdentityKey::Relationship {
                        start: start_key,
                        end: end_key,
                        rel: rel_key,
                    },
                    Snapshot::Relationship {
                        start: start.properties.clone(),
                        end: end.properties.clone(),
                        rel: rel.properties.clone(),
                    },
                ))
            }
            other => Err(CodecError::UnexpectedShape {
                expected: "node, node, relationship columns",
                actual: describe(other),
            }),
        }
    }

    fn node_identity(&self, node: &NodeRecord) -> Result<KeyValue, CodecError> {
        let value = node
            .properties
            .get(&self.node_key)
            .ok_or_else(|| CodecError::MissingKey {
                property: self.node_key.clone(),
            })?;
        KeyValue::from_property(&self.node_key, value)
    }
}

fn describe(columns: &[Column]) -> String {
    let names: Vec<&str> = columns
        .iter()
        .map(|c| match c {
            Column::Node(_) => "node",
            Column::Relationship(_) => "relationship",
            Column::Scalar(_) => "scalar",
        })
        .collect();
    names.join(", ")
}
