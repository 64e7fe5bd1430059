//! Bolt value and row conversion.

use graph_record::{NodeRecord, Properties, PropertyValue, Record, RelationshipRecord};
use neo4rs::{BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltNull, BoltString, BoltType};

/// Convert an engine property value into a Bolt query parameter.
pub fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Null => BoltType::Null(BoltNull),
        PropertyValue::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        PropertyValue::Int(i) => BoltType::Integer(BoltInteger::new(*i)),
        PropertyValue::Float(f) => BoltType::Float(BoltFloat::new(*f)),
        PropertyValue::Text(s) => BoltType::String(BoltString::new(s)),
        PropertyValue::List(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(to_bolt(item));
            }
            BoltType::List(list)
        }
    }
}

/// Convert a Bolt property value into an engine property value.
///
/// The verifier compares scalar and list properties by value. Temporal,
/// spatial, byte, and structural Bolt values have no exact cross-store
/// comparison here and are rejected explicitly rather than silently
/// coerced.
pub fn from_bolt(value: BoltType) -> anyhow::Result<PropertyValue> {
    match value {
        BoltType::Null(_) => Ok(PropertyValue::Null),
        BoltType::Boolean(b) => Ok(PropertyValue::Bool(b.value)),
        BoltType::Integer(i) => Ok(PropertyValue::Int(i.value)),
        BoltType::Float(f) => Ok(PropertyValue::Float(f.value)),
        BoltType::String(s) => Ok(PropertyValue::Text(s.value)),
        BoltType::List(list) => {
            let items = list
                .value
                .into_iter()
                .map(from_bolt)
                .collect::<anyhow::Result<Vec<_>>>()?;
            Ok(PropertyValue::List(items))
        }
        other => anyhow::bail!(
            "Bolt {} property values are not comparable by the verifier",
            bolt_type_name(&other)
        ),
    }
}

fn bolt_type_name(value: &BoltType) -> &'static str {
    match value {
        BoltType::Null(_) => "Null",
        BoltType::Boolean(_) => "Boolean",
        BoltType::Integer(_) => "Integer",
        BoltType::Float(_) => "Float",
        BoltType::String(_) => "String",
        BoltType::Bytes(_) => "Bytes",
        BoltType::List(_) => "List",
        BoltType::Map(_) => "Map",
        BoltType::Node(_) => "Node",
        BoltType::Relation(_) => "Relation",
        BoltType::UnboundedRelation(_) => "UnboundedRelation",
        BoltType::Path(_) => "Path",
        BoltType::Date(_) => "Date",
        BoltType::Time(_) => "Time",
        BoltType::LocalTime(_) => "LocalTime",
        BoltType::DateTime(_) => "DateTime",
        BoltType::LocalDateTime(_) => "LocalDateTime",
        BoltType::DateTimeZoneId(_) => "DateTimeZoneId",
        BoltType::Duration(_) => "Duration",
        BoltType::Point2D(_) => "Point2D",
        BoltType::Point3D(_) => "Point3D",
    }
}

/// Reduce a driver node to its property map.
pub(crate) fn node_record(node: neo4rs::Node) -> anyhow::Result<NodeRecord> {
    let mut properties = Properties::new();
    for key in node.keys() {
        let value = node.get::<BoltType>(key)?;
        properties.insert(key.to_string(), from_bolt(value)?);
    }
    Ok(NodeRecord::new(properties))
}

/// Reduce a driver relationship to its property map.
pub(crate) fn relationship_record(
    relationship: neo4rs::Relation,
) -> anyhow::Result<RelationshipRecord> {
    let mut properties = Properties::new();
    for key in relationship.keys() {
        let value = relationship.get::<BoltType>(key)?;
        properties.insert(key.to_string(), from_bolt(value)?);
    }
    Ok(RelationshipRecord::new(properties))
}

/// Convert one driver row into an engine record.
///
/// The engine issues exactly three row shapes: `RETURN n,m,r` triples,
/// `RETURN n` nodes, and `RETURN cypherStatements` export blobs. Anything
/// else is an error.
pub(crate) fn convert_row(row: &neo4rs::Row) -> anyhow::Result<Record> {
    if let Ok(relationship) = row.get::<neo4rs::Relation>("r") {
        let start: neo4rs::Node = row.get("n")?;
        let end: neo4rs::Node = row.get("m")?;
        return Ok(Record::triple(
            node_record(start)?,
            node_record(end)?,
            relationship_record(relationship)?,
        ));
    }
    if let Ok(node) = row.get::<neo4rs::Node>("n") {
        return Ok(Record::node(node_record(node)?));
    }
    if let Ok(blob) = row.get::<String>("cypherStatements") {
        return Ok(Record::scalar(PropertyValue::Text(blob)));
    }
    anyhow::bail!("unrecognized result row shape")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_round_trip() {
        for value in [
            PropertyValue::Null,
            PropertyValue::Bool(true),
            PropertyValue::Int(-7),
            PropertyValue::Float(2.5),
            PropertyValue::Text("A".to_string()),
        ] {
            assert_eq!(from_bolt(to_bolt(&value)).unwrap(), value);
        }
    }

    #[test]
    fn test_list_round_trip() {
        let value = PropertyValue::List(vec![
            PropertyValue::Int(1),
            PropertyValue::Text("two".to_string()),
        ]);
        assert_eq!(from_bolt(to_bolt(&value)).unwrap(), value);
    }

    #[test]
    fn test_uncomparable_bolt_value_is_rejected() {
        let bytes = BoltType::Bytes(neo4rs::BoltBytes::new(vec![1u8, 2].into()));
        let error = from_bolt(bytes).unwrap_err();
        assert!(error.to_string().contains("Bytes"));
    }
}
