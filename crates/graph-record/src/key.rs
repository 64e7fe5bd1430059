//! Identity keys and property snapshots.

use crate::error::CodecError;
use crate::record::Properties;
use crate::PropertyValue;
use std::fmt;

/// A scalar property value usable as a correlation key.
///
/// Floats are keyed by their IEEE-754 bit pattern so that map lookups stay
/// exact and total; `0.0` and `-0.0` are therefore distinct keys. Null and
/// list values cannot key a lookup and are rejected at conversion time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
}

impl KeyValue {
    /// Convert a property value into a key, naming the offending property
    /// when the value cannot serve as one.
    pub fn from_property(property: &str, value: &PropertyValue) -> Result<Self, CodecError> {
        match value {
            PropertyValue::Bool(b) => Ok(Self::Bool(*b)),
            PropertyValue::Int(i) => Ok(Self::Int(*i)),
            PropertyValue::Float(f) => Ok(Self::Float(f.to_bits())),
            PropertyValue::Text(s) => Ok(Self::Text(s.clone())),
            PropertyValue::Null | PropertyValue::List(_) => Err(CodecError::UnsupportedKey {
                property: property.to_string(),
            }),
        }
    }

    /// The property value this key was derived from, for use as a query
    /// parameter when re-querying the other store.
    pub fn to_property(&self) -> PropertyValue {
        match self {
            Self::Bool(b) => PropertyValue::Bool(*b),
            Self::Int(i) => PropertyValue::Int(*i),
            Self::Float(bits) => PropertyValue::Float(f64::from_bits(*bits)),
            Self::Text(s) => PropertyValue::Text(s.clone()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// The identity of a node or relationship for cross-store correlation.
///
/// Relationship identity is the composite of the start node key, the end node
/// key, and the relationship's own key property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Node(KeyValue),
    Relationship {
        start: KeyValue,
        end: KeyValue,
        rel: KeyValue,
    },
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(key) => write!(f, "({key})"),
            Self::Relationship { start, end, rel } => {
                write!(f, "({start})-[{rel}]->({end})")
            }
        }
    }
}

/// The comparable payload associated with an identity key at the moment a
/// verification request was issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Node(Properties),
    Relationship {
        start: Properties,
        end: Properties,
        rel: Properties,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_keys_compare_by_bits() {
        let a = KeyValue::from_property("distance", &PropertyValue::Float(5.0)).unwrap();
        let b = KeyValue::from_property("distance", &PropertyValue::Float(5.0)).unwrap();
        let c = KeyValue::from_property("distance", &PropertyValue::Float(5.0000001)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_null_key_rejected() {
        let err = KeyValue::from_property("name", &PropertyValue::Null).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedKey { property } if property == "name"));
    }

    #[test]
    fn test_key_round_trips_to_property() {
        let value = PropertyValue::Float(2.5);
        let key = KeyValue::from_property("distance", &value).unwrap();
        assert_eq!(key.to_property(), value);
    }

    #[test]
    fn test_relationship_key_display() {
        let key = IdentityKey::Relationship {
            start: KeyValue::Text("A".to_string()),
            end: KeyValue::Text("B".to_string()),
            rel: KeyValue::Int(5),
        };
        assert_eq!(key.to_string(), "(A)-[5]->(B)");
    }
}
