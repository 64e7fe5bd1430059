//! Record-level building blocks for graph-sync.
//!
//! This crate owns everything the transfer engine needs to reason about a
//! single result row: property values, record shapes, identity keys derived
//! from user-configured properties, property snapshots, and the correlation
//! map that links an in-flight verification request to the snapshot captured
//! when it was issued.

mod codec;
mod correlation;
mod error;
mod key;
mod record;
mod values;

pub use codec::RecordCodec;
pub use correlation::CorrelationMap;
pub use error::CodecError;
pub use key::{IdentityKey, KeyValue, Snapshot};
pub use record::{Column, NodeRecord, Properties, Record, RelationshipRecord};
pub use values::PropertyValue;
