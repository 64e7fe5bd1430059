//! Error types for record decoding.

use thiserror::Error;

/// Errors raised while extracting identity keys and snapshots from records.
///
/// A missing or unusable identity property indicates a configuration
/// mismatch rather than a transient condition, so these are fatal to the
/// phase that hits them and are never retried.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The configured identity property is absent from the record.
    #[error("record is missing the configured identity property '{property}'")]
    MissingKey { property: String },

    /// The identity property exists but its value cannot key a lookup.
    #[error("property '{property}' is not usable as an identity key (null and list values cannot key a lookup)")]
    UnsupportedKey { property: String },

    /// The record does not have the column layout the decoder expected.
    #[error("unexpected record shape: expected {expected}, got [{actual}]")]
    UnexpectedShape {
        expected: &'static str,
        actual: String,
    },
}
