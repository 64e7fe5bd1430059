//! Engine-fatal error conditions surfaced by the run controller.
//!
//! Worker tasks never crash the process; they record the first error they
//! hit and exit their loop. The controller observes recorded errors on its
//! next poll, initiates shutdown, and re-raises after the tasks are joined.
//! Nothing is retried.

use graph_record::IdentityKey;
use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// The cheap pre-check found the stores disagreeing on a record count;
    /// raised before any streaming begins.
    CountMismatch {
        kind: &'static str,
        source: i64,
        target: i64,
    },

    /// A target response did not match the expectation captured when its
    /// request was derived.
    VerificationMismatch {
        key: IdentityKey,
        reason: &'static str,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::CountMismatch {
                kind,
                source,
                target,
            } => write!(
                f,
                "{kind} count mismatch: source has {source}, target has {target}"
            ),
            EngineError::VerificationMismatch { key, reason } => {
                write!(f, "verification failed for {key}: {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
