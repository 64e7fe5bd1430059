//! The pipelined transfer-and-verification engine.
//!
//! Streams a broad query's results out of a source store, derives per-record
//! requests against a target store, and either replays them (bulk copy) or
//! checks the target's answers against the snapshots captured at derivation
//! time (verification). The store itself is an external collaborator behind
//! the [`GraphStore`] and [`TransferPipeline`] traits; this crate owns the
//! producer/consumer tasks, the stream transforms, the monitoring loop, and
//! shutdown/error propagation.

pub mod controller;
pub mod drainer;
pub mod error;
pub mod feeder;
pub mod pipeline;
pub mod progress;
pub mod queries;
pub mod task;
pub mod testing;
pub mod transform;
pub mod verify;

pub use controller::{
    Controller, EngineConfig, PhaseOutcome, PhaseReport, StoreCounts, VerifyReport,
};
pub use drainer::{Drainer, Sink};
pub use error::EngineError;
pub use feeder::Feeder;
pub use pipeline::{Batch, GraphStore, Request, TransferPipeline};
pub use progress::ProgressSnapshot;
