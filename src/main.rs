//! Command-line interface for graph-sync.
//!
//! # Usage Examples
//!
//! ```bash
//! # Bulk-copy one store into another
//! graph-sync copy \
//!   --source-uri bolt://localhost:7687 --source-password secret \
//!   --target-uri bolt://replica:7687 --target-password secret
//!
//! # Verify the replica is a faithful copy
//! graph-sync verify \
//!   --source-uri bolt://localhost:7687 --source-password secret \
//!   --target-uri bolt://replica:7687 --target-password secret \
//!   --node-key name --relationship-key distance
//! ```
//!
//! An operator interrupt (Ctrl-C) triggers a graceful shutdown and exits 0;
//! a count mismatch, verification mismatch, or transport failure is printed
//! and exits 1.

use clap::{Parser, Subcommand};
use graph_bolt::BoltGraph;
use graph_engine::{Controller, EngineConfig, PhaseOutcome};
use graph_record::RecordCodec;
use graph_sync::{KeyOpts, SourceOpts, TargetOpts};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "graph-sync")]
#[command(about = "Copy a graph store into another store, or verify one is a faithful copy")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bulk-copy the source store's exported statements into the target store
    Copy {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        target: TargetOpts,
    },

    /// Verify the target store is a faithful copy of the source store
    Verify {
        #[command(flatten)]
        source: SourceOpts,

        #[command(flatten)]
        target: TargetOpts,

        #[command(flatten)]
        keys: KeyOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Copy { source, target } => {
            let keys = KeyOpts {
                node_key: "name".to_string(),
                relationship_key: "distance".to_string(),
            };
            let controller = connect(&source, &target, &keys)?;
            watch_for_interrupt(controller.cancel_token());

            let report = controller.run_copy().await?;
            match report.outcome {
                PhaseOutcome::Complete => tracing::info!(
                    "copy complete: {} statements replayed",
                    report.received
                ),
                PhaseOutcome::Cancelled => tracing::info!(
                    "copy cancelled: {} statements replayed, {} still in flight",
                    report.received,
                    report.sent.saturating_sub(report.received)
                ),
            }
        }
        Commands::Verify {
            source,
            target,
            keys,
        } => {
            let controller = connect(&source, &target, &keys)?;
            watch_for_interrupt(controller.cancel_token());

            let report = controller.run_verify().await?;
            match report.relationships.outcome {
                PhaseOutcome::Complete => tracing::info!(
                    "verified {} relationships and {} isolated nodes",
                    report.relationships.received,
                    report.isolated_nodes.map_or(0, |phase| phase.received)
                ),
                PhaseOutcome::Cancelled => {
                    tracing::info!("verification cancelled before completion")
                }
            }
        }
    }

    Ok(())
}

fn connect(
    source: &SourceOpts,
    target: &TargetOpts,
    keys: &KeyOpts,
) -> anyhow::Result<Controller<BoltGraph>> {
    let source_store = BoltGraph::connect(&source.into())?;
    let target_store = BoltGraph::connect(&target.into())?;
    let codec = RecordCodec::new(keys.node_key.clone(), keys.relationship_key.clone());
    Ok(Controller::new(
        source_store,
        target_store,
        codec,
        EngineConfig::default(),
    ))
}

/// Turn the first Ctrl-C into a cooperative shutdown request.
fn watch_for_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, requesting shutdown");
            token.cancel();
        }
    });
}
