//! Run command - process the redraw queue until interrupted.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tilegen::config::ConfigFile;
use tilegen::coordinator::{Coordinator, CoordinatorStats};
use tilegen::dispatcher::{DispatcherConfig, DispatcherStats, RenderDispatcher};
use tilegen::logging::LoggingOptions;
use tilegen::render::RenderPipeline;
use tilegen::store::{
    AggregateSource, MemoryAggregateSource, MemoryQueueStore, MySqlStore, WorkQueueStore,
};

use crate::error::CliError;
use crate::runner::{runtime, CliRunner};

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub debug: bool,
    /// Use in-memory stores
    pub memory: bool,
    /// Disable stdout logging
    pub quiet: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(
        args.config.as_deref(),
        LoggingOptions {
            stdout: !args.quiet,
            debug: args.debug,
        },
    )?;
    runner.log_startup("run");

    let config = runner.config().clone();
    let runtime = runtime()?;

    let (coordinator, dispatcher) = runtime.block_on(async move {
        if args.memory {
            warn!("Using in-memory stores, nothing is read from or written to MySQL");
            let queue = Arc::new(MemoryQueueStore::new());
            let aggregates = Arc::new(MemoryAggregateSource::new(config.coordinator.source_zoom));
            Ok::<_, CliError>(serve(&config, queue, aggregates).await)
        } else {
            let store = Arc::new(
                MySqlStore::connect(&config.database, config.coordinator.source_zoom).await?,
            );
            let stats = serve(&config, Arc::clone(&store), Arc::clone(&store)).await;
            store.close().await;
            Ok(stats)
        }
    })?;

    println!();
    println!("Cycles:          {}", coordinator.cycles);
    println!("Tiles claimed:   {}", coordinator.tiles_rendered);
    println!("Jobs submitted:  {}", coordinator.jobs_submitted);
    println!("Skipped:         {}", coordinator.skipped);
    println!("Aborted:         {}", coordinator.aborted);
    println!(
        "Jobs completed:  {} ({} failed)",
        dispatcher.completed, dispatcher.failed
    );
    println!(
        "Tiles written:   {} ({} stale removed)",
        dispatcher.tiles_written, dispatcher.tiles_removed
    );

    Ok(())
}

/// Runs the dispatcher and coordinator until Ctrl-C, then drains the workers.
async fn serve<Q, A>(
    config: &ConfigFile,
    queue: Arc<Q>,
    aggregates: Arc<A>,
) -> (CoordinatorStats, DispatcherStats)
where
    Q: WorkQueueStore,
    A: AggregateSource,
{
    let pipeline = Arc::new(RenderPipeline::from_settings(&config.output));
    let dispatcher =
        RenderDispatcher::start(pipeline, DispatcherConfig::from(&config.dispatcher));

    let coordinator = Coordinator::new(&config.coordinator, queue, aggregates, dispatcher.submitter());

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(
        tokio::signal::ctrl_c(),
        shutdown.clone(),
    ));

    println!("tilegen running. Press Ctrl+C to stop.");
    let coordinator_stats = coordinator.run(shutdown).await;

    info!("Draining render queue");
    let dispatcher_stats = dispatcher.shutdown().await;

    (coordinator_stats, dispatcher_stats)
}

/// Cancels `token` once `signal` fires.
///
/// A listener that cannot be installed leaves the daemon running.
async fn cancel_on_interrupt<F>(signal: F, token: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Interrupt received, finishing current cycle");
            token.cancel();
        }
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl-C, continuing without it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_interrupt_cancels_token() {
        let token = CancellationToken::new();
        cancel_on_interrupt(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_listener_failure_keeps_running() {
        let token = CancellationToken::new();
        cancel_on_interrupt(
            async { Err(io::Error::new(io::ErrorKind::Other, "no signal driver")) },
            token.clone(),
        )
        .await;
        assert!(!token.is_cancelled());
    }
}
