//! tilegen CLI - Command-line interface
//!
//! Runs the tile reprocessing daemon and a few maintenance commands around
//! its work queue and configuration.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{bbox, enqueue, init, run};
use error::CliError;

#[derive(Parser)]
#[command(name = "tilegen")]
#[command(version = tilegen::VERSION)]
#[command(about = "Regenerate coverage map tiles from the redraw queue", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tilegen/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the redraw queue until interrupted
    Run {
        /// Use empty in-memory stores instead of MySQL (dry run)
        #[arg(long)]
        memory: bool,

        /// Do not mirror log output to stdout
        #[arg(long)]
        quiet: bool,
    },

    /// Queue a tile for redrawing
    Enqueue {
        /// Zoom level
        zoom: u8,
        /// Tile column
        x: i64,
        /// Tile row
        y: i64,
    },

    /// Print the aggregate region fetched for a tile
    Bbox {
        /// Zoom level
        zoom: u8,
        /// Tile column
        x: i64,
        /// Tile row
        y: i64,

        /// Padding in tiles around the tile
        #[arg(long, default_value_t = tilegen::coordinator::FETCH_PADDING)]
        pad: u32,

        /// Zoom level to project the region to (default: configured source zoom)
        #[arg(long)]
        target_zoom: Option<u8>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Run { memory, quiet } => run::run(run::RunArgs {
            config: cli.config,
            debug: cli.debug,
            memory,
            quiet,
        }),
        Commands::Enqueue { zoom, x, y } => enqueue::run(cli.config.as_deref(), zoom, x, y),
        Commands::Bbox {
            zoom,
            x,
            y,
            pad,
            target_zoom,
        } => bbox::run(cli.config.as_deref(), zoom, x, y, pad, target_zoom),
        Commands::Init { force } => init::run(cli.config.as_deref(), force),
    };

    if let Err(e) = result {
        e.exit();
    }
}
