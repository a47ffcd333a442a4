//! tilegen - Map tile reprocessing for coverage rasters
//!
//! Turns a backlog of dirty tile coordinates into rendered heatmap, gateway
//! count and fog-of-war PNG tiles, using pre-aggregated coverage cells.
//!
//! # Overview
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilegen::config::ConfigFile;
//! use tilegen::coordinator::Coordinator;
//! use tilegen::dispatcher::{DispatcherConfig, RenderDispatcher};
//! use tilegen::render::RenderPipeline;
//! use tilegen::store::MySqlStore;
//!
//! let config = ConfigFile::load()?;
//! let store = Arc::new(MySqlStore::connect(&config.database, config.coordinator.source_zoom).await?);
//! let dispatcher = RenderDispatcher::start(
//!     Arc::new(RenderPipeline::from_settings(&config.output)),
//!     DispatcherConfig::from(&config.dispatcher),
//! );
//! let coordinator = Coordinator::new(&config.coordinator, store.clone(), store, dispatcher.submitter());
//! coordinator.run(shutdown).await;
//! dispatcher.shutdown().await;
//! ```

pub mod config;
pub mod coord;
pub mod coordinator;
pub mod dispatcher;
pub mod logging;
pub mod render;
pub mod store;

/// Version of the tilegen library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
