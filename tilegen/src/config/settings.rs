//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
///
/// Built once at startup and handed by reference to the components that
/// need it; nothing reads configuration from global state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Output directories for rendered tiles
    pub output: OutputSettings,
    /// Work queue / aggregate database connection
    pub database: DatabaseSettings,
    /// Reprocessing loop settings
    pub coordinator: CoordinatorSettings,
    /// Render worker pool settings
    pub dispatcher: DispatcherSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Where each artifact kind is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Global coverage heatmap tiles
    pub global_heatmap_dir: PathBuf,
    /// Gateway count tiles
    pub gateway_count_dir: PathBuf,
    /// Fog-of-war tiles
    pub fog_of_war_dir: PathBuf,
}

/// MySQL connection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Pool size. The coordinator issues one statement at a time, so a
    /// small pool is enough.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_secs: u64,
}

/// Reprocessing loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    /// Sleep between polls when nothing is eligible
    pub poll_interval: Duration,
    /// Requests younger than this are left alone so bursts of ingestion
    /// coalesce before a redraw
    pub min_queue_age: Duration,
    /// Lowest zoom level to process
    pub min_zoom: u8,
    /// Highest zoom level to process
    pub max_zoom: u8,
    /// Zoom level the aggregate tables are stored at
    pub source_zoom: u8,
}

/// Render worker pool configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatcherSettings {
    /// Number of writer workers
    pub workers: usize,
    /// Bounded job queue capacity; submissions wait while it is full
    pub queue_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
