//! Default values and constants for all configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use super::settings::*;
use crate::coord::MAX_ZOOM;

// =============================================================================
// Output defaults
// =============================================================================

pub const DEFAULT_GLOBAL_HEATMAP_DIR: &str = "./heatmapTiles";
pub const DEFAULT_GATEWAY_COUNT_DIR: &str = "./gwCountTiles";
pub const DEFAULT_FOG_OF_WAR_DIR: &str = "./fowTiles";

// =============================================================================
// Database defaults
// =============================================================================

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 3306;
pub const DEFAULT_DB_USER: &str = "user";
pub const DEFAULT_DB_PASSWORD: &str = "password";
pub const DEFAULT_DB_NAME: &str = "database";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Coordinator defaults
// =============================================================================

/// Default sleep when the queue has nothing eligible.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default minimum age before a queued tile is eligible.
pub const DEFAULT_MIN_QUEUE_AGE: Duration = Duration::from_secs(1);

pub const DEFAULT_MIN_ZOOM: u8 = 1;
pub const DEFAULT_MAX_ZOOM: u8 = 19;

/// Zoom level of the `agg_zoom_*` tables.
pub const DEFAULT_SOURCE_ZOOM: u8 = 19;

/// Highest zoom any setting may name.
pub const MAX_CONFIG_ZOOM: u8 = MAX_ZOOM;

// =============================================================================
// Dispatcher defaults
// =============================================================================

pub const DEFAULT_WORKERS: usize = 4;

/// Queue slots per worker when `queue_capacity` is not set.
pub const DEFAULT_QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Default queue capacity for a given worker count.
pub fn default_queue_capacity(workers: usize) -> usize {
    workers.max(1) * DEFAULT_QUEUE_SLOTS_PER_WORKER
}

// =============================================================================
// Paths
// =============================================================================

/// Default log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "tilegen.log";

/// Get the path to the config directory (~/.tilegen).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilegen")
}

/// Get the path to the config file (~/.tilegen/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Get the default log file path (~/.tilegen/tilegen.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            output: OutputSettings {
                global_heatmap_dir: PathBuf::from(DEFAULT_GLOBAL_HEATMAP_DIR),
                gateway_count_dir: PathBuf::from(DEFAULT_GATEWAY_COUNT_DIR),
                fog_of_war_dir: PathBuf::from(DEFAULT_FOG_OF_WAR_DIR),
            },
            database: DatabaseSettings {
                host: DEFAULT_DB_HOST.to_string(),
                port: DEFAULT_DB_PORT,
                user: DEFAULT_DB_USER.to_string(),
                password: DEFAULT_DB_PASSWORD.to_string(),
                database: DEFAULT_DB_NAME.to_string(),
                max_connections: DEFAULT_DB_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DB_CONNECT_TIMEOUT_SECS,
            },
            coordinator: CoordinatorSettings::default(),
            dispatcher: DispatcherSettings::default(),
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_queue_age: DEFAULT_MIN_QUEUE_AGE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            source_zoom: DEFAULT_SOURCE_ZOOM,
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: default_queue_capacity(DEFAULT_WORKERS),
        }
    }
}
