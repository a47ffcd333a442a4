//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::duration::format_duration;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[output]
; Directories receiving rendered tiles, laid out as <dir>/<z>/<x>/<y>.png
global_heatmap_dir = {}
gateway_count_dir = {}
fog_of_war_dir = {}

[database]
; MySQL server holding tiles_to_redraw and the agg_zoom_* tables
host = {}
port = {}
user = {}
password = {}
database = {}
; Connection pool size
max_connections = {}
; Seconds to wait for a pooled connection
connect_timeout_secs = {}

[coordinator]
; Sleep between polls when no tile is eligible (e.g. 10s, 500ms, 1m)
poll_interval = {}
; Queued tiles younger than this are not processed yet
min_queue_age = {}
; Zoom levels to process (inclusive)
min_zoom = {}
max_zoom = {}
; Zoom level of the aggregate tables (agg_zoom_<source_zoom>)
source_zoom = {}

[dispatcher]
; Number of render/writer workers
workers = {}
; Render jobs held in memory before the coordinator waits
queue_capacity = {}

[logging]
file = {}
"#,
        path_to_string(&config.output.global_heatmap_dir),
        path_to_string(&config.output.gateway_count_dir),
        path_to_string(&config.output.fog_of_war_dir),
        config.database.host,
        config.database.port,
        config.database.user,
        config.database.password,
        config.database.database,
        config.database.max_connections,
        config.database.connect_timeout_secs,
        format_duration(config.coordinator.poll_interval),
        format_duration(config.coordinator.min_queue_age),
        config.coordinator.min_zoom,
        config.coordinator.max_zoom,
        config.coordinator.source_zoom,
        config.dispatcher.workers,
        config.dispatcher.queue_capacity,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
