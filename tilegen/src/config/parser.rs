//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::defaults::{default_queue_capacity, MAX_CONFIG_ZOOM};
use super::duration::parse_duration;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the
/// INI, then validates cross-field constraints.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = non_empty(section.get("global_heatmap_dir")) {
            config.output.global_heatmap_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("gateway_count_dir")) {
            config.output.gateway_count_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section.get("fog_of_war_dir")) {
            config.output.fog_of_war_dir = expand_tilde(v);
        }
    }

    // [database] section
    if let Some(section) = ini.section(Some("database")) {
        if let Some(v) = non_empty(section.get("host")) {
            config.database.host = v.to_string();
        }
        if let Some(v) = section.get("port") {
            config.database.port =
                parse_number(v, "database", "port", "must be a port number (1-65535)")?;
        }
        if let Some(v) = non_empty(section.get("user")) {
            config.database.user = v.to_string();
        }
        if let Some(v) = section.get("password") {
            config.database.password = v.to_string();
        }
        if let Some(v) = non_empty(section.get("database")) {
            config.database.database = v.to_string();
        }
        if let Some(v) = section.get("max_connections") {
            config.database.max_connections = parse_number(
                v,
                "database",
                "max_connections",
                "must be a positive integer",
            )?;
        }
        if let Some(v) = section.get("connect_timeout_secs") {
            config.database.connect_timeout_secs = parse_number(
                v,
                "database",
                "connect_timeout_secs",
                "must be a positive integer (seconds)",
            )?;
        }
    }

    // [coordinator] section
    if let Some(section) = ini.section(Some("coordinator")) {
        if let Some(v) = section.get("poll_interval") {
            config.coordinator.poll_interval =
                parse_duration(v).map_err(|e| invalid("coordinator", "poll_interval", v, e))?;
        }
        if let Some(v) = section.get("min_queue_age") {
            config.coordinator.min_queue_age =
                parse_duration(v).map_err(|e| invalid("coordinator", "min_queue_age", v, e))?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.coordinator.min_zoom =
                parse_number(v, "coordinator", "min_zoom", "must be a zoom level")?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.coordinator.max_zoom =
                parse_number(v, "coordinator", "max_zoom", "must be a zoom level")?;
        }
        if let Some(v) = section.get("source_zoom") {
            config.coordinator.source_zoom =
                parse_number(v, "coordinator", "source_zoom", "must be a zoom level")?;
        }
    }

    // [dispatcher] section
    if let Some(section) = ini.section(Some("dispatcher")) {
        if let Some(v) = section.get("workers") {
            config.dispatcher.workers =
                parse_number(v, "dispatcher", "workers", "must be a positive integer")?;
            config.dispatcher.queue_capacity = default_queue_capacity(config.dispatcher.workers);
        }
        if let Some(v) = section.get("queue_capacity") {
            config.dispatcher.queue_capacity =
                parse_number(v, "dispatcher", "queue_capacity", "must be a positive integer")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    validate(&config)?;
    Ok(config)
}

/// Checks constraints that span several keys.
fn validate(config: &ConfigFile) -> Result<(), ConfigFileError> {
    let c = &config.coordinator;

    if c.source_zoom > MAX_CONFIG_ZOOM {
        return Err(invalid(
            "coordinator",
            "source_zoom",
            c.source_zoom,
            format!("must be at most {}", MAX_CONFIG_ZOOM),
        ));
    }
    if c.max_zoom > c.source_zoom {
        return Err(invalid(
            "coordinator",
            "max_zoom",
            c.max_zoom,
            format!("must not exceed source_zoom ({})", c.source_zoom),
        ));
    }
    if c.min_zoom > c.max_zoom {
        return Err(invalid(
            "coordinator",
            "min_zoom",
            c.min_zoom,
            format!("must not exceed max_zoom ({})", c.max_zoom),
        ));
    }
    if config.dispatcher.workers == 0 {
        return Err(invalid("dispatcher", "workers", 0, "must be at least 1"));
    }
    if config.dispatcher.queue_capacity == 0 {
        return Err(invalid("dispatcher", "queue_capacity", 0, "must be at least 1"));
    }
    if config.database.max_connections == 0 {
        return Err(invalid("database", "max_connections", 0, "must be at least 1"));
    }

    Ok(())
}

fn invalid(
    section: &str,
    key: &str,
    value: impl ToString,
    reason: impl ToString,
) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_number<T: FromStr>(
    value: &str,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
