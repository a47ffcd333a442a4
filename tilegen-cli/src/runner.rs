//! CLI runner for common setup.
//!
//! Encapsulates configuration loading, logging initialization and runtime
//! creation so command handlers stay short.

use std::path::{Path, PathBuf};

use tilegen::config::{config_file_path, ConfigFile};
use tilegen::logging::{init_logging, LoggingGuard, LoggingOptions};
use tracing::info;

use crate::error::CliError;

/// Resolves the configuration file path from `--config`.
pub fn resolve_config_path(config: Option<&Path>) -> PathBuf {
    config.map(Path::to_path_buf).unwrap_or_else(config_file_path)
}

/// Loads the configuration, falling back to defaults when the file is absent.
pub fn load_config(config: Option<&Path>) -> Result<ConfigFile, CliError> {
    Ok(ConfigFile::load_from(&resolve_config_path(config))?)
}

/// Builds the multi-threaded runtime used by async commands.
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tilegen")
        .build()
        .map_err(CliError::Runtime)
}

/// Runner that keeps logging alive for a long running command.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Loads config and initializes logging.
    pub fn new(config: Option<&Path>, options: LoggingOptions) -> Result<Self, CliError> {
        let config_path = resolve_config_path(config);
        let config = ConfigFile::load_from(&config_path)?;

        let logging_guard = init_logging(&config.logging.file, options)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tilegen v{}", tilegen::VERSION);
        info!(
            config = %self.config_path.display(),
            log_file = %self.config.logging.file.display(),
            "tilegen CLI: {} command",
            command
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path_wins() {
        let path = Path::new("/etc/tilegen/config.ini");
        assert_eq!(resolve_config_path(Some(path)), path);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(resolve_config_path(None), config_file_path());
    }

    #[test]
    fn test_missing_config_loads_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = load_config(Some(&temp.path().join("absent.ini"))).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[dispatcher]\nworkers = 0\n").unwrap();

        assert!(matches!(load_config(Some(&path)), Err(CliError::Config(_))));
    }
}
