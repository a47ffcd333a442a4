//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilegen::config::ConfigFileError;
use tilegen::coord::CoordError;
use tilegen::store::StoreError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or written
    Config(ConfigFileError),
    /// Database unreachable or a statement failed
    Store(StoreError),
    /// Invalid tile arguments
    InvalidTile(CoordError),
    /// Failed to start the async runtime or signal handling
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Store(StoreError::Connection(_)) => {
                eprintln!();
                eprintln!("Check the [database] section of your configuration:");
                eprintln!("  1. host and port point at a running MySQL server");
                eprintln!("  2. user and password are valid for the database");
                eprintln!("  3. Or try a dry run with: tilegen run --memory");
            }
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Run 'tilegen init --force' to write a fresh default configuration.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Store(e) => write!(f, "Database error: {}", e),
            CliError::InvalidTile(e) => write!(f, "Invalid tile: {}", e),
            CliError::Runtime(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::InvalidTile(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidTile(e)
    }
}
