//! Configuration for the tile reprocessor.
//!
//! Everything is loaded once at startup from an INI file (see
//! [`ConfigFile::load_from`]) and passed by reference into the stores, the
//! render dispatcher and the coordinator.
//!
//! # Example
//!
//! ```
//! use tilegen::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert!(config.coordinator.min_zoom <= config.coordinator.max_zoom);
//! ```

mod defaults;
mod duration;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use duration::{format_duration, parse_duration, DurationParseError};
pub use file::ConfigFileError;
pub use settings::{
    ConfigFile, CoordinatorSettings, DatabaseSettings, DispatcherSettings, LoggingSettings,
    OutputSettings,
};
