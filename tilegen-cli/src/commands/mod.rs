//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`run`] - Main command (process the redraw queue)
//! - [`enqueue`] - Queue a tile for redrawing
//! - [`bbox`] - Show the aggregate region fetched for a tile
//! - [`init`] - Configuration initialization

pub mod bbox;
pub mod enqueue;
pub mod init;
pub mod run;
