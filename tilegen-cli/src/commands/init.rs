//! Init command - write a default configuration file.

use std::path::Path;

use tilegen::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

pub fn run(config: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = resolve_config_path(config);

    if force {
        ConfigFile::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(&path)? {
        println!("Created configuration file at {}", path.display());
    } else {
        println!(
            "Configuration file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    Ok(())
}
