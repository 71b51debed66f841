use std::{fs, path::Path};

use anyhow::{Context, Result};
use colored::Colorize;

use super::super::exit_status::ExitStatus;
use super::super::report::SUCCESS_MARK;
use crate::config::{CONFIG_FILE_NAME, Config, default_config_json};

/// Write `.fmtguardrc.json` with the default settings into the current directory.
pub fn init() -> Result<ExitStatus> {
    let config_path = Path::new(CONFIG_FILE_NAME);

    if config_path.exists() {
        eprintln!(
            "Error: {CONFIG_FILE_NAME} already exists; delete it to regenerate the defaults"
        );
        return Ok(ExitStatus::Failure);
    }

    fs::write(config_path, default_config_json()?)
        .with_context(|| format!("Failed to write {CONFIG_FILE_NAME}"))?;

    let defaults = Config::default();
    println!(
        "{} {}",
        SUCCESS_MARK.green(),
        format!("Created {CONFIG_FILE_NAME} with default settings").green()
    );
    println!("  ignores: {}", defaults.ignores.join(", "));
    println!("  includes: all .cs files not ignored");
    println!("  ignoreTestFiles: {}", defaults.ignore_test_files);

    Ok(ExitStatus::Success)
}
