//! Command-line interface layer.

pub mod actions;
pub mod args;
pub mod commands;
pub mod exit_status;
pub mod report;
mod run;

use std::process::ExitCode;

use anyhow::Result;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

use crate::logging::init_logging;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    init_logging(args.verbose());

    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };

    let status = run::run(args)?;
    Ok(status.into())
}
