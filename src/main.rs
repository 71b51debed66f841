use std::process::ExitCode;

use clap::Parser;
use fmtguard::cli::{Arguments, Command, ExitStatus};
use fmtguard::logging::init_logging;

fn main() -> ExitCode {
    let args = Arguments::parse();

    if matches!(args.command, Some(Command::Serve)) {
        // stdout carries the protocol, logs stay on stderr
        init_logging(false);
        if let Err(err) = fmtguard::mcp::run_server() {
            eprintln!("Error: {}", err);
            return ExitStatus::Error.into();
        }
        return ExitStatus::Success.into();
    }

    match fmtguard::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
