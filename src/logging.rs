//! Diagnostic logging to stderr.
//!
//! Reports go to stdout through the `cli::report` module. Everything here is
//! for following what the analysis skipped and why.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding an `EnvFilter` directive, e.g. `fmtguard=trace`.
pub const LOG_ENV: &str = "FMTGUARD_LOG";

/// Install the global subscriber. Later calls are no-ops.
///
/// `FMTGUARD_LOG` wins over `verbose`; without it the level is `warn`, or
/// `debug` when `verbose` is set.
pub fn init_logging(verbose: bool) {
    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let use_ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_ansi(use_ansi)
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .compact()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}
