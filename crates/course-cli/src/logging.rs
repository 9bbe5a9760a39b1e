//! Diagnostic tracing setup.
//!
//! Diagnostics go to stderr and never mix with the command output on
//! stdout. `--verbose` turns on debug-level spans for this tool's crates;
//! `RUST_LOG` takes over completely when set without the flag.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("course_cli=debug,course_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
