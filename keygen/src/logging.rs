//! # Diagnostics
//!
//! `runstr-keygen` writes exactly one thing to stdout: the key report (or the
//! encode/decode result). Everything from `tracing` goes to stderr, so
//! `runstr-keygen generate -o json | jq -r .public` and
//! `runstr-keygen generate > keys.txt` never capture a log line.
//!
//! Events from both crates carry the public key at most. Secrets are never
//! recorded at any level.

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shape of the stderr diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines for an operator at a terminal.
    Pretty,
    /// One JSON object per event, for CI jobs that archive provisioning runs.
    Json,
}

/// Install the global subscriber for this process.
///
/// `RUST_LOG` replaces `default_filter` when it is set. To see the curve and
/// encoding steps while provisioning a key:
///
/// ```text
/// RUST_LOG=runstr_attest=debug,runstr_keygen=debug runstr-keygen generate
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter '{}'", default_filter))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.context("a tracing subscriber is already installed")?;

    tracing::debug!(?format, "diagnostics on stderr");
    Ok(())
}
