//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`. They are separate from the
//! operation log, which only ever holds move records and notes.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default level (`info`, or `debug` when
/// `verbose`). Returns `false` if a subscriber was already installed, in
/// which case nothing changes.
pub fn init(verbose: bool) -> bool {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
