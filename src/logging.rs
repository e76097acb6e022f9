//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count.
#[must_use]
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs a stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `verbosity`.
/// Calling this more than once keeps the first subscriber.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
