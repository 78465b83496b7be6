//! Logging setup
//!
//! Installs a `tracing` subscriber that writes to stderr, so command output
//! on stdout stays clean for piping.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable that overrides the log filter (`RUST_LOG` syntax)
pub const LOG_ENV: &str = "TALLY_LOG";

/// Pick the filter directive: `--verbose`, then `TALLY_LOG`, then settings
pub fn filter_directive(verbose: bool, env_value: Option<&str>, configured: &str) -> String {
    if verbose {
        return "debug".to_string();
    }
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => configured.to_string(),
    }
}

/// Install the global subscriber
///
/// Calling this more than once keeps the first subscriber.
pub fn init_logging(verbose: bool, configured_level: &str) {
    let env_value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env_value.as_deref(), configured_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .try_init();
}
