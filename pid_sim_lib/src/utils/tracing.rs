//! Process-wide log output for the simulator.

use eyre::Result;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the log filter from `RUST_LOG`, falling back to `default`.
pub fn log_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber for a simulator run.
///
/// Compact single-line events without targets, so the per-tick debug lines
/// stay readable. Fails if a global subscriber is already installed.
///
/// ```no_run
/// fn main() -> eyre::Result<()> {
///     pid_sim_lib::init_tracing()?;
///     Ok(())
/// }
/// ```
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(DEFAULT_LOG_FILTER))
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_subscriber_installs_once() {
        assert!(init_tracing().is_ok());
        assert!(init_tracing().is_err());
    }

    #[test]
    fn test_default_filter_is_info() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert_eq!(log_filter(DEFAULT_LOG_FILTER).to_string(), "info");
        }
    }
}
