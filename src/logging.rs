//! Process-wide tracing setup for the binary.
//!
//! Output goes to stderr so command results on stdout stay machine-readable.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "SMART_TASK_LOG";

const DEFAULT_DIRECTIVE: &str = "smart_task_parser=info";
const VERBOSE_DIRECTIVE: &str = "smart_task_parser=debug";

/// Install the global subscriber.
///
/// `SMART_TASK_LOG` wins over `verbose` when set. Fails if a subscriber is
/// already installed.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "smart_task_parser=info");
        assert_eq!(default_directive(true), "smart_task_parser=debug");
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging(false);
        let err = init_logging(true).unwrap_err();
        assert!(err.to_string().starts_with("failed to initialize logging"));
    }
}
