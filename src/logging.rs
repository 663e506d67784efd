//! Logging configuration using tracing

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when neither `--verbose` nor `RUST_LOG` is given
const DEFAULT_FILTER: &str = "info";

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the logging system.
///
/// Logs go to stderr so stdout stays clean for command results.
pub fn init(verbose: bool, json: bool) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(filter(verbose));

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter() {
        assert_eq!(filter(true).to_string(), "debug");
    }

    #[test]
    fn test_second_init_is_an_error() {
        // Whichever test gets here first wins the global subscriber
        let _ = init(false, false);
        assert!(init(false, true).is_err());
    }
}
