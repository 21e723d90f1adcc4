//! Logging initialization for the command-line tool
//!
//! `RUST_LOG` takes precedence when set. Otherwise the level defaults to `info`
//! (`debug` in debug builds) and each `-v` raises it one step.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Default filter directive for a given verbosity count
pub fn default_directive(verbose: u8) -> &'static str {
    let base = if cfg!(debug_assertions) { 1 } else { 0 };
    match verbose.saturating_add(base) {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global tracing subscriber; logs go to stderr so results can be piped
pub fn setup_logging(verbose: u8) {
    let from_env = std::env::var("RUST_LOG").is_ok();
    let filter = if from_env {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(verbose))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    if !from_env {
        tracing::debug!("RUST_LOG not set, using '{}'", default_directive(verbose));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_level() {
        let levels: Vec<&str> = (0..4).map(default_directive).collect();
        if cfg!(debug_assertions) {
            assert_eq!(levels, ["debug", "trace", "trace", "trace"]);
        } else {
            assert_eq!(levels, ["info", "debug", "trace", "trace"]);
        }
    }
}
