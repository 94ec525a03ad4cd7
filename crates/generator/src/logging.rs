//! Logging setup
//!
//! Console logging through `tracing-subscriber`. The level comes from
//! `RUST_LOG` when set, otherwise from the `BADGE_ENV` environment
//! (`production` logs at `info`, everything else at `debug`).

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize logging once; later calls are no-ops
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        );

        // Another subscriber may already be installed, e.g. by a test harness
        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }

        tracing::debug!(environment = %environment, "logging initialized");
    });
}

/// Current environment from `BADGE_ENV`, defaulting to `development`
fn get_environment() -> String {
    std::env::var("BADGE_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Default log level for an environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_for_environment() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("test"), "debug");
    }

    #[test]
    fn test_init_twice() {
        init_logging();
        init_logging();
    }
}
