//! Logging bootstrap for binaries and tests.
//!
//! The library only emits `tracing` events; it never installs a subscriber
//! on its own.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

fn build_filter(config: &LogConfig) -> EnvFilter {
    match config.filter {
        Some(ref custom) => {
            EnvFilter::try_new(custom).unwrap_or_else(|_| EnvFilter::new(config.level.to_string()))
        }
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
    }
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.level` unless `config.filter` is set.
/// Returns `false` when a global subscriber was already installed; later
/// calls are otherwise ignored.
pub fn init_logging(config: &LogConfig) -> bool {
    let subscriber = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt::layer().compact().with_ansi(config.ansi).with_target(true));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn explicit_filter_overrides_level() {
        let cfg = LogConfig {
            level: LogLevel::Error,
            ansi: false,
            filter: Some("biosig=debug".into()),
        };
        assert_eq!(build_filter(&cfg).to_string(), "biosig=debug");
    }

    #[test]
    fn second_install_is_rejected() {
        let cfg = LogConfig::default();
        let _ = init_logging(&cfg);
        assert!(!init_logging(&cfg));
    }
}
