//! Process-wide tracing setup.

use anyhow::{Context, Result};
use hk_config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const LOG_FILE_PREFIX: &str = "homekeep.log";

/// Install the global subscriber: stderr always, plus a daily-rotated file
/// when `config.dir` is set.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs. Initializes at most once; later calls are no-ops.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = env_filter(rust_log.as_deref(), &config.level);

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .ok();

    Ok(guard)
}

/// `RUST_LOG` wins over the configured level. An unparseable directive falls
/// back to `info` rather than silencing everything.
fn env_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    let directive = filter_directive(rust_log, level);
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn filter_directive<'a>(rust_log: Option<&'a str>, level: &'a str) -> &'a str {
    match rust_log.map(str::trim) {
        Some(env) if !env.is_empty() => env,
        _ => level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_rust_log_overrides_config_level() {
        assert_eq!(filter_directive(Some("hk_web=debug"), "info"), "hk_web=debug");
        assert_eq!(filter_directive(None, "warn"), "warn");
        assert_eq!(filter_directive(Some("  "), "warn"), "warn");
    }

    #[test]
    fn test_env_filter_accepts_configured_level() {
        assert_eq!(
            env_filter(None, "debug").max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            env_filter(Some("warn"), "debug").max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_init_creates_log_dir() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let config = LogConfig {
            level: "info".into(),
            dir: Some(dir.clone()),
        };

        let guard = init(&config).unwrap();
        assert!(guard.is_some());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_init_without_dir_has_no_guard() {
        let config = LogConfig::default();
        assert!(init(&config).unwrap().is_none());
    }
}
