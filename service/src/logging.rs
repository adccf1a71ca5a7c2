use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ConfigBuilder, ThreadLogMode};

/// HTTP stack modules muted unless running at Trace. Their per-request logs
/// drown out subscriber joins and prunes on a busy relay.
const FILTERED_MODULES: &[&str] = &["tower", "tracing", "hyper", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger.
    ///
    /// At Trace everything is shown, including the HTTP stack, and every line
    /// carries the emitting thread so concurrent broadcasts can be told apart.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;
        simplelog::TermLogger::init(
            Self::convert_level_filter(level),
            Self::build_log_config(level),
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
    }

    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn is_tracing(level: LevelFilter) -> bool {
        level == LevelFilter::Trace
    }

    fn build_log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if Self::is_tracing(level) {
            builder
                .set_thread_level(simplelog::LevelFilter::Error)
                .set_thread_mode(ThreadLogMode::Both);
        } else {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_modules_cover_the_http_stack() {
        for module in ["tower", "hyper", "axum", "tracing"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
    }

    #[test]
    fn test_filtered_modules_never_hide_relay_crates() {
        for module in ["sse", "service", "web", "sse_relay"] {
            assert!(
                !FILTERED_MODULES.iter().any(|m| module.starts_with(m)),
                "{module} must stay visible"
            );
        }
    }

    #[test]
    fn test_only_trace_counts_as_tracing() {
        assert!(Logger::is_tracing(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(!Logger::is_tracing(level), "{level} should filter");
        }
    }

    #[test]
    fn test_build_log_config_at_every_level_does_not_panic() {
        for level in LevelFilter::iter() {
            let _config = Logger::build_log_config(level);
        }
    }

    #[test]
    fn test_convert_level_filter_keeps_ordering() {
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Off) as u8,
            simplelog::LevelFilter::Off as u8
        );
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Debug) as u8,
            simplelog::LevelFilter::Debug as u8
        );
        assert_eq!(
            Logger::convert_level_filter(LevelFilter::Trace) as u8,
            simplelog::LevelFilter::Trace as u8
        );
    }
}
