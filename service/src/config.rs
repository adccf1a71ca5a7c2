use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to subscribe and publish.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: String,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Number of most recent id-bearing events kept for replay to reconnecting subscribers
    #[arg(long, env, default_value_t = sse::history::DEFAULT_CAPACITY)]
    pub history_capacity: usize,

    /// Seconds between keep-alive comments sent to every subscriber. 0 disables them.
    #[arg(long, env, default_value_t = 15)]
    pub keep_alive_interval_secs: u64,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// The `interface:port` pair the server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.interface, self.port)
    }

    /// `None` when keep-alives are disabled.
    pub fn keep_alive_interval(&self) -> Option<Duration> {
        match self.keep_alive_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["sse_relay"]);

        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.keep_alive_interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from([
            "sse_relay",
            "--interface",
            "0.0.0.0",
            "--port",
            "8080",
            "--history-capacity",
            "50",
            "--log-level-filter",
            "DEBUG",
            "--allowed-origins",
            "https://a.example,https://b.example",
        ]);

        assert_eq!(config.listen_address(), "0.0.0.0:8080");
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_zero_keep_alive_interval_disables_keep_alives() {
        let config = Config::parse_from(["sse_relay", "--keep-alive-interval-secs", "0"]);

        assert_eq!(config.keep_alive_interval(), None);
    }
}
