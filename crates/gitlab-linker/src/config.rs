//! Configuration for the linker service.
//!
//! Every option can be given as a flag or through a `GITLAB_LINKER_*`
//! environment variable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// GitLab to issue tracker linker configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "gitlab-linker")]
#[command(about = "Links GitLab merge requests and commits to issue tracker tickets")]
#[command(version)]
pub struct Config {
    /// Address to listen on.
    #[arg(
        long,
        env = "GITLAB_LINKER_ADDRESS",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub address: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "GITLAB_LINKER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Default log filter (`RUST_LOG` takes precedence).
    #[arg(long, env = "GITLAB_LINKER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long, env = "GITLAB_LINKER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Accepted `X-Gitlab-Token` values (comma-separated). Empty allows any caller.
    #[arg(
        long,
        env = "GITLAB_LINKER_GITLAB_TOKENS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub gitlab_tokens: Vec<String>,

    /// Tracker API base URL.
    #[arg(
        long,
        env = "GITLAB_LINKER_TRACKER_URL",
        default_value = "https://api.tracker.yandex.net/v2"
    )]
    pub tracker_url: String,

    /// Tracker API token.
    #[arg(long, env = "GITLAB_LINKER_TRACKER_TOKEN", hide_env_values = true)]
    pub tracker_token: String,

    /// Origin label stored with created remote links.
    #[arg(long, env = "GITLAB_LINKER_TRACKER_LINK_ORIGIN")]
    pub tracker_link_origin: String,

    /// Timeout for a single tracker request, in seconds.
    #[arg(long, env = "GITLAB_LINKER_TRACKER_TIMEOUT_SECS", default_value_t = 10)]
    pub tracker_timeout_secs: u64,
}

impl Config {
    /// Socket address to bind.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Per-request tracker timeout.
    #[must_use]
    pub const fn tracker_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = [
        "gitlab-linker",
        "--tracker-token",
        "secret",
        "--tracker-link-origin",
        "ru.example.gitlab",
    ];

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(REQUIRED).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.gitlab_tokens.is_empty());
        assert_eq!(config.tracker_url, "https://api.tracker.yandex.net/v2");
        assert_eq!(config.tracker_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_explicit_flags() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--address",
            "127.0.0.1",
            "--port",
            "9000",
            "--log-format",
            "json",
            "--gitlab-tokens",
            "token1,token2",
            "--tracker-url",
            "http://localhost:8000/v2",
            "--tracker-timeout-secs",
            "3",
        ]);

        let config = Config::try_parse_from(args).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.gitlab_tokens, vec!["token1", "token2"]);
        assert_eq!(config.tracker_url, "http://localhost:8000/v2");
        assert_eq!(config.tracker_link_origin, "ru.example.gitlab");
        assert_eq!(config.tracker_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_tracker_token_required() {
        let result = Config::try_parse_from(["gitlab-linker", "--tracker-link-origin", "origin"]);
        assert!(result.is_err());
    }
}
