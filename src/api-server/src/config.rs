//! Server configuration

use clap::{ArgAction, Parser};

/// Pantry API server
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pantry-server",
    version,
    about = "REST API server for pantry lists, recipes and meal plans",
    long_about = None
)]
pub struct ServerConfig {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value_t = 8080, env = "PORT")]
    pub port: u16,

    /// Log filter (trace, debug, info, warn, error or an `EnvFilter` directive)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Collect engine decision metrics
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        env = "ENABLE_METRICS"
    )]
    pub enable_metrics: bool,

    /// Users that get a session token at startup
    #[arg(long, value_delimiter = ',', env = "PANTRY_DEV_USERS")]
    pub dev_users: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            enable_metrics: true,
            dev_users: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Development users with blanks dropped
    pub fn session_users(&self) -> impl Iterator<Item = &str> {
        self.dev_users
            .iter()
            .map(|user| user.trim())
            .filter(|user| !user.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let config = ServerConfig::try_parse_from(["pantry-server"]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.enable_metrics);
        assert_eq!(config.session_users().count(), 0);
    }

    #[test]
    fn test_args_parsing() {
        let config = ServerConfig::try_parse_from([
            "pantry-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--log-level",
            "debug",
            "--enable-metrics",
            "false",
            "--dev-users",
            "alice, bob,,",
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.log_level, "debug");
        assert!(!config.enable_metrics);
        assert_eq!(config.session_users().collect::<Vec<_>>(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_args_reject_bad_port() {
        assert!(ServerConfig::try_parse_from(["pantry-server", "--port", "not-a-port"]).is_err());
    }

    #[test]
    fn test_default_matches_parser() {
        let parsed = ServerConfig::try_parse_from(["pantry-server", "--log-level", "info"]).unwrap();
        let default = ServerConfig::default();
        assert_eq!(parsed.host, default.host);
        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.log_level, default.log_level);
    }
}
