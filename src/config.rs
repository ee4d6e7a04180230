//! Configuration module for the fslink client.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the client
#[derive(Parser, Debug)]
#[command(name = "fslink")]
#[command(author = "fslink authors")]
#[command(version = "0.1.0")]
#[command(about = "Send text to a TCP endpoint and print what comes back", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host name or IPv4 address to connect to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to connect to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Text to write after connecting
    #[arg(short, long)]
    pub data: Option<String>,

    /// Number of single-chunk reads to perform
    #[arg(short = 'n', long)]
    pub reads: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote endpoint configuration
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// What to send and how much to read back
#[derive(Debug, Deserialize)]
pub struct ExchangeConfig {
    /// Text to write after connecting
    pub data: Option<String>,
    /// Number of single-chunk reads
    #[serde(default = "default_reads")]
    pub reads: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            data: None,
            reads: default_reads(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9001
}

fn default_reads() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data: Option<String>,
    pub reads: usize,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_cli(CliArgs::parse())
    }

    fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents =
                std::fs::read_to_string(config_path).map_err(|source| ConfigError::Unreadable {
                    path: config_path.clone(),
                    source,
                })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Malformed {
                path: config_path.clone(),
                source,
            })?
        } else {
            TomlConfig::default()
        };

        Self::merge(cli, toml_config)
    }

    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let reads = cli.reads.unwrap_or(toml_config.exchange.reads);
        if reads == 0 {
            return Err(ConfigError::Invalid("reads must be at least 1"));
        }

        Ok(Config {
            host: cli.host.unwrap_or(toml_config.connection.host),
            port: cli.port.unwrap_or(toml_config.connection.port),
            data: cli.data.or(toml_config.exchange.data),
            reads,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Why a client configuration could not be produced.
#[derive(Debug)]
pub enum ConfigError {
    /// The `--config` file could not be read.
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The `--config` file is not valid TOML for this client.
    Malformed {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A value is out of range.
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Unreadable { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigError::Malformed { path, source } => {
                write!(f, "bad client config in {}: {source}", path.display())
            }
            ConfigError::Invalid(msg) => write!(f, "invalid client config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Unreadable { source, .. } => Some(source),
            ConfigError::Malformed { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("fslink").chain(args.iter().copied()))
    }

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.port, 9001);
        assert_eq!(config.exchange.reads, 1);
        assert!(config.exchange.data.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [connection]
            host = "example.org"
            port = 7

            [exchange]
            data = "ping\r\n"
            reads = 3

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.connection.host, "example.org");
        assert_eq!(config.connection.port, 7);
        assert_eq!(config.exchange.data.as_deref(), Some("ping\r\n"));
        assert_eq!(config.exchange.reads, 3);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: TomlConfig = toml::from_str(
            r#"
            [connection]
            host = "10.0.0.1"
            port = 7

            [exchange]
            data = "from file"
            "#,
        )
        .unwrap();

        let config = Config::merge(cli(&["--port", "9100", "-d", "from cli"]), file).unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 9100);
        assert_eq!(config.data.as_deref(), Some("from cli"));
        assert_eq!(config.reads, 1);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_zero_reads_rejected() {
        let err = Config::merge(cli(&["-n", "0"]), TomlConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(err.to_string(), "invalid client config: reads must be at least 1");
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_cli(cli(&["-c", "/nonexistent/fslink.toml"])).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
