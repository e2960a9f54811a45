use burrow_storage::StorageSettings;
use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const DATABASE_TIMEOUT_ENV: &str = "DATABASE_TIMEOUT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SERVER_ADDRESS: &str = "localhost:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_DATABASE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Command-line flags. Every flag can be overridden by its environment
/// variable, see [`Config::resolve`].
#[derive(Debug, Clone, Parser)]
#[command(name = "burrow", about = "URL shortener", version)]
pub struct Cli {
    /// Address the HTTP server binds to
    #[arg(short = 'a', long, default_value = DEFAULT_SERVER_ADDRESS)]
    pub server_address: String,

    /// Base URL used to render short links
    #[arg(short = 'b', long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// File backing the link storage
    #[arg(short = 'f', long)]
    pub file_storage_path: Option<PathBuf>,

    /// PostgreSQL connection string
    #[arg(short = 'd', long)]
    pub database_dsn: Option<String>,

    /// Bound on every database operation, in seconds
    #[arg(long, default_value_t = DEFAULT_DATABASE_TIMEOUT_SECS)]
    pub database_timeout: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Effective service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub base_url: String,
    pub storage: StorageSettings,
    pub log_format: LogFormat,
}

impl Config {
    /// Parses the process arguments and overlays the process environment.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let cli = Cli::try_parse()?;
        Ok(Self::resolve(cli, |name| std::env::var(name).ok())?)
    }

    /// Merges flags with environment values looked up through `env`.
    ///
    /// A non-empty environment value takes precedence over the flag.
    pub fn resolve(
        cli: Cli,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|value| !value.is_empty());

        let database_timeout = match env(DATABASE_TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                name: DATABASE_TIMEOUT_ENV,
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => cli.database_timeout,
        };

        let log_format = match env(LOG_FORMAT_ENV) {
            Some(raw) => {
                LogFormat::from_str(&raw, true).map_err(|reason| ConfigError::InvalidValue {
                    name: LOG_FORMAT_ENV,
                    value: raw.clone(),
                    reason,
                })?
            }
            None => cli.log_format,
        };

        let storage = StorageSettings::builder()
            .database_dsn(env(DATABASE_DSN_ENV).or(cli.database_dsn))
            .file_path(
                env(FILE_STORAGE_PATH_ENV)
                    .map(PathBuf::from)
                    .or(cli.file_storage_path),
            )
            .database_timeout(Duration::from_secs(database_timeout))
            .build();

        Ok(Self {
            server_address: env(SERVER_ADDRESS_ENV).unwrap_or(cli.server_address),
            base_url: env(BASE_URL_ENV).unwrap_or(cli.base_url),
            storage,
            log_format,
        })
    }
}
