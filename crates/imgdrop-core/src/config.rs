//! Configuration module
//!
//! Configuration is read once from the process environment (a `.env` file is honoured),
//! validated, and then treated as immutable. The mutable part of the authorization
//! roster is persisted separately; see `ROSTER_PATH`.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::HTTP_CLIENT_TIMEOUT;
use crate::error::AppError;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";
const POLL_TIMEOUT_SECS: u64 = 30;
const ROSTER_PATH: &str = "authorized_users.json";
const LOG_LEVEL: &str = "info";

/// Chat transport credentials
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

impl Debug for TelegramConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

/// Image host account and credentials
#[derive(Clone)]
pub struct CloudflareConfig {
    pub account_id: String,
    pub api_token: String,
    pub api_url: String,
}

impl Debug for CloudflareConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudflareConfig")
            .field("account_id", &self.account_id)
            .field("api_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Log output encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::ConfigInvalid(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Logging verbosity and destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LOG_LEVEL.to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub cloudflare: CloudflareConfig,
    pub admin_id: i64,
    pub authorized_users: Vec<i64>,
    pub roster_path: PathBuf,
    pub http_timeout_secs: u64,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| AppError::ConfigInvalid(format!("{} must be set", key)))
        };

        let admin_id: i64 = parse_number("ADMIN_ID", &required("ADMIN_ID")?)?;

        let authorized_users = match get("AUTHORIZED_USERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| parse_number("AUTHORIZED_USERS", s))
                .collect::<Result<Vec<i64>, _>>()?,
            None => Vec::new(),
        };

        let config = Config {
            telegram: TelegramConfig {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| TELEGRAM_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                poll_timeout_secs: get("TELEGRAM_POLL_TIMEOUT_SECS")
                    .map(|v| parse_number("TELEGRAM_POLL_TIMEOUT_SECS", &v))
                    .transpose()?
                    .unwrap_or(POLL_TIMEOUT_SECS),
            },
            cloudflare: CloudflareConfig {
                account_id: required("CLOUDFLARE_ACCOUNT_ID")?,
                api_token: required("CLOUDFLARE_API_TOKEN")?,
                api_url: get("CLOUDFLARE_API_URL")
                    .unwrap_or_else(|| CLOUDFLARE_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            admin_id,
            authorized_users,
            roster_path: PathBuf::from(
                get("ROSTER_PATH").unwrap_or_else(|| ROSTER_PATH.to_string()),
            ),
            http_timeout_secs: get("HTTP_TIMEOUT_SECS")
                .map(|v| parse_number("HTTP_TIMEOUT_SECS", &v))
                .transpose()?
                .unwrap_or(HTTP_CLIENT_TIMEOUT.as_secs()),
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| LOG_LEVEL.to_string()),
                format: get("LOG_FORMAT")
                    .map(|v| v.parse::<LogFormat>())
                    .transpose()?
                    .unwrap_or_default(),
                file: get("LOG_FILE").map(PathBuf::from),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.admin_id == 0 {
            return Err(AppError::ConfigInvalid(
                "ADMIN_ID must be a non-zero user id".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::ConfigInvalid(
                "HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::ConfigInvalid(format!("{} must be a valid number, got '{}'", key, value))
    })
}
