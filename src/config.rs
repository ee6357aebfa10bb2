use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use tracing::info;

use crate::error::{Error, Result};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

impl LogFormat {
    /// Read `EXPENSES_LOG_FORMAT` from the process environment.
    ///
    /// Runs before the subscriber exists, so an unset variable falls back to
    /// `Text` without logging; `Config::load` reports the default afterwards.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LOG_FORMAT_KEY) {
            Some(value) => parse(LOG_FORMAT_KEY, value),
            None => Ok(LogFormat::Text),
        }
    }
}

const LOG_FORMAT_KEY: &str = "EXPENSES_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct Config {
    pub database: String,
    pub host: IpAddr,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Config {
    /// Load from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database: try_load(&lookup, "EXPENSES_DATABASE", "expenses.db")?,
            host: try_load(&lookup, "EXPENSES_HOST", "0.0.0.0")?,
            port: try_load(&lookup, "EXPENSES_PORT", "8080")?,
            log_format: try_load(&lookup, LOG_FORMAT_KEY, "text")?,
        })
    }

    pub fn bind_address(&self) -> String {
        match self.host {
            IpAddr::V4(ip) => format!("{}:{}", ip, self.port),
            IpAddr::V6(ip) => format!("[{}]:{}", ip, self.port),
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, value)
}

fn parse<T>(key: &'static str, value: String) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match value.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(Error::Config {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
