//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// How long the simulated gateway takes to approve a payment.
    pub payment_delay: Duration,
    pub payment_max_attempts: u32,
    /// Shopper sessions untouched for longer than this are dropped.
    pub session_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8083,
            payment_delay: Duration::from_millis(2000),
            payment_max_attempts: 3,
            session_idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got `{value}`")]
    Invalid { name: &'static str, value: String, expected: &'static str },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = parse(&lookup, "PORT", "a port number")?.unwrap_or(defaults.port);
        let payment_delay = parse::<u64>(&lookup, "PAYMENT_DELAY_MS", "a number of milliseconds")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.payment_delay);
        let payment_max_attempts = match parse::<u32>(&lookup, "PAYMENT_MAX_ATTEMPTS", "a positive integer")? {
            Some(0) => {
                return Err(ConfigError::Invalid { name: "PAYMENT_MAX_ATTEMPTS", value: "0".into(), expected: "a positive integer" })
            }
            Some(n) => n,
            None => defaults.payment_max_attempts,
        };
        let session_idle_timeout = match parse::<u64>(&lookup, "SESSION_IDLE_SECS", "a positive number of seconds")? {
            Some(0) => {
                return Err(ConfigError::Invalid { name: "SESSION_IDLE_SECS", value: "0".into(), expected: "a positive number of seconds" })
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.session_idle_timeout,
        };
        Ok(Self { port, payment_delay, payment_max_attempts, session_idle_timeout })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid { name, value: raw, expected }),
    }
}
