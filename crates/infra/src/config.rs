//! Configuration loading and representation.
//!
//! Everything comes from environment variables with defaults matching the
//! reference deployment. `from_lookup` takes any `key -> value` function so tests
//! don't have to touch the process environment.

use std::net::SocketAddr;

use thiserror::Error;

use cashpoint_dispenser::{DenominationSet, STANDARD_DENOMINATIONS};

pub const ENV_DENOMINATIONS: &str = "CASHPOINT_DENOMINATIONS";
pub const ENV_MIN_WITHDRAW: &str = "CASHPOINT_MIN_WITHDRAW";
pub const ENV_MAX_WITHDRAW: &str = "CASHPOINT_MAX_WITHDRAW";
pub const ENV_BIND_ADDR: &str = "CASHPOINT_BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

const DEFAULT_MIN_WITHDRAW: u64 = 1;
const DEFAULT_MAX_WITHDRAW: u64 = 1000;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            message: message.into(),
        }
    }
}

/// Inclusive bounds on a single withdrawal amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WithdrawalLimits {
    min: u64,
    max: u64,
}

impl WithdrawalLimits {
    pub fn new(min: u64, max: u64) -> Result<Self, ConfigError> {
        if min == 0 {
            return Err(ConfigError::invalid(ENV_MIN_WITHDRAW, "must be at least 1"));
        }
        if min > max {
            return Err(ConfigError::invalid(
                ENV_MAX_WITHDRAW,
                format!("must not be below the minimum ({min})"),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn contains(&self, amount: u64) -> bool {
        (self.min..=self.max).contains(&amount)
    }
}

impl Default for WithdrawalLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WITHDRAW,
            max: DEFAULT_MAX_WITHDRAW,
        }
    }
}

/// Policy for one dispensing unit: which notes it takes, how much it pays out at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtmConfig {
    pub denominations: DenominationSet,
    pub limits: WithdrawalLimits,
}

/// Process configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub atm: AtmConfig,
    pub bind_addr: SocketAddr,
    /// Only consulted when built with the `postgres` feature.
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            atm: AtmConfig::default(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let denominations = match get(ENV_DENOMINATIONS) {
            Some(raw) => parse_denominations(&raw)?,
            None => {
                tracing::warn!(default = ?STANDARD_DENOMINATIONS, "{ENV_DENOMINATIONS} not set; using default");
                DenominationSet::standard()
            }
        };

        let min = parse_u64(ENV_MIN_WITHDRAW, get(ENV_MIN_WITHDRAW), DEFAULT_MIN_WITHDRAW)?;
        let max = parse_u64(ENV_MAX_WITHDRAW, get(ENV_MAX_WITHDRAW), DEFAULT_MAX_WITHDRAW)?;
        let limits = WithdrawalLimits::new(min, max)?;

        let bind_addr = get(ENV_BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(ENV_BIND_ADDR, e.to_string()))?;

        Ok(Self {
            atm: AtmConfig {
                denominations,
                limits,
            },
            bind_addr,
            database_url: get(ENV_DATABASE_URL),
        })
    }
}

fn parse_denominations(raw: &str) -> Result<DenominationSet, ConfigError> {
    let values = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| ConfigError::invalid(ENV_DENOMINATIONS, format!("'{s}' is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    DenominationSet::new(values).map_err(|e| ConfigError::invalid(ENV_DENOMINATIONS, e.to_string()))
}

fn parse_u64(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(v) => v
            .parse::<u64>()
            .map_err(|_| ConfigError::invalid(var, format!("'{v}' is not a non-negative integer"))),
        None => Ok(default),
    }
}
