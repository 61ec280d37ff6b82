//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tradeflow_cashflow::{DEFAULT_MAX_HORIZON_DAYS, ProjectionParams};
use tradeflow_core::Money;

pub const HORIZON_VAR: &str = "TRADEFLOW_CASHFLOW_HORIZON_DAYS";
pub const MAX_HORIZON_VAR: &str = "TRADEFLOW_CASHFLOW_MAX_HORIZON_DAYS";
pub const STARTING_BALANCE_VAR: &str = "TRADEFLOW_STARTING_BALANCE";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days covered by a default cash-flow projection
    pub cashflow_horizon_days: u32,

    /// Upper bound accepted for any projection horizon
    pub cashflow_max_horizon_days: u32,

    /// Balance the projection starts from
    pub starting_balance: Money,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cashflow_horizon_days: 30,
            cashflow_max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            starting_balance: Money::ZERO,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable when it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = EngineConfig {
            cashflow_horizon_days: match lookup(HORIZON_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(HORIZON_VAR.to_string()))?,
                None => defaults.cashflow_horizon_days,
            },

            cashflow_max_horizon_days: match lookup(MAX_HORIZON_VAR) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(MAX_HORIZON_VAR.to_string()))?,
                None => defaults.cashflow_max_horizon_days,
            },

            starting_balance: match lookup(STARTING_BALANCE_VAR) {
                Some(raw) => Money::parse(raw.trim())
                    .map_err(|_| ConfigError::InvalidValue(STARTING_BALANCE_VAR.to_string()))?,
                None => defaults.starting_balance,
            },
        };

        if config.cashflow_horizon_days == 0 {
            return Err(ConfigError::InvalidValue(HORIZON_VAR.to_string()));
        }
        if config.cashflow_horizon_days > config.cashflow_max_horizon_days {
            return Err(ConfigError::HorizonExceedsMax {
                horizon: config.cashflow_horizon_days,
                max: config.cashflow_max_horizon_days,
            });
        }

        Ok(config)
    }

    /// Projection parameters for a run as of `as_of`. The horizon limit is
    /// not part of them: the engine applies `cashflow_max_horizon_days`.
    pub fn projection_params(&self, as_of: NaiveDate) -> ProjectionParams {
        ProjectionParams::new(as_of, self.cashflow_horizon_days, self.starting_balance)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Cash-flow horizon of {horizon} days exceeds the maximum of {max}")]
    HorizonExceedsMax { horizon: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = EngineConfig::from_lookup(lookup_in(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.cashflow_horizon_days, 30);
        assert_eq!(config.cashflow_max_horizon_days, 365);
        assert_eq!(config.starting_balance, Money::ZERO);
    }

    #[test]
    fn values_are_read_from_variables() {
        let config = EngineConfig::from_lookup(lookup_in(&[
            (HORIZON_VAR, "7"),
            (MAX_HORIZON_VAR, "90"),
            (STARTING_BALANCE_VAR, " 5000.00 "),
        ]))
        .unwrap();
        assert_eq!(config.cashflow_horizon_days, 7);
        assert_eq!(config.cashflow_max_horizon_days, 90);
        assert_eq!(config.starting_balance.to_string(), "5000.00");

        let params = config.projection_params(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(params.horizon_days, 7);
        assert_eq!(params.starting_balance, config.starting_balance);
    }

    #[test]
    fn unparsable_values_name_the_variable() {
        let err = EngineConfig::from_lookup(lookup_in(&[(HORIZON_VAR, "thirty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var) if var == HORIZON_VAR));

        let err =
            EngineConfig::from_lookup(lookup_in(&[(STARTING_BALANCE_VAR, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var) if var == STARTING_BALANCE_VAR));
    }

    #[test]
    fn horizon_must_fit_the_maximum() {
        let err = EngineConfig::from_lookup(lookup_in(&[(HORIZON_VAR, "400")])).unwrap_err();
        assert!(matches!(err, ConfigError::HorizonExceedsMax { horizon: 400, max: 365 }));

        let err = EngineConfig::from_lookup(lookup_in(&[(HORIZON_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
