//! Process configuration loaded from the environment, mirroring the
//! `Config::from_env` pattern used elsewhere in this codebase.

use std::env;

use crate::error::DealerError;

#[derive(Debug, Clone)]
pub struct DealerConfig {
    pub minimum_positive_liability_usd: f64,
    pub wallet_selector: String,
    pub strategy_selector: String,
    pub ledger_db_path: String,
    pub tick_interval_secs: u64,
    pub metrics_addr: String,
}

impl DealerConfig {
    /// Selectors are fatal if absent: `tick()` never surfaces a
    /// configuration error, so picking the wallet/strategy implementation
    /// must happen before the control loop exists at all.
    pub fn from_env() -> Result<Self, DealerError> {
        let _ = dotenv::dotenv();

        let wallet_selector = env::var("DEALER_WALLET").map_err(|_| {
            DealerError::Configuration("DEALER_WALLET must name a wallet implementation".into())
        })?;
        let strategy_selector = env::var("DEALER_STRATEGY").map_err(|_| {
            DealerError::Configuration(
                "DEALER_STRATEGY must name a hedging strategy implementation".into(),
            )
        })?;

        let minimum_positive_liability_usd = env::var("DEALER_MIN_LIABILITY_USD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(5.0);

        let ledger_db_path =
            env::var("DEALER_LEDGER_DB_PATH").unwrap_or_else(|_| "dealer_ledger.db".to_string());

        let tick_interval_secs = env::var("DEALER_TICK_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        let metrics_addr =
            env::var("DEALER_METRICS_ADDR").unwrap_or_else(|_| "0.0.0.0:9100".to_string());

        Ok(Self {
            minimum_positive_liability_usd,
            wallet_selector,
            strategy_selector,
            ledger_db_path,
            tick_interval_secs,
            metrics_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_wallet_selector_is_a_configuration_error() {
        std::env::remove_var("DEALER_WALLET");
        std::env::remove_var("DEALER_STRATEGY");
        let err = DealerConfig::from_env().expect_err("missing selectors must be fatal");
        assert!(matches!(err, DealerError::Configuration(_)));
    }

    #[test]
    fn unparseable_liability_threshold_falls_back_to_default() {
        std::env::set_var("DEALER_WALLET", "paper");
        std::env::set_var("DEALER_STRATEGY", "paper");
        std::env::set_var("DEALER_MIN_LIABILITY_USD", "not-a-number");
        let config = DealerConfig::from_env().expect("selectors are present");
        assert_eq!(config.minimum_positive_liability_usd, 5.0);
        std::env::remove_var("DEALER_WALLET");
        std::env::remove_var("DEALER_STRATEGY");
        std::env::remove_var("DEALER_MIN_LIABILITY_USD");
    }
}
