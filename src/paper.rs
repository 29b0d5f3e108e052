//! Paper (in-memory, no external calls) wallet and strategy implementations,
//! selected via `DEALER_WALLET=paper` / `DEALER_STRATEGY=paper`. These exist
//! purely so the binary has something runnable out of the box; real
//! deployments select a concrete wallet/exchange-backed implementation
//! instead (see SPEC_FULL.md section 1 — concrete implementations are an
//! external-collaborator concern, not part of the core).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::callbacks::{DepositCallback, WithdrawCallback};
use crate::error::DealerError;
use crate::model::{btc_to_sats, LeverageDelta, PositionDelta};
use crate::strategy::HedgingStrategy;
use crate::wallet::WalletClient;

/// Tracks a liability in micro-USD so it can be nudged deterministically
/// from an environment variable between ticks, for manual smoke-testing.
pub struct PaperWallet {
    usd_liability_micros: AtomicI64,
    address_counter: AtomicI64,
}

impl PaperWallet {
    pub fn new(initial_usd_liability: f64) -> Self {
        Self {
            usd_liability_micros: AtomicI64::new((initial_usd_liability * 1_000_000.0) as i64),
            address_counter: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl WalletClient for PaperWallet {
    async fn get_usd_wallet_balance(&self) -> Result<f64, DealerError> {
        let micros = self.usd_liability_micros.load(Ordering::Relaxed);
        Ok(-(micros as f64) / 1_000_000.0)
    }

    async fn get_btc_wallet_balance(&self) -> Result<f64, DealerError> {
        Ok(0.0)
    }

    async fn deposit_address(&self) -> Result<String, DealerError> {
        let n = self.address_counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("paper-addr-{n}"))
    }

    async fn pay_on_chain(&self, _address: &str, _sats: u64, _memo: &str) -> Result<(), DealerError> {
        Ok(())
    }
}

/// Always-neutral hedging strategy: position updates and leverage updates
/// are no-ops that report success, and settlement checks always report
/// "already settled" so the reconciler never stalls on paper state.
pub struct PaperStrategy {
    name: String,
    spot_price_usd: Mutex<f64>,
}

impl PaperStrategy {
    pub fn new(spot_price_usd: f64) -> Self {
        Self {
            name: "paper".to_string(),
            spot_price_usd: Mutex::new(spot_price_usd),
        }
    }
}

#[async_trait]
impl HedgingStrategy for PaperStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_btc_spot_price_in_usd(&self) -> Result<f64, DealerError> {
        Ok(*self.spot_price_usd.lock().await)
    }

    async fn update_position(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
    ) -> Result<PositionDelta, DealerError> {
        let target_btc = -(usd_liability / btc_price_in_usd);
        Ok(PositionDelta {
            original_position: json!(null),
            updated_position: json!({ "btc": target_btc }),
        })
    }

    async fn close_position(&self) -> Result<(), DealerError> {
        Ok(())
    }

    async fn update_leverage(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
        _deposit_address: String,
        _withdraw_cb: Arc<dyn WithdrawCallback>,
        _deposit_cb: Arc<dyn DepositCallback>,
    ) -> Result<LeverageDelta, DealerError> {
        let sats = btc_to_sats(usd_liability / btc_price_in_usd);
        Ok(LeverageDelta(json!({ "target_collateral_sats": sats })))
    }

    async fn is_deposit_completed(&self, _address: &str, _sats: u64) -> Result<bool, DealerError> {
        Ok(true)
    }

    async fn is_withdrawal_completed(&self, _address: &str, _sats: u64) -> Result<bool, DealerError> {
        Ok(true)
    }
}
