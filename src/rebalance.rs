//! `RebalancePhase` — gated on zero pending transfers; invokes the
//! strategy's leverage update with deposit/withdraw callbacks bound to this
//! instance. See spec section 4.F.

use std::sync::Arc;

use crate::callbacks::TransferCallbacks;
use crate::error::DealerError;
use crate::ledger::TransferLedger;
use crate::model::LeverageDelta;
use crate::strategy::HedgingStrategy;
use crate::wallet::WalletClient;

pub struct RebalancePhase {
    wallet: Arc<dyn WalletClient>,
    strategy: Arc<dyn HedgingStrategy>,
    ledger: Arc<dyn TransferLedger>,
}

impl RebalancePhase {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        strategy: Arc<dyn HedgingStrategy>,
        ledger: Arc<dyn TransferLedger>,
    ) -> Self {
        Self {
            wallet,
            strategy,
            ledger,
        }
    }

    /// Returns `(leverage_skipped, leverage_result)`. A missing/invalid
    /// deposit address aborts the *whole tick*, not just this phase — it is
    /// returned as `Err` rather than folded into the leverage result, so
    /// `ControlLoop::tick` skips aggregation entirely, matching spec
    /// section 4.F.
    #[tracing::instrument(name = "app.dealer.update_position_and_leverage", skip(self))]
    pub async fn run(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
    ) -> Result<(bool, Option<Result<LeverageDelta, String>>), DealerError> {
        let pending = self.ledger.get_pending_count().await?;
        if pending > 0 {
            tracing::info!(pending, "rebalance skipped: pending transfers outstanding");
            return Ok((true, None));
        }

        let deposit_address = self
            .wallet
            .deposit_address()
            .await
            .map_err(|_| Self::address_unavailable())?;
        if deposit_address.trim().is_empty() {
            return Err(Self::address_unavailable());
        }

        let callbacks = Arc::new(TransferCallbacks::new(
            self.wallet.clone(),
            self.ledger.clone(),
            self.strategy.name().to_string(),
        ));

        let result = self
            .strategy
            .update_leverage(
                usd_liability,
                btc_price_in_usd,
                deposit_address,
                callbacks.clone(),
                callbacks,
            )
            .await
            .map_err(|e| e.to_string());

        Ok((false, Some(result)))
    }

    fn address_unavailable() -> DealerError {
        DealerError::InvariantViolation("WalletOnChainAddress is unavailable or invalid.".to_string())
    }
}
