//! `HedgingStrategy` — the concrete hedging-strategy interface, named by
//! contract only (spot/futures/perpetual math and exchange adapters are out
//! of scope for this crate). See spec section 6.

use std::sync::Arc;

use async_trait::async_trait;

use crate::callbacks::{DepositCallback, WithdrawCallback};
use crate::error::DealerError;
use crate::model::{LeverageDelta, PositionDelta};

#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait HedgingStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn get_btc_spot_price_in_usd(&self) -> Result<f64, DealerError>;

    async fn update_position(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
    ) -> Result<PositionDelta, DealerError>;

    /// Fire-and-advance: its `Result` is never inspected by `PositionPhase`.
    async fn close_position(&self) -> Result<(), DealerError>;

    /// The strategy decides whether to call `withdraw_cb` (drain
    /// collateral), `deposit_cb` (add collateral), or neither.
    async fn update_leverage(
        &self,
        usd_liability: f64,
        btc_price_in_usd: f64,
        deposit_address: String,
        withdraw_cb: Arc<dyn WithdrawCallback>,
        deposit_cb: Arc<dyn DepositCallback>,
    ) -> Result<LeverageDelta, DealerError>;

    async fn is_deposit_completed(&self, address: &str, sats: u64) -> Result<bool, DealerError>;

    async fn is_withdrawal_completed(&self, address: &str, sats: u64) -> Result<bool, DealerError>;
}
