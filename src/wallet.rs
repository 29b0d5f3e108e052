//! `WalletClient` — the custodial wallet's interface, named by contract
//! only. Concrete adapters (talking to a real custodian) are out of scope
//! for this crate; see spec section 6.

use async_trait::async_trait;

use crate::error::DealerError;

#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// May return negative, zero, positive, or NaN. A negative value means
    /// the user owes USD; the control loop inverts the sign.
    async fn get_usd_wallet_balance(&self) -> Result<f64, DealerError>;

    async fn get_btc_wallet_balance(&self) -> Result<f64, DealerError>;

    /// Returns a fresh or reusable on-chain address to receive a deposit.
    async fn deposit_address(&self) -> Result<String, DealerError>;

    async fn pay_on_chain(&self, address: &str, sats: u64, memo: &str) -> Result<(), DealerError>;
}
