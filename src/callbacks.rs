//! Capability interfaces the `HedgingStrategy` calls back into during
//! `update_leverage`, plus `TransferCallbacks`, the concrete implementation
//! bound to a `ControlLoop` instance. See spec section 4.G.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::error::DealerError;
use crate::ledger::TransferLedger;
use crate::model::{btc_to_sats, round_btc, Transfer, TransferDirection};
use crate::wallet::WalletClient;

/// Number of halving retries after the first `pay_on_chain` attempt. Total
/// attempts are `DEFAULT_DEPOSIT_RETRIES + 1`.
pub const DEFAULT_DEPOSIT_RETRIES: u32 = 2;

/// Executes an on-chain deposit and records it. The strategy calls this to
/// add collateral to the exchange.
#[async_trait]
pub trait DepositCallback: Send + Sync {
    async fn deposit(&self, address: String, size_btc: f64) -> Result<(), DealerError>;
}

/// Records the expectation of a withdrawal the strategy itself initiates on
/// the exchange. Takes no on-chain action.
#[async_trait]
pub trait WithdrawCallback: Send + Sync {
    async fn withdraw(&self, address: String, size_btc: f64) -> Result<(), DealerError>;
}

/// Bound to a single `ControlLoop` instance: holds the wallet and ledger it
/// should act against, and the name of the active strategy (used only to
/// build a human-readable memo).
pub struct TransferCallbacks {
    wallet: Arc<dyn WalletClient>,
    ledger: Arc<dyn TransferLedger>,
    strategy_name: String,
    max_retries: u32,
}

impl TransferCallbacks {
    pub fn new(
        wallet: Arc<dyn WalletClient>,
        ledger: Arc<dyn TransferLedger>,
        strategy_name: impl Into<String>,
    ) -> Self {
        Self {
            wallet,
            ledger,
            strategy_name: strategy_name.into(),
            max_retries: DEFAULT_DEPOSIT_RETRIES,
        }
    }

    fn memo(&self, kind: &str) -> String {
        format!("dealer:{}:{}", self.strategy_name, kind)
    }
}

#[async_trait]
impl DepositCallback for TransferCallbacks {
    /// Pays on-chain, halving the amount on each failure, up to
    /// `max_retries` retries (`max_retries + 1` total `pay_on_chain` calls).
    /// A successful pay is always followed by a ledger insert attempt; if
    /// that insert fails the error is surfaced as-is, because the on-chain
    /// payment has already happened and there is no way to undo it — see
    /// the money-safety note in spec section 9.
    async fn deposit(&self, address: String, size_btc: f64) -> Result<(), DealerError> {
        let mut amount = round_btc(size_btc);
        let mut retries_left = self.max_retries;
        let memo = self.memo("deposit");

        loop {
            let sats = btc_to_sats(amount);
            match self.wallet.pay_on_chain(&address, sats, &memo).await {
                Ok(()) => {
                    let transfer = Transfer::new_pending(
                        TransferDirection::DepositToExchange,
                        address.clone(),
                        sats,
                        memo.clone(),
                    );
                    return self.ledger.insert(transfer).await.map_err(|e| {
                        error!(
                            address = %address,
                            sats,
                            error = %e,
                            "on-chain deposit succeeded but ledger insert failed; transfer is unrecorded"
                        );
                        e
                    });
                }
                Err(e) if retries_left > 0 => {
                    warn!(
                        address = %address,
                        amount_btc = amount,
                        retries_left,
                        error = %e,
                        "deposit pay failed, halving and retrying"
                    );
                    retries_left -= 1;
                    amount = round_btc(amount / 2.0);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl WithdrawCallback for TransferCallbacks {
    /// Only records the expectation of a withdrawal; the strategy itself
    /// initiates it on the exchange.
    async fn withdraw(&self, address: String, size_btc: f64) -> Result<(), DealerError> {
        let sats = btc_to_sats(round_btc(size_btc));
        let memo = self.memo("withdraw");
        let transfer =
            Transfer::new_pending(TransferDirection::WithdrawFromExchange, address, sats, memo);
        self.ledger.insert(transfer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MockTransferLedger;
    use crate::wallet::MockWalletClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn halving_retry_matches_spec_scenario_s5() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let seen_sizes = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut wallet = MockWalletClient::new();
        {
            let call_count = call_count.clone();
            let seen_sizes = seen_sizes.clone();
            wallet
                .expect_pay_on_chain()
                .times(3)
                .returning(move |_addr, sats, _memo| {
                    let n = call_count.fetch_add(1, Ordering::SeqCst);
                    seen_sizes.lock().unwrap().push(sats);
                    if n < 2 {
                        Err(DealerError::UpstreamUnavailable("no liquidity".into()))
                    } else {
                        Ok(())
                    }
                });
        }

        let mut ledger = MockTransferLedger::new();
        ledger
            .expect_insert()
            .times(1)
            .withf(|t| t.size_sats == 10_000_000 && t.direction == TransferDirection::DepositToExchange)
            .returning(|_| Ok(()));

        let callbacks = TransferCallbacks::new(Arc::new(wallet), Arc::new(ledger), "test-strategy");
        callbacks
            .deposit("bc1qaddress".to_string(), 0.4)
            .await
            .expect("deposit should eventually succeed");

        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(*seen_sizes.lock().unwrap(), vec![40_000_000, 20_000_000, 10_000_000]);
    }

    #[tokio::test]
    async fn deposit_exhausts_retries_and_returns_underlying_error() {
        let mut wallet = MockWalletClient::new();
        wallet
            .expect_pay_on_chain()
            .times(3)
            .returning(|_, _, _| Err(DealerError::UpstreamUnavailable("down".into())));

        let ledger = MockTransferLedger::new();
        let callbacks = TransferCallbacks::new(Arc::new(wallet), Arc::new(ledger), "s");
        let err = callbacks
            .deposit("addr".to_string(), 0.2)
            .await
            .expect_err("should fail after exhausting retries");
        assert!(matches!(err, DealerError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn deposit_surfaces_ledger_insert_failure_after_successful_pay() {
        let mut wallet = MockWalletClient::new();
        wallet.expect_pay_on_chain().times(1).returning(|_, _, _| Ok(()));

        let mut ledger = MockTransferLedger::new();
        ledger
            .expect_insert()
            .times(1)
            .returning(|_| Err(DealerError::Ledger("disk full".into())));

        let callbacks = TransferCallbacks::new(Arc::new(wallet), Arc::new(ledger), "s");
        let err = callbacks
            .deposit("addr".to_string(), 0.05)
            .await
            .expect_err("ledger insert failure must surface");
        assert!(matches!(err, DealerError::Ledger(_)));
    }

    #[tokio::test]
    async fn withdraw_records_expectation_without_on_chain_action() {
        let wallet = MockWalletClient::new(); // no expectations set: pay_on_chain must not be called
        let mut ledger = MockTransferLedger::new();
        ledger
            .expect_insert()
            .times(1)
            .withf(|t| {
                t.direction == TransferDirection::WithdrawFromExchange && t.size_sats == 5_000_000
            })
            .returning(|_| Ok(()));

        let callbacks = TransferCallbacks::new(Arc::new(wallet), Arc::new(ledger), "s");
        callbacks
            .withdraw("addr".to_string(), 0.05)
            .await
            .expect("withdraw should succeed");
    }
}
