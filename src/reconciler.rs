//! `TransferReconciler` — sweeps pending deposits and withdrawals, asks the
//! strategy whether each has settled, and marks settled rows complete. See
//! spec section 4.D.
//!
//! Reconciliation must be monotonic and repeatable: a transient
//! strategy-side failure on one row never blocks the rest of the sweep, and
//! never blocks the phases that run after it in the same tick — because the
//! ledger's completion bit gates rebalancing, a row stuck on a failing
//! settlement check would otherwise freeze rebalancing indefinitely.

use std::sync::Arc;

use tracing::{error, warn};

use crate::error::DealerError;
use crate::ledger::TransferLedger;
use crate::strategy::HedgingStrategy;

pub struct TransferReconciler {
    ledger: Arc<dyn TransferLedger>,
    strategy: Arc<dyn HedgingStrategy>,
}

impl TransferReconciler {
    pub fn new(ledger: Arc<dyn TransferLedger>, strategy: Arc<dyn HedgingStrategy>) -> Self {
        Self { ledger, strategy }
    }

    #[tracing::instrument(name = "app.dealer.update_in_flight_transfer", skip(self))]
    pub async fn reconcile(&self) -> Result<(), DealerError> {
        let deposits = self.ledger.get_pending_deposit().await?;
        for (address, transfers) in deposits {
            for transfer in transfers {
                self.settle_if_complete(
                    &address,
                    transfer.size_sats,
                    self.strategy.is_deposit_completed(&address, transfer.size_sats).await,
                )
                .await;
            }
        }

        let withdrawals = self.ledger.get_pending_withdraw().await?;
        for (address, transfers) in withdrawals {
            for transfer in transfers {
                self.settle_if_complete(
                    &address,
                    transfer.size_sats,
                    self.strategy
                        .is_withdrawal_completed(&address, transfer.size_sats)
                        .await,
                )
                .await;
            }
        }

        Ok(())
    }

    /// A failed settlement check is tolerated and logged; a positive one is
    /// written through to the ledger, and a ledger-write failure there is
    /// also tolerated and logged — the row will simply be revisited next
    /// tick.
    async fn settle_if_complete(
        &self,
        address: &str,
        sats: u64,
        settlement: Result<bool, DealerError>,
    ) {
        match settlement {
            Ok(true) => {
                if let Err(e) = self.ledger.completed(address).await {
                    error!(address, sats, error = %e, "failed to mark transfer completed; will retry next tick");
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(address, sats, error = %e, "settlement check failed; will retry next tick");
            }
        }
    }
}
