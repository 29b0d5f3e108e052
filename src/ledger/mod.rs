//! `TransferLedger` — the persistent store of in-flight on-chain transfers.
//! Only the operations the core calls are specified here (spec section 6);
//! the concrete `sqlite` backend is ambient plumbing, not core logic.

pub mod sqlite;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DealerError;
use crate::model::Transfer;

pub use sqlite::SqliteTransferLedger;

#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait TransferLedger: Send + Sync {
    async fn insert(&self, transfer: Transfer) -> Result<(), DealerError>;

    /// Pending (not yet completed) deposit rows, keyed by address.
    async fn get_pending_deposit(&self) -> Result<HashMap<String, Vec<Transfer>>, DealerError>;

    /// Pending (not yet completed) withdrawal rows, keyed by address.
    async fn get_pending_withdraw(&self) -> Result<HashMap<String, Vec<Transfer>>, DealerError>;

    /// Idempotent: flips `completed` to true for the pending row(s) at
    /// `address`. A no-op (not an error) if already completed or absent.
    async fn completed(&self, address: &str) -> Result<(), DealerError>;

    async fn get_pending_count(&self) -> Result<u64, DealerError>;
}
