//! SQLite-backed `TransferLedger`, modeled on `vault::VaultDb`: WAL
//! journaling, `prepare_cached` statements, and a `tokio::sync::Mutex`
//! serializing access to a single `rusqlite::Connection`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tokio::sync::Mutex;

use crate::error::DealerError;
use crate::ledger::TransferLedger;
use crate::model::{Transfer, TransferDirection};

fn to_ledger_err(context: &str, e: rusqlite::Error) -> DealerError {
    DealerError::Ledger(format!("{context}: {e}"))
}

fn direction_from_row(s: &str) -> Result<TransferDirection, DealerError> {
    match s {
        "deposit_to_exchange" => Ok(TransferDirection::DepositToExchange),
        "withdraw_from_exchange" => Ok(TransferDirection::WithdrawFromExchange),
        other => Err(DealerError::Ledger(format!(
            "unrecognized transfer direction in ledger row: {other}"
        ))),
    }
}

#[derive(Clone)]
pub struct SqliteTransferLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTransferLedger {
    pub fn open(db_path: &str) -> Result<Self, DealerError> {
        let conn = Connection::open(db_path)
            .map_err(|e| to_ledger_err("open transfer ledger db", e))?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transfers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                direction TEXT NOT NULL,
                address TEXT NOT NULL,
                size_sats INTEGER NOT NULL,
                memo TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
            )",
            [],
        )
        .map_err(|e| to_ledger_err("create transfers table", e))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transfers_pending
             ON transfers(direction, completed)",
            [],
        )
        .map_err(|e| to_ledger_err("create pending index", e))?;

        // Enforces the spec invariant that a pending row's address is
        // unique within its direction (spec section 3 and section 9).
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_transfers_pending_address
             ON transfers(direction, address) WHERE completed = 0",
            [],
        )
        .map_err(|e| to_ledger_err("create pending-address uniqueness index", e))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn get_pending(
        &self,
        direction: TransferDirection,
    ) -> Result<HashMap<String, Vec<Transfer>>, DealerError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare_cached(
                "SELECT direction, address, size_sats, memo, completed
                 FROM transfers WHERE direction = ?1 AND completed = 0
                 ORDER BY id ASC",
            )
            .map_err(|e| to_ledger_err("prepare pending query", e))?;

        let rows = stmt
            .query_map(params![direction.as_str()], |row| {
                let direction: String = row.get(0)?;
                let address: String = row.get(1)?;
                let size_sats: i64 = row.get(2)?;
                let memo: String = row.get(3)?;
                let completed: i64 = row.get(4)?;
                Ok((direction, address, size_sats, memo, completed))
            })
            .map_err(|e| to_ledger_err("query pending rows", e))?;

        let mut out: HashMap<String, Vec<Transfer>> = HashMap::new();
        for row in rows {
            let (direction, address, size_sats, memo, completed) =
                row.map_err(|e| to_ledger_err("read pending row", e))?;
            let transfer = Transfer {
                direction: direction_from_row(&direction)?,
                address: address.clone(),
                size_sats: size_sats.max(0) as u64,
                memo,
                completed: completed != 0,
            };
            out.entry(address).or_default().push(transfer);
        }
        Ok(out)
    }
}

#[async_trait]
impl TransferLedger for SqliteTransferLedger {
    async fn insert(&self, transfer: Transfer) -> Result<(), DealerError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO transfers (direction, address, size_sats, memo, completed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transfer.direction.as_str(),
                transfer.address,
                transfer.size_sats as i64,
                transfer.memo,
                transfer.completed as i64,
            ],
        )
        .map_err(|e| to_ledger_err("insert transfer", e))?;
        Ok(())
    }

    async fn get_pending_deposit(&self) -> Result<HashMap<String, Vec<Transfer>>, DealerError> {
        self.get_pending(TransferDirection::DepositToExchange).await
    }

    async fn get_pending_withdraw(&self) -> Result<HashMap<String, Vec<Transfer>>, DealerError> {
        self.get_pending(TransferDirection::WithdrawFromExchange)
            .await
    }

    async fn completed(&self, address: &str) -> Result<(), DealerError> {
        let conn = self.conn.lock().await;
        // Idempotent by construction: touches zero rows if already
        // completed or absent, which rusqlite reports as Ok(0), not an
        // error.
        conn.execute(
            "UPDATE transfers SET completed = 1 WHERE address = ?1 AND completed = 0",
            params![address],
        )
        .map_err(|e| to_ledger_err("mark transfer completed", e))?;
        Ok(())
    }

    async fn get_pending_count(&self) -> Result<u64, DealerError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transfers WHERE completed = 0", [], |row| {
                row.get(0)
            })
            .map_err(|e| to_ledger_err("count pending transfers", e))?;
        Ok(count.max(0) as u64)
    }
}
