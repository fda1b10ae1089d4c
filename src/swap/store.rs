use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension as _, Row, params, params_from_iter};

use super::{ReverseSwap, ReverseSwapSerialized, Swap, SwapSerialized, SwapStatus};
use crate::error::{Error, RecordKind, Result};

/// Persistence contract for swap records.
///
/// Records are mutated only through the named setters below. Every setter fails with
/// [`Error::NotFound`] when the id does not exist and changes nothing but its target columns.
pub trait SwapStore {
    fn create_swap(&mut self, swap: &Swap) -> Result<()>;
    fn get_swap(&self, id: &str) -> Result<Swap>;
    fn list_swaps(&self) -> Result<Vec<Swap>>;
    /// Swaps whose status is not completed.
    fn list_pending_swaps(&self) -> Result<Vec<Swap>>;
    /// Pending swaps whose refund path is valid at `current_height` (inclusive).
    fn list_refundable_swaps(&self, current_height: u32) -> Result<Vec<Swap>>;
    fn update_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()>;
    fn set_swap_invoice(&mut self, id: &str, invoice: &str) -> Result<()>;
    fn set_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()>;
    /// Records the refund transaction and moves the swap to [`SwapStatus::Refunded`] in one
    /// write.
    fn set_swap_refund_transaction_id(&mut self, id: &str, txid: &str) -> Result<()>;

    fn create_reverse_swap(&mut self, reverse_swap: &ReverseSwap) -> Result<()>;
    fn get_reverse_swap(&self, id: &str) -> Result<ReverseSwap>;
    fn list_reverse_swaps(&self) -> Result<Vec<ReverseSwap>>;
    fn list_pending_reverse_swaps(&self) -> Result<Vec<ReverseSwap>>;
    fn update_reverse_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()>;
    fn set_reverse_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()>;
    fn set_reverse_swap_claim_transaction_id(&mut self, id: &str, txid: &str) -> Result<()>;
}

const SWAP_COLUMNS: &str = "id, status, private_key, preimage, redeem_script, invoice, address, \
expected_amount, timeout_block_height, lockup_transaction_id, refund_transaction_id";

const REVERSE_SWAP_COLUMNS: &str = "id, status, accept_zero_conf, private_key, preimage, \
redeem_script, invoice, claim_address, onchain_amount, timeout_block_height, \
lockup_transaction_id, claim_transaction_id";

#[derive(Debug)]
pub struct SqliteSwapStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteSwapStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create swap store dir {}", dir.display()))?;
        }

        let conn =
            Connection::open(&path).with_context(|| format!("open sqlite {}", path.display()))?;
        conn.busy_timeout(Duration::from_secs(5))
            .context("set sqlite busy_timeout")?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("configure sqlite pragmas")?;

        migrate(&conn).context("migrate sqlite schema")?;

        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn query_swaps(&self, filter: &str, values: Vec<Value>) -> Result<Vec<Swap>> {
        let sql = format!("SELECT {SWAP_COLUMNS} FROM swaps {filter} ORDER BY rowid");
        let mut stmt = self.conn.prepare(&sql).context("prepare swap query")?;
        let rows = stmt
            .query_map(params_from_iter(values), swap_row)
            .context("query swaps")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(Swap::try_from(row.context("read swap row")?)?);
        }
        Ok(out)
    }

    fn query_reverse_swaps(&self, filter: &str, values: Vec<Value>) -> Result<Vec<ReverseSwap>> {
        let sql =
            format!("SELECT {REVERSE_SWAP_COLUMNS} FROM reverse_swaps {filter} ORDER BY rowid");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare reverse swap query")?;
        let rows = stmt
            .query_map(params_from_iter(values), reverse_swap_row)
            .context("query reverse swaps")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(ReverseSwap::try_from(
                row.context("read reverse swap row")?,
            )?);
        }
        Ok(out)
    }

    fn update(&mut self, kind: RecordKind, id: &str, sql: &str, values: Vec<Value>) -> Result<()> {
        let rows = self
            .conn
            .execute(sql, params_from_iter(values))
            .with_context(|| format!("update {kind} {id}"))?;
        if rows == 0 {
            return Err(Error::not_found(kind, id));
        }
        Ok(())
    }
}

impl SwapStore for SqliteSwapStore {
    fn create_swap(&mut self, swap: &Swap) -> Result<()> {
        swap.validate()?;
        let s = SwapSerialized::from(swap);

        let rows = self
            .conn
            .execute(
                &format!(
                    "INSERT INTO swaps ({SWAP_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
                     ON CONFLICT(id) DO NOTHING"
                ),
                params![
                    &s.id,
                    &s.status,
                    &s.private_key,
                    &s.preimage,
                    &s.redeem_script,
                    &s.invoice,
                    &s.address,
                    s.expected_amount,
                    s.timeout_block_height,
                    &s.lockup_transaction_id,
                    &s.refund_transaction_id,
                ],
            )
            .with_context(|| format!("insert swap {}", s.id))?;
        if rows == 0 {
            return Err(Error::DuplicateId {
                kind: RecordKind::Swap,
                id: s.id.clone(),
            });
        }

        tracing::info!(swap_id = %s.id, status = %s.status, "created swap");
        Ok(())
    }

    fn get_swap(&self, id: &str) -> Result<Swap> {
        let serialized = self
            .conn
            .query_row(
                &format!("SELECT {SWAP_COLUMNS} FROM swaps WHERE id = ?1"),
                params![id],
                swap_row,
            )
            .optional()
            .with_context(|| format!("get swap {id}"))?
            .ok_or_else(|| Error::not_found(RecordKind::Swap, id))?;
        Swap::try_from(serialized)
    }

    fn list_swaps(&self) -> Result<Vec<Swap>> {
        self.query_swaps("", Vec::new())
    }

    fn list_pending_swaps(&self) -> Result<Vec<Swap>> {
        let (filter, values) = pending_filter();
        self.query_swaps(&filter, values)
    }

    fn list_refundable_swaps(&self, current_height: u32) -> Result<Vec<Swap>> {
        let (mut filter, mut values) = pending_filter();
        values.push(Value::Integer(i64::from(current_height)));
        filter.push_str(&format!(" AND timeout_block_height <= ?{}", values.len()));
        self.query_swaps(&filter, values)
    }

    fn update_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()> {
        self.update(
            RecordKind::Swap,
            id,
            "UPDATE swaps SET status = ?2 WHERE id = ?1",
            vec![text(id), text(status.as_str())],
        )?;
        tracing::debug!(swap_id = %id, %status, "updated swap status");
        Ok(())
    }

    fn set_swap_invoice(&mut self, id: &str, invoice: &str) -> Result<()> {
        self.update(
            RecordKind::Swap,
            id,
            "UPDATE swaps SET invoice = ?2 WHERE id = ?1",
            vec![text(id), text(invoice)],
        )?;
        tracing::debug!(swap_id = %id, "set swap invoice");
        Ok(())
    }

    fn set_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.update(
            RecordKind::Swap,
            id,
            "UPDATE swaps SET lockup_transaction_id = ?2 WHERE id = ?1",
            vec![text(id), text(txid)],
        )?;
        tracing::debug!(swap_id = %id, lockup_txid = %txid, "set swap lockup transaction");
        Ok(())
    }

    fn set_swap_refund_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.update(
            RecordKind::Swap,
            id,
            "UPDATE swaps SET status = ?2, refund_transaction_id = ?3 WHERE id = ?1",
            vec![text(id), text(SwapStatus::Refunded.as_str()), text(txid)],
        )?;
        tracing::info!(swap_id = %id, refund_txid = %txid, "swap refunded");
        Ok(())
    }

    fn create_reverse_swap(&mut self, reverse_swap: &ReverseSwap) -> Result<()> {
        reverse_swap.validate()?;
        let s = ReverseSwapSerialized::from(reverse_swap);

        let rows = self
            .conn
            .execute(
                &format!(
                    "INSERT INTO reverse_swaps ({REVERSE_SWAP_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
                     ON CONFLICT(id) DO NOTHING"
                ),
                params![
                    &s.id,
                    &s.status,
                    s.accept_zero_conf,
                    &s.private_key,
                    &s.preimage,
                    &s.redeem_script,
                    &s.invoice,
                    &s.claim_address,
                    s.onchain_amount,
                    s.timeout_block_height,
                    &s.lockup_transaction_id,
                    &s.claim_transaction_id,
                ],
            )
            .with_context(|| format!("insert reverse swap {}", s.id))?;
        if rows == 0 {
            return Err(Error::DuplicateId {
                kind: RecordKind::ReverseSwap,
                id: s.id.clone(),
            });
        }

        tracing::info!(
            swap_id = %s.id,
            status = %s.status,
            accept_zero_conf = s.accept_zero_conf,
            "created reverse swap"
        );
        Ok(())
    }

    fn get_reverse_swap(&self, id: &str) -> Result<ReverseSwap> {
        let serialized = self
            .conn
            .query_row(
                &format!("SELECT {REVERSE_SWAP_COLUMNS} FROM reverse_swaps WHERE id = ?1"),
                params![id],
                reverse_swap_row,
            )
            .optional()
            .with_context(|| format!("get reverse swap {id}"))?
            .ok_or_else(|| Error::not_found(RecordKind::ReverseSwap, id))?;
        ReverseSwap::try_from(serialized)
    }

    fn list_reverse_swaps(&self) -> Result<Vec<ReverseSwap>> {
        self.query_reverse_swaps("", Vec::new())
    }

    fn list_pending_reverse_swaps(&self) -> Result<Vec<ReverseSwap>> {
        let (filter, values) = pending_filter();
        self.query_reverse_swaps(&filter, values)
    }

    fn update_reverse_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()> {
        self.update(
            RecordKind::ReverseSwap,
            id,
            "UPDATE reverse_swaps SET status = ?2 WHERE id = ?1",
            vec![text(id), text(status.as_str())],
        )?;
        tracing::debug!(swap_id = %id, %status, "updated reverse swap status");
        Ok(())
    }

    fn set_reverse_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.update(
            RecordKind::ReverseSwap,
            id,
            "UPDATE reverse_swaps SET lockup_transaction_id = ?2 WHERE id = ?1",
            vec![text(id), text(txid)],
        )?;
        tracing::debug!(swap_id = %id, lockup_txid = %txid, "set reverse swap lockup transaction");
        Ok(())
    }

    fn set_reverse_swap_claim_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.update(
            RecordKind::ReverseSwap,
            id,
            "UPDATE reverse_swaps SET claim_transaction_id = ?2 WHERE id = ?1",
            vec![text(id), text(txid)],
        )?;
        tracing::info!(swap_id = %id, claim_txid = %txid, "set reverse swap claim transaction");
        Ok(())
    }
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS swaps (
  id TEXT PRIMARY KEY,
  status TEXT NOT NULL,
  private_key TEXT NOT NULL,
  preimage TEXT NOT NULL,
  redeem_script TEXT NOT NULL,
  invoice TEXT,
  address TEXT NOT NULL,
  expected_amount INTEGER NOT NULL,
  timeout_block_height INTEGER NOT NULL,
  lockup_transaction_id TEXT,
  refund_transaction_id TEXT
);
CREATE INDEX IF NOT EXISTS swaps_status_idx ON swaps(status);

CREATE TABLE IF NOT EXISTS reverse_swaps (
  id TEXT PRIMARY KEY,
  status TEXT NOT NULL,
  accept_zero_conf INTEGER NOT NULL,
  private_key TEXT NOT NULL,
  preimage TEXT NOT NULL,
  redeem_script TEXT NOT NULL,
  invoice TEXT NOT NULL,
  claim_address TEXT NOT NULL,
  onchain_amount INTEGER NOT NULL,
  timeout_block_height INTEGER NOT NULL,
  lockup_transaction_id TEXT,
  claim_transaction_id TEXT
);
CREATE INDEX IF NOT EXISTS reverse_swaps_status_idx ON reverse_swaps(status);
"#,
    )
    .context("create tables")?;
    Ok(())
}

/// `WHERE status NOT IN (...)` over the completed statuses, bound as parameters.
fn pending_filter() -> (String, Vec<Value>) {
    let values: Vec<Value> = SwapStatus::COMPLETED
        .iter()
        .map(|status| text(status.as_str()))
        .collect();
    let placeholders = (1..=values.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    (format!("WHERE status NOT IN ({placeholders})"), values)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn swap_row(row: &Row<'_>) -> rusqlite::Result<SwapSerialized> {
    Ok(SwapSerialized {
        id: row.get(0)?,
        status: row.get(1)?,
        private_key: row.get(2)?,
        preimage: row.get(3)?,
        redeem_script: row.get(4)?,
        invoice: row.get(5)?,
        address: row.get(6)?,
        expected_amount: unsigned_column(row, 7, "expected_amount")?,
        timeout_block_height: unsigned_column(row, 8, "timeout_block_height")?,
        lockup_transaction_id: row.get(9)?,
        refund_transaction_id: row.get(10)?,
    })
}

fn reverse_swap_row(row: &Row<'_>) -> rusqlite::Result<ReverseSwapSerialized> {
    Ok(ReverseSwapSerialized {
        id: row.get(0)?,
        status: row.get(1)?,
        accept_zero_conf: row.get(2)?,
        private_key: row.get(3)?,
        preimage: row.get(4)?,
        redeem_script: row.get(5)?,
        invoice: row.get(6)?,
        claim_address: row.get(7)?,
        onchain_amount: unsigned_column(row, 8, "onchain_amount")?,
        timeout_block_height: unsigned_column(row, 9, "timeout_block_height")?,
        lockup_transaction_id: row.get(10)?,
        claim_transaction_id: row.get(11)?,
    })
}

fn unsigned_column<T: TryFrom<i64>>(row: &Row<'_>, col: usize, name: &str) -> rusqlite::Result<T> {
    let value: i64 = row.get(col)?;
    T::try_from(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            col,
            Type::Integer,
            format!("invalid {name} {value}").into(),
        )
    })
}
