//! Run ledger: one row per synchronization run.
//!
//! The ledger is the only operational surface of the sync job. Operators
//! read outcomes from it, the orchestrator checkpoints into it after every
//! page, and the next run derives its feed window from the most recent
//! non-null cursor.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{RunRecord, RunRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;

/// Repository over the `sync_runs` table.
#[derive(Debug, Clone)]
pub struct RunLedger {
    pool: SqlitePool,
}
impl From<&Database> for RunLedger {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl RunLedger {
    /// Create a new ledger with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The most recent run record, if any run has ever started.
    pub async fn latest(&self) -> Result<Option<RunRecord>> {
        let row: Option<RunRow> = sqlx::query_as(include_str!("../queries/latest_run.sql"))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(RunRecord::try_from).transpose()
    }

    /// The most recent non-null cursor across all runs.
    ///
    /// This is the lower bound for the next run's feed window; `None`
    /// means no run ever committed a cursor.
    pub async fn latest_cursor(&self) -> Result<Option<UtcDateTime>> {
        let cursor: Option<i64> = sqlx::query_scalar(include_str!("../queries/latest_cursor.sql"))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        cursor
            .map(|ts| UtcDateTime::from_unix_timestamp(ts).or_raise(|| ErrorKind::InvalidData("run cursor")))
            .transpose()
    }

    /// Open a new run record and return its id.
    ///
    /// The cursor is seeded with the window's lower bound so an interrupted
    /// run that never checkpoints resumes from the same place.
    pub async fn open(&self, started_at: UtcDateTime, cursor: UtcDateTime, total: u64) -> Result<i64> {
        let total = i64::try_from(total).or_raise(|| ErrorKind::InvalidData("run total count"))?;
        let result = sqlx::query(include_str!("../queries/insert_run.sql"))
            .bind(started_at.unix_timestamp())
            .bind(cursor.unix_timestamp())
            .bind(total)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.last_insert_rowid())
    }

    /// Persist page progress: the new cursor and the running processed count.
    pub async fn checkpoint(&self, run_id: i64, cursor: UtcDateTime, processed: u64) -> Result<()> {
        let processed = i64::try_from(processed).or_raise(|| ErrorKind::InvalidData("run processed count"))?;
        sqlx::query(include_str!("../queries/checkpoint_run.sql"))
            .bind(cursor.unix_timestamp())
            .bind(processed)
            .bind(run_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Close a run successfully (sets the end time, leaves error null).
    pub async fn close(&self, run_id: i64) -> Result<()> {
        sqlx::query(include_str!("../queries/close_run.sql"))
            .bind(UtcDateTime::now().unix_timestamp())
            .bind(run_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Close a run with a captured error text.
    pub async fn close_with_error(&self, run_id: i64, error: impl AsRef<str>) -> Result<()> {
        sqlx::query(include_str!("../queries/fail_run.sql"))
            .bind(UtcDateTime::now().unix_timestamp())
            .bind(error.as_ref())
            .bind(run_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// The most recent runs, newest first.
    pub async fn recent(&self, limit: u32) -> Result<Vec<RunRecord>> {
        let rows: Vec<RunRow> = sqlx::query_as(include_str!("../queries/list_runs.sql"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(RunRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).unwrap()
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let db = Database::connect_in_memory().await.unwrap();
        let ledger = RunLedger::from(&db);
        assert!(ledger.latest().await.unwrap().is_none());
        assert!(ledger.latest_cursor().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_checkpoint_close() {
        let db = Database::connect_in_memory().await.unwrap();
        let ledger = RunLedger::from(&db);
        let run_id = ledger.open(ts(1_700_000_000), ts(0), 137).await.unwrap();

        let open = ledger.latest().await.unwrap().unwrap();
        assert!(open.is_open());
        assert_eq!(open.total_count, 137);
        assert_eq!(open.processed_count, 0);

        ledger.checkpoint(run_id, ts(1_699_999_000), 100).await.unwrap();
        ledger.close(run_id).await.unwrap();

        let closed = ledger.latest().await.unwrap().unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.processed_count, 100);
        assert_eq!(closed.cursor, Some(ts(1_699_999_000)));
        assert!(closed.error.is_none());
        assert_eq!(ledger.latest_cursor().await.unwrap(), Some(ts(1_699_999_000)));
    }

    #[tokio::test]
    async fn test_close_with_error() {
        let db = Database::connect_in_memory().await.unwrap();
        let ledger = RunLedger::from(&db);
        let run_id = ledger.open(ts(1_700_000_000), ts(0), 10).await.unwrap();
        ledger.close_with_error(run_id, "feed unavailable").await.unwrap();
        let failed = ledger.latest().await.unwrap().unwrap();
        assert!(!failed.is_open());
        assert_eq!(failed.error.as_deref(), Some("feed unavailable"));
    }

    #[tokio::test]
    async fn test_latest_cursor_skips_null() {
        let db = Database::connect_in_memory().await.unwrap();
        let ledger = RunLedger::from(&db);
        let first = ledger.open(ts(1_700_000_000), ts(500), 1).await.unwrap();
        ledger.checkpoint(first, ts(1_700_000_010), 1).await.unwrap();
        ledger.close(first).await.unwrap();
        // A later row with a null cursor must not mask the committed one.
        sqlx::query("INSERT INTO sync_runs (started_at, cursor, total_count, processed_count) VALUES (?, NULL, 0, 0)")
            .bind(1_700_000_100_i64)
            .execute(db.pool())
            .await
            .unwrap();
        assert_eq!(ledger.latest_cursor().await.unwrap(), Some(ts(1_700_000_010)));
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let db = Database::connect_in_memory().await.unwrap();
        let ledger = RunLedger::from(&db);
        for i in 0..3 {
            let id = ledger.open(ts(1_700_000_000 + i), ts(0), 0).await.unwrap();
            ledger.close(id).await.unwrap();
        }
        let runs = ledger.recent(2).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].id > runs[1].id);
    }
}
