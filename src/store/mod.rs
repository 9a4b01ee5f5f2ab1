//! src/store/mod.rs
//!
//! Durable, single-writer-safe persistence of request records and their
//! status. Backed by an embedded SQLite database via `sqlx`, following the
//! schema in the original `libgetgood/database.go`: `requests(id, status,
//! uri UNIQUE, http_status)`.
//!
//! All mutating operations (and the few reads used for claim reconciliation)
//! are serialized by a process-wide `tokio::sync::Mutex`, generalizing the
//! Go implementation's `sync.Mutex` guard around every `DBConn` method. The
//! mutex exists even though SQLite already serializes writers, because
//! several of our operations are compound (read-then-write) and must appear
//! atomic to concurrent callers — the claim protocol in particular depends
//! on this (see `set_inflight`).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tokio::sync::Mutex;

mod status;
pub use status::RequestStatus;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),
}

/// Row projection for `requests`, used internally by queries that need more
/// than a single column — `sqlx::query_as` maps columns onto these fields
/// positionally by name, so it doubles as a check that the schema and the
/// Rust side agree on shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRecord {
    pub id: i64,
    pub uri: String,
    pub status: i64,
    pub http_status: Option<i64>,
}

/// Durable store of request records.
///
/// `write_lock` serializes compound operations (claim, reconciliation,
/// batched inserts) so that two Poller claim cycles — or a claim racing a
/// reconciliation pass at resume — cannot interleave. The pool itself is
/// `Clone` and safe to share; the lock is what makes the *operations*
/// atomic, not the connection.
pub struct Store {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Store {
    /// Open (or create) the SQLite file at `path`. Does not create the
    /// schema; call `create_schema` after opening.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(path)
            .map_err(sqlx::Error::from)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// In-memory store, used by tests that don't need a file on disk.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// Idempotent: ensures the table and unique index on `uri` exist.
    pub async fn create_schema(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS requests (\
                id INTEGER PRIMARY KEY ASC, \
                status INTEGER NOT NULL, \
                uri TEXT NOT NULL, \
                http_status INTEGER\
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS requests_uri_idx ON requests (uri)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Truncates all records.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("DELETE FROM requests").execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts `uris` in a single transaction, ignoring any that already
    /// exist (conflict on the unique `uri` index is a no-op, not an error).
    /// On any row-level error the whole transaction rolls back.
    pub async fn add_requests(&self, uris: &[String]) -> Result<(), StoreError> {
        if uris.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        for uri in uris {
            sqlx::query(
                "INSERT INTO requests (status, uri, http_status) VALUES (?, ?, NULL) \
                 ON CONFLICT(uri) DO NOTHING",
            )
            .bind(RequestStatus::Unprocessed as i64)
            .bind(uri)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Returns up to `batch_size` URIs currently `Unprocessed`.
    pub async fn get_incomplete(&self, batch_size: u32) -> Result<Vec<String>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let rows = sqlx::query("SELECT uri FROM requests WHERE status = ? LIMIT ?")
            .bind(RequestStatus::Unprocessed as i64)
            .bind(batch_size)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>("uri")).collect())
    }

    /// Bulk `Unprocessed -> Inflight`. This is the claim step: it must
    /// succeed before any of `uris` is handed to the work queue (§4.3).
    pub async fn set_inflight(&self, uris: &[String]) -> Result<(), StoreError> {
        if uris.is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        for uri in uris {
            sqlx::query("UPDATE requests SET status = ? WHERE uri = ?")
                .bind(RequestStatus::Inflight as i64)
                .bind(uri)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_failed(&self, uri: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("UPDATE requests SET status = ? WHERE uri = ?")
            .bind(RequestStatus::Failed as i64)
            .bind(uri)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_completed(&self, uri: &str, http_status: u16) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("UPDATE requests SET status = ?, http_status = ? WHERE uri = ?")
            .bind(RequestStatus::Processed as i64)
            .bind(http_status as i64)
            .bind(uri)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resume-time reconciliation: any record left `Inflight` from a
    /// previous run becomes `Unprocessed` again.
    pub async fn reset_inflight(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("UPDATE requests SET status = ? WHERE status = ?")
            .bind(RequestStatus::Unprocessed as i64)
            .bind(RequestStatus::Inflight as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resume-time reconciliation: `Failed` records are retried once per
    /// process start.
    pub async fn reset_failed(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("UPDATE requests SET status = ? WHERE status = ?")
            .bind(RequestStatus::Unprocessed as i64)
            .bind(RequestStatus::Failed as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_remaining(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let row = sqlx::query("SELECT COUNT(*) AS n FROM requests WHERE status IN (?, ?)")
            .bind(RequestStatus::Unprocessed as i64)
            .bind(RequestStatus::Inflight as i64)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    pub async fn count_completed(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let row = sqlx::query("SELECT COUNT(*) AS n FROM requests WHERE status = ?")
            .bind(RequestStatus::Processed as i64)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    pub async fn count_failed(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let row = sqlx::query("SELECT COUNT(*) AS n FROM requests WHERE status = ?")
            .bind(RequestStatus::Failed as i64)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    pub async fn count_total(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let row = sqlx::query("SELECT COUNT(*) AS n FROM requests")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }

    /// Looks up the current status of a single URI, if it exists. Used by
    /// tests and diagnostics to check invariant 1 (never `Inflight` at a
    /// quiescent moment); not part of the pipeline's hot path.
    pub async fn status_of(&self, uri: &str) -> Result<Option<RequestStatus>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let record: Option<RequestRecord> =
            sqlx::query_as("SELECT id, uri, status, http_status FROM requests WHERE uri = ?")
                .bind(uri)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record.map(|r| {
            RequestStatus::try_from(r.status).expect("status column holds an out-of-range value")
        }))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        store.create_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn add_requests_is_idempotent() {
        let store = memory_store().await;
        let uris = vec!["http://h/a".to_string(), "http://h/b".to_string()];
        store.add_requests(&uris).await.unwrap();
        store.add_requests(&uris).await.unwrap();
        assert_eq!(store.count_total().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn claim_then_complete_lifecycle() {
        let store = memory_store().await;
        let uris = vec!["http://h/a".to_string()];
        store.add_requests(&uris).await.unwrap();

        let incomplete = store.get_incomplete(10).await.unwrap();
        assert_eq!(incomplete, uris);

        store.set_inflight(&incomplete).await.unwrap();
        assert_eq!(store.count_remaining().await.unwrap(), 1);
        assert_eq!(store.get_incomplete(10).await.unwrap().len(), 0);

        store.set_completed(&uris[0], 200).await.unwrap();
        assert_eq!(store.count_completed().await.unwrap(), 1);
        assert_eq!(store.count_remaining().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_requests_reset_on_reconciliation() {
        let store = memory_store().await;
        let uris = vec!["http://h/a".to_string()];
        store.add_requests(&uris).await.unwrap();
        store.set_inflight(&uris).await.unwrap();
        store.set_failed(&uris[0]).await.unwrap();
        assert_eq!(store.count_failed().await.unwrap(), 1);

        store.reset_failed().await.unwrap();
        assert_eq!(store.count_failed().await.unwrap(), 0);
        assert_eq!(store.get_incomplete(10).await.unwrap(), uris);
    }

    #[tokio::test]
    async fn inflight_resets_on_reconciliation_not_failed() {
        let store = memory_store().await;
        let uris = vec!["http://h/a".to_string(), "http://h/b".to_string()];
        store.add_requests(&uris).await.unwrap();
        store.set_inflight(&uris).await.unwrap();

        store.reset_inflight().await.unwrap();
        let incomplete = store.get_incomplete(10).await.unwrap();
        assert_eq!(incomplete.len(), 2);
    }

    #[tokio::test]
    async fn counts_partition_total() {
        let store = memory_store().await;
        let uris = vec![
            "http://h/a".to_string(),
            "http://h/b".to_string(),
            "http://h/c".to_string(),
        ];
        store.add_requests(&uris).await.unwrap();
        store.set_inflight(&uris[0..1]).await.unwrap();
        store.set_completed(&uris[0], 200).await.unwrap();
        store.set_inflight(&uris[1..2]).await.unwrap();
        store.set_failed(&uris[1]).await.unwrap();

        let total = store.count_total().await.unwrap();
        let remaining = store.count_remaining().await.unwrap();
        let completed = store.count_completed().await.unwrap();
        let failed = store.count_failed().await.unwrap();
        assert_eq!(remaining + completed + failed, total);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn repeated_reset_inflight_is_equivalent_to_one() {
        let store = memory_store().await;
        let uris = vec!["http://h/a".to_string()];
        store.add_requests(&uris).await.unwrap();
        store.set_inflight(&uris).await.unwrap();

        store.reset_inflight().await.unwrap();
        store.reset_inflight().await.unwrap();

        assert_eq!(store.get_incomplete(10).await.unwrap(), uris);
    }
}
