pub mod deadline;
pub mod migrations;
pub mod proximity;
pub mod repository;
pub mod seed;
pub mod store;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Value, ValueRef};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// SQLite VM instructions between two deadline checks.
const PROGRESS_INTERVAL: i32 = 1_000;

/// Process-wide handle to the document database.
///
/// Constructed once at startup and shared behind an `Arc` for the lifetime of
/// the process. There is no reconnection logic: a broken file surfaces as
/// store errors on every call.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Private, non-persistent database. Used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        migrations::run(&conn)?;

        // Abort running statements once the calling request's deadline passes.
        conn.progress_handler(PROGRESS_INTERVAL, Some(deadline::expired));

        conn.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            fold_case,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        deadline::check()?;
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }
}

/// Unicode lower-casing for text, same as `str::to_lowercase`. SQLite's own
/// `lower()` only folds ASCII. Non-text values pass through unchanged.
fn fold_case(ctx: &Context<'_>) -> rusqlite::Result<Value> {
    Ok(match ctx.get_raw(0) {
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).to_lowercase()),
        other => other.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crate::deadline::DeadlineExceeded;
    use crate::repository;

    #[test]
    fn running_statements_stop_at_the_deadline() {
        let db = Database::open_in_memory().unwrap();
        let started = Instant::now();

        let res = deadline::scoped(started + Duration::from_millis(100), || {
            db.with_conn(|conn| {
                let n: i64 = conn.query_row(
                    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c
                                              WHERE x < 10000000000)
                     SELECT count(*) FROM c",
                    [],
                    |r| r.get(0),
                )?;
                Ok(n)
            })
        });

        let elapsed = started.elapsed();
        let err = res.unwrap_err();
        // Interrupted mid-statement, not refused up front.
        assert!(err.downcast_ref::<DeadlineExceeded>().is_none());
        assert!(matches!(
            repository::Error::from(err),
            repository::Error::DeadlineExceeded
        ));
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    }

    #[test]
    fn statements_run_normally_without_a_deadline() {
        let db = Database::open_in_memory().unwrap();
        let n: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c
                                              WHERE x < 10000)
                     SELECT count(*) FROM c",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(n, 10000);
    }

    #[test]
    fn fold_case_handles_non_ascii() {
        let db = Database::open_in_memory().unwrap();
        let (folded, number): (String, i64) = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT fold_case('ÜNTERBERG Öl'), fold_case(7)", [], |r| {
                    Ok((r.get(0)?, r.get(1)?))
                })?)
            })
            .unwrap();
        assert_eq!(folded, "ünterberg öl");
        assert_eq!(number, 7);
    }
}
