use crate::config::PoolSettings;
use crate::error::{CoreError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, warn};

type SqlitePool = Pool<SqliteConnectionManager>;

/// A connection checked out of the store's pool; returned when dropped
pub type StoreConnection = PooledConnection<SqliteConnectionManager>;

/// SQLite-backed store with a bounded pool of connections.
///
/// Every operation borrows a connection for the duration of one closure and
/// hands it back on all exit paths. Transient failures (pool contention,
/// `SQLITE_BUSY`/`SQLITE_LOCKED`) are retried with exponential backoff.
pub struct Store {
    path: PathBuf,
    settings: PoolSettings,
    pool: Mutex<Option<SqlitePool>>,
}

impl Store {
    pub fn drop(path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = sidecar_path(path, suffix);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
        Ok(())
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Open (creating if needed) the database at `path` and ensure the schema
    pub fn open(path: &Path, settings: PoolSettings) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let busy_timeout = settings.acquire_timeout();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA cache_size = -64000;  -- 64MB cache
                PRAGMA temp_store = MEMORY;
                ",
            )
        });

        let max_size = u32::try_from(settings.max_connections.max(1)).unwrap_or(u32::MAX);
        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(0))
            .connection_timeout(settings.acquire_timeout().max(Duration::from_millis(1)))
            .build(manager)
            .map_err(|e| CoreError::Config(format!("Could not build connection pool: {}", e)))?;
        debug!(
            "Connection pool for {} ready (max {} connections)",
            path.display(),
            max_size
        );

        let store = Store {
            path: path.to_path_buf(),
            settings,
            pool: Mutex::new(Some(pool)),
        };
        store.write(|tx| init_schema(tx))?;
        Ok(store)
    }

    /// Release the pool and refuse further work. Connections still checked
    /// out are closed as they come back.
    pub fn close(&self) {
        let pool = self.lock_pool().take();
        drop(pool);
        debug!("Store {} closed", self.path.display());
    }

    pub fn is_closed(&self) -> bool {
        self.lock_pool().is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Run a read-only closure on a pooled connection, retrying transient failures
    pub fn run<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&Connection) -> Result<T>,
    {
        self.with_retry(|| {
            let conn = self.acquire()?;
            f(&conn)
        })
    }

    /// Run a closure inside a transaction. The transaction commits when the
    /// closure succeeds and rolls back otherwise.
    pub fn write<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&Transaction<'_>) -> Result<T>,
    {
        self.with_retry(|| {
            let mut conn = self.acquire()?;
            let tx = conn.transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
    }

    /// Bytes occupied by the database: the main file's pages plus the
    /// write-ahead log that has not been checkpointed into it yet
    pub fn storage_bytes(&self) -> Result<u64> {
        let main = self.run(|conn| {
            let pages: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
            let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
            Ok((pages.max(0) as u64) * (page_size.max(0) as u64))
        })?;
        let wal = match fs::metadata(sidecar_path(&self.path, "-wal")) {
            Ok(meta) => meta.len(),
            Err(_) => 0,
        };
        Ok(main + wal)
    }

    /// Check a connection out of the pool, waiting up to the acquire timeout
    pub fn acquire(&self) -> Result<StoreConnection> {
        let pool = self.lock_pool().clone().ok_or(CoreError::Closed)?;
        pool.get().map_err(|e| {
            debug!("Pool checkout on {} failed: {}", self.path.display(), e);
            CoreError::PoolTimeout(self.settings.acquire_timeout())
        })
    }

    fn with_retry<T, F>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        warn!("Store gave up after {} attempts: {}", attempt, e);
                        return Err(CoreError::StoreUnavailable {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }
                    let delay = self.settings.backoff(attempt);
                    warn!(
                        "Transient store failure (attempt {}/{}): {}; retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn lock_pool(&self) -> MutexGuard<'_, Option<SqlitePool>> {
        self.pool
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", path.display(), suffix))
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Cached neighborhood graphs, one row per (name, depth)
        CREATE TABLE IF NOT EXISTS connected_documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    depth INTEGER NOT NULL CHECK(depth >= 0),
    document_nodes TEXT NOT NULL,  -- JSON array
    comment_nodes TEXT NOT NULL,   -- JSON array
    edges TEXT NOT NULL,           -- JSON array
    created_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
    updated_at INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
    UNIQUE(name, depth)
);

CREATE INDEX IF NOT EXISTS idx_connected_documents_name ON connected_documents(name);
CREATE INDEX IF NOT EXISTS idx_connected_documents_depth ON connected_documents(depth);
CREATE INDEX IF NOT EXISTS idx_connected_documents_created_at ON connected_documents(created_at);
CREATE INDEX IF NOT EXISTS idx_connected_documents_updated_at ON connected_documents(updated_at);

-- Structural indexes over the JSON columns
CREATE INDEX IF NOT EXISTS idx_connected_documents_document_count
    ON connected_documents(json_array_length(document_nodes));
CREATE INDEX IF NOT EXISTS idx_connected_documents_comment_count
    ON connected_documents(json_array_length(comment_nodes));
CREATE INDEX IF NOT EXISTS idx_connected_documents_edge_count
    ON connected_documents(json_array_length(edges));
        ",
    )?;
    Ok(())
}
