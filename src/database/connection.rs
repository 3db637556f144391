/*!
 * SQLite connections for the job store.
 *
 * A file database is opened several times so that calls for unrelated jobs
 * do not queue behind one lock: each call borrows a free connection and runs
 * on tokio's blocking pool. In WAL mode readers run next to a writer, and
 * concurrent writers wait up to `BUSY_TIMEOUT` for SQLite's write lock. An
 * in-memory database only exists inside the connection that created it, so
 * it gets exactly one.
 */

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::schema;

/// Connections opened for a file database
pub const POOL_SIZE: usize = 4;

/// How long a write waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_DB_DIRNAME: &str = "pagetrans";
const DEFAULT_DB_FILENAME: &str = "pagetrans.db";

struct Pool {
    connections: Vec<Mutex<Connection>>,
    /// Round-robin start when every connection is busy
    next: AtomicUsize,
}

impl Pool {
    fn acquire(&self) -> MutexGuard<'_, Connection> {
        if let Some(guard) = self.connections.iter().find_map(|c| c.try_lock()) {
            return guard;
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        self.connections[index].lock()
    }
}

/// Shared handle to the job database
#[derive(Clone)]
pub struct DatabaseConnection {
    db_path: PathBuf,
    pool: Arc<Pool>,
}

impl DatabaseConnection {
    /// Open (or create) the database file, creating its directory as needed
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening job database at {:?}", db_path);

        let first = open_file(&db_path)?;
        schema::initialize_schema(&first)?;

        let mut connections = vec![Mutex::new(first)];
        for _ in 1..POOL_SIZE {
            connections.push(Mutex::new(open_file(&db_path)?));
        }

        Ok(Self::from_connections(db_path, connections))
    }

    /// Private in-memory database with a single connection
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory job database");

        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::initialize_schema(&conn)?;

        Ok(Self::from_connections(PathBuf::from(":memory:"), vec![Mutex::new(conn)]))
    }

    fn from_connections(db_path: PathBuf, connections: Vec<Mutex<Connection>>) -> Self {
        Self {
            db_path,
            pool: Arc::new(Pool {
                connections,
                next: AtomicUsize::new(0),
            }),
        }
    }

    /// `<data dir>/pagetrans/pagetrans.db`
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Number of connections calls are spread over
    pub fn pool_size(&self) -> usize {
        self.pool.connections.len()
    }

    /// Run `f` on a free connection inside `spawn_blocking`
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let conn = pool.acquire();
            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }

    /// Run `f` inside a transaction that commits when `f` succeeds
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.acquire();
            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Job and sentence counts
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.pool.acquire();
        let mut stats = DatabaseStats::default();

        let mut per_status = conn.prepare("SELECT status, COUNT(*) FROM jobs GROUP BY status")?;
        let rows = per_status.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            match row? {
                (status, count) if status == "pending" => stats.pending_jobs = count,
                (status, count) if status == "done" => stats.done_jobs = count,
                (status, count) if status == "failed" => stats.failed_jobs = count,
                (status, _) => debug!("Ignoring jobs with unknown status {:?}", status),
            }
        }

        let (sentence_count, full_match_count): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(full_match) FROM job_sentences",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        stats.sentence_count = sentence_count;
        stats.full_match_count = full_match_count;

        if self.db_path != Path::new(":memory:") {
            stats.file_size_bytes = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);
        }

        Ok(stats)
    }
}

fn open_file(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("Failed to open database: {:?}", path))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Database statistics
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    /// Jobs waiting for their translation
    pub pending_jobs: i64,
    /// Jobs whose translation was collected
    pub done_jobs: i64,
    /// Jobs refused by the MT backend
    pub failed_jobs: i64,
    /// Sentences over all jobs
    pub sentence_count: i64,
    /// Sentences answered from the translation memory
    pub full_match_count: i64,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Jobs: {} pending, {} done, {} failed; Sentences: {} ({} full matches), Size: {} KB",
            self.pending_jobs,
            self.done_jobs,
            self.failed_jobs,
            self.sentence_count,
            self.full_match_count,
            self.file_size_bytes / 1024
        )
    }
}
