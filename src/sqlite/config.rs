use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::{ManageConnection, Pool};
use rusqlite::{Connection, InterruptHandle};
use serde::Deserialize;

use crate::error::SqlRowMapError;
use crate::service::QueryService;
use crate::types::UnmappedColumns;

/// Options for configuring the `SQLite` pool and the row mapper.
///
/// Every pooled connection opens `db_path` separately, so point it at a file;
/// a plain `:memory:` path would give each connection its own empty database.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_wal")]
    pub wal: bool,
    #[serde(default)]
    pub unmapped_columns: UnmappedColumns,
    #[serde(default = "default_cache_paths")]
    pub cache_paths: bool,
}

fn default_max_connections() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_wal() -> bool {
    true
}

fn default_cache_paths() -> bool {
    true
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
            unmapped_columns: UnmappedColumns::default(),
            cache_paths: default_cache_paths(),
        }
    }

    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Parse options from a JSON document such as
    /// `{"db_path": "app.db", "unmapped_columns": "ignore"}`.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::ConfigError` if the document does not describe valid options.
    pub fn from_json(json: &str) -> Result<Self, SqlRowMapError> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| SqlRowMapError::ConfigError(format!("invalid sqlite options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    /// Returns `SqlRowMapError::ConfigError` for an empty path or a zero-sized pool.
    pub fn validate(&self) -> Result<(), SqlRowMapError> {
        if self.db_path.is_empty() {
            return Err(SqlRowMapError::ConfigError("db_path must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(SqlRowMapError::ConfigError(
                "max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.opts.max_connections = max_connections;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn unmapped_columns(mut self, policy: UnmappedColumns) -> Self {
        self.opts.unmapped_columns = policy;
        self
    }

    #[must_use]
    pub fn cache_paths(mut self, cache_paths: bool) -> Self {
        self.opts.cache_paths = cache_paths;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a [`QueryService`] from these options.
    ///
    /// # Errors
    /// Returns `SqlRowMapError` if the options are invalid or the pool cannot be created.
    pub async fn build(self) -> Result<QueryService, SqlRowMapError> {
        QueryService::connect(self.finish()).await
    }
}

/// One `SQLite` connection plus the handle used to interrupt it from another thread.
pub struct SqliteHandle {
    pub(crate) conn: tokio::sync::Mutex<Connection>,
    interrupt: InterruptHandle,
}

impl SqliteHandle {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: tokio::sync::Mutex::new(conn),
            interrupt,
        }
    }

    /// Abort whatever statement is running on this connection.
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }
}

impl std::fmt::Debug for SqliteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteHandle").finish_non_exhaustive()
    }
}

pub type SharedSqliteConnection = Arc<SqliteHandle>;

/// bb8 manager for `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteManager {
    db_path: String,
    busy_timeout: Duration,
    wal: bool,
}

impl SqliteManager {
    #[must_use]
    pub fn new(opts: &SqliteOptions) -> Self {
        Self {
            db_path: opts.db_path.clone(),
            busy_timeout: Duration::from_millis(opts.busy_timeout_ms),
            wal: opts.wal,
        }
    }

    /// Build a pool from this manager.
    ///
    /// # Errors
    /// Returns `SqlRowMapError` if pool creation fails.
    pub async fn build_pool(self, max_size: u32) -> Result<Pool<SqliteManager>, SqlRowMapError> {
        Pool::builder()
            .max_size(max_size)
            .build(self)
            .await
            .map_err(|e| SqlRowMapError::ConnectionError(format!("sqlite pool error: {e}")))
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = rusqlite::Error;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let manager = self.clone();
        async move {
            let conn = Connection::open(&manager.db_path)?;
            conn.busy_timeout(manager.busy_timeout)?;
            if manager.wal {
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
                tracing::trace!(db_path = %manager.db_path, journal_mode = %mode, "sqlite connection opened");
            }
            Ok(Arc::new(SqliteHandle::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let guard = conn.conn.lock().await;
            guard.query_row("SELECT 1", [], |_| Ok(()))
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
