//! Public query entry points.
//!
//! Every operation exists twice: a plain form that checks a connection out of
//! the shared pool, and a `*_tx` form that runs on a caller-owned [`Tx`].

use std::sync::Arc;

use bb8::Pool;
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use crate::error::SqlRowMapError;
use crate::mapping::{Materializer, PathCache, Record};
use crate::results::ExecResult;
use crate::sqlite::config::{SqliteManager, SqliteOptions};
use crate::sqlite::connection::run_blocking;
use crate::sqlite::executor::execute;
use crate::sqlite::params::Params;
use crate::transaction::Tx;
use crate::types::{IsolationLevel, RowValues, UnmappedColumns};

/// Configured once, then shared by every call site that queries the database.
///
/// Cloning is cheap; clones share the pool and the column path cache.
#[derive(Clone)]
pub struct QueryService {
    pool: Pool<SqliteManager>,
    paths: Arc<PathCache>,
    unmapped: UnmappedColumns,
    cache_paths: bool,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("pool", &self.pool.state())
            .field("unmapped", &self.unmapped)
            .field("cache_paths", &self.cache_paths)
            .finish_non_exhaustive()
    }
}

impl QueryService {
    /// Open the pool described by `opts`.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::ConfigError` for invalid options and
    /// `SqlRowMapError::ConnectionError` if the pool cannot be created.
    pub async fn connect(opts: SqliteOptions) -> Result<Self, SqlRowMapError> {
        opts.validate()?;
        let pool = SqliteManager::new(&opts)
            .build_pool(opts.max_connections)
            .await?;
        tracing::debug!(db_path = %opts.db_path, max_connections = opts.max_connections, "query service ready");
        Ok(Self::from_pool(pool, opts.unmapped_columns, opts.cache_paths))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<SqliteManager>, unmapped: UnmappedColumns, cache_paths: bool) -> Self {
        Self {
            pool,
            paths: Arc::new(PathCache::new()),
            unmapped,
            cache_paths,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<SqliteManager> {
        &self.pool
    }

    /// Column path resolutions remembered so far.
    #[must_use]
    pub fn path_cache(&self) -> &PathCache {
        &self.paths
    }

    /// Check that a connection can be checked out and answers a trivial query.
    ///
    /// # Errors
    /// Returns the checkout or `SQLite` error.
    pub async fn ping(&self, cancel: &CancellationToken) -> Result<(), SqlRowMapError> {
        self.run(None, cancel, |conn, _| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(SqlRowMapError::SqliteError)
        })
        .await
    }

    /// Open a serializable transaction on a dedicated connection.
    ///
    /// # Errors
    /// Returns the checkout or `SQLite` error, or `Cancelled`.
    pub async fn begin(&self, cancel: &CancellationToken) -> Result<Tx, SqlRowMapError> {
        let conn = self.pool.get_owned().await?;
        Tx::begin(conn, IsolationLevel::Serializable, cancel).await
    }

    /// Execute a statement (or, without parameters, a script) that returns no rows.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn exec(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ExecResult, SqlRowMapError> {
        self.exec_in(None, cancel, sql, params).await
    }

    /// [`exec`](Self::exec) inside `tx`.
    ///
    /// # Errors
    /// Driver errors are returned unchanged.
    pub async fn exec_tx(
        &self,
        cancel: &CancellationToken,
        tx: &mut Tx,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ExecResult, SqlRowMapError> {
        self.exec_in(Some(tx), cancel, sql, params).await
    }

    /// Fetch the first row of `sql` as a `T`; later rows are never read.
    ///
    /// # Errors
    /// Returns `SqlRowMapError::NoRows` when the query matches nothing, or any
    /// mapping or driver error.
    pub async fn one<T: Record>(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
    ) -> Result<T, SqlRowMapError> {
        self.one_in(None, cancel, sql, params).await
    }

    /// [`one`](Self::one) inside `tx`.
    ///
    /// # Errors
    /// See [`one`](Self::one).
    pub async fn one_tx<T: Record>(
        &self,
        cancel: &CancellationToken,
        tx: &mut Tx,
        sql: &str,
        params: &[RowValues],
    ) -> Result<T, SqlRowMapError> {
        self.one_in(Some(tx), cancel, sql, params).await
    }

    /// Fetch every row of `sql` as a `T`, in result order.
    ///
    /// # Errors
    /// Returns the first mapping or driver error; no rows are returned with it.
    pub async fn query<T: Record>(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<T>, SqlRowMapError> {
        self.fetch(None, cancel, sql, params, false).await
    }

    /// [`query`](Self::query) inside `tx`.
    ///
    /// # Errors
    /// See [`query`](Self::query).
    pub async fn query_tx<T: Record>(
        &self,
        cancel: &CancellationToken,
        tx: &mut Tx,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Vec<T>, SqlRowMapError> {
        self.fetch(Some(tx), cancel, sql, params, false).await
    }

    async fn exec_in(
        &self,
        tx: Option<&mut Tx>,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
    ) -> Result<ExecResult, SqlRowMapError> {
        let values = Params::convert(params)?.0;
        let sql_owned = sql.to_owned();
        tracing::debug!(sql = %sql, params = values.len(), in_tx = tx.is_some(), "exec");
        self.run(tx, cancel, move |conn, token| {
            execute(conn, &sql_owned, &values, token)
        })
        .await
    }

    async fn one_in<T: Record>(
        &self,
        tx: Option<&mut Tx>,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
    ) -> Result<T, SqlRowMapError> {
        self.fetch::<T>(tx, cancel, sql, params, true)
            .await?
            .into_iter()
            .next()
            .ok_or(SqlRowMapError::NoRows)
    }

    async fn fetch<T: Record>(
        &self,
        tx: Option<&mut Tx>,
        cancel: &CancellationToken,
        sql: &str,
        params: &[RowValues],
        stop_after_first: bool,
    ) -> Result<Vec<T>, SqlRowMapError> {
        let values = Params::convert(params)?.0;
        let sql_owned = sql.to_owned();
        let paths = self.cache_paths.then(|| Arc::clone(&self.paths));
        let unmapped = self.unmapped;
        tracing::debug!(
            sql = %sql,
            params = values.len(),
            record = T::schema().type_name,
            first_only = stop_after_first,
            in_tx = tx.is_some(),
            "query"
        );
        self.run(tx, cancel, move |conn, token| {
            let mut stmt = conn.prepare(&sql_owned)?;
            let mut materializer = Materializer::new(token).with_unmapped(unmapped);
            if let Some(paths) = paths.as_deref() {
                materializer = materializer.with_path_cache(paths);
            }
            Ok(materializer.materialize::<T>(&mut stmt, &values, stop_after_first)?)
        })
        .await
    }

    /// Route blocking work to the transaction's connection, or to a pooled one.
    async fn run<F, R>(
        &self,
        tx: Option<&mut Tx>,
        cancel: &CancellationToken,
        func: F,
    ) -> Result<R, SqlRowMapError>
    where
        F: FnOnce(&mut Connection, &CancellationToken) -> Result<R, SqlRowMapError>
            + Send
            + 'static,
        R: Send + 'static,
    {
        match tx {
            Some(tx) => run_blocking(tx.handle()?, cancel, func).await,
            None => {
                let conn = self.pool.get().await?;
                run_blocking(Arc::clone(&*conn), cancel, func).await
            }
        }
    }
}
