use std::sync::Arc;

use bb8::PooledConnection;
use tokio_util::sync::CancellationToken;

use crate::error::SqlRowMapError;
use crate::sqlite::config::{SharedSqliteConnection, SqliteManager};
use crate::sqlite::connection::run_blocking;
use crate::types::IsolationLevel;

/// An open transaction holding one pooled connection.
///
/// Pass it to the `*_tx` operations of [`QueryService`](crate::QueryService)
/// to run statements inside it. Commit and rollback are always the caller's
/// call; a `Tx` dropped without either is rolled back before its connection
/// goes back to the pool.
pub struct Tx {
    conn: Option<PooledConnection<'static, SqliteManager>>,
    isolation: IsolationLevel,
}

impl Tx {
    pub(crate) async fn begin(
        conn: PooledConnection<'static, SqliteManager>,
        isolation: IsolationLevel,
        cancel: &CancellationToken,
    ) -> Result<Self, SqlRowMapError> {
        let sql = isolation.begin_sql();
        run_blocking(Arc::clone(&*conn), cancel, move |guard, _| {
            guard
                .execute_batch(sql)
                .map_err(SqlRowMapError::SqliteError)
        })
        .await?;
        tracing::debug!(?isolation, "transaction started");
        Ok(Self {
            conn: Some(conn),
            isolation,
        })
    }

    #[must_use]
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    pub(crate) fn handle(&self) -> Result<SharedSqliteConnection, SqlRowMapError> {
        self.conn.as_ref().map(|c| Arc::clone(&**c)).ok_or_else(|| {
            SqlRowMapError::ExecutionError("sqlite transaction already completed".into())
        })
    }

    /// Commit the transaction and release its connection.
    ///
    /// # Errors
    /// Returns `SqlRowMapError` if committing fails; the transaction is then
    /// rolled back when the handle is dropped.
    ///
    /// If `SQLite` already ended the transaction itself, for example after an
    /// interrupted statement, nothing is committed and
    /// `SqlRowMapError::ExecutionError` is returned.
    pub async fn commit(mut self) -> Result<(), SqlRowMapError> {
        if !self.finish("COMMIT").await? {
            return Err(SqlRowMapError::ExecutionError(
                "sqlite transaction was already rolled back; nothing committed".into(),
            ));
        }
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Roll the transaction back and release its connection.
    ///
    /// # Errors
    /// Returns `SqlRowMapError` if rolling back fails.
    pub async fn rollback(mut self) -> Result<(), SqlRowMapError> {
        if self.finish("ROLLBACK").await? {
            tracing::debug!("transaction rolled back");
        } else {
            tracing::debug!("transaction was already rolled back by sqlite");
        }
        Ok(())
    }

    /// Run `sql` to end the transaction. Returns `false` without running it
    /// when the connection is already back in autocommit mode.
    async fn finish(&mut self, sql: &'static str) -> Result<bool, SqlRowMapError> {
        // Ending a transaction is not cancellable.
        let never = CancellationToken::new();
        let ran = run_blocking(self.handle()?, &never, move |guard, _| {
            if guard.is_autocommit() {
                return Ok(false);
            }
            guard.execute_batch(sql)?;
            Ok(true)
        })
        .await?;
        self.conn = None;
        Ok(ran)
    }
}

impl std::fmt::Debug for Tx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tx")
            .field("isolation", &self.isolation)
            .field("active", &self.conn.is_some())
            .finish()
    }
}

impl Drop for Tx {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        tracing::warn!("transaction dropped while active; rolling back");
        let handle: SharedSqliteConnection = Arc::clone(&*conn);
        let rollback = move || {
            let guard = handle.conn.blocking_lock();
            if guard.is_autocommit() {
                tracing::debug!("dropped transaction was already rolled back by sqlite");
            } else if let Err(e) = guard.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback of dropped transaction failed");
            }
            // The connection goes back to the pool only once the rollback is done.
            drop(guard);
            drop(conn);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(rollback);
            }
            Err(_) => rollback(),
        }
    }
}
