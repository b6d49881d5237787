use std::sync::Arc;

use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

use crate::error::SqlRowMapError;

use super::config::SharedSqliteConnection;

/// Run synchronous `SQLite` work for `conn` on the blocking pool.
///
/// The closure receives the cancellation token so it can stop between rows or
/// statements. If the token fires while the closure is running, the
/// connection is interrupted and the resulting `SQLite` error is returned as-is.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    cancel: &CancellationToken,
    func: F,
) -> Result<R, SqlRowMapError>
where
    F: FnOnce(&mut Connection, &CancellationToken) -> Result<R, SqlRowMapError> + Send + 'static,
    R: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(SqlRowMapError::Cancelled);
    }
    let worker = Arc::clone(&conn);
    let token = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || {
        let mut guard = worker.conn.blocking_lock();
        if token.is_cancelled() {
            return Err(SqlRowMapError::Cancelled);
        }
        func(&mut guard, &token)
    });

    let joined = tokio::select! {
        joined = &mut task => joined,
        () = cancel.cancelled() => {
            tracing::debug!("cancellation requested; interrupting sqlite connection");
            conn.interrupt();
            task.await
        }
    };
    joined.map_err(|e| {
        SqlRowMapError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
    })?
}
