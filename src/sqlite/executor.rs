use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, Statement};
use tokio_util::sync::CancellationToken;

use crate::error::SqlRowMapError;
use crate::results::ExecResult;

/// Execute a statement that returns no rows.
///
/// Without parameters `sql` may hold several `;`-separated statements; they run
/// in order and `rows_affected` is the sum over all of them. With parameters
/// `sql` must be a single statement.
///
/// # Errors
/// Returns the `SQLite` error of the first failing statement, or
/// `SqlRowMapError::Cancelled` if the token fires between statements.
pub fn execute(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    cancel: &CancellationToken,
) -> Result<ExecResult, SqlRowMapError> {
    let rows_affected = if params.is_empty() {
        let mut affected = 0;
        let mut batch = Batch::new(conn, sql);
        while let Some(mut stmt) = batch.next()? {
            if cancel.is_cancelled() {
                return Err(SqlRowMapError::Cancelled);
            }
            affected += run_counted(conn, &mut stmt, &[])?;
        }
        affected
    } else {
        let mut stmt = conn.prepare(sql)?;
        run_counted(conn, &mut stmt, params)?
    };
    Ok(ExecResult {
        rows_affected,
        last_insert_rowid: conn.last_insert_rowid(),
    })
}

/// Run one statement and return the rows it inserted, updated, or deleted.
///
/// `sqlite3_changes` keeps the count of the last INSERT/UPDATE/DELETE, so a
/// statement that did not move the connection's total change counter (DDL,
/// PRAGMA, SELECT) counts as zero.
fn run_counted(
    conn: &Connection,
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<usize, SqlRowMapError> {
    let before = conn.total_changes();
    let changed = stmt.execute(rusqlite::params_from_iter(params.iter()))?;
    Ok(if conn.total_changes() == before { 0 } else { changed })
}
