/// Outcome of a statement run through `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows inserted, updated, or deleted.
    pub rows_affected: usize,
    /// Rowid of the most recent successful INSERT on the connection.
    pub last_insert_rowid: i64,
}
