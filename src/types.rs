use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values bound as statement parameters.
///
/// ```rust
/// use sql_rowmap::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("Eliminator".into()),
///     RowValues::Null,
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, stored as 0/1
    Bool(bool),
    /// Timestamp value, stored as `YYYY-MM-DD HH:MM:SS[.fff]` text
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value, stored as its serialized text
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Isolation level used for transactions opened through [`QueryService::begin`].
///
/// `SQLite` only offers serializable transactions; the variant exists so the
/// level is named at the call site and in logs.
///
/// [`QueryService::begin`]: crate::QueryService::begin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    Serializable,
}

impl IsolationLevel {
    pub(crate) fn begin_sql(self) -> &'static str {
        match self {
            // IMMEDIATE takes the write lock up front so two serializable
            // transactions never deadlock upgrading from a read lock.
            IsolationLevel::Serializable => "BEGIN IMMEDIATE",
        }
    }
}

/// What to do with a result column whose name does not resolve to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedColumns {
    /// Fail the query with [`SqlRowMapError::UnmappedColumn`](crate::SqlRowMapError::UnmappedColumn).
    #[default]
    Error,
    /// Skip the column.
    Ignore,
}
