use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlRowMapError {
    /// Errors raised by `SQLite` itself, passed through untouched.
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    /// A single-row query matched nothing.
    #[error("no rows in result set")]
    NoRows,

    #[error("field not addressable for column {column:?}")]
    FieldNotAddressable { column: String },

    #[error("no conversion for {type_name} (column {column:?})")]
    NoConversion {
        column: String,
        type_name: &'static str,
    },

    #[error("column {column:?} does not name a field of {type_name}")]
    UnmappedColumn {
        column: String,
        type_name: &'static str,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlRowMapError {
    /// True when a single-row query found nothing, the one error callers
    /// usually want to treat as an ordinary "not found".
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::NoRows)
    }
}

impl From<bb8::RunError<rusqlite::Error>> for SqlRowMapError {
    fn from(err: bb8::RunError<rusqlite::Error>) -> Self {
        SqlRowMapError::ConnectionError(format!("sqlite checkout error: {err}"))
    }
}
