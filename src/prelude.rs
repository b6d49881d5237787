//! Convenient imports for common functionality.

pub use crate::error::SqlRowMapError;
pub use crate::mapping::{Fields, Record};
pub use crate::results::ExecResult;
pub use crate::service::QueryService;
pub use crate::sqlite::{SqliteOptions, SqliteOptionsBuilder};
pub use crate::transaction::Tx;
pub use crate::types::{IsolationLevel, RowValues, UnmappedColumns};

pub use tokio_util::sync::CancellationToken;
