//! Map `SQLite` query results onto plain Rust structs.
//!
//! Result columns are matched to struct fields by name. A dotted alias such as
//! `User.Name` reaches into an embedded struct, so a join can fill a nested
//! value without any per-query mapping code:
//!
//! ```rust,no_run
//! use sql_rowmap::prelude::*;
//!
//! sql_rowmap::record! {
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: i64 as "ID",
//!         pub name: String as "Name",
//!     }
//! }
//!
//! sql_rowmap::record! {
//!     #[derive(Debug, Default)]
//!     pub struct Message {
//!         pub id: i64 as "ID",
//!         #[nested]
//!         pub user: User as "User",
//!         pub body: String as "Body",
//!     }
//! }
//!
//! # async fn demo() -> Result<(), SqlRowMapError> {
//! let service = SqliteOptions::builder("app.db".into()).build().await?;
//! let cancel = CancellationToken::new();
//! let messages: Vec<Message> = service
//!     .query(
//!         &cancel,
//!         r#"SELECT m.ID, m.Body, u.ID AS "User.ID", u.Name AS "User.Name"
//!            FROM Messages m JOIN Users u ON m.UserID = u.ID"#,
//!         &[],
//!     )
//!     .await?;
//! # let _ = messages;
//! # Ok(()) }
//! ```

pub mod error;
pub mod mapping;
pub mod prelude;
pub mod results;
pub mod service;
pub mod sqlite;
pub mod transaction;
pub mod types;

pub use error::SqlRowMapError;
pub use mapping::{DeclaredType, FieldDef, FieldMut, FieldShape, Fields, Record, Schema};
pub use results::ExecResult;
pub use service::QueryService;
pub use sqlite::{SqliteOptions, SqliteOptionsBuilder};
pub use transaction::Tx;
pub use types::{IsolationLevel, RowValues, UnmappedColumns};

pub use tokio_util::sync::CancellationToken;
