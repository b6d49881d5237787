// SQLite collaborator for the row mapper.
//
// - config: pool options and the bb8 connection manager
// - connection: blocking hand-off with cancellation
// - params: parameter conversion from `RowValues`
// - executor: non-row-returning statement execution

pub mod config;
pub mod connection;
pub mod executor;
pub mod params;

pub use config::{SharedSqliteConnection, SqliteHandle, SqliteManager, SqliteOptions, SqliteOptionsBuilder};
pub use params::Params;
