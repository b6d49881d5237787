use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Row, Statement};
use tokio_util::sync::CancellationToken;

use super::binder::bind;
use super::path::{FieldPath, PathCache, resolve};
use super::record::{FieldShape, Record};
use super::scan::{ScanKind, dispatch, scan_kind};
use crate::error::SqlRowMapError;
use crate::types::UnmappedColumns;

/// Name and declared type of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name (or alias) as reported by `SQLite`; used as the dotted field path.
    pub name: String,
    /// Declared type of the underlying table column, if it has one. Informational only.
    pub decl_type: Option<String>,
}

/// Read the column descriptors of a prepared statement.
#[must_use]
pub fn describe(stmt: &Statement<'_>) -> Vec<ColumnDescriptor> {
    stmt.columns()
        .iter()
        .map(|column| ColumnDescriptor {
            name: column.name().to_owned(),
            decl_type: column.decl_type().map(str::to_owned),
        })
        .collect()
}

/// How one result column is handled for every row of a result set.
#[derive(Debug, Clone)]
pub enum ColumnPlan {
    Bind {
        index: usize,
        column: String,
        path: Arc<FieldPath>,
        kind: ScanKind,
    },
    Skip {
        index: usize,
        column: String,
    },
}

/// Rows decoded before a failure, returned together with the failure.
///
/// The rows are complete; the row that failed is never included. Callers
/// should not treat them as a usable result.
#[derive(Debug)]
pub struct Interrupted<T> {
    pub decoded: Vec<T>,
    pub error: SqlRowMapError,
}

impl<T> From<Interrupted<T>> for SqlRowMapError {
    fn from(interrupted: Interrupted<T>) -> Self {
        interrupted.error
    }
}

/// Turns a result cursor into destination records.
pub struct Materializer<'a> {
    paths: Option<&'a PathCache>,
    unmapped: UnmappedColumns,
    cancel: &'a CancellationToken,
}

impl<'a> Materializer<'a> {
    #[must_use]
    pub fn new(cancel: &'a CancellationToken) -> Self {
        Self {
            paths: None,
            unmapped: UnmappedColumns::default(),
            cancel,
        }
    }

    #[must_use]
    pub fn with_path_cache(mut self, paths: &'a PathCache) -> Self {
        self.paths = Some(paths);
        self
    }

    #[must_use]
    pub fn with_unmapped(mut self, unmapped: UnmappedColumns) -> Self {
        self.unmapped = unmapped;
        self
    }

    fn resolve<T: Record>(&self, column: &str) -> Arc<FieldPath> {
        match self.paths {
            Some(cache) => cache.resolve::<T>(column),
            None => Arc::new(resolve(column, T::schema())),
        }
    }

    /// Resolve every column against `T` and pick its scan kind.
    ///
    /// # Errors
    /// - [`SqlRowMapError::UnmappedColumn`] when a column matches no field and
    ///   unmapped columns are not ignored.
    /// - [`SqlRowMapError::FieldNotAddressable`] when a column names an
    ///   embedded record rather than a leaf field.
    /// - [`SqlRowMapError::NoConversion`] when the field's type is not decodable.
    pub fn plan<T: Record>(
        &self,
        columns: &[ColumnDescriptor],
    ) -> Result<Vec<ColumnPlan>, SqlRowMapError> {
        let mut plan = Vec::with_capacity(columns.len());
        for (index, descriptor) in columns.iter().enumerate() {
            let column = descriptor.name.clone();
            let path = self.resolve::<T>(&column);
            let entry = match path.terminal() {
                Some(FieldShape::Leaf(declared)) => {
                    let kind = scan_kind(&column, declared)?;
                    ColumnPlan::Bind {
                        index,
                        column,
                        path,
                        kind,
                    }
                }
                Some(FieldShape::Nested(_)) => {
                    return Err(SqlRowMapError::FieldNotAddressable { column });
                }
                None if self.unmapped == UnmappedColumns::Ignore => {
                    tracing::debug!(column = %column, record = T::schema().type_name, "ignoring unmapped column");
                    ColumnPlan::Skip { index, column }
                }
                None => {
                    return Err(SqlRowMapError::UnmappedColumn {
                        column,
                        type_name: T::schema().type_name,
                    });
                }
            };
            tracing::trace!(?descriptor, ?entry, "column plan");
            plan.push(entry);
        }
        Ok(plan)
    }

    /// Run `stmt` with `params` and decode its rows into `T`, in cursor order.
    ///
    /// With `stop_after_first`, returns after the first decoded row and leaves
    /// the rest of the cursor unread.
    ///
    /// # Errors
    /// Any planning, binding, dispatch, decode, or driver failure ends the
    /// whole operation; rows decoded before it come back in [`Interrupted`].
    pub fn materialize<T: Record>(
        &self,
        stmt: &mut Statement<'_>,
        params: &[Value],
        stop_after_first: bool,
    ) -> Result<Vec<T>, Interrupted<T>> {
        let mut decoded = Vec::new();
        match self.fill(stmt, params, stop_after_first, &mut decoded) {
            Ok(()) => Ok(decoded),
            Err(error) => Err(Interrupted { decoded, error }),
        }
    }

    fn fill<T: Record>(
        &self,
        stmt: &mut Statement<'_>,
        params: &[Value],
        stop_after_first: bool,
        out: &mut Vec<T>,
    ) -> Result<(), SqlRowMapError> {
        let plan = self.plan::<T>(&describe(stmt))?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            if self.cancel.is_cancelled() {
                return Err(SqlRowMapError::Cancelled);
            }
            out.push(decode_row(row, &plan)?);
            if stop_after_first {
                break;
            }
        }
        Ok(())
    }
}

/// Decode one row into a fresh, default-initialized record.
///
/// # Errors
/// Returns the first binding, dispatch, or driver decode failure.
pub fn decode_row<T: Record>(row: &Row<'_>, plan: &[ColumnPlan]) -> Result<T, SqlRowMapError> {
    let mut record = T::default();
    for entry in plan {
        let ColumnPlan::Bind {
            index, column, path, ..
        } = entry
        else {
            continue;
        };
        let (handle, declared) = bind(column, &mut record, path)?;
        dispatch(column, handle, declared)?.decode(row, *index)?;
    }
    Ok(record)
}
