//! Row materialization: column name → field path → writable field → scan slot.

pub mod binder;
pub mod materialize;
pub mod path;
pub mod record;
pub mod scan;

pub use binder::bind;
pub use materialize::{ColumnDescriptor, ColumnPlan, Interrupted, Materializer, decode_row, describe};
pub use path::{FieldPath, PathCache, resolve};
pub use record::{DeclaredType, FieldDef, FieldMut, FieldShape, Fields, Record, Schema};
pub use scan::{ScanKind, Slot, dispatch};
