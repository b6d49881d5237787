use std::any::Any;

use super::path::FieldPath;
use super::record::{DeclaredType, FieldMut, Fields};
use crate::error::SqlRowMapError;

/// Borrow the field `path` points at inside `instance`.
///
/// The handle writes straight into `instance`. Fails with
/// [`SqlRowMapError::FieldNotAddressable`] when the path is empty, ends on an
/// embedded record instead of a leaf, or walks through a position the
/// instance does not expose.
pub fn bind<'a>(
    column: &str,
    instance: &'a mut dyn Fields,
    path: &FieldPath,
) -> Result<(&'a mut dyn Any, DeclaredType), SqlRowMapError> {
    walk(instance, path.positions()).ok_or_else(|| SqlRowMapError::FieldNotAddressable {
        column: column.to_owned(),
    })
}

fn walk<'a>(fields: &'a mut dyn Fields, positions: &[usize]) -> Option<(&'a mut dyn Any, DeclaredType)> {
    let (&first, rest) = positions.split_first()?;
    match (fields.field_mut(first)?, rest.is_empty()) {
        (FieldMut::Leaf { handle, declared }, true) => Some((handle, declared)),
        (FieldMut::Nested(inner), false) => walk(inner, rest),
        _ => None,
    }
}
