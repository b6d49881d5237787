use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::record::{FieldShape, Record, Schema};

/// Location of a field inside a (possibly nested) destination type.
#[derive(Debug, Clone)]
pub struct FieldPath {
    positions: Vec<usize>,
    segments: usize,
    terminal: Option<FieldShape>,
}

impl FieldPath {
    /// Field positions, one per nesting level, outermost first.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// True when every dotted segment of the column name matched a field.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.positions.is_empty() && self.positions.len() == self.segments
    }

    /// Shape of the field the path ends at, when fully resolved.
    #[must_use]
    pub fn terminal(&self) -> Option<FieldShape> {
        if self.is_resolved() {
            self.terminal
        } else {
            None
        }
    }
}

/// Resolve a dotted column name against a destination schema.
///
/// Segments are matched by exact, case-sensitive field name. Resolution stops
/// at the first segment with no matching field (including any segment that
/// follows a leaf field), leaving a path shorter than the segment count.
#[must_use]
pub fn resolve(column: &str, schema: &'static Schema) -> FieldPath {
    let mut positions = Vec::new();
    let mut terminal = None;
    let mut current = Some(schema);
    let mut segments = 0;

    for segment in column.split('.') {
        segments += 1;
        let Some(level) = current else { continue };
        let Some(position) = level.position(segment) else {
            current = None;
            continue;
        };
        positions.push(position);
        let shape = level.fields[position].shape;
        current = match shape {
            FieldShape::Nested(inner) => Some(inner()),
            FieldShape::Leaf(_) => None,
        };
        terminal = Some(shape);
    }

    FieldPath {
        positions,
        segments,
        terminal,
    }
}

/// Memoized [`resolve`] results keyed by destination type and column name.
///
/// Entries are never evicted: the cache holds one entry per distinct
/// `(type, column)` pair seen, unresolved columns included. That stays small
/// for a fixed set of queries. Callers that build column aliases dynamically
/// should disable path caching or call [`PathCache::clear`] periodically.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: Mutex<HashMap<(TypeId, String), Arc<FieldPath>>>,
}

impl PathCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `column` for `T`, reusing an earlier resolution when present.
    pub fn resolve<T: Record>(&self, column: &str) -> Arc<FieldPath> {
        let key = (TypeId::of::<T>(), column.to_owned());
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            entries
                .entry(key)
                .or_insert_with(|| Arc::new(resolve(column, T::schema()))),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every remembered resolution.
    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}
