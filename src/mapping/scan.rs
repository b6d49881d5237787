//! Scan-target registry and dispatch.
//!
//! Every Rust type a column can be decoded into is listed once in
//! `scan_registry!`. The macro produces the [`ScanKind`] tag, the matching
//! [`Slot`] variant holding a typed `&mut` into the destination field, and the
//! decoder each slot uses. A type missing from the list is rejected with
//! [`SqlRowMapError::NoConversion`]; there is no fallback.

use std::any::{Any, TypeId};

use chrono::NaiveDateTime;
use rusqlite::Row;
use rusqlite::types::FromSql;

use super::record::DeclaredType;
use crate::error::SqlRowMapError;

macro_rules! scan_registry {
    ($( $kind:ident($ty:ty) = $decode:ident ),* $(,)?) => {
        /// The closed set of decodable field types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ScanKind {
            $( $kind, )*
        }

        impl ScanKind {
            /// Every registered kind, in registry order.
            pub const ALL: &'static [ScanKind] = &[$( ScanKind::$kind, )*];

            /// Look up the kind registered for exactly this Rust type.
            #[must_use]
            pub fn for_type(id: TypeId) -> Option<ScanKind> {
                $(
                    if id == TypeId::of::<$ty>() {
                        return Some(ScanKind::$kind);
                    }
                )*
                None
            }

            /// `TypeId` of the Rust type this kind decodes into.
            #[must_use]
            pub fn target_type_id(self) -> TypeId {
                match self {
                    $( ScanKind::$kind => TypeId::of::<$ty>(), )*
                }
            }

            /// Name of the Rust type this kind decodes into.
            #[must_use]
            pub fn type_name(self) -> &'static str {
                match self {
                    $( ScanKind::$kind => std::any::type_name::<$ty>(), )*
                }
            }
        }

        /// A typed, writable reference into one destination field.
        ///
        /// Lives only for the decode of a single column of a single row.
        #[derive(Debug)]
        pub enum Slot<'a> {
            $( $kind(&'a mut $ty), )*
        }

        impl<'a> Slot<'a> {
            /// Narrow an untyped field handle to the slot for `kind`.
            ///
            /// Returns `None` when the handle does not point at the kind's type.
            pub fn wire(kind: ScanKind, handle: &'a mut dyn Any) -> Option<Slot<'a>> {
                match kind {
                    $( ScanKind::$kind => handle.downcast_mut::<$ty>().map(Slot::$kind), )*
                }
            }

            #[must_use]
            pub fn kind(&self) -> ScanKind {
                match self {
                    $( Slot::$kind(_) => ScanKind::$kind, )*
                }
            }

            /// Decode column `index` of `row` into the field.
            ///
            /// # Errors
            /// Returns the driver error when the stored value cannot be represented
            /// by the field's type (wrong storage class, NULL into a non-nullable
            /// field, integer out of range).
            pub fn decode(self, row: &Row<'_>, index: usize) -> rusqlite::Result<()> {
                match self {
                    $( Slot::$kind(target) => *target = $decode(row, index)?, )*
                }
                Ok(())
            }
        }
    };
}

scan_registry! {
    Bool(bool) = direct,
    I8(i8) = direct,
    I16(i16) = direct,
    I32(i32) = direct,
    I64(i64) = direct,
    Isize(isize) = direct,
    U8(u8) = direct,
    U16(u16) = direct,
    U32(u32) = direct,
    U64(u64) = unsigned,
    Usize(usize) = unsigned,
    F32(f32) = direct,
    F64(f64) = direct,
    Text(String) = direct,
    Bytes(Vec<u8>) = direct,
    Timestamp(NaiveDateTime) = direct,
    NullBool(Option<bool>) = direct,
    NullI8(Option<i8>) = direct,
    NullI16(Option<i16>) = direct,
    NullI32(Option<i32>) = direct,
    NullI64(Option<i64>) = direct,
    NullIsize(Option<isize>) = direct,
    NullU8(Option<u8>) = direct,
    NullU16(Option<u16>) = direct,
    NullU32(Option<u32>) = direct,
    NullU64(Option<u64>) = unsigned_nullable,
    NullUsize(Option<usize>) = unsigned_nullable,
    NullF32(Option<f32>) = direct,
    NullF64(Option<f64>) = direct,
    NullText(Option<String>) = direct,
    NullBytes(Option<Vec<u8>>) = direct,
    NullTimestamp(Option<NaiveDateTime>) = direct,
}

fn direct<T: FromSql>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    row.get(index)
}

// SQLite integers are i64; wide unsigned fields go through an explicit range check.
fn unsigned<T: TryFrom<i64>>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let value: i64 = row.get(index)?;
    T::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, value))
}

fn unsigned_nullable<T: TryFrom<i64>>(row: &Row<'_>, index: usize) -> rusqlite::Result<Option<T>> {
    let value: Option<i64> = row.get(index)?;
    value
        .map(|value| {
            T::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, value))
        })
        .transpose()
}

/// Pick the scan kind for a field's declared type.
///
/// # Errors
/// Returns [`SqlRowMapError::NoConversion`] naming the declared type when it is
/// not in the registry.
pub fn scan_kind(column: &str, declared: DeclaredType) -> Result<ScanKind, SqlRowMapError> {
    ScanKind::for_type(declared.type_id()).ok_or_else(|| SqlRowMapError::NoConversion {
        column: column.to_owned(),
        type_name: declared.name(),
    })
}

/// Turn a bound field handle into a driver scan slot.
///
/// # Errors
/// Returns [`SqlRowMapError::NoConversion`] when the declared type is not
/// registered, or when the handle does not actually point at that type.
pub fn dispatch<'a>(
    column: &str,
    handle: &'a mut dyn Any,
    declared: DeclaredType,
) -> Result<Slot<'a>, SqlRowMapError> {
    let kind = scan_kind(column, declared)?;
    Slot::wire(kind, handle).ok_or_else(|| SqlRowMapError::NoConversion {
        column: column.to_owned(),
        type_name: declared.name(),
    })
}
