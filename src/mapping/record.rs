//! Destination types: the static shape a result row is mapped onto.
//!
//! A destination type describes itself twice. [`Record::schema`] gives the
//! field names and declared types, which is all the path resolver needs.
//! [`Fields::field_mut`] hands out live, writable references into one
//! instance, which is what the binder walks. The [`record!`](crate::record)
//! macro generates both from a single struct declaration.

use std::any::{Any, TypeId};

/// The static type of a leaf field, as declared in the destination struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclaredType {
    name: &'static str,
    id: TypeId,
}

impl DeclaredType {
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

/// What sits at one field position.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    /// A scalar (or unsupported) value that a column can be decoded into.
    Leaf(DeclaredType),
    /// An embedded destination type whose fields continue the dotted path.
    Nested(fn() -> &'static Schema),
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Name matched, case-sensitively, against one dotted segment of a column name.
    pub name: &'static str,
    pub shape: FieldShape,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub type_name: &'static str,
    pub fields: Vec<FieldDef>,
}

impl Schema {
    /// Position of the field called `name`, if any.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// A writable reference to one field of a live instance.
pub enum FieldMut<'a> {
    Leaf {
        handle: &'a mut dyn Any,
        declared: DeclaredType,
    },
    Nested(&'a mut dyn Fields),
}

impl<'a> FieldMut<'a> {
    pub fn leaf<T: Any>(field: &'a mut T) -> Self {
        FieldMut::Leaf {
            handle: field,
            declared: DeclaredType::of::<T>(),
        }
    }

    pub fn nested<T: Fields>(field: &'a mut T) -> Self {
        FieldMut::Nested(field)
    }
}

/// Positional, writable access to the fields of an instance.
///
/// Positions must agree with the order of [`Schema::fields`].
pub trait Fields {
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// A type query rows can be materialized into.
pub trait Record: Fields + Default + Send + 'static {
    fn schema() -> &'static Schema;
}

/// Declare a struct together with its [`Record`] implementation.
///
/// Each field maps to the column whose name equals the field identifier,
/// unless an `as "Column"` alias is given. Fields holding another record are
/// marked `#[nested]` and are addressed with dotted names (`User.Name`).
///
/// ```rust
/// sql_rowmap::record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64 as "ID",
///         pub name: String as "Name",
///     }
/// }
///
/// sql_rowmap::record! {
///     #[derive(Debug, Default)]
///     pub struct Message {
///         pub id: i64 as "ID",
///         #[nested]
///         pub user: User as "User",
///         pub body: String as "Body",
///     }
/// }
///
/// use sql_rowmap::Record;
/// assert_eq!(Message::schema().position("User"), Some(1));
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::__record_fields! {
            @parse [$(#[$meta])* $vis struct $name] [] $($body)*
        }
    };
}

// Field muncher behind `record!`. `@parse` splits off one field, `@attrs`
// pulls the `#[nested]` marker out of its attributes and keeps the rest, and
// `@emit` writes the struct and both trait impls once every field is sorted.
#[doc(hidden)]
#[macro_export]
macro_rules! __record_fields {
    (@parse $head:tt [$($done:tt)*]) => {
        $crate::__record_fields! { @emit $head $($done)* }
    };
    (@parse $head:tt [$($done:tt)*]
        $(#[$($attr:tt)*])*
        $fvis:vis $field:ident : $fty:ty $(as $column:literal)?
        $(, $($rest:tt)*)?
    ) => {
        $crate::__record_fields! {
            @attrs $head [$($done)*] [$($($rest)*)?]
            [] leaf [$fvis] $field [$fty] [$($column)?]
            $([$($attr)*])*
        }
    };

    (@attrs $head:tt [$($done:tt)*] [$($rest:tt)*]
        [$($kept:tt)*] $kind:ident [$fvis:vis] $field:ident [$fty:ty] [$($column:literal)?]
    ) => {
        $crate::__record_fields! {
            @parse $head
            [$($done)* { [$($kept)*] $kind [$fvis] $field [$fty] [$($column)?] }]
            $($rest)*
        }
    };
    (@attrs $head:tt [$($done:tt)*] [$($rest:tt)*]
        [$($kept:tt)*] $kind:ident [$fvis:vis] $field:ident [$fty:ty] [$($column:literal)?]
        [nested] $($attrs:tt)*
    ) => {
        $crate::__record_fields! {
            @attrs $head [$($done)*] [$($rest)*]
            [$($kept)*] nested [$fvis] $field [$fty] [$($column)?]
            $($attrs)*
        }
    };
    (@attrs $head:tt [$($done:tt)*] [$($rest:tt)*]
        [$($kept:tt)*] $kind:ident [$fvis:vis] $field:ident [$fty:ty] [$($column:literal)?]
        [$($other:tt)*] $($attrs:tt)*
    ) => {
        $crate::__record_fields! {
            @attrs $head [$($done)*] [$($rest)*]
            [$($kept)* #[$($other)*]] $kind [$fvis] $field [$fty] [$($column)?]
            $($attrs)*
        }
    };

    (@emit [$(#[$meta:meta])* $vis:vis struct $name:ident]
        $({ [$($kept:tt)*] $kind:ident [$fvis:vis] $field:ident [$fty:ty] [$($column:literal)?] })*
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $($kept)* $fvis $field: $fty, )*
        }

        impl $crate::Record for $name {
            fn schema() -> &'static $crate::Schema {
                static SCHEMA: ::std::sync::LazyLock<$crate::Schema> =
                    ::std::sync::LazyLock::new(|| $crate::Schema {
                        type_name: ::std::any::type_name::<$name>(),
                        fields: ::std::vec![
                            $(
                                $crate::FieldDef {
                                    name: $crate::__record_column!($field $(, $column)?),
                                    shape: $crate::__record_shape!($kind ; $fty),
                                },
                            )*
                        ],
                    });
                &SCHEMA
            }
        }

        impl $crate::Fields for $name {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(&mut self, index: usize) -> ::std::option::Option<$crate::FieldMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::std::option::Option::Some(
                            $crate::__record_field_mut!($kind ; &mut self.$field),
                        );
                    }
                    position += 1;
                )*
                ::std::option::Option::None
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_shape {
    (nested ; $fty:ty) => {
        $crate::FieldShape::Nested(<$fty as $crate::Record>::schema)
    };
    (leaf ; $fty:ty) => {
        $crate::FieldShape::Leaf($crate::DeclaredType::of::<$fty>())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field_mut {
    (nested ; $place:expr) => {
        $crate::FieldMut::nested($place)
    };
    (leaf ; $place:expr) => {
        $crate::FieldMut::leaf($place)
    };
}
