//! Strongly-typed entity identifiers.
//!
//! Each [`Image`](crate::image::Image) stores its classes, methods and fields in
//! contiguous arenas; the identifiers here are indexes into those arenas. Edges
//! between entities are stored as identifier sets, which makes every traversal an
//! array lookup and makes identity comparison index equality. Identifiers from
//! different images live in different index spaces and must never be mixed.

use std::fmt;

/// The three kinds of matchable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A top-level class
    Class,
    /// A method owned by a class
    Method,
    /// A field owned by a class
    Field,
}

impl EntityKind {
    /// Returns a lowercase human-readable name for this kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Method => "method",
            EntityKind::Field => "field",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Creates an identifier from a raw arena index.
            ///
            /// Normal usage obtains identifiers from an [`Image`](crate::image::Image)
            /// or its builder; this constructor exists for tests and for code that
            /// round-trips indexes through parallel arrays.
            #[must_use]
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Returns the raw arena index.
            #[must_use]
            #[inline]
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Identifier of a class within one image.
    ClassId,
    "c"
);
entity_id!(
    /// Identifier of a method within one image.
    MethodId,
    "m"
);
entity_id!(
    /// Identifier of a field within one image.
    FieldId,
    "f"
);
