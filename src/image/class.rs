//! Class records and their relationship edges.

use std::sync::OnceLock;

use crate::image::{AccessFlags, ClassId, FieldId, MethodId};

/// A class in a program image.
///
/// Classes are top-level entities; everything else is owned by one. All edge
/// sets are bidirectionally consistent with their counterparts (a class listed
/// in `children` has this class as `parent`, and so on); the image builder
/// establishes and validates this before an image is released for matching.
///
/// A class with `real == false` is a placeholder for a type that is referenced
/// by the image but not present in it (library types, primitives, arrays). It
/// anchors edges so the reference graph stays well formed, but carries no
/// members of its own.
#[derive(Debug)]
pub struct ClassDef {
    /// Identifier of this class in its image
    pub id: ClassId,
    /// Internal name in slash-separated form (e.g. `java/lang/Object`), or the
    /// descriptor form for primitives (`I`) and arrays (`[I`)
    pub name: String,
    /// Access and property flags
    pub flags: AccessFlags,
    /// Whether this class is declared in the image (`false` for placeholders)
    pub real: bool,
    /// The direct superclass, if any
    pub parent: Option<ClassId>,
    /// Classes whose `parent` is this class
    pub children: Vec<ClassId>,
    /// Directly declared interfaces
    pub interfaces: Vec<ClassId>,
    /// Classes that directly implement or extend this interface
    pub implementers: Vec<ClassId>,
    /// Declared methods, in declaration order (placeholder members appended last)
    pub methods: Vec<MethodId>,
    /// Declared fields, in declaration order (placeholder members appended last)
    pub fields: Vec<FieldId>,
    /// Methods anywhere in the image whose return or parameter types mention this class
    pub method_type_refs: Vec<MethodId>,
    /// Fields anywhere in the image whose declared type is this class
    pub field_type_refs: Vec<FieldId>,

    // Aggregated reference sets, computed on first access (pure functions of the image).
    pub(crate) out_class_refs: OnceLock<Vec<ClassId>>,
    pub(crate) in_class_refs: OnceLock<Vec<ClassId>>,
    pub(crate) out_method_refs: OnceLock<Vec<MethodId>>,
    pub(crate) in_method_refs: OnceLock<Vec<MethodId>>,
    pub(crate) read_field_refs: OnceLock<Vec<FieldId>>,
    pub(crate) write_field_refs: OnceLock<Vec<FieldId>>,
}

impl ClassDef {
    /// Creates a class record with no edges.
    pub(crate) fn new(id: ClassId, name: String, flags: AccessFlags, real: bool) -> Self {
        Self {
            id,
            name,
            flags,
            real,
            parent: None,
            children: Vec::new(),
            interfaces: Vec::new(),
            implementers: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            method_type_refs: Vec::new(),
            field_type_refs: Vec::new(),
            out_class_refs: OnceLock::new(),
            in_class_refs: OnceLock::new(),
            out_method_refs: OnceLock::new(),
            in_method_refs: OnceLock::new(),
            read_field_refs: OnceLock::new(),
            write_field_refs: OnceLock::new(),
        }
    }

    /// Returns `true` if this class is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(AccessFlags::INTERFACE)
    }

    /// Returns `true` if this class is an enum.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(AccessFlags::ENUM)
    }

    /// Returns `true` if this class is an annotation interface.
    #[must_use]
    pub fn is_annotation(&self) -> bool {
        self.flags.contains(AccessFlags::ANNOTATION)
    }
}
