//! Field records and their access edges.

use crate::image::{AccessFlags, ClassId, FieldId, Image, MethodId};

/// A field in a program image.
///
/// A field with `real == false` stands in for a field referenced by some method
/// body but not declared in the image, so read/write edges always resolve.
#[derive(Debug)]
pub struct FieldDef {
    /// Identifier of this field in its image
    pub id: FieldId,
    /// The declaring class
    pub owner: ClassId,
    /// Simple name
    pub name: String,
    /// Declared type
    pub ty: ClassId,
    /// Access and property flags
    pub flags: AccessFlags,
    /// Whether this field is declared in the image
    pub real: bool,
    /// Methods that read this field
    pub readers: Vec<MethodId>,
    /// Methods that write this field
    pub writers: Vec<MethodId>,
}

impl FieldDef {
    pub(crate) fn new(
        id: FieldId,
        owner: ClassId,
        name: String,
        ty: ClassId,
        flags: AccessFlags,
        real: bool,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            ty,
            flags,
            real,
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Renders the field's type descriptor, e.g. `Ljava/lang/String;`.
    #[must_use]
    pub fn descriptor(&self, image: &Image) -> String {
        crate::image::method::type_descriptor(&image.class(self.ty).name)
    }
}
