//! Access flags for classes, methods and fields.
//!
//! Flags use the standard class-file access-flag encoding so assembled images can
//! carry flag words straight through. Composite masks select the flag subsets the
//! matching engine cares about: the class-kind bits that gate candidate pairing,
//! and the per-kind bit windows that flag-similarity features measure.

use bitflags::bitflags;

bitflags! {
    /// Access and property flags of a class, method or field.
    ///
    /// The numeric values follow the class-file format, so a single flag word covers
    /// all three entity kinds; which bits are meaningful depends on the owner kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccessFlags: u32 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Method declared synchronized
        const SYNCHRONIZED = 0x0020;
        /// Field declared volatile
        const VOLATILE = 0x0040;
        /// Field declared transient
        const TRANSIENT = 0x0080;
        /// Method implemented in native code
        const NATIVE = 0x0100;
        /// Class is an interface
        const INTERFACE = 0x0200;
        /// Class or method declared abstract
        const ABSTRACT = 0x0400;
        /// Compiler-generated entity not present in source
        const SYNTHETIC = 0x1000;
        /// Class is an annotation interface
        const ANNOTATION = 0x2000;
        /// Class is an enum, field is an enum constant
        const ENUM = 0x4000;

        /// Bits that determine what kind of class this is.
        ///
        /// Two classes may only ever be paired when they agree on this subset;
        /// an enum cannot become an interface through obfuscation.
        const CLASS_KIND_MASK = Self::INTERFACE.bits() | Self::ANNOTATION.bits() | Self::ENUM.bits();

        /// The class-kind bits plus abstractness, measured by the class type-check feature.
        const CLASS_CHECK_MASK = Self::CLASS_KIND_MASK.bits() | Self::ABSTRACT.bits();

        /// Method bits measured by the method flag-similarity feature.
        const METHOD_CHECK_MASK = Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::STATIC.bits()
            | Self::FINAL.bits()
            | Self::SYNCHRONIZED.bits()
            | Self::NATIVE.bits()
            | Self::ABSTRACT.bits();

        /// Field bits measured by the field flag-similarity feature.
        const FIELD_CHECK_MASK = Self::PUBLIC.bits()
            | Self::PRIVATE.bits()
            | Self::PROTECTED.bits()
            | Self::STATIC.bits()
            | Self::FINAL.bits()
            | Self::VOLATILE.bits()
            | Self::TRANSIENT.bits()
            | Self::ENUM.bits();
    }
}

impl AccessFlags {
    /// Extracts the class-kind bits (`INTERFACE`, `ANNOTATION`, `ENUM`).
    #[must_use]
    pub fn class_kind(self) -> Self {
        self & Self::CLASS_KIND_MASK
    }
}
