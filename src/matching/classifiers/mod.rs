//! The built-in feature families for classes, methods and fields.
//!
//! Each family lives in its own submodule and registers itself into a
//! [`FeatureSet`] with its canonical weights. [`ClassifierSet`] bundles the
//! three sets; the engine owns one instance, and there is no global registry.

mod class;
mod field;
mod method;

use crate::{
    image::{ClassId, FieldId, MethodId},
    matching::feature::FeatureSet,
};

/// The three feature registries a matching run scores with.
///
/// [`ClassifierSet::with_defaults`] yields the built-in families. Callers that
/// want to experiment with custom features can start from
/// [`ClassifierSet::empty`] and register their own.
pub struct ClassifierSet {
    /// Features scoring class pairs
    pub classes: FeatureSet<ClassId>,
    /// Features scoring method pairs
    pub methods: FeatureSet<MethodId>,
    /// Features scoring field pairs
    pub fields: FeatureSet<FieldId>,
}

impl ClassifierSet {
    /// Creates the built-in classifier families.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::empty();
        class::register(&mut set.classes);
        method::register(&mut set.methods);
        field::register(&mut set.fields);
        set
    }

    /// Creates a set with no features registered.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            classes: FeatureSet::new(),
            methods: FeatureSet::new(),
            fields: FeatureSet::new(),
        }
    }
}

impl Default for ClassifierSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_families_registered() {
        let set = ClassifierSet::with_defaults();
        assert_eq!(set.classes.len(), 16);
        assert_eq!(set.methods.len(), 10);
        assert_eq!(set.fields.len(), 5);
    }

    #[test]
    fn test_empty_set() {
        let set = ClassifierSet::empty();
        assert!(set.classes.is_empty());
        assert!(set.methods.is_empty());
        assert!(set.fields.is_empty());
    }
}
