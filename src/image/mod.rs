//! The program-image data model.
//!
//! An [`Image`] is a fully resolved snapshot of one program version: every class,
//! method and field, with every cross-reference materialized as a bidirectional
//! edge. Images are produced once by an assembler front-end through
//! [`ImageBuilder`] and are immutable afterwards; the matching engine only
//! ever reads them, which makes intra-pass parallel scoring safe.
//!
//! # Storage model
//!
//! Entities live in three contiguous arenas indexed by [`ClassId`], [`MethodId`]
//! and [`FieldId`]. Edges are identifier sets, so graph traversal in either
//! direction is an array lookup and entity identity is index equality. References
//! to types the image does not declare (library classes, primitives, arrays)
//! materialize as placeholder records with `real == false`, keeping the graph
//! closed without faking bodies.
//!
//! # Aggregated reference sets
//!
//! For class-level similarity the engine needs each class's footprint in the
//! reference graph: which classes it mentions, which mention it, and the union of
//! its members' call/read/write edges. These are pure functions of the image and
//! are computed once on first access, then cached per class.

mod builder;
mod class;
mod entity;
mod field;
mod flags;
mod method;

pub use builder::{ClassDecl, FieldDecl, ImageBuilder, MethodDecl};
pub use class::ClassDef;
pub use entity::{ClassId, EntityKind, FieldId, MethodId};
pub use field::FieldDef;
pub use flags::AccessFlags;
pub use method::{MethodDef, OpKind};

use rustc_hash::FxHashMap;

use crate::{Error, Result};

/// A fully assembled, immutable program image.
///
/// Constructed through [`ImageBuilder`]; all structural invariants (edge
/// bidirectionality, hierarchy acyclicity, member-key uniqueness) are validated
/// at build time, so matching code can rely on them unconditionally.
#[derive(Debug)]
pub struct Image {
    /// Display name of this image (e.g. a version label)
    name: String,
    classes: Vec<ClassDef>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
    by_name: FxHashMap<String, ClassId>,
}

impl Image {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            classes: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Returns the display name of this image.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the class record for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this image.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    /// Returns the method record for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this image.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    /// Returns the field record for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this image.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    /// Looks up a class by its internal name.
    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Looks up a class by its internal name, erroring when absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownEntity`] if no class of that name exists.
    pub fn require_class(&self, name: &str) -> Result<ClassId> {
        self.class_by_name(name)
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    /// Finds a method of `class` by simple name and descriptor.
    ///
    /// `(name, descriptor)` is unique within a class, so at most one method can
    /// match.
    #[must_use]
    pub fn method_by_key(&self, class: ClassId, name: &str, desc: &str) -> Option<MethodId> {
        self.class(class)
            .methods
            .iter()
            .copied()
            .find(|&m| {
                let method = self.method(m);
                method.name == name && method.descriptor(self) == desc
            })
    }

    /// Finds a field of `class` by simple name and type descriptor.
    #[must_use]
    pub fn field_by_key(&self, class: ClassId, name: &str, desc: &str) -> Option<FieldId> {
        self.class(class)
            .fields
            .iter()
            .copied()
            .find(|&f| {
                let field = self.field(f);
                field.name == name && field.descriptor(self) == desc
            })
    }

    /// Number of classes, placeholders included.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Number of methods, placeholders included.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Number of fields, placeholders included.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterates over all class records in arena order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter()
    }

    /// Iterates over all method records in arena order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter()
    }

    /// Iterates over all field records in arena order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Length of the superclass chain above `id`.
    ///
    /// A class with no parent has depth 0.
    #[must_use]
    pub fn hierarchy_depth(&self, id: ClassId) -> usize {
        let mut depth = 0;
        let mut cur = self.class(id).parent;
        while let Some(p) = cur {
            depth += 1;
            cur = self.class(p).parent;
        }
        depth
    }

    /// Classes referenced by `id`: every class mentioned in a member body plus
    /// every field type, deduplicated.
    #[must_use]
    pub fn out_class_refs(&self, id: ClassId) -> &[ClassId] {
        let class = self.class(id);
        class.out_class_refs.get_or_init(|| {
            let mut refs: Vec<ClassId> = Vec::new();
            for &m in &class.methods {
                refs.extend_from_slice(&self.method(m).class_refs);
            }
            for &f in &class.fields {
                refs.push(self.field(f).ty);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Classes that reference `id`: the owners of every method or field whose
    /// declared type mentions this class.
    #[must_use]
    pub fn in_class_refs(&self, id: ClassId) -> &[ClassId] {
        let class = self.class(id);
        class.in_class_refs.get_or_init(|| {
            let mut refs: Vec<ClassId> = Vec::new();
            for &m in &class.method_type_refs {
                refs.push(self.method(m).owner);
            }
            for &f in &class.field_type_refs {
                refs.push(self.field(f).owner);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Union of the outgoing call edges of all methods of `id`.
    #[must_use]
    pub fn out_method_refs(&self, id: ClassId) -> &[MethodId] {
        let class = self.class(id);
        class.out_method_refs.get_or_init(|| {
            let mut refs: Vec<MethodId> = Vec::new();
            for &m in &class.methods {
                refs.extend_from_slice(&self.method(m).refs_out);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Union of the incoming call edges of all methods of `id`.
    #[must_use]
    pub fn in_method_refs(&self, id: ClassId) -> &[MethodId] {
        let class = self.class(id);
        class.in_method_refs.get_or_init(|| {
            let mut refs: Vec<MethodId> = Vec::new();
            for &m in &class.methods {
                refs.extend_from_slice(&self.method(m).refs_in);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Union of the field-read edges of all methods of `id`.
    #[must_use]
    pub fn read_field_refs(&self, id: ClassId) -> &[FieldId] {
        let class = self.class(id);
        class.read_field_refs.get_or_init(|| {
            let mut refs: Vec<FieldId> = Vec::new();
            for &m in &class.methods {
                refs.extend_from_slice(&self.method(m).field_reads);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Union of the field-write edges of all methods of `id`.
    #[must_use]
    pub fn write_field_refs(&self, id: ClassId) -> &[FieldId] {
        let class = self.class(id);
        class.write_field_refs.get_or_init(|| {
            let mut refs: Vec<FieldId> = Vec::new();
            for &m in &class.methods {
                refs.extend_from_slice(&self.method(m).field_writes);
            }
            dedup_ids(&mut refs);
            refs
        })
    }

    /// Qualified display name of a method, e.g. `a/B.run`.
    #[must_use]
    pub fn method_display(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("{}.{}", self.class(m.owner).name, m.name)
    }

    /// Qualified display name of a field, e.g. `a/B.count`.
    #[must_use]
    pub fn field_display(&self, id: FieldId) -> String {
        let f = self.field(id);
        format!("{}.{}", self.class(f.owner).name, f.name)
    }

    pub(crate) fn classes_mut(&mut self) -> &mut Vec<ClassDef> {
        &mut self.classes
    }

    pub(crate) fn methods_mut(&mut self) -> &mut Vec<MethodDef> {
        &mut self.methods
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Vec<FieldDef> {
        &mut self.fields
    }

    pub(crate) fn index_class_name(&mut self, name: String, id: ClassId) {
        self.by_name.insert(name, id);
    }

    /// Verifies the structural invariants the matching engine relies on.
    ///
    /// Checks edge bidirectionality for every edge kind, acyclicity of the
    /// class hierarchy and of the interface graph, member-key uniqueness per
    /// class, and that placeholder entities carry no body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImageInconsistent`](crate::Error::ImageInconsistent)
    /// naming the first violation found.
    pub(crate) fn validate(&self) -> Result<()> {
        self.validate_hierarchy()?;
        self.validate_edges()?;
        self.validate_member_keys()?;
        Ok(())
    }

    fn validate_hierarchy(&self) -> Result<()> {
        // parent chains must terminate; walking more steps than there are
        // classes proves a cycle
        let limit = self.classes.len();
        for class in &self.classes {
            let mut steps = 0;
            let mut cur = class.parent;
            while let Some(p) = cur {
                steps += 1;
                if steps > limit {
                    return Err(inconsistent_error!(
                        "class hierarchy cycle through '{}'",
                        class.name
                    ));
                }
                cur = self.class(p).parent;
            }

            if let Some(p) = class.parent {
                if !self.class(p).children.contains(&class.id) {
                    return Err(inconsistent_error!(
                        "'{}' has parent '{}' but is not among its children",
                        class.name,
                        self.class(p).name
                    ));
                }
            }
            for &child in &class.children {
                if self.class(child).parent != Some(class.id) {
                    return Err(inconsistent_error!(
                        "'{}' lists child '{}' which does not point back",
                        class.name,
                        self.class(child).name
                    ));
                }
            }
            for &itf in &class.interfaces {
                if !self.class(itf).implementers.contains(&class.id) {
                    return Err(inconsistent_error!(
                        "'{}' implements '{}' but is not among its implementers",
                        class.name,
                        self.class(itf).name
                    ));
                }
            }
            for &imp in &class.implementers {
                if !self.class(imp).interfaces.contains(&class.id) {
                    return Err(inconsistent_error!(
                        "'{}' lists implementer '{}' which does not point back",
                        class.name,
                        self.class(imp).name
                    ));
                }
            }
        }

        // interface graph must be acyclic as well
        for class in &self.classes {
            let mut visited = vec![false; self.classes.len()];
            let mut stack = vec![class.id];
            let mut steps = 0usize;
            while let Some(cur) = stack.pop() {
                for &itf in &self.class(cur).interfaces {
                    if itf == class.id {
                        return Err(inconsistent_error!(
                            "interface cycle through '{}'",
                            class.name
                        ));
                    }
                    if !visited[itf.index()] {
                        visited[itf.index()] = true;
                        stack.push(itf);
                    }
                }
                steps += 1;
                if steps > self.classes.len() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn validate_edges(&self) -> Result<()> {
        for method in &self.methods {
            if !method.real && !method.insns.is_empty() {
                return Err(inconsistent_error!(
                    "placeholder method '{}' carries a body",
                    self.method_display(method.id)
                ));
            }
            for &callee in &method.refs_out {
                if !self.method(callee).refs_in.contains(&method.id) {
                    return Err(inconsistent_error!(
                        "call edge '{}' -> '{}' missing its reverse",
                        self.method_display(method.id),
                        self.method_display(callee)
                    ));
                }
            }
            for &caller in &method.refs_in {
                if !self.method(caller).refs_out.contains(&method.id) {
                    return Err(inconsistent_error!(
                        "caller edge '{}' <- '{}' missing its forward",
                        self.method_display(method.id),
                        self.method_display(caller)
                    ));
                }
            }
            for &f in &method.field_reads {
                if !self.field(f).readers.contains(&method.id) {
                    return Err(inconsistent_error!(
                        "read edge '{}' -> '{}' missing its reverse",
                        self.method_display(method.id),
                        self.field_display(f)
                    ));
                }
            }
            for &f in &method.field_writes {
                if !self.field(f).writers.contains(&method.id) {
                    return Err(inconsistent_error!(
                        "write edge '{}' -> '{}' missing its reverse",
                        self.method_display(method.id),
                        self.field_display(f)
                    ));
                }
            }
        }
        for field in &self.fields {
            for &reader in &field.readers {
                if !self.method(reader).field_reads.contains(&field.id) {
                    return Err(inconsistent_error!(
                        "reader edge '{}' <- '{}' missing its forward",
                        self.field_display(field.id),
                        self.method_display(reader)
                    ));
                }
            }
            for &writer in &field.writers {
                if !self.method(writer).field_writes.contains(&field.id) {
                    return Err(inconsistent_error!(
                        "writer edge '{}' <- '{}' missing its forward",
                        self.field_display(field.id),
                        self.method_display(writer)
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_member_keys(&self) -> Result<()> {
        for class in &self.classes {
            let mut method_keys: Vec<(&str, String)> = Vec::with_capacity(class.methods.len());
            for &m in &class.methods {
                let method = self.method(m);
                let key = (method.name.as_str(), method.descriptor(self));
                if method_keys.contains(&key) {
                    return Err(inconsistent_error!(
                        "duplicate method '{}{}' in class '{}'",
                        key.0,
                        key.1,
                        class.name
                    ));
                }
                method_keys.push(key);
            }
            let mut field_keys: Vec<(&str, ClassId)> = Vec::with_capacity(class.fields.len());
            for &f in &class.fields {
                let field = self.field(f);
                let key = (field.name.as_str(), field.ty);
                if field_keys.contains(&key) {
                    return Err(inconsistent_error!(
                        "duplicate field '{}' in class '{}'",
                        key.0,
                        class.name
                    ));
                }
                field_keys.push(key);
            }
        }
        Ok(())
    }
}

/// Sorts and deduplicates an id set in place.
fn dedup_ids<T: Ord + Copy>(ids: &mut Vec<T>) {
    ids.sort_unstable();
    ids.dedup();
}
