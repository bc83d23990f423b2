//! Declarative construction of program images.
//!
//! [`ImageBuilder`] is the ingestion point an assembler front-end targets: it
//! accepts class, member and body declarations in any order, resolves every
//! cross-reference, materializes placeholders for types and members the image
//! references but does not declare, back-fills all reverse edges, and validates
//! the structural invariants before releasing the finished [`Image`].
//!
//! Types are written in the internal descriptor form: single letters for
//! primitives (`V Z B C S I J F D`), `Lpkg/Name;` for object types, and a `[`
//! prefix per array dimension. Method descriptors are the usual
//! `(<params>)<return>` concatenation, e.g. `(ILjava/lang/String;)V`.
//!
//! # Example
//!
//! ```rust
//! use classmatch::image::{AccessFlags, ImageBuilder, OpKind};
//!
//! let mut builder = ImageBuilder::new("v1");
//! builder
//!     .class("app/Main", AccessFlags::PUBLIC)
//!     .parent("java/lang/Object")
//!     .method_with("run", "()V", |m| {
//!         m.flags(AccessFlags::PUBLIC)
//!             .insns(&[OpKind::Load, OpKind::Invoke, OpKind::Return])
//!             .calls("app/Util", "helper", "()V");
//!     })
//!     .field("count", "I", AccessFlags::PRIVATE);
//! builder.class("app/Util", AccessFlags::PUBLIC).method("helper", "()V");
//! let image = builder.build()?;
//! assert!(image.class_by_name("app/Main").is_some());
//! # Ok::<(), classmatch::Error>(())
//! ```

use rustc_hash::FxHashMap;

use crate::{
    image::{
        AccessFlags, ClassDef, ClassId, FieldDef, FieldId, Image, MethodDef, MethodId, OpKind,
    },
    Error, Result,
};

/// Reference to a member of some class, by name and descriptor.
#[derive(Debug, Clone)]
struct MemberRef {
    class: String,
    name: String,
    desc: String,
}

/// A declared method, including its body summary and outgoing references.
#[derive(Debug, Default)]
pub struct MethodDecl {
    name: String,
    desc: String,
    flags: AccessFlags,
    insns: Vec<OpKind>,
    calls: Vec<MemberRef>,
    reads: Vec<MemberRef>,
    writes: Vec<MemberRef>,
    uses: Vec<String>,
}

impl MethodDecl {
    /// Sets the access flags.
    pub fn flags(&mut self, flags: AccessFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Sets the instruction category sequence of the body.
    pub fn insns(&mut self, insns: &[OpKind]) -> &mut Self {
        self.insns = insns.to_vec();
        self
    }

    /// Records an invocation of `class.name desc` from this body.
    pub fn calls(&mut self, class: &str, name: &str, desc: &str) -> &mut Self {
        self.calls.push(MemberRef {
            class: class.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    /// Records a read of field `class.name` (of type `desc`) from this body.
    pub fn reads(&mut self, class: &str, name: &str, desc: &str) -> &mut Self {
        self.reads.push(MemberRef {
            class: class.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    /// Records a write of field `class.name` (of type `desc`) from this body.
    pub fn writes(&mut self, class: &str, name: &str, desc: &str) -> &mut Self {
        self.writes.push(MemberRef {
            class: class.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        });
        self
    }

    /// Records that the body mentions `class` (allocation, cast, instanceof).
    ///
    /// Call and field-access targets are collected automatically; this is for
    /// type mentions that have no member target.
    pub fn uses(&mut self, class: &str) -> &mut Self {
        self.uses.push(class.to_string());
        self
    }
}

/// A declared field.
#[derive(Debug)]
pub struct FieldDecl {
    name: String,
    desc: String,
    flags: AccessFlags,
}

/// A declared class and its members.
#[derive(Debug)]
pub struct ClassDecl {
    name: String,
    flags: AccessFlags,
    parent: Option<String>,
    interfaces: Vec<String>,
    methods: Vec<MethodDecl>,
    fields: Vec<FieldDecl>,
}

impl ClassDecl {
    /// Sets the superclass by internal name.
    pub fn parent(&mut self, name: &str) -> &mut Self {
        self.parent = Some(name.to_string());
        self
    }

    /// Adds a directly implemented interface by internal name.
    pub fn interface(&mut self, name: &str) -> &mut Self {
        let name = name.to_string();
        if !self.interfaces.contains(&name) {
            self.interfaces.push(name);
        }
        self
    }

    /// Declares a method with no body summary and empty flags.
    pub fn method(&mut self, name: &str, desc: &str) -> &mut Self {
        self.method_with(name, desc, |_| {})
    }

    /// Declares a method and configures it through the closure.
    pub fn method_with(
        &mut self,
        name: &str,
        desc: &str,
        build: impl FnOnce(&mut MethodDecl),
    ) -> &mut Self {
        let mut decl = MethodDecl {
            name: name.to_string(),
            desc: desc.to_string(),
            ..MethodDecl::default()
        };
        build(&mut decl);
        self.methods.push(decl);
        self
    }

    /// Declares a field of type `desc`.
    pub fn field(&mut self, name: &str, desc: &str, flags: AccessFlags) -> &mut Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            desc: desc.to_string(),
            flags,
        });
        self
    }
}

/// Builder assembling a fully resolved [`Image`] from declarations.
#[derive(Debug)]
pub struct ImageBuilder {
    name: String,
    decls: Vec<ClassDecl>,
    index: FxHashMap<String, usize>,
}

impl ImageBuilder {
    /// Creates a builder for an image with the given display name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            decls: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Declares a class, or returns the existing declaration of the same name.
    ///
    /// Redeclaring a class updates its flags and keeps previously declared
    /// members, so declarations can be split across call sites.
    pub fn class(&mut self, name: &str, flags: AccessFlags) -> &mut ClassDecl {
        if let Some(&i) = self.index.get(name) {
            self.decls[i].flags = flags;
            return &mut self.decls[i];
        }
        self.index.insert(name.to_string(), self.decls.len());
        self.decls.push(ClassDecl {
            name: name.to_string(),
            flags,
            parent: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        });
        self.decls.last_mut().unwrap()
    }

    /// Resolves all declarations into an immutable image.
    ///
    /// Every referenced-but-undeclared class, method or field materializes as a
    /// placeholder record with `real == false`. All reverse edges are
    /// back-filled and the structural invariants are verified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDescriptor`] for malformed descriptors and
    /// [`Error::ImageInconsistent`] for duplicate member keys or hierarchy
    /// cycles.
    pub fn build(self) -> Result<Image> {
        let mut asm = Assembler {
            image: Image::new(self.name),
            methods_by_key: FxHashMap::default(),
            fields_by_key: FxHashMap::default(),
        };

        // Declared classes first, in declaration order, so their ids are stable
        // regardless of what the reference-resolution below interns.
        let mut class_ids = Vec::with_capacity(self.decls.len());
        for decl in &self.decls {
            let id = asm.intern_class(&decl.name);
            {
                let class = &mut asm.image.classes_mut()[id.index()];
                class.flags = decl.flags;
                class.real = true;
            }
            class_ids.push(id);
        }

        // Hierarchy edges.
        for (decl, &id) in self.decls.iter().zip(&class_ids) {
            if let Some(parent_name) = &decl.parent {
                let parent = asm.intern_class(parent_name);
                asm.image.classes_mut()[id.index()].parent = Some(parent);
                asm.image.classes_mut()[parent.index()].children.push(id);
            }
            for itf_name in &decl.interfaces {
                let itf = asm.intern_class(itf_name);
                asm.image.classes_mut()[id.index()].interfaces.push(itf);
                asm.image.classes_mut()[itf.index()].implementers.push(id);
            }
        }

        // Declared members, keeping per-class declaration order.
        let mut method_ids: Vec<Vec<MethodId>> = Vec::with_capacity(self.decls.len());
        for (decl, &owner) in self.decls.iter().zip(&class_ids) {
            let mut ids = Vec::with_capacity(decl.methods.len());
            for m in &decl.methods {
                let id = asm.declare_method(owner, &m.name, &m.desc, m.flags, true)?;
                asm.image.methods_mut()[id.index()].insns = m.insns.clone();
                ids.push(id);
            }
            for f in &decl.fields {
                asm.declare_field(owner, &f.name, &f.desc, f.flags, true)?;
            }
            method_ids.push(ids);
        }

        // Body references: calls, field accesses, bare type mentions. Missing
        // targets materialize as placeholders here.
        for (decl, ids) in self.decls.iter().zip(&method_ids) {
            for (m, &mid) in decl.methods.iter().zip(ids) {
                let mut class_refs: Vec<ClassId> = Vec::new();
                for call in &m.calls {
                    let target = asm.resolve_method(call)?;
                    class_refs.push(asm.image.method(target).owner);
                    asm.image.methods_mut()[mid.index()].refs_out.push(target);
                    asm.image.methods_mut()[target.index()].refs_in.push(mid);
                }
                for read in &m.reads {
                    let target = asm.resolve_field(read)?;
                    class_refs.push(asm.image.field(target).owner);
                    asm.image.methods_mut()[mid.index()].field_reads.push(target);
                    asm.image.fields_mut()[target.index()].readers.push(mid);
                }
                for write in &m.writes {
                    let target = asm.resolve_field(write)?;
                    class_refs.push(asm.image.field(target).owner);
                    asm.image.methods_mut()[mid.index()]
                        .field_writes
                        .push(target);
                    asm.image.fields_mut()[target.index()].writers.push(mid);
                }
                for name in &m.uses {
                    class_refs.push(asm.intern_class(name));
                }
                asm.image.methods_mut()[mid.index()].class_refs = class_refs;
            }
        }

        // Type-reference edges: which members mention each class in their
        // declared types.
        for mid in 0..asm.image.method_count() {
            let method = &asm.image.methods_mut()[mid];
            let id = method.id;
            let mut types = method.params.clone();
            types.push(method.return_type);
            for t in types {
                asm.image.classes_mut()[t.index()].method_type_refs.push(id);
            }
        }
        for fid in 0..asm.image.field_count() {
            let field = &asm.image.fields_mut()[fid];
            let (id, ty) = (field.id, field.ty);
            asm.image.classes_mut()[ty.index()].field_type_refs.push(id);
        }

        asm.normalize_edge_sets();
        asm.image.validate()?;
        Ok(asm.image)
    }
}

/// Working state of a [`ImageBuilder::build`] run.
struct Assembler {
    image: Image,
    methods_by_key: FxHashMap<(ClassId, String, String), MethodId>,
    fields_by_key: FxHashMap<(ClassId, String, String), FieldId>,
}

impl Assembler {
    /// Returns the class named `name`, creating a placeholder if absent.
    fn intern_class(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.image.class_by_name(name) {
            return id;
        }
        let id = ClassId::new(self.image.class_count());
        self.image.classes_mut().push(ClassDef::new(
            id,
            name.to_string(),
            AccessFlags::empty(),
            false,
        ));
        self.image.index_class_name(name.to_string(), id);
        id
    }

    fn declare_method(
        &mut self,
        owner: ClassId,
        name: &str,
        desc: &str,
        flags: AccessFlags,
        real: bool,
    ) -> Result<MethodId> {
        let key = (owner, name.to_string(), desc.to_string());
        if self.methods_by_key.contains_key(&key) {
            if real {
                return Err(inconsistent_error!(
                    "duplicate method '{}{}' in class '{}'",
                    name,
                    desc,
                    self.image.class(owner).name
                ));
            }
            return Ok(self.methods_by_key[&key]);
        }

        let (params, ret) = parse_method_descriptor(desc)?;
        let params = params.iter().map(|t| self.intern_class(t)).collect();
        let ret = self.intern_class(&ret);

        let id = MethodId::new(self.image.method_count());
        self.image.methods_mut().push(MethodDef::new(
            id,
            owner,
            name.to_string(),
            ret,
            params,
            flags,
            real,
        ));
        self.image.classes_mut()[owner.index()].methods.push(id);
        self.methods_by_key.insert(key, id);
        Ok(id)
    }

    fn declare_field(
        &mut self,
        owner: ClassId,
        name: &str,
        desc: &str,
        flags: AccessFlags,
        real: bool,
    ) -> Result<FieldId> {
        let key = (owner, name.to_string(), desc.to_string());
        if self.fields_by_key.contains_key(&key) {
            if real {
                return Err(inconsistent_error!(
                    "duplicate field '{}' in class '{}'",
                    name,
                    self.image.class(owner).name
                ));
            }
            return Ok(self.fields_by_key[&key]);
        }

        let ty = parse_field_descriptor(desc)?;
        let ty = self.intern_class(&ty);

        let id = FieldId::new(self.image.field_count());
        self.image.fields_mut().push(FieldDef::new(
            id,
            owner,
            name.to_string(),
            ty,
            flags,
            real,
        ));
        self.image.classes_mut()[owner.index()].fields.push(id);
        self.fields_by_key.insert(key, id);
        Ok(id)
    }

    /// Resolves a call target, creating a placeholder method if absent.
    fn resolve_method(&mut self, target: &MemberRef) -> Result<MethodId> {
        let owner = self.intern_class(&target.class);
        let key = (owner, target.name.clone(), target.desc.clone());
        if let Some(&id) = self.methods_by_key.get(&key) {
            return Ok(id);
        }
        self.declare_method(owner, &target.name, &target.desc, AccessFlags::empty(), false)
    }

    /// Resolves a field-access target, creating a placeholder field if absent.
    fn resolve_field(&mut self, target: &MemberRef) -> Result<FieldId> {
        let owner = self.intern_class(&target.class);
        let key = (owner, target.name.clone(), target.desc.clone());
        if let Some(&id) = self.fields_by_key.get(&key) {
            return Ok(id);
        }
        self.declare_field(owner, &target.name, &target.desc, AccessFlags::empty(), false)
    }

    /// Sorts and deduplicates every derived edge set, giving all images a
    /// canonical edge order independent of declaration order.
    fn normalize_edge_sets(&mut self) {
        for class in self.image.classes_mut() {
            sort_dedup(&mut class.children);
            sort_dedup(&mut class.implementers);
            sort_dedup(&mut class.method_type_refs);
            sort_dedup(&mut class.field_type_refs);
        }
        for method in self.image.methods_mut() {
            sort_dedup(&mut method.refs_out);
            sort_dedup(&mut method.refs_in);
            sort_dedup(&mut method.field_reads);
            sort_dedup(&mut method.field_writes);
            sort_dedup(&mut method.class_refs);
        }
        for field in self.image.fields_mut() {
            sort_dedup(&mut field.readers);
            sort_dedup(&mut field.writers);
        }
    }
}

fn sort_dedup<T: Ord + Copy>(ids: &mut Vec<T>) {
    ids.sort_unstable();
    ids.dedup();
}

const PRIMITIVES: &str = "VZBCSIJFD";

/// Parses one type from the front of `desc`, returning its internal name and
/// the remaining input.
fn parse_type(desc: &str) -> Result<(String, &str)> {
    match desc.as_bytes().first() {
        Some(b'L') => {
            let semi = desc
                .find(';')
                .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
            let name = &desc[1..semi];
            if name.is_empty() {
                return Err(Error::InvalidDescriptor(desc.to_string()));
            }
            Ok((name.to_string(), &desc[semi + 1..]))
        }
        Some(b'[') => {
            let (inner, rest) = parse_type(&desc[1..])?;
            Ok((
                format!("[{}", crate::image::method::type_descriptor(&inner)),
                rest,
            ))
        }
        Some(&c) if PRIMITIVES.contains(c as char) => {
            Ok(((c as char).to_string(), &desc[1..]))
        }
        _ => Err(Error::InvalidDescriptor(desc.to_string())),
    }
}

/// Parses a full field/type descriptor into an internal type name.
fn parse_field_descriptor(desc: &str) -> Result<String> {
    let (name, rest) = parse_type(desc)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(name)
}

/// Parses a method descriptor into parameter type names and a return type name.
fn parse_method_descriptor(desc: &str) -> Result<(Vec<String>, String)> {
    let body = desc
        .strip_prefix('(')
        .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    let close = body
        .find(')')
        .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    let (mut params_str, ret_str) = (&body[..close], &body[close + 1..]);

    let mut params = Vec::new();
    while !params_str.is_empty() {
        let (name, rest) = parse_type(params_str)?;
        params.push(name);
        params_str = rest;
    }

    let (ret, rest) = parse_type(ret_str)?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok((params, ret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_descriptor() {
        assert_eq!(parse_field_descriptor("I").unwrap(), "I");
        assert_eq!(parse_field_descriptor("V").unwrap(), "V");
        assert_eq!(parse_field_descriptor("J").unwrap(), "J");
    }

    #[test]
    fn test_parse_object_descriptor() {
        assert_eq!(
            parse_field_descriptor("Ljava/lang/String;").unwrap(),
            "java/lang/String"
        );
    }

    #[test]
    fn test_parse_array_descriptor() {
        assert_eq!(parse_field_descriptor("[I").unwrap(), "[I");
        assert_eq!(parse_field_descriptor("[[I").unwrap(), "[[I");
        assert_eq!(
            parse_field_descriptor("[Ljava/lang/String;").unwrap(),
            "[Ljava/lang/String;"
        );
    }

    #[test]
    fn test_parse_invalid_descriptors() {
        assert!(parse_field_descriptor("").is_err());
        assert!(parse_field_descriptor("X").is_err());
        assert!(parse_field_descriptor("L;").is_err());
        assert!(parse_field_descriptor("Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("II").is_err());
    }

    #[test]
    fn test_parse_method_descriptor() {
        let (params, ret) = parse_method_descriptor("(ILjava/lang/String;[J)V").unwrap();
        assert_eq!(params, vec!["I", "java/lang/String", "[J"]);
        assert_eq!(ret, "V");

        let (params, ret) = parse_method_descriptor("()I").unwrap();
        assert!(params.is_empty());
        assert_eq!(ret, "I");

        assert!(parse_method_descriptor("I)V").is_err());
        assert!(parse_method_descriptor("(I").is_err());
        assert!(parse_method_descriptor("(I)VV").is_err());
    }

    #[test]
    fn test_placeholders_materialize() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Main", AccessFlags::PUBLIC)
            .method_with("run", "()V", |m| {
                m.calls("lib/Ext", "helper", "(I)V");
            });
        let image = builder.build().unwrap();

        // lib/Ext, its method, and the primitive types exist as placeholders
        let ext = image.class_by_name("lib/Ext").unwrap();
        assert!(!image.class(ext).real);
        assert_eq!(image.class(ext).methods.len(), 1);
        let helper = image.class(ext).methods[0];
        assert!(!image.method(helper).real);
        assert!(!image.class(image.class_by_name("V").unwrap()).real);

        // forward and reverse call edges both present
        let main = image.class_by_name("a/Main").unwrap();
        let run = image.class(main).methods[0];
        assert_eq!(image.method(run).refs_out, vec![helper]);
        assert_eq!(image.method(helper).refs_in, vec![run]);
    }

    #[test]
    fn test_field_access_edges() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Holder", AccessFlags::PUBLIC)
            .field("count", "I", AccessFlags::PRIVATE);
        builder
            .class("a/User", AccessFlags::PUBLIC)
            .method_with("bump", "()V", |m| {
                m.reads("a/Holder", "count", "I").writes("a/Holder", "count", "I");
            });
        let image = builder.build().unwrap();

        let holder = image.class_by_name("a/Holder").unwrap();
        let count = image.class(holder).fields[0];
        assert!(image.field(count).real);
        let user = image.class_by_name("a/User").unwrap();
        let bump = image.class(user).methods[0];
        assert_eq!(image.field(count).readers, vec![bump]);
        assert_eq!(image.field(count).writers, vec![bump]);
        assert_eq!(image.method(bump).field_reads, vec![count]);
        assert_eq!(image.method(bump).field_writes, vec![count]);
    }

    #[test]
    fn test_require_class() {
        let mut builder = ImageBuilder::new("test");
        builder.class("a/Known", AccessFlags::PUBLIC);
        let image = builder.build().unwrap();
        assert!(image.require_class("a/Known").is_ok());
        assert!(matches!(
            image.require_class("a/Missing"),
            Err(Error::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_hierarchy_edges() {
        let mut builder = ImageBuilder::new("test");
        builder.class("a/Base", AccessFlags::PUBLIC);
        builder
            .class("a/Derived", AccessFlags::PUBLIC)
            .parent("a/Base")
            .interface("a/Marker");
        let image = builder.build().unwrap();

        let base = image.class_by_name("a/Base").unwrap();
        let derived = image.class_by_name("a/Derived").unwrap();
        let marker = image.class_by_name("a/Marker").unwrap();
        assert_eq!(image.class(derived).parent, Some(base));
        assert_eq!(image.class(base).children, vec![derived]);
        assert_eq!(image.class(derived).interfaces, vec![marker]);
        assert_eq!(image.class(marker).implementers, vec![derived]);
        assert!(!image.class(marker).real);
    }

    #[test]
    fn test_type_reference_edges() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Box", AccessFlags::PUBLIC)
            .method("get", "()La/Item;")
            .field("item", "La/Item;", AccessFlags::PRIVATE);
        let image = builder.build().unwrap();

        let item = image.class_by_name("a/Item").unwrap();
        let box_cls = image.class_by_name("a/Box").unwrap();
        let get = image.class(box_cls).methods[0];
        let field = image.class(box_cls).fields[0];
        assert_eq!(image.class(item).method_type_refs, vec![get]);
        assert_eq!(image.class(item).field_type_refs, vec![field]);
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Dup", AccessFlags::PUBLIC)
            .method("m", "()V")
            .method("m", "()V");
        assert!(matches!(
            builder.build(),
            Err(Error::ImageInconsistent { .. })
        ));
    }

    #[test]
    fn test_overload_allowed() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Over", AccessFlags::PUBLIC)
            .method("m", "()V")
            .method("m", "(I)V");
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_hierarchy_cycle_rejected() {
        let mut builder = ImageBuilder::new("test");
        builder.class("a/A", AccessFlags::PUBLIC).parent("a/B");
        builder.class("a/B", AccessFlags::PUBLIC).parent("a/A");
        assert!(matches!(
            builder.build(),
            Err(Error::ImageInconsistent { .. })
        ));
    }

    #[test]
    fn test_class_redeclaration_merges() {
        let mut builder = ImageBuilder::new("test");
        builder.class("a/Split", AccessFlags::PUBLIC).method("one", "()V");
        builder.class("a/Split", AccessFlags::PUBLIC).method("two", "()V");
        let image = builder.build().unwrap();
        let split = image.class_by_name("a/Split").unwrap();
        assert_eq!(image.class(split).methods.len(), 2);
    }

    #[test]
    fn test_member_key_lookup() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Keys", AccessFlags::PUBLIC)
            .method("m", "()V")
            .method("m", "(I)V")
            .field("f", "I", AccessFlags::PRIVATE);
        let image = builder.build().unwrap();
        let keys = image.class_by_name("a/Keys").unwrap();

        let m0 = image.method_by_key(keys, "m", "()V").unwrap();
        let m1 = image.method_by_key(keys, "m", "(I)V").unwrap();
        assert_ne!(m0, m1);
        assert!(image.method_by_key(keys, "m", "(J)V").is_none());
        assert!(image.field_by_key(keys, "f", "I").is_some());
        assert!(image.field_by_key(keys, "f", "J").is_none());
    }

    #[test]
    fn test_method_descriptor_rendering() {
        let mut builder = ImageBuilder::new("test");
        builder
            .class("a/Sig", AccessFlags::PUBLIC)
            .method("m", "(ILjava/lang/String;[J)V");
        let image = builder.build().unwrap();
        let sig = image.class_by_name("a/Sig").unwrap();
        let m = image.class(sig).methods[0];
        assert_eq!(image.method(m).descriptor(&image), "(ILjava/lang/String;[J)V");
    }
}
