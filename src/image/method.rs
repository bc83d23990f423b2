//! Method records, their body summaries and reference edges.

use crate::image::{AccessFlags, ClassId, FieldId, Image, MethodId};

/// Coarse instruction categories.
///
/// The matching engine never interprets bytecode; it only compares body lengths
/// and, at the richer levels, the category sequence of two bodies. The assembler
/// maps each concrete opcode onto one of these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// Constant push
    Const,
    /// Local or argument load
    Load,
    /// Local or argument store
    Store,
    /// Array element load
    ArrayLoad,
    /// Array element store
    ArrayStore,
    /// Pure stack manipulation (dup, pop, swap)
    Stack,
    /// Arithmetic
    Arith,
    /// Bitwise or logical operation
    Logic,
    /// Numeric conversion
    Convert,
    /// Comparison producing a value
    Compare,
    /// Conditional branch
    Branch,
    /// Table or lookup switch
    Switch,
    /// Return from method
    Return,
    /// Field read
    FieldGet,
    /// Field write
    FieldPut,
    /// Method invocation
    Invoke,
    /// Object or array allocation
    New,
    /// Throw
    Throw,
    /// Monitor enter/exit
    Monitor,
    /// Anything else
    Other,
}

/// A method in a program image.
///
/// A method with `real == false` has no body in its declaring class. It stands
/// in for an inherited or external method that the image references, so call
/// edges always have both endpoints.
#[derive(Debug)]
pub struct MethodDef {
    /// Identifier of this method in its image
    pub id: MethodId,
    /// The declaring class
    pub owner: ClassId,
    /// Simple name
    pub name: String,
    /// Return type
    pub return_type: ClassId,
    /// Parameter types, in order
    pub params: Vec<ClassId>,
    /// Access and property flags
    pub flags: AccessFlags,
    /// Whether this method has a body in its declaring class
    pub real: bool,
    /// Instruction category sequence of the body (empty for non-real methods)
    pub insns: Vec<OpKind>,
    /// Methods invoked from this method's body
    pub refs_out: Vec<MethodId>,
    /// Methods whose bodies invoke this method
    pub refs_in: Vec<MethodId>,
    /// Fields read by this method's body
    pub field_reads: Vec<FieldId>,
    /// Fields written by this method's body
    pub field_writes: Vec<FieldId>,
    /// Classes mentioned in this method's body
    pub class_refs: Vec<ClassId>,
}

impl MethodDef {
    pub(crate) fn new(
        id: MethodId,
        owner: ClassId,
        name: String,
        return_type: ClassId,
        params: Vec<ClassId>,
        flags: AccessFlags,
        real: bool,
    ) -> Self {
        Self {
            id,
            owner,
            name,
            return_type,
            params,
            flags,
            real,
            insns: Vec::new(),
            refs_out: Vec::new(),
            refs_in: Vec::new(),
            field_reads: Vec::new(),
            field_writes: Vec::new(),
            class_refs: Vec::new(),
        }
    }

    /// Renders the method descriptor, e.g. `(ILjava/lang/String;)V`.
    #[must_use]
    pub fn descriptor(&self, image: &Image) -> String {
        let mut out = String::from("(");
        for &p in &self.params {
            out.push_str(&type_descriptor(&image.class(p).name));
        }
        out.push(')');
        out.push_str(&type_descriptor(&image.class(self.return_type).name));
        out
    }
}

/// Renders the descriptor form of a type name.
///
/// Primitive and array names already are their own descriptor; object names
/// gain the `L...;` wrapping.
#[must_use]
pub(crate) fn type_descriptor(name: &str) -> String {
    let is_primitive = name.len() == 1 && "VZBCSIJFD".contains(name);
    if is_primitive || name.starts_with('[') {
        name.to_string()
    } else {
        format!("L{name};")
    }
}
