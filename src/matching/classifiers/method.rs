//! The method feature family.
//!
//! Method candidates are already restricted to members of a matched class
//! pair, so the features here discriminate within one class: signature
//! agreement, flag agreement, the caller/callee neighborhoods, the fields the
//! body touches, and, at the richer levels, a coarse body-shape comparison
//! via the longest common subsequence of instruction categories.

use crate::{
    image::{AccessFlags, ClassId, MethodId, OpKind},
    matching::{
        compare::{
            compare_counts, compare_field_sets, compare_method_sets, flag_similarity,
            MatchContext, MatchEntity,
        },
        feature::{FeatureSet, MatchFeature},
        level::LevelMask,
    },
};

/// Registers the method feature family with its canonical weights.
pub(crate) fn register(set: &mut FeatureSet<MethodId>) {
    set.register(10, OwnerGate);
    set.register(5, ReturnType);
    set.register(5, ParameterTypes);
    set.register(3, FlagCheck);
    set.register(6, CalleeSet);
    set.register(6, CallerSet);
    set.register(5, FieldReadSet);
    set.register(5, FieldWriteSet);
    set.register(3, InsnCount);
    set.register_at(8, LevelMask::SECONDARY_AND_UP, OpcodeSequence);
}

/// Hard gate on the owning classes being potentially equal.
struct OwnerGate;

impl MatchFeature<MethodId> for OwnerGate {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        let owners_equal = ClassId::potentially_equal(
            ctx,
            ctx.image_a.method(a).owner,
            ctx.image_b.method(b).owner,
        );
        if owners_equal {
            1.0
        } else {
            0.0
        }
    }
}

/// Agreement of the return types.
struct ReturnType;

impl MatchFeature<MethodId> for ReturnType {
    fn name(&self) -> &'static str {
        "return type"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        let equal = ClassId::potentially_equal(
            ctx,
            ctx.image_a.method(a).return_type,
            ctx.image_b.method(b).return_type,
        );
        if equal {
            1.0
        } else {
            0.0
        }
    }
}

/// Per-position agreement of the parameter types, normalized by the larger
/// arity.
struct ParameterTypes;

impl MatchFeature<MethodId> for ParameterTypes {
    fn name(&self) -> &'static str {
        "parameter types"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        let pa = &ctx.image_a.method(a).params;
        let pb = &ctx.image_b.method(b).params;
        if pa.is_empty() && pb.is_empty() {
            return 1.0;
        }
        let matched = pa
            .iter()
            .zip(pb)
            .filter(|&(&x, &y)| ClassId::potentially_equal(ctx, x, y))
            .count();
        matched as f64 / pa.len().max(pb.len()) as f64
    }
}

/// Hamming similarity over the method flag bits.
struct FlagCheck;

impl MatchFeature<MethodId> for FlagCheck {
    fn name(&self) -> &'static str {
        "access flags"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        flag_similarity(
            ctx.image_a.method(a).flags,
            ctx.image_b.method(b).flags,
            AccessFlags::METHOD_CHECK_MASK,
        )
    }
}

/// Set similarity of the methods this method calls.
struct CalleeSet;

impl MatchFeature<MethodId> for CalleeSet {
    fn name(&self) -> &'static str {
        "out references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        compare_method_sets(
            ctx,
            &ctx.image_a.method(a).refs_out,
            &ctx.image_b.method(b).refs_out,
        )
    }
}

/// Set similarity of the methods that call this method.
struct CallerSet;

impl MatchFeature<MethodId> for CallerSet {
    fn name(&self) -> &'static str {
        "in references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        compare_method_sets(
            ctx,
            &ctx.image_a.method(a).refs_in,
            &ctx.image_b.method(b).refs_in,
        )
    }
}

/// Set similarity of the fields this method reads.
struct FieldReadSet;

impl MatchFeature<MethodId> for FieldReadSet {
    fn name(&self) -> &'static str {
        "field reads"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        compare_field_sets(
            ctx,
            &ctx.image_a.method(a).field_reads,
            &ctx.image_b.method(b).field_reads,
        )
    }
}

/// Set similarity of the fields this method writes.
struct FieldWriteSet;

impl MatchFeature<MethodId> for FieldWriteSet {
    fn name(&self) -> &'static str {
        "field writes"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        compare_field_sets(
            ctx,
            &ctx.image_a.method(a).field_writes,
            &ctx.image_b.method(b).field_writes,
        )
    }
}

/// Similarity of body lengths.
struct InsnCount;

impl MatchFeature<MethodId> for InsnCount {
    fn name(&self) -> &'static str {
        "instruction count"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        compare_counts(
            ctx.image_a.method(a).insns.len(),
            ctx.image_b.method(b).insns.len(),
        )
    }
}

/// Rudimentary body-shape similarity: the longest common subsequence of the
/// instruction category sequences, normalized by the longer body.
struct OpcodeSequence;

impl MatchFeature<MethodId> for OpcodeSequence {
    fn name(&self) -> &'static str {
        "opcode sequence"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: MethodId, b: MethodId) -> f64 {
        let ia = &ctx.image_a.method(a).insns;
        let ib = &ctx.image_b.method(b).insns;
        if ia.is_empty() && ib.is_empty() {
            return 1.0;
        }
        if ia.is_empty() || ib.is_empty() {
            return 0.0;
        }
        lcs_length(ia, ib) as f64 / ia.len().max(ib.len()) as f64
    }
}

/// Longest-common-subsequence length, two-row dynamic programming.
fn lcs_length(a: &[OpKind], b: &[OpKind]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; short.len() + 1];
    let mut cur = vec![0usize; short.len() + 1];
    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Image, ImageBuilder};
    use crate::matching::store::MatchStore;

    fn build(f: impl FnOnce(&mut ImageBuilder)) -> Image {
        let mut builder = ImageBuilder::new("test");
        f(&mut builder);
        builder.build().unwrap()
    }

    fn sole_method(image: &Image, class: &str) -> MethodId {
        image.class(image.class_by_name(class).unwrap()).methods[0]
    }

    #[test]
    fn test_lcs_length() {
        use OpKind::{Arith, Invoke, Load, Return, Store};
        assert_eq!(lcs_length(&[Load, Arith, Return], &[Load, Arith, Return]), 3);
        assert_eq!(lcs_length(&[Load, Arith, Return], &[Load, Store, Arith, Return]), 3);
        assert_eq!(lcs_length(&[Load, Return], &[Invoke, Arith]), 0);
        assert_eq!(lcs_length(&[], &[Load]), 0);
    }

    #[test]
    fn test_opcode_sequence_feature() {
        let a = build(|b| {
            b.class("x/A", AccessFlags::PUBLIC)
                .method_with("m", "()V", |m| {
                    m.insns(&[OpKind::Load, OpKind::Arith, OpKind::Return]);
                });
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::PUBLIC)
                .method_with("m", "()V", |m| {
                    m.insns(&[OpKind::Load, OpKind::Store, OpKind::Arith, OpKind::Return]);
                });
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = OpcodeSequence.score(&ctx, sole_method(&a, "x/A"), sole_method(&b, "y/B"));
        assert!((score - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parameter_types_partial_match() {
        let a = build(|b| {
            b.class("x/Marker", AccessFlags::INTERFACE);
            b.class("x/A", AccessFlags::PUBLIC).method("m", "(ILx/Marker;)V");
        });
        let b = build(|bl| {
            bl.class("y/Plain", AccessFlags::PUBLIC);
            bl.class("y/B", AccessFlags::PUBLIC).method("m", "(ILy/Plain;)V");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = ParameterTypes.score(&ctx, sole_method(&a, "x/A"), sole_method(&b, "y/B"));
        // first position agrees (I/I); an interface cannot pair with a plain class
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_return_type_feature() {
        let a = build(|b| {
            b.class("x/A", AccessFlags::PUBLIC).method("m", "()I");
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::PUBLIC).method("m", "()I");
            bl.class("y/C", AccessFlags::PUBLIC).method("m", "()J");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let ma = sole_method(&a, "x/A");
        assert!((ReturnType.score(&ctx, ma, sole_method(&b, "y/B")) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flag_check() {
        let a = build(|b| {
            b.class("x/A", AccessFlags::PUBLIC).method_with("m", "()V", |m| {
                m.flags(AccessFlags::PUBLIC | AccessFlags::STATIC);
            });
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::PUBLIC).method_with("m", "()V", |m| {
                m.flags(AccessFlags::PUBLIC);
            });
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = FlagCheck.score(&ctx, sole_method(&a, "x/A"), sole_method(&b, "y/B"));
        // one differing bit out of eight
        assert!((score - 0.875).abs() < f64::EPSILON);
    }
}
