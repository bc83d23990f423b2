//! The class feature family.
//!
//! Class pairing leans on structure alone: what kind of class it is, where it
//! sits in the hierarchy, how many members it has, and how it is wired into
//! the reference graph. The heavyweight features are the type check (an enum
//! will never pair with an interface) and the greedy member-profile comparison
//! in [`SimilarMethods`].

use crate::{
    image::{AccessFlags, ClassId, Image, MethodId},
    matching::{
        compare::{
            compare_class_sets, compare_counts, compare_field_sets, compare_method_sets,
            flag_similarity, MatchContext, MatchEntity,
        },
        feature::{FeatureSet, MatchFeature},
        level::LevelMask,
    },
};

/// Registers the class feature family with its canonical weights.
pub(crate) fn register(set: &mut FeatureSet<ClassId>) {
    set.register(20, ClassTypeCheck);
    set.register(1, HierarchyDepth);
    set.register(4, ParentClass);
    set.register(3, ChildClasses);
    set.register(3, Interfaces);
    set.register(2, Implementers);
    set.register(3, MethodCount);
    set.register(3, FieldCount);
    set.register(2, HierarchySiblings);
    set.register(10, SimilarMethods);
    set.register(6, OutReferences);
    set.register(6, InReferences);
    set.register_at(6, LevelMask::SECONDARY_AND_UP, MethodOutReferences);
    set.register_at(6, LevelMask::SECONDARY_AND_UP, MethodInReferences);
    set.register_at(5, LevelMask::SECONDARY_AND_UP, FieldReadReferences);
    set.register_at(5, LevelMask::SECONDARY_AND_UP, FieldWriteReferences);
}

/// Hamming similarity over the enum/interface/annotation/abstract flag bits.
struct ClassTypeCheck;

impl MatchFeature<ClassId> for ClassTypeCheck {
    fn name(&self) -> &'static str {
        "class type check"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        flag_similarity(
            ctx.image_a.class(a).flags,
            ctx.image_b.class(b).flags,
            AccessFlags::CLASS_CHECK_MASK,
        )
    }
}

/// Similarity of superclass-chain lengths.
struct HierarchyDepth;

impl MatchFeature<ClassId> for HierarchyDepth {
    fn name(&self) -> &'static str {
        "hierarchy depth"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_counts(
            ctx.image_a.hierarchy_depth(a),
            ctx.image_b.hierarchy_depth(b),
        )
    }
}

/// Agreement of the direct superclasses.
struct ParentClass;

impl MatchFeature<ClassId> for ParentClass {
    fn name(&self) -> &'static str {
        "parent class"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        match (ctx.image_a.class(a).parent, ctx.image_b.class(b).parent) {
            (None, None) => 1.0,
            (Some(pa), Some(pb)) => {
                if ClassId::potentially_equal(ctx, pa, pb) {
                    1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }
}

/// Set similarity of the direct subclasses.
struct ChildClasses;

impl MatchFeature<ClassId> for ChildClasses {
    fn name(&self) -> &'static str {
        "child classes"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_class_sets(
            ctx,
            &ctx.image_a.class(a).children,
            &ctx.image_b.class(b).children,
        )
    }
}

/// Set similarity of the directly declared interfaces.
struct Interfaces;

impl MatchFeature<ClassId> for Interfaces {
    fn name(&self) -> &'static str {
        "interfaces"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_class_sets(
            ctx,
            &ctx.image_a.class(a).interfaces,
            &ctx.image_b.class(b).interfaces,
        )
    }
}

/// Set similarity of the classes that implement or extend this one.
struct Implementers;

impl MatchFeature<ClassId> for Implementers {
    fn name(&self) -> &'static str {
        "implementers"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_class_sets(
            ctx,
            &ctx.image_a.class(a).implementers,
            &ctx.image_b.class(b).implementers,
        )
    }
}

/// Similarity of method-count cardinalities.
struct MethodCount;

impl MatchFeature<ClassId> for MethodCount {
    fn name(&self) -> &'static str {
        "method count"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_counts(
            ctx.image_a.class(a).methods.len(),
            ctx.image_b.class(b).methods.len(),
        )
    }
}

/// Similarity of field-count cardinalities.
struct FieldCount;

impl MatchFeature<ClassId> for FieldCount {
    fn name(&self) -> &'static str {
        "field count"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_counts(
            ctx.image_a.class(a).fields.len(),
            ctx.image_b.class(b).fields.len(),
        )
    }
}

/// Similarity of sibling counts (the parents' child-set sizes).
struct HierarchySiblings;

impl MatchFeature<ClassId> for HierarchySiblings {
    fn name(&self) -> &'static str {
        "hierarchy siblings"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_counts(
            sibling_count(ctx.image_a, a),
            sibling_count(ctx.image_b, b),
        )
    }
}

fn sibling_count(image: &Image, id: ClassId) -> usize {
    image
        .class(id)
        .parent
        .map_or(0, |p| image.class(p).children.len())
}

/// Greedy best-pairing of the two method lists.
///
/// Walks A's methods in declaration order and claims, per method, the best
/// not-yet-claimed B method that passes the potential-equality gates
/// (including return type and per-position parameter types). A claimed pair
/// contributes its body-length similarity; placeholder methods pair only with
/// placeholders. The sum is normalized by the larger method count.
struct SimilarMethods;

impl MatchFeature<ClassId> for SimilarMethods {
    fn name(&self) -> &'static str {
        "similar methods"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        let methods_a = &ctx.image_a.class(a).methods;
        let methods_b = &ctx.image_b.class(b).methods;
        if methods_a.is_empty() && methods_b.is_empty() {
            return 1.0;
        }
        if methods_a.is_empty() || methods_b.is_empty() {
            return 0.0;
        }

        let mut claimed = vec![false; methods_b.len()];
        let mut total = 0.0;
        for &ma_id in methods_a {
            let ma = ctx.image_a.method(ma_id);
            let mut best: Option<usize> = None;
            let mut best_score = 0.0;
            for (i, &mb_id) in methods_b.iter().enumerate() {
                if claimed[i] {
                    continue;
                }
                if !MethodId::potentially_equal(ctx, ma_id, mb_id) {
                    continue;
                }
                let mb = ctx.image_b.method(mb_id);
                if !ClassId::potentially_equal(ctx, ma.return_type, mb.return_type) {
                    continue;
                }
                if ma.params.len() != mb.params.len() {
                    continue;
                }
                if !ma
                    .params
                    .iter()
                    .zip(&mb.params)
                    .all(|(&pa, &pb)| ClassId::potentially_equal(ctx, pa, pb))
                {
                    continue;
                }
                let score = if !ma.real || !mb.real {
                    if !ma.real && !mb.real {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    compare_counts(ma.insns.len(), mb.insns.len())
                };
                if score > best_score {
                    best_score = score;
                    best = Some(i);
                }
            }
            if let Some(i) = best {
                total += best_score;
                claimed[i] = true;
            }
        }
        total / methods_a.len().max(methods_b.len()) as f64
    }
}

/// Set similarity of the classes this class references.
struct OutReferences;

impl MatchFeature<ClassId> for OutReferences {
    fn name(&self) -> &'static str {
        "out references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_class_sets(
            ctx,
            ctx.image_a.out_class_refs(a),
            ctx.image_b.out_class_refs(b),
        )
    }
}

/// Set similarity of the classes that reference this class.
struct InReferences;

impl MatchFeature<ClassId> for InReferences {
    fn name(&self) -> &'static str {
        "in references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_class_sets(
            ctx,
            ctx.image_a.in_class_refs(a),
            ctx.image_b.in_class_refs(b),
        )
    }
}

/// Set similarity of the methods this class's methods call.
struct MethodOutReferences;

impl MatchFeature<ClassId> for MethodOutReferences {
    fn name(&self) -> &'static str {
        "method out references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_method_sets(
            ctx,
            ctx.image_a.out_method_refs(a),
            ctx.image_b.out_method_refs(b),
        )
    }
}

/// Set similarity of the methods that call into this class.
struct MethodInReferences;

impl MatchFeature<ClassId> for MethodInReferences {
    fn name(&self) -> &'static str {
        "method in references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_method_sets(
            ctx,
            ctx.image_a.in_method_refs(a),
            ctx.image_b.in_method_refs(b),
        )
    }
}

/// Set similarity of the fields this class's methods read.
struct FieldReadReferences;

impl MatchFeature<ClassId> for FieldReadReferences {
    fn name(&self) -> &'static str {
        "field read references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_field_sets(
            ctx,
            ctx.image_a.read_field_refs(a),
            ctx.image_b.read_field_refs(b),
        )
    }
}

/// Set similarity of the fields this class's methods write.
struct FieldWriteReferences;

impl MatchFeature<ClassId> for FieldWriteReferences {
    fn name(&self) -> &'static str {
        "field write references"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: ClassId, b: ClassId) -> f64 {
        compare_field_sets(
            ctx,
            ctx.image_a.write_field_refs(a),
            ctx.image_b.write_field_refs(b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Image, ImageBuilder, OpKind};
    use crate::matching::store::MatchStore;

    fn build(f: impl FnOnce(&mut ImageBuilder)) -> Image {
        let mut builder = ImageBuilder::new("test");
        f(&mut builder);
        builder.build().unwrap()
    }

    #[test]
    fn test_class_type_check_mask() {
        // interface vs abstract: 2 of 4 bits differ
        let a = build(|b| {
            b.class("x/A", AccessFlags::INTERFACE);
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::ABSTRACT);
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = ClassTypeCheck.score(
            &ctx,
            a.class_by_name("x/A").unwrap(),
            b.class_by_name("y/B").unwrap(),
        );
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parent_class_feature() {
        let a = build(|b| {
            b.class("x/Root", AccessFlags::PUBLIC);
            b.class("x/Leaf", AccessFlags::PUBLIC).parent("x/Root");
        });
        let b = build(|bl| {
            bl.class("y/Root", AccessFlags::PUBLIC);
            bl.class("y/Leaf", AccessFlags::PUBLIC).parent("y/Root");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);

        let leaf_a = a.class_by_name("x/Leaf").unwrap();
        let leaf_b = b.class_by_name("y/Leaf").unwrap();
        let root_a = a.class_by_name("x/Root").unwrap();
        let root_b = b.class_by_name("y/Root").unwrap();

        assert!((ParentClass.score(&ctx, leaf_a, leaf_b) - 1.0).abs() < f64::EPSILON);
        assert!((ParentClass.score(&ctx, root_a, root_b) - 1.0).abs() < f64::EPSILON);
        // one side parented, the other not
        assert!((ParentClass.score(&ctx, leaf_a, root_b) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similar_methods_identical_profiles() {
        let mk = |name: &'static str| {
            build(move |b| {
                b.class(name, AccessFlags::PUBLIC)
                    .method_with("m", "()V", |m| {
                        m.insns(&[OpKind::Load, OpKind::Return]);
                    })
                    .method_with("n", "(I)I", |m| {
                        m.insns(&[OpKind::Load, OpKind::Arith, OpKind::Return]);
                    });
            })
        };
        let a = mk("x/A");
        let b = mk("y/B");
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = SimilarMethods.score(
            &ctx,
            a.class_by_name("x/A").unwrap(),
            b.class_by_name("y/B").unwrap(),
        );
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similar_methods_empty_rules() {
        let a = build(|b| {
            b.class("x/Empty", AccessFlags::PUBLIC);
        });
        let b = build(|bl| {
            bl.class("y/Empty", AccessFlags::PUBLIC);
            bl.class("y/Full", AccessFlags::PUBLIC).method("m", "()V");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);

        let empty_a = a.class_by_name("x/Empty").unwrap();
        let empty_b = b.class_by_name("y/Empty").unwrap();
        let full_b = b.class_by_name("y/Full").unwrap();
        assert!((SimilarMethods.score(&ctx, empty_a, empty_b) - 1.0).abs() < f64::EPSILON);
        assert!((SimilarMethods.score(&ctx, empty_a, full_b) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similar_methods_arity_gate() {
        let a = build(|b| {
            b.class("x/A", AccessFlags::PUBLIC).method("m", "(II)V");
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::PUBLIC).method("m", "(I)V");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = SimilarMethods.score(
            &ctx,
            a.class_by_name("x/A").unwrap(),
            b.class_by_name("y/B").unwrap(),
        );
        assert!((score - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similar_methods_body_length_ratio() {
        let a = build(|b| {
            b.class("x/A", AccessFlags::PUBLIC)
                .method_with("m", "()V", |m| {
                    m.insns(&[OpKind::Load, OpKind::Load, OpKind::Return]);
                });
        });
        let b = build(|bl| {
            bl.class("y/B", AccessFlags::PUBLIC)
                .method_with("m", "()V", |m| {
                    m.insns(&[
                        OpKind::Load,
                        OpKind::Load,
                        OpKind::Invoke,
                        OpKind::Return,
                    ]);
                });
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = SimilarMethods.score(
            &ctx,
            a.class_by_name("x/A").unwrap(),
            b.class_by_name("y/B").unwrap(),
        );
        // one method pair with body-length similarity 3/4
        assert!((score - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hierarchy_sibling_counts() {
        let a = build(|b| {
            b.class("x/P", AccessFlags::PUBLIC);
            b.class("x/C1", AccessFlags::PUBLIC).parent("x/P");
            b.class("x/C2", AccessFlags::PUBLIC).parent("x/P");
        });
        let b = build(|bl| {
            bl.class("y/P", AccessFlags::PUBLIC);
            bl.class("y/C1", AccessFlags::PUBLIC).parent("y/P");
        });
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let score = HierarchySiblings.score(
            &ctx,
            a.class_by_name("x/C1").unwrap(),
            b.class_by_name("y/C1").unwrap(),
        );
        assert!((score - 0.5).abs() < f64::EPSILON);
    }
}
