//! The field feature family.
//!
//! Fields expose the least structure of the three kinds, so the family is
//! small: declared type, flags, and the reader/writer neighborhoods.

use crate::{
    image::{AccessFlags, ClassId, FieldId},
    matching::{
        compare::{compare_method_sets, flag_similarity, MatchContext, MatchEntity},
        feature::{FeatureSet, MatchFeature},
    },
};

/// Registers the field feature family with its canonical weights.
pub(crate) fn register(set: &mut FeatureSet<FieldId>) {
    set.register(10, OwnerGate);
    set.register(8, ValueType);
    set.register(3, FlagCheck);
    set.register(6, ReaderSet);
    set.register(6, WriterSet);
}

/// Hard gate on the owning classes being potentially equal.
struct OwnerGate;

impl MatchFeature<FieldId> for OwnerGate {
    fn name(&self) -> &'static str {
        "owner"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
        let owners_equal = ClassId::potentially_equal(
            ctx,
            ctx.image_a.field(a).owner,
            ctx.image_b.field(b).owner,
        );
        if owners_equal {
            1.0
        } else {
            0.0
        }
    }
}

/// Agreement of the declared types.
struct ValueType;

impl MatchFeature<FieldId> for ValueType {
    fn name(&self) -> &'static str {
        "value type"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
        let equal = ClassId::potentially_equal(
            ctx,
            ctx.image_a.field(a).ty,
            ctx.image_b.field(b).ty,
        );
        if equal {
            1.0
        } else {
            0.0
        }
    }
}

/// Hamming similarity over the field flag bits.
struct FlagCheck;

impl MatchFeature<FieldId> for FlagCheck {
    fn name(&self) -> &'static str {
        "access flags"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
        flag_similarity(
            ctx.image_a.field(a).flags,
            ctx.image_b.field(b).flags,
            AccessFlags::FIELD_CHECK_MASK,
        )
    }
}

/// Set similarity of the methods that read this field.
struct ReaderSet;

impl MatchFeature<FieldId> for ReaderSet {
    fn name(&self) -> &'static str {
        "readers"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
        compare_method_sets(
            ctx,
            &ctx.image_a.field(a).readers,
            &ctx.image_b.field(b).readers,
        )
    }
}

/// Set similarity of the methods that write this field.
struct WriterSet;

impl MatchFeature<FieldId> for WriterSet {
    fn name(&self) -> &'static str {
        "writers"
    }

    fn score(&self, ctx: &MatchContext<'_>, a: FieldId, b: FieldId) -> f64 {
        compare_method_sets(
            ctx,
            &ctx.image_a.field(a).writers,
            &ctx.image_b.field(b).writers,
        )
    }
}
