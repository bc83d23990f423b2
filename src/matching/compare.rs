//! Primitive similarity operators.
//!
//! Everything here is a pure function of the two images and the current match
//! store. The operators return values in `[0, 1]` and are the vocabulary all
//! feature functions are written in: count similarity, the permissive
//! "potentially equal" gate, and greedy set similarity.
//!
//! The [`MatchEntity`] trait unifies the three identifier kinds so set
//! comparison and the classifier framework can be written once. It is
//! implemented for [`ClassId`], [`MethodId`] and [`FieldId`] only; the trait is
//! not meant to be implemented outside this crate.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use crate::{
    image::{AccessFlags, ClassId, EntityKind, FieldId, Image, MethodId},
    matching::store::{MatchMap, MatchStore},
};

/// Shared read-only view of a matching run: both images and the store.
///
/// Cheap to copy; one is materialized per scoring call site. The two image
/// references may point at the same image (that is how an image is matched
/// against itself); [`same_image`](Self::same_image) detects it by pointer
/// identity.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    /// The named image (side A)
    pub image_a: &'a Image,
    /// The unnamed image (side B)
    pub image_b: &'a Image,
    /// Matches committed so far
    pub store: &'a MatchStore,
}

impl<'a> MatchContext<'a> {
    /// Creates a context over an image pair and a store.
    #[must_use]
    pub fn new(image_a: &'a Image, image_b: &'a Image, store: &'a MatchStore) -> Self {
        Self {
            image_a,
            image_b,
            store,
        }
    }

    /// Returns `true` if both sides are the same image object.
    #[must_use]
    pub fn same_image(&self) -> bool {
        std::ptr::eq(self.image_a, self.image_b)
    }
}

/// Capability set of a matchable entity kind.
///
/// An implementation ties an identifier type to its arena, its projection of
/// the match store, and its kind-specific shape compatibility. The framework
/// and the set operators below are generic over this trait.
pub trait MatchEntity:
    Copy + Eq + Ord + Hash + Send + Sync + fmt::Debug + fmt::Display + Into<usize>
{
    /// The entity kind this identifier addresses.
    const KIND: EntityKind;

    /// Rebuilds an identifier from a raw arena index.
    fn from_index(index: usize) -> Self;

    /// Size of this kind's arena in `image`.
    fn arena_len(image: &Image) -> usize;

    /// Whether the entity is declared in the image (not a placeholder).
    fn is_real(self, image: &Image) -> bool;

    /// Qualified display name for diagnostics.
    fn display(self, image: &Image) -> String;

    /// This kind's bijection within the store.
    fn map(store: &MatchStore) -> &MatchMap<Self>;

    /// Mutable access to this kind's bijection.
    fn map_mut(store: &mut MatchStore) -> &mut MatchMap<Self>;

    /// Whether two entities could be the same declaration judging only by
    /// shape, ignoring match state.
    fn shape_compatible(ctx: &MatchContext<'_>, a: Self, b: Self) -> bool;

    /// Stable name-based ordering of two same-side entities, for reproducible
    /// tie-breaks.
    fn cmp_by_name(image: &Image, x: Self, y: Self) -> Ordering;

    /// The fast gate run before any expensive scoring: `true` when the pair is
    /// the same object, already matched to each other, or both unmatched with
    /// compatible shapes.
    ///
    /// The gate must stay permissive: a false positive only wastes scoring
    /// work, while a false negative silently precludes a real match.
    fn potentially_equal(ctx: &MatchContext<'_>, a: Self, b: Self) -> bool {
        if ctx.same_image() && a == b {
            return true;
        }
        let map = Self::map(ctx.store);
        if let Some(partner) = map.partner_of_a(a) {
            return partner == b;
        }
        if map.partner_of_b(b).is_some() {
            return false;
        }
        Self::shape_compatible(ctx, a, b)
    }
}

impl MatchEntity for ClassId {
    const KIND: EntityKind = EntityKind::Class;

    fn from_index(index: usize) -> Self {
        ClassId::new(index)
    }

    fn arena_len(image: &Image) -> usize {
        image.class_count()
    }

    fn is_real(self, image: &Image) -> bool {
        image.class(self).real
    }

    fn display(self, image: &Image) -> String {
        image.class(self).name.clone()
    }

    fn map(store: &MatchStore) -> &MatchMap<Self> {
        &store.classes
    }

    fn map_mut(store: &mut MatchStore) -> &mut MatchMap<Self> {
        &mut store.classes
    }

    fn shape_compatible(ctx: &MatchContext<'_>, a: Self, b: Self) -> bool {
        let ca = ctx.image_a.class(a);
        let cb = ctx.image_b.class(b);
        ca.flags.class_kind() == cb.flags.class_kind() || (!ca.real && !cb.real)
    }

    fn cmp_by_name(image: &Image, x: Self, y: Self) -> Ordering {
        image.class(x).name.cmp(&image.class(y).name)
    }
}

impl MatchEntity for MethodId {
    const KIND: EntityKind = EntityKind::Method;

    fn from_index(index: usize) -> Self {
        MethodId::new(index)
    }

    fn arena_len(image: &Image) -> usize {
        image.method_count()
    }

    fn is_real(self, image: &Image) -> bool {
        image.method(self).real
    }

    fn display(self, image: &Image) -> String {
        image.method_display(self)
    }

    fn map(store: &MatchStore) -> &MatchMap<Self> {
        &store.methods
    }

    fn map_mut(store: &mut MatchStore) -> &mut MatchMap<Self> {
        &mut store.methods
    }

    fn shape_compatible(ctx: &MatchContext<'_>, a: Self, b: Self) -> bool {
        let ma = ctx.image_a.method(a);
        let mb = ctx.image_b.method(b);
        ClassId::potentially_equal(ctx, ma.owner, mb.owner)
            && ClassId::potentially_equal(ctx, ma.return_type, mb.return_type)
            && ma.params.len() == mb.params.len()
            && ma
                .params
                .iter()
                .zip(&mb.params)
                .all(|(&pa, &pb)| ClassId::potentially_equal(ctx, pa, pb))
    }

    fn cmp_by_name(image: &Image, x: Self, y: Self) -> Ordering {
        let (mx, my) = (image.method(x), image.method(y));
        let owner_x = &image.class(mx.owner).name;
        let owner_y = &image.class(my.owner).name;
        owner_x
            .cmp(owner_y)
            .then_with(|| mx.name.cmp(&my.name))
            .then_with(|| x.cmp(&y))
    }
}

impl MatchEntity for FieldId {
    const KIND: EntityKind = EntityKind::Field;

    fn from_index(index: usize) -> Self {
        FieldId::new(index)
    }

    fn arena_len(image: &Image) -> usize {
        image.field_count()
    }

    fn is_real(self, image: &Image) -> bool {
        image.field(self).real
    }

    fn display(self, image: &Image) -> String {
        image.field_display(self)
    }

    fn map(store: &MatchStore) -> &MatchMap<Self> {
        &store.fields
    }

    fn map_mut(store: &mut MatchStore) -> &mut MatchMap<Self> {
        &mut store.fields
    }

    fn shape_compatible(ctx: &MatchContext<'_>, a: Self, b: Self) -> bool {
        let fa = ctx.image_a.field(a);
        let fb = ctx.image_b.field(b);
        ClassId::potentially_equal(ctx, fa.owner, fb.owner)
            && ClassId::potentially_equal(ctx, fa.ty, fb.ty)
    }

    fn cmp_by_name(image: &Image, x: Self, y: Self) -> Ordering {
        let (fx, fy) = (image.field(x), image.field(y));
        let owner_x = &image.class(fx.owner).name;
        let owner_y = &image.class(fy.owner).name;
        owner_x
            .cmp(owner_y)
            .then_with(|| fx.name.cmp(&fy.name))
            .then_with(|| x.cmp(&y))
    }
}

/// Similarity of two cardinalities: `1 − |x−y| / max(x, y)`, and 1 when both
/// are zero.
#[must_use]
pub fn compare_counts(x: usize, y: usize) -> f64 {
    let max = x.max(y);
    if max == 0 {
        1.0
    } else {
        1.0 - (x.abs_diff(y) as f64) / (max as f64)
    }
}

/// Similarity of two flag words restricted to `mask`: one minus the normalized
/// Hamming distance over the mask's bits.
#[must_use]
pub(crate) fn flag_similarity(a: AccessFlags, b: AccessFlags, mask: AccessFlags) -> f64 {
    let bits = mask.bits().count_ones();
    let diff = ((a ^ b) & mask).bits().count_ones();
    1.0 - f64::from(diff) / f64::from(bits)
}

/// Greedy set similarity in `[0, 1]`.
///
/// Iterates the smaller side and claims, per element, the best unclaimed
/// partner on the larger side: a partner it is already matched to (or is, for
/// a self-comparison, the same object as) scores 1, a merely potentially-equal
/// partner scores 0.5. The sum is normalized by the larger cardinality. Two
/// empty sets are fully similar; exactly one empty set is fully dissimilar.
#[must_use]
pub fn compare_entity_sets<I: MatchEntity>(ctx: &MatchContext<'_>, sa: &[I], sb: &[I]) -> f64 {
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }

    let max = sa.len().max(sb.len());
    let mut total = 0.0;
    if sa.len() <= sb.len() {
        let mut claimed = vec![false; sb.len()];
        for &probe in sa {
            total += claim_best(ctx, probe, sb, &mut claimed, true);
        }
    } else {
        let mut claimed = vec![false; sa.len()];
        for &probe in sb {
            total += claim_best(ctx, probe, sa, &mut claimed, false);
        }
    }
    total / max as f64
}

/// Claims the best unclaimed partner of `probe` in `pool` and returns its
/// weight, or 0 if nothing in the pool is even potentially equal.
fn claim_best<I: MatchEntity>(
    ctx: &MatchContext<'_>,
    probe: I,
    pool: &[I],
    claimed: &mut [bool],
    probe_is_a: bool,
) -> f64 {
    let map = I::map(ctx.store);
    let mut best: Option<(usize, f64)> = None;
    for (i, &cand) in pool.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        let (a, b) = if probe_is_a { (probe, cand) } else { (cand, probe) };
        let weight = if (ctx.same_image() && a == b) || map.partner_of_a(a) == Some(b) {
            1.0
        } else if I::potentially_equal(ctx, a, b) {
            0.5
        } else {
            continue;
        };
        if best.map_or(true, |(_, w)| weight > w) {
            best = Some((i, weight));
            if weight == 1.0 {
                break;
            }
        }
    }
    match best {
        Some((i, weight)) => {
            claimed[i] = true;
            weight
        }
        None => 0.0,
    }
}

/// [`compare_entity_sets`] specialized to classes.
#[must_use]
pub fn compare_class_sets(ctx: &MatchContext<'_>, sa: &[ClassId], sb: &[ClassId]) -> f64 {
    compare_entity_sets(ctx, sa, sb)
}

/// [`compare_entity_sets`] specialized to methods.
#[must_use]
pub fn compare_method_sets(ctx: &MatchContext<'_>, sa: &[MethodId], sb: &[MethodId]) -> f64 {
    compare_entity_sets(ctx, sa, sb)
}

/// [`compare_entity_sets`] specialized to fields.
#[must_use]
pub fn compare_field_sets(ctx: &MatchContext<'_>, sa: &[FieldId], sb: &[FieldId]) -> f64 {
    compare_entity_sets(ctx, sa, sb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageBuilder;
    use crate::matching::MatchLevel;
    use crate::matching::store::MatchInfo;

    fn two_images() -> (Image, Image) {
        let mut a = ImageBuilder::new("a");
        a.class("x/One", AccessFlags::PUBLIC);
        a.class("x/Two", AccessFlags::PUBLIC | AccessFlags::INTERFACE);
        let mut b = ImageBuilder::new("b");
        b.class("y/Uno", AccessFlags::PUBLIC);
        b.class("y/Dos", AccessFlags::PUBLIC | AccessFlags::INTERFACE);
        (a.build().unwrap(), b.build().unwrap())
    }

    #[test]
    fn test_compare_counts_boundaries() {
        assert!((compare_counts(3, 4) - 0.75).abs() < f64::EPSILON);
        assert!((compare_counts(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((compare_counts(0, 5) - 0.0).abs() < f64::EPSILON);
        assert!((compare_counts(5, 0) - 0.0).abs() < f64::EPSILON);
        assert!((compare_counts(7, 7) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_flag_similarity() {
        // INTERFACE vs ABSTRACT differ in 2 of the 4 class-check bits
        let sim = flag_similarity(
            AccessFlags::INTERFACE,
            AccessFlags::ABSTRACT,
            AccessFlags::CLASS_CHECK_MASK,
        );
        assert!((sim - 0.5).abs() < f64::EPSILON);

        let sim = flag_similarity(
            AccessFlags::PUBLIC,
            AccessFlags::PUBLIC,
            AccessFlags::METHOD_CHECK_MASK,
        );
        assert!((sim - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_potentially_equal_unmatched_shapes() {
        let (a, b) = two_images();
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);

        let one = a.class_by_name("x/One").unwrap();
        let uno = b.class_by_name("y/Uno").unwrap();
        let two = a.class_by_name("x/Two").unwrap();
        let dos = b.class_by_name("y/Dos").unwrap();

        assert!(ClassId::potentially_equal(&ctx, one, uno));
        assert!(ClassId::potentially_equal(&ctx, two, dos));
        // plain class vs interface
        assert!(!ClassId::potentially_equal(&ctx, one, dos));
    }

    #[test]
    fn test_potentially_equal_respects_matches() {
        let (a, b) = two_images();
        let mut store = MatchStore::for_images(&a, &b);

        let one = a.class_by_name("x/One").unwrap();
        let two = a.class_by_name("x/Two").unwrap();
        let uno = b.class_by_name("y/Uno").unwrap();
        let dos = b.class_by_name("y/Dos").unwrap();
        store.classes.commit(
            one,
            uno,
            MatchInfo {
                score: 1.0,
                level: MatchLevel::Initial,
            },
        );

        let ctx = MatchContext::new(&a, &b, &store);
        assert!(ClassId::potentially_equal(&ctx, one, uno));
        // a matched entity is only potentially equal to its partner
        assert!(!ClassId::potentially_equal(&ctx, one, dos));
        assert!(!ClassId::potentially_equal(&ctx, two, uno));
    }

    #[test]
    fn test_potentially_equal_same_image() {
        let (a, _) = two_images();
        let store = MatchStore::for_images(&a, &a);
        let ctx = MatchContext::new(&a, &a, &store);
        let one = a.class_by_name("x/One").unwrap();
        assert!(ctx.same_image());
        assert!(ClassId::potentially_equal(&ctx, one, one));
    }

    #[test]
    fn test_compare_sets_empty_rules() {
        let (a, b) = two_images();
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let one = a.class_by_name("x/One").unwrap();

        let empty: Vec<ClassId> = Vec::new();
        assert!((compare_class_sets(&ctx, &empty, &empty) - 1.0).abs() < f64::EPSILON);
        assert!((compare_class_sets(&ctx, &[one], &empty) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_sets_weights() {
        let (a, b) = two_images();
        let mut store = MatchStore::for_images(&a, &b);
        let one = a.class_by_name("x/One").unwrap();
        let uno = b.class_by_name("y/Uno").unwrap();
        let two = a.class_by_name("x/Two").unwrap();
        let dos = b.class_by_name("y/Dos").unwrap();

        // unmatched but shape-compatible pairs score 0.5 each
        let ctx = MatchContext::new(&a, &b, &store);
        let sim = compare_class_sets(&ctx, &[one, two], &[uno, dos]);
        assert!((sim - 0.5).abs() < f64::EPSILON);

        // a committed pair upgrades to 1.0
        store.classes.commit(
            one,
            uno,
            MatchInfo {
                score: 1.0,
                level: MatchLevel::Initial,
            },
        );
        let ctx = MatchContext::new(&a, &b, &store);
        let sim = compare_class_sets(&ctx, &[one, two], &[uno, dos]);
        assert!((sim - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_sets_unbalanced() {
        let (a, b) = two_images();
        let store = MatchStore::for_images(&a, &b);
        let ctx = MatchContext::new(&a, &b, &store);
        let one = a.class_by_name("x/One").unwrap();
        let uno = b.class_by_name("y/Uno").unwrap();
        let dos = b.class_by_name("y/Dos").unwrap();

        // one A element, two B candidates: only one can be claimed
        let sim = compare_class_sets(&ctx, &[one], &[uno, dos]);
        assert!((sim - 0.25).abs() < f64::EPSILON);
    }
}
