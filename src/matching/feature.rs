//! The classifier framework: weighted feature registration and ranking.
//!
//! A feature is one similarity function over a candidate pair, with a symbolic
//! name, a positive weight, and the set of levels it participates in. A
//! [`FeatureSet`] aggregates its registered features into a weighted mean and
//! ranks candidate lists deterministically.
//!
//! Feature outputs are contracted to `[0, 1]`. The framework verifies this on
//! every invocation and aborts the run on violation: an out-of-range score is
//! a bug in the feature, and letting it skew the mean would silently corrupt
//! match decisions.

use std::cmp::Ordering;

use crate::{
    matching::{
        compare::{MatchContext, MatchEntity},
        level::{LevelMask, MatchLevel},
    },
    Error, Result,
};

/// One weighted similarity function over candidate pairs.
///
/// Implementations are stateless; everything they need is reachable through
/// the [`MatchContext`]. All features must be thread-safe so ranking can fan
/// out over a worker pool.
pub trait MatchFeature<I>: Send + Sync {
    /// Symbolic name, used in diagnostics and tests.
    fn name(&self) -> &'static str;

    /// Scores a candidate pair. Must return a value in `[0, 1]`.
    fn score(&self, ctx: &MatchContext<'_>, a: I, b: I) -> f64;
}

/// A feature with its registration metadata.
struct RegisteredFeature<I> {
    feature: Box<dyn MatchFeature<I>>,
    weight: u32,
    levels: LevelMask,
}

/// A scored candidate, produced by [`FeatureSet::rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<I> {
    /// The candidate entity on the B side
    pub id: I,
    /// Aggregated weighted-mean score in `[0, 1]`
    pub score: f64,
}

/// The ordered feature registry for one entity kind.
pub struct FeatureSet<I> {
    features: Vec<RegisteredFeature<I>>,
}

impl<I: MatchEntity> FeatureSet<I> {
    /// Creates an empty feature set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
        }
    }

    /// Registers a feature active at every level.
    pub fn register(&mut self, weight: u32, feature: impl MatchFeature<I> + 'static) {
        self.register_at(weight, LevelMask::ALL, feature);
    }

    /// Registers a feature active at the given levels only.
    pub fn register_at(
        &mut self,
        weight: u32,
        levels: LevelMask,
        feature: impl MatchFeature<I> + 'static,
    ) {
        debug_assert!(weight > 0, "feature weight must be positive");
        self.features.push(RegisteredFeature {
            feature: Box::new(feature),
            weight,
            levels,
        });
    }

    /// Number of registered features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if no features are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Scores one pair: the weighted mean of all features active at `level`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureOutOfRange`] if any feature produces a value
    /// outside `[0, 1]`.
    pub fn score_pair(
        &self,
        ctx: &MatchContext<'_>,
        a: I,
        b: I,
        level: MatchLevel,
    ) -> Result<f64> {
        let mut total = 0.0;
        let mut weight_sum = 0u32;
        for entry in &self.features {
            if !entry.levels.contains(level) {
                continue;
            }
            let value = entry.feature.score(ctx, a, b);
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::FeatureOutOfRange {
                    feature: entry.feature.name(),
                    level,
                    a: a.display(ctx.image_a),
                    b: b.display(ctx.image_b),
                    value,
                });
            }
            total += f64::from(entry.weight) * value;
            weight_sum += entry.weight;
        }
        if weight_sum == 0 {
            return Ok(0.0);
        }
        Ok((total / f64::from(weight_sum)).clamp(0.0, 1.0))
    }

    /// Scores `a` against every candidate and returns them best-first.
    ///
    /// Ties are broken by the candidates' display names and finally by index,
    /// so rankings are reproducible across runs regardless of candidate-set
    /// construction order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureOutOfRange`] if any feature produces a value
    /// outside `[0, 1]`.
    pub fn rank(
        &self,
        ctx: &MatchContext<'_>,
        a: I,
        candidates: &[I],
        level: MatchLevel,
    ) -> Result<Vec<Candidate<I>>> {
        let mut ranked = Vec::with_capacity(candidates.len());
        for &b in candidates {
            let score = self.score_pair(ctx, a, b, level)?;
            ranked.push(Candidate { id: b, score });
        }
        ranked.sort_by(|x, y| {
            y.score
                .partial_cmp(&x.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| I::cmp_by_name(ctx.image_b, x.id, y.id))
                .then_with(|| x.id.cmp(&y.id))
        });
        Ok(ranked)
    }
}

impl<I: MatchEntity> Default for FeatureSet<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{AccessFlags, ClassId, Image, ImageBuilder};
    use crate::matching::store::MatchStore;

    struct ConstFeature(&'static str, f64);

    impl MatchFeature<ClassId> for ConstFeature {
        fn name(&self) -> &'static str {
            self.0
        }

        fn score(&self, _ctx: &MatchContext<'_>, _a: ClassId, _b: ClassId) -> f64 {
            self.1
        }
    }

    fn image() -> Image {
        let mut b = ImageBuilder::new("img");
        b.class("x/Aa", AccessFlags::PUBLIC);
        b.class("x/Bb", AccessFlags::PUBLIC);
        b.class("x/Cc", AccessFlags::PUBLIC);
        b.build().unwrap()
    }

    #[test]
    fn test_weighted_mean() {
        let img = image();
        let store = MatchStore::for_images(&img, &img);
        let ctx = MatchContext::new(&img, &img, &store);

        let mut set = FeatureSet::new();
        set.register(3, ConstFeature("one", 1.0));
        set.register(1, ConstFeature("zero", 0.0));

        let id = ClassId::new(0);
        let score = set.score_pair(&ctx, id, id, MatchLevel::Initial).unwrap();
        assert!((score - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_level_gating() {
        let img = image();
        let store = MatchStore::for_images(&img, &img);
        let ctx = MatchContext::new(&img, &img, &store);

        let mut set = FeatureSet::new();
        set.register(1, ConstFeature("always", 1.0));
        set.register_at(1, LevelMask::SECONDARY_AND_UP, ConstFeature("late", 0.0));

        let id = ClassId::new(0);
        let initial = set.score_pair(&ctx, id, id, MatchLevel::Initial).unwrap();
        let secondary = set.score_pair(&ctx, id, id, MatchLevel::Secondary).unwrap();
        assert!((initial - 1.0).abs() < f64::EPSILON);
        assert!((secondary - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_range_aborts() {
        let img = image();
        let store = MatchStore::for_images(&img, &img);
        let ctx = MatchContext::new(&img, &img, &store);

        let mut set = FeatureSet::new();
        set.register(1, ConstFeature("broken", 1.5));

        let id = ClassId::new(0);
        let err = set.score_pair(&ctx, id, id, MatchLevel::Initial).unwrap_err();
        assert!(matches!(
            err,
            Error::FeatureOutOfRange {
                feature: "broken",
                ..
            }
        ));

        let mut set = FeatureSet::new();
        set.register(1, ConstFeature("nan", f64::NAN));
        assert!(set.score_pair(&ctx, id, id, MatchLevel::Initial).is_err());
    }

    #[test]
    fn test_rank_orders_and_breaks_ties_by_name() {
        let img = image();
        let store = MatchStore::for_images(&img, &img);
        let ctx = MatchContext::new(&img, &img, &store);

        // every pair scores the same, so ranking falls back to name order
        let mut set = FeatureSet::new();
        set.register(1, ConstFeature("flat", 0.5));

        let candidates = [ClassId::new(2), ClassId::new(0), ClassId::new(1)];
        let ranked = set
            .rank(&ctx, ClassId::new(0), &candidates, MatchLevel::Initial)
            .unwrap();
        let names: Vec<_> = ranked
            .iter()
            .map(|c| img.class(c.id).name.clone())
            .collect();
        assert_eq!(names, vec!["x/Aa", "x/Bb", "x/Cc"]);
    }

    #[test]
    fn test_empty_set_scores_zero() {
        let img = image();
        let store = MatchStore::for_images(&img, &img);
        let ctx = MatchContext::new(&img, &img, &store);
        let set: FeatureSet<ClassId> = FeatureSet::new();
        let score = set
            .score_pair(&ctx, ClassId::new(0), ClassId::new(0), MatchLevel::Initial)
            .unwrap();
        assert!((score - 0.0).abs() < f64::EPSILON);
    }
}
