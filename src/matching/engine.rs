//! The matcher driver.
//!
//! [`MatchEngine`] runs the iterated matching pipeline over an image pair. For
//! each configured level it loops class, method and field passes to a fixed
//! point: every pass ranks all eligible source entities against their candidate
//! sets, proposes the pairs that clear the level's thresholds, resolves
//! competing proposals, and commits the survivors. Each committed class pair is
//! propagated up the hierarchy, and newly committed pairs sharpen the scores of
//! the next pass, so the loop runs until nothing changes.
//!
//! Ranking within one pass only reads the store, so it can fan out over a
//! worker pool; proposal resolution and commits are always serial, and no pass
//! ever observes a partially committed batch.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::{
    image::{ClassId, FieldId, Image, MethodId},
    matching::{
        classifiers::ClassifierSet,
        compare::{MatchContext, MatchEntity},
        config::MatcherConfig,
        feature::FeatureSet,
        level::{LevelMap, MatchLevel},
        store::{MatchInfo, MatchStore},
    },
    Result,
};

/// Cooperative cancellation flag, checked between passes and between levels.
///
/// Cancellation never tears a pass apart: a pass either commits its full
/// proposal batch or none of it, so a cancelled run leaves a consistent store.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a matching run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// All configured levels ran to their fixed points
    Completed,
    /// Cancellation was observed; the store holds all matches committed so far
    Cancelled,
}

/// Counters describing one matching run.
#[derive(Debug, Clone)]
pub struct MatchStats {
    /// Real classes in the source image
    pub classes_total: usize,
    /// Classes matched by the run
    pub classes_matched: usize,
    /// Real methods in the source image
    pub methods_total: usize,
    /// Methods matched by the run
    pub methods_matched: usize,
    /// Real fields in the source image
    pub fields_total: usize,
    /// Fields matched by the run
    pub fields_matched: usize,
    /// Commits per level, hierarchy propagation included
    pub commits_per_level: LevelMap<usize>,
    /// Commits made by hierarchy propagation
    pub propagated: usize,
    /// Fixed-point passes executed
    pub passes: usize,
}

impl MatchStats {
    fn for_image(a: &Image) -> Self {
        Self {
            classes_total: a.classes().filter(|c| c.real).count(),
            classes_matched: 0,
            methods_total: a.methods().filter(|m| m.real).count(),
            methods_matched: 0,
            fields_total: a.fields().filter(|f| f.real).count(),
            fields_matched: 0,
            commits_per_level: LevelMap::splat(0),
            propagated: 0,
            passes: 0,
        }
    }

    /// Renders a one-line human-readable report.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "classes {}/{}, methods {}/{}, fields {}/{} matched ({} propagated, {} passes)",
            self.classes_matched,
            self.classes_total,
            self.methods_matched,
            self.methods_total,
            self.fields_matched,
            self.fields_total,
            self.propagated,
            self.passes
        )
    }
}

/// The outcome of a matching run: the store, how the run ended, and counters.
#[derive(Debug)]
pub struct MatchResult {
    /// All committed matches
    pub store: MatchStore,
    /// Whether the run completed or was cancelled
    pub outcome: MatchOutcome,
    /// Run counters
    pub stats: MatchStats,
}

/// One source entity's accepted candidate, pending resolution.
#[derive(Debug, Clone, Copy)]
struct Proposal<I> {
    source: I,
    target: I,
    score: f64,
}

/// Per-source result of the ranking scan.
enum Verdict<I> {
    Propose(Proposal<I>),
    /// Cleared the absolute threshold but not the margin
    NearMiss(I),
    None,
}

/// Members of a class, generically over the member kind.
trait MemberEntity: MatchEntity {
    fn owner(self, image: &Image) -> ClassId;
    fn members_of(image: &Image, class: ClassId) -> &[Self];
    fn features(classifiers: &ClassifierSet) -> &FeatureSet<Self>;
}

impl MemberEntity for MethodId {
    fn owner(self, image: &Image) -> ClassId {
        image.method(self).owner
    }

    fn members_of(image: &Image, class: ClassId) -> &[Self] {
        &image.class(class).methods
    }

    fn features(classifiers: &ClassifierSet) -> &FeatureSet<Self> {
        &classifiers.methods
    }
}

impl MemberEntity for FieldId {
    fn owner(self, image: &Image) -> ClassId {
        image.field(self).owner
    }

    fn members_of(image: &Image, class: ClassId) -> &[Self] {
        &image.class(class).fields
    }

    fn features(classifiers: &ClassifierSet) -> &FeatureSet<Self> {
        &classifiers.fields
    }
}

/// The similarity-matching engine.
///
/// Owns its configuration and classifier families; construction is the only
/// registration step, there is no process-wide state. One engine can run any
/// number of image pairs.
///
/// # Example
///
/// ```rust
/// use classmatch::image::{AccessFlags, ImageBuilder};
/// use classmatch::matching::{MatchEngine, MatcherConfig};
///
/// let mut named = ImageBuilder::new("v1");
/// named.class("app/Main", AccessFlags::PUBLIC).method("run", "()V");
/// let named = named.build()?;
///
/// let mut unnamed = ImageBuilder::new("v2");
/// unnamed.class("a", AccessFlags::PUBLIC).method("x", "()V");
/// let unnamed = unnamed.build()?;
///
/// let engine = MatchEngine::new(MatcherConfig::default());
/// let result = engine.run(&named, &unnamed)?;
/// println!("{}", result.stats.summary());
/// # Ok::<(), classmatch::Error>(())
/// ```
pub struct MatchEngine {
    config: MatcherConfig,
    classifiers: ClassifierSet,
}

impl MatchEngine {
    /// Creates an engine with the built-in classifier families.
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        Self {
            config,
            classifiers: ClassifierSet::with_defaults(),
        }
    }

    /// Creates an engine with custom classifier families.
    #[must_use]
    pub fn with_classifiers(config: MatcherConfig, classifiers: ClassifierSet) -> Self {
        Self {
            config,
            classifiers,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Matches image `a` (the named side) against image `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature function misbehaves
    /// ([`Error::FeatureOutOfRange`](crate::Error::FeatureOutOfRange)).
    pub fn run(&self, a: &Image, b: &Image) -> Result<MatchResult> {
        self.run_with_cancel(a, b, &CancelToken::new())
    }

    /// Matches with a cancellation token.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature function misbehaves.
    pub fn run_with_cancel(
        &self,
        a: &Image,
        b: &Image,
        cancel: &CancelToken,
    ) -> Result<MatchResult> {
        self.resume(MatchStore::for_images(a, b), a, b, cancel)
    }

    /// Continues matching on a pre-seeded store.
    ///
    /// Matches already in the store are honored and never revisited; running
    /// the engine again on its own output commits nothing new.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature function misbehaves.
    pub fn resume(
        &self,
        mut store: MatchStore,
        a: &Image,
        b: &Image,
        cancel: &CancelToken,
    ) -> Result<MatchResult> {
        let mut stats = MatchStats::for_image(a);

        'levels: for &level in &self.config.levels {
            loop {
                if cancel.is_cancelled() {
                    break 'levels;
                }
                let mut changed = false;
                changed |= self.match_classes(a, b, &mut store, level, &mut stats)?;
                changed |=
                    self.match_members::<MethodId>(a, b, &mut store, level, &mut stats)?;
                changed |= self.match_members::<FieldId>(a, b, &mut store, level, &mut stats)?;
                stats.passes += 1;
                if !changed {
                    break;
                }
            }
        }

        let outcome = if cancel.is_cancelled() {
            MatchOutcome::Cancelled
        } else {
            MatchOutcome::Completed
        };
        stats.classes_matched = store.classes.matched_count();
        stats.methods_matched = store.methods.matched_count();
        stats.fields_matched = store.fields.matched_count();
        Ok(MatchResult {
            store,
            outcome,
            stats,
        })
    }

    /// One class pass: propose, resolve, commit, propagate.
    fn match_classes(
        &self,
        a: &Image,
        b: &Image,
        store: &mut MatchStore,
        level: MatchLevel,
        stats: &mut MatchStats,
    ) -> Result<bool> {
        let sources: Vec<ClassId> = a
            .classes()
            .filter(|c| c.real && store.classes.partner_of_a(c.id).is_none())
            .map(|c| c.id)
            .collect();

        let (proposals, near_misses) = self.scan(a, b, store, level, &sources, &self.classifiers.classes, |ctx, src| {
            let src_kind = ctx.image_a.class(src).flags.class_kind();
            ctx.image_b
                .classes()
                .filter(|c| {
                    c.real
                        && ctx.store.classes.partner_of_b(c.id).is_none()
                        && c.flags.class_kind() == src_kind
                })
                .map(|c| c.id)
                .collect()
        })?;

        let committed = self.resolve_and_commit(store, level, proposals, near_misses, stats);
        if self.config.propagate_hierarchy && !committed.is_empty() {
            self.propagate_hierarchy(a, b, store, level, committed.clone(), stats)?;
        }
        Ok(!committed.is_empty())
    }

    /// One member pass (methods or fields), restricted to members of already
    /// matched class pairs.
    fn match_members<I: MemberEntity>(
        &self,
        a: &Image,
        b: &Image,
        store: &mut MatchStore,
        level: MatchLevel,
        stats: &mut MatchStats,
    ) -> Result<bool> {
        let features = I::features(&self.classifiers);
        let sources: Vec<I> = {
            let map = I::map(store);
            (0..I::arena_len(a))
                .map(I::from_index)
                .filter(|&m| {
                    m.is_real(a)
                        && map.partner_of_a(m).is_none()
                        && store.classes.partner_of_a(I::owner(m, a)).is_some()
                })
                .collect()
        };

        let (proposals, near_misses) = self.scan(a, b, store, level, &sources, features, |ctx, src| {
            let owner = I::owner(src, ctx.image_a);
            let Some(partner) = ctx.store.classes.partner_of_a(owner) else {
                return Vec::new();
            };
            I::members_of(ctx.image_b, partner)
                .iter()
                .copied()
                .filter(|&m| {
                    m.is_real(ctx.image_b) && I::map(ctx.store).partner_of_b(m).is_none()
                })
                .collect()
        })?;

        let committed = self.resolve_and_commit(store, level, proposals, near_misses, stats);
        Ok(!committed.is_empty())
    }

    /// Ranks every source against its candidates and returns the proposals
    /// that cleared both thresholds, plus the near-misses.
    ///
    /// Read-only with respect to the store; runs across a worker pool when
    /// `parallelism > 1`. Results are in source order either way.
    fn scan<I: MatchEntity>(
        &self,
        a: &Image,
        b: &Image,
        store: &MatchStore,
        level: MatchLevel,
        sources: &[I],
        features: &FeatureSet<I>,
        candidates_for: impl Fn(&MatchContext<'_>, I) -> Vec<I> + Sync,
    ) -> Result<(Vec<Proposal<I>>, Vec<I>)> {
        let ctx = MatchContext::new(a, b, store);
        let abs = self.config.absolute_threshold[level];
        let rel = self.config.relative_threshold[level];

        let judge = |&src: &I| -> Result<Verdict<I>> {
            let candidates = candidates_for(&ctx, src);
            if candidates.is_empty() {
                return Ok(Verdict::None);
            }
            let ranked = features.rank(&ctx, src, &candidates, level)?;
            let s1 = ranked[0].score;
            let s2 = if ranked.len() > 1 { ranked[1].score } else { 0.0 };
            if s1 >= abs && s1 - s2 >= rel {
                Ok(Verdict::Propose(Proposal {
                    source: src,
                    target: ranked[0].id,
                    score: s1,
                }))
            } else if s1 >= abs {
                Ok(Verdict::NearMiss(src))
            } else {
                Ok(Verdict::None)
            }
        };

        let verdicts: Vec<Verdict<I>> = if self.config.parallelism > 1 {
            sources.par_iter().map(judge).collect::<Result<_>>()?
        } else {
            sources.iter().map(judge).collect::<Result<_>>()?
        };

        let mut proposals = Vec::new();
        let mut near_misses = Vec::new();
        for verdict in verdicts {
            match verdict {
                Verdict::Propose(p) => proposals.push(p),
                Verdict::NearMiss(src) => near_misses.push(src),
                Verdict::None => {}
            }
        }
        Ok((proposals, near_misses))
    }

    /// Resolves competing proposals and commits the survivors.
    ///
    /// A target claimed by several sources is only awarded when one proposer
    /// leads the others by the level's relative margin; otherwise the target
    /// and all its suitors are deferred to a later pass. At the final level,
    /// deferred and near-miss sources are recorded as ambiguous.
    fn resolve_and_commit<I: MatchEntity>(
        &self,
        store: &mut MatchStore,
        level: MatchLevel,
        proposals: Vec<Proposal<I>>,
        near_misses: Vec<I>,
        stats: &mut MatchStats,
    ) -> Vec<(I, I)> {
        let rel = self.config.relative_threshold[level];
        let record_ambiguous = level == MatchLevel::Final;

        let mut committed = Vec::new();
        let mut handled: FxHashSet<I> = FxHashSet::default();
        for proposal in &proposals {
            if !handled.insert(proposal.target) {
                continue;
            }
            let mut rivals: Vec<&Proposal<I>> = proposals
                .iter()
                .filter(|p| p.target == proposal.target)
                .collect();
            let winner = if rivals.len() == 1 {
                Some(rivals[0])
            } else {
                rivals.sort_by(|x, y| {
                    y.score
                        .partial_cmp(&x.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                if rivals[0].score - rivals[1].score >= rel {
                    Some(rivals[0])
                } else {
                    if record_ambiguous {
                        for rival in &rivals {
                            I::map_mut(store).set_ambiguous(rival.source);
                        }
                    }
                    None
                }
            };
            if let Some(winner) = winner {
                if I::map_mut(store).commit(
                    winner.source,
                    winner.target,
                    MatchInfo {
                        score: winner.score,
                        level,
                    },
                ) {
                    stats.commits_per_level[level] += 1;
                    committed.push((winner.source, winner.target));
                }
            }
        }

        if record_ambiguous {
            for src in near_misses {
                I::map_mut(store).set_ambiguous(src);
            }
        }
        committed
    }

    /// Extends fresh class commits to their parents and single interfaces, to
    /// a fixed point.
    fn propagate_hierarchy(
        &self,
        a: &Image,
        b: &Image,
        store: &mut MatchStore,
        level: MatchLevel,
        seeds: Vec<(ClassId, ClassId)>,
        stats: &mut MatchStats,
    ) -> Result<()> {
        let mut worklist = seeds;
        while let Some((ca, cb)) = worklist.pop() {
            if let (Some(pa), Some(pb)) = (a.class(ca).parent, b.class(cb).parent) {
                self.try_propagate(a, b, store, level, pa, pb, &mut worklist, stats)?;
            }
            let (ia, ib) = (&a.class(ca).interfaces, &b.class(cb).interfaces);
            if ia.len() == 1 && ib.len() == 1 {
                self.try_propagate(a, b, store, level, ia[0], ib[0], &mut worklist, stats)?;
            }
        }
        Ok(())
    }

    fn try_propagate(
        &self,
        a: &Image,
        b: &Image,
        store: &mut MatchStore,
        level: MatchLevel,
        pa: ClassId,
        pb: ClassId,
        worklist: &mut Vec<(ClassId, ClassId)>,
        stats: &mut MatchStats,
    ) -> Result<()> {
        let (cls_a, cls_b) = (a.class(pa), b.class(pb));
        if !cls_a.real || !cls_b.real {
            return Ok(());
        }
        if cls_a.flags.class_kind() != cls_b.flags.class_kind() {
            return Ok(());
        }
        if store.classes.partner_of_a(pa).is_some() || store.classes.partner_of_b(pb).is_some() {
            return Ok(());
        }

        let score = {
            let ctx = MatchContext::new(a, b, store);
            self.classifiers.classes.score_pair(&ctx, pa, pb, level)?
        };
        if store.classes.commit(pa, pb, MatchInfo { score, level }) {
            stats.commits_per_level[level] += 1;
            stats.propagated += 1;
            worklist.push((pa, pb));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{AccessFlags, ImageBuilder};

    fn simple_pair() -> (Image, Image) {
        let mut a = ImageBuilder::new("named");
        a.class("app/Main", AccessFlags::PUBLIC).method("run", "()V");
        let mut b = ImageBuilder::new("unnamed");
        b.class("a", AccessFlags::PUBLIC).method("x", "()V");
        (a.build().unwrap(), b.build().unwrap())
    }

    #[test]
    fn test_cancelled_before_start() {
        let (a, b) = simple_pair();
        let engine = MatchEngine::new(MatcherConfig::default());
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = engine.run_with_cancel(&a, &b, &cancel).unwrap();
        assert_eq!(result.outcome, MatchOutcome::Cancelled);
        assert_eq!(result.store.total_matched(), 0);
    }

    #[test]
    fn test_simple_pair_matches() {
        let (a, b) = simple_pair();
        let engine = MatchEngine::new(MatcherConfig::default());
        let result = engine.run(&a, &b).unwrap();
        assert_eq!(result.outcome, MatchOutcome::Completed);

        let main = a.class_by_name("app/Main").unwrap();
        let target = b.class_by_name("a").unwrap();
        assert_eq!(result.store.class_match(main), Some(target));
        assert_eq!(result.stats.classes_matched, 1);
        assert_eq!(result.stats.methods_matched, 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (a, b) = simple_pair();
        let serial = MatchEngine::new(MatcherConfig::default()).run(&a, &b).unwrap();
        let parallel = MatchEngine::new(MatcherConfig::default().with_parallelism(4))
            .run(&a, &b)
            .unwrap();

        let pairs = |r: &MatchResult| -> Vec<(ClassId, ClassId)> {
            r.store.iter_class_matches().map(|(x, y, _)| (x, y)).collect()
        };
        assert_eq!(pairs(&serial), pairs(&parallel));
    }

    #[test]
    fn test_stats_summary_format() {
        let (a, b) = simple_pair();
        let result = MatchEngine::new(MatcherConfig::default()).run(&a, &b).unwrap();
        let summary = result.stats.summary();
        assert!(summary.contains("classes 1/1"));
        assert!(summary.contains("methods 1/1"));
    }
}
