//! The match store: a bidirectional partial bijection per entity kind.
//!
//! The store is the only mutable state of a matching run. It is append-only
//! while the run is in progress (commits are never revoked) and records, for
//! every confirmed pair, the level at which it was committed and the final
//! similarity score. It can be cloned and fed back into a later run to resume
//! or verify idempotence.

use crate::{
    image::{ClassId, FieldId, Image, MethodId},
    matching::MatchLevel,
};

/// Provenance of one confirmed match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchInfo {
    /// Aggregated similarity at commit time
    pub score: f64,
    /// Level at which the pair was committed
    pub level: MatchLevel,
}

/// One kind's partial bijection between image A and image B.
///
/// Both directions are stored as arena-parallel vectors, so lookups in either
/// direction are array reads. Provenance and ambiguity markers are keyed by the
/// A side.
#[derive(Debug, Clone)]
pub struct MatchMap<I> {
    a_to_b: Vec<Option<I>>,
    b_to_a: Vec<Option<I>>,
    info: Vec<Option<MatchInfo>>,
    ambiguous: Vec<bool>,
    matched: usize,
}

impl<I: Copy + PartialEq + std::fmt::Debug> MatchMap<I> {
    fn with_sizes(len_a: usize, len_b: usize) -> Self {
        Self {
            a_to_b: vec![None; len_a],
            b_to_a: vec![None; len_b],
            info: vec![None; len_a],
            ambiguous: vec![false; len_a],
            matched: 0,
        }
    }

    /// Returns the partner of an A-side entity.
    #[must_use]
    pub fn partner_of_a(&self, a: I) -> Option<I>
    where
        I: Into<usize>,
    {
        self.a_to_b[a.into()]
    }

    /// Returns the partner of a B-side entity.
    #[must_use]
    pub fn partner_of_b(&self, b: I) -> Option<I>
    where
        I: Into<usize>,
    {
        self.b_to_a[b.into()]
    }

    /// Returns the provenance of an A-side entity's match, if any.
    #[must_use]
    pub fn info(&self, a: I) -> Option<MatchInfo>
    where
        I: Into<usize>,
    {
        self.info[a.into()]
    }

    /// Returns `true` if the A-side entity was recorded ambiguous.
    #[must_use]
    pub fn is_ambiguous(&self, a: I) -> bool
    where
        I: Into<usize>,
    {
        self.ambiguous[a.into()]
    }

    /// Number of committed pairs.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.matched
    }

    /// Iterates over committed pairs in ascending A-index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, I, MatchInfo)> + '_ {
        self.a_to_b.iter().enumerate().filter_map(move |(i, &b)| {
            b.map(|b| (i, b, self.info[i].expect("committed pair has info")))
        })
    }

    /// Commits a pair. Returns `false` (and changes nothing) if either side is
    /// already taken.
    pub(crate) fn commit(&mut self, a: I, b: I, info: MatchInfo) -> bool
    where
        I: Into<usize>,
    {
        let (ai, bi) = (a.into(), b.into());
        if self.a_to_b[ai].is_some() || self.b_to_a[bi].is_some() {
            debug_assert!(
                self.a_to_b[ai] == Some(b),
                "conflicting commit over existing match"
            );
            return false;
        }
        self.a_to_b[ai] = Some(b);
        self.b_to_a[bi] = Some(a);
        self.info[ai] = Some(info);
        self.ambiguous[ai] = false;
        self.matched += 1;
        true
    }

    pub(crate) fn set_ambiguous(&mut self, a: I)
    where
        I: Into<usize>,
    {
        let ai = a.into();
        if self.a_to_b[ai].is_none() {
            self.ambiguous[ai] = true;
        }
    }
}

/// All confirmed matches of a run, per entity kind.
#[derive(Debug, Clone)]
pub struct MatchStore {
    pub(crate) classes: MatchMap<ClassId>,
    pub(crate) methods: MatchMap<MethodId>,
    pub(crate) fields: MatchMap<FieldId>,
}

impl MatchStore {
    /// Creates an empty store sized for the given image pair.
    #[must_use]
    pub fn for_images(a: &Image, b: &Image) -> Self {
        Self {
            classes: MatchMap::with_sizes(a.class_count(), b.class_count()),
            methods: MatchMap::with_sizes(a.method_count(), b.method_count()),
            fields: MatchMap::with_sizes(a.field_count(), b.field_count()),
        }
    }

    /// The class bijection.
    #[must_use]
    pub fn classes(&self) -> &MatchMap<ClassId> {
        &self.classes
    }

    /// The method bijection.
    #[must_use]
    pub fn methods(&self) -> &MatchMap<MethodId> {
        &self.methods
    }

    /// The field bijection.
    #[must_use]
    pub fn fields(&self) -> &MatchMap<FieldId> {
        &self.fields
    }

    /// Partner of an A-side class.
    #[must_use]
    pub fn class_match(&self, a: ClassId) -> Option<ClassId> {
        self.classes.partner_of_a(a)
    }

    /// Partner of an A-side method.
    #[must_use]
    pub fn method_match(&self, a: MethodId) -> Option<MethodId> {
        self.methods.partner_of_a(a)
    }

    /// Partner of an A-side field.
    #[must_use]
    pub fn field_match(&self, a: FieldId) -> Option<FieldId> {
        self.fields.partner_of_a(a)
    }

    /// Iterates over matched class pairs in ascending A-index order.
    pub fn iter_class_matches(&self) -> impl Iterator<Item = (ClassId, ClassId, MatchInfo)> + '_ {
        self.classes.iter().map(|(i, b, info)| (ClassId::new(i), b, info))
    }

    /// Iterates over matched method pairs in ascending A-index order.
    pub fn iter_method_matches(&self) -> impl Iterator<Item = (MethodId, MethodId, MatchInfo)> + '_ {
        self.methods.iter().map(|(i, b, info)| (MethodId::new(i), b, info))
    }

    /// Iterates over matched field pairs in ascending A-index order.
    pub fn iter_field_matches(&self) -> impl Iterator<Item = (FieldId, FieldId, MatchInfo)> + '_ {
        self.fields.iter().map(|(i, b, info)| (FieldId::new(i), b, info))
    }

    /// Total number of committed pairs across all kinds.
    #[must_use]
    pub fn total_matched(&self) -> usize {
        self.classes.matched_count() + self.methods.matched_count() + self.fields.matched_count()
    }
}
