//! The similarity-based matching engine.
//!
//! This module contains the complete matching stack:
//!
//! - [`compare`] - primitive similarity operators and the potential-equality gate
//! - [`feature`] - the classifier framework: weighted features and ranking
//! - [`classifiers`] - the built-in feature families for the three entity kinds
//! - [`store`] - the bidirectional partial bijection the run accumulates
//! - [`engine`] - the iterated driver: propose, resolve, commit, propagate
//!
//! # Matching model
//!
//! Matching proceeds in [levels](MatchLevel) with progressively relaxed
//! [thresholds](MatcherConfig): a candidate pair commits only when its weighted
//! feature score clears the level's absolute floor and leads the runner-up by
//! the level's relative margin. Committed pairs feed back into scoring (matched
//! neighbors count fully in set comparisons), so each level loops to a fixed
//! point before the next one starts. Ambiguous pairs are deliberately left
//! unmatched and, at the final level, recorded for reporting.

pub mod classifiers;
pub mod compare;
pub mod config;
pub mod engine;
pub mod feature;
pub mod level;
pub mod store;

pub use classifiers::ClassifierSet;
pub use compare::{
    compare_class_sets, compare_counts, compare_entity_sets, compare_field_sets,
    compare_method_sets, MatchContext, MatchEntity,
};
pub use config::MatcherConfig;
pub use engine::{CancelToken, MatchEngine, MatchOutcome, MatchResult, MatchStats};
pub use feature::{Candidate, FeatureSet, MatchFeature};
pub use level::{LevelMap, LevelMask, MatchLevel};
pub use store::{MatchInfo, MatchMap, MatchStore};
