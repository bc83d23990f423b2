//! Configuration for the matching engine.

use strum::IntoEnumIterator;

use crate::matching::level::{LevelMap, MatchLevel};

/// Configuration for a matching run.
///
/// The per-level thresholds implement the engine's confidence policy: a pair
/// is only committed when its score clears the level's absolute floor AND
/// leads the runner-up by the level's relative margin. Early levels demand
/// near-certainty; later levels trade confidence for coverage.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum aggregated score to commit, per level.
    pub absolute_threshold: LevelMap<f64>,

    /// Minimum lead over the runner-up to commit, per level.
    pub relative_threshold: LevelMap<f64>,

    /// Propagate a committed class pair to its parents and single interfaces
    /// (default: true).
    pub propagate_hierarchy: bool,

    /// The levels to run, in order (default: all four).
    pub levels: Vec<MatchLevel>,

    /// Worker parallelism for the ranking phase (default: 1). Commits are
    /// always serial.
    pub parallelism: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            absolute_threshold: LevelMap::new([0.80, 0.70, 0.60, 0.50]),
            relative_threshold: LevelMap::new([0.08, 0.05, 0.03, 0.01]),
            propagate_hierarchy: true,
            levels: MatchLevel::iter().collect(),
            parallelism: 1,
        }
    }
}

impl MatcherConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute threshold for one level.
    #[must_use]
    pub fn with_absolute_threshold(mut self, level: MatchLevel, value: f64) -> Self {
        self.absolute_threshold[level] = value;
        self
    }

    /// Sets the relative threshold for one level.
    #[must_use]
    pub fn with_relative_threshold(mut self, level: MatchLevel, value: f64) -> Self {
        self.relative_threshold[level] = value;
        self
    }

    /// Enables or disables hierarchy propagation.
    #[must_use]
    pub fn with_hierarchy_propagation(mut self, enable: bool) -> Self {
        self.propagate_hierarchy = enable;
        self
    }

    /// Restricts the run to the given levels, in the given order.
    #[must_use]
    pub fn with_levels(mut self, levels: Vec<MatchLevel>) -> Self {
        self.levels = levels;
        self
    }

    /// Sets the ranking parallelism. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_parallelism(mut self, workers: usize) -> Self {
        self.parallelism = workers.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = MatcherConfig::default();
        assert!((config.absolute_threshold[MatchLevel::Initial] - 0.80).abs() < f64::EPSILON);
        assert!((config.absolute_threshold[MatchLevel::Final] - 0.50).abs() < f64::EPSILON);
        assert!((config.relative_threshold[MatchLevel::Initial] - 0.08).abs() < f64::EPSILON);
        assert!((config.relative_threshold[MatchLevel::Final] - 0.01).abs() < f64::EPSILON);
        assert!(config.propagate_hierarchy);
        assert_eq!(config.levels.len(), 4);
        assert_eq!(config.parallelism, 1);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MatcherConfig::new()
            .with_absolute_threshold(MatchLevel::Initial, 0.9)
            .with_hierarchy_propagation(false)
            .with_levels(vec![MatchLevel::Initial, MatchLevel::Final])
            .with_parallelism(0);

        assert!((config.absolute_threshold[MatchLevel::Initial] - 0.9).abs() < f64::EPSILON);
        assert!(!config.propagate_hierarchy);
        assert_eq!(config.levels, vec![MatchLevel::Initial, MatchLevel::Final]);
        assert_eq!(config.parallelism, 1);
    }
}
