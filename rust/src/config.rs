//! Configuration types for the schedule generator.

use pyo3::prelude::*;

use crate::generator::SchedulerError;

/// Relative weights of the quality-function sub-scores.
///
/// Only the ratios matter: the composite is divided by the weight sum, so a
/// schedule that is perfect on every sub-score always scores 100.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringWeights {
    /// Penalty for concurrently scheduling sessions that share an audience
    #[pyo3(get, set)]
    pub conflict: f64,
    /// Match between expected attendance and venue capacity
    #[pyo3(get, set)]
    pub capacity: f64,
    /// Share of required technical features the venue provides
    #[pyo3(get, set)]
    pub feature: f64,
    /// Even spread of sessions across time slots
    #[pyo3(get, set)]
    pub balance: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            conflict: 0.40,
            capacity: 0.25,
            feature: 0.20,
            balance: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.conflict + self.capacity + self.feature + self.balance
    }

    fn validate(&self) -> Result<(), SchedulerError> {
        validate_weight_group(
            "scoring",
            &[
                ("conflict", self.conflict),
                ("capacity", self.capacity),
                ("feature", self.feature),
                ("balance", self.balance),
            ],
        )
    }
}

#[pymethods]
impl ScoringWeights {
    #[new]
    #[pyo3(signature = (conflict=None, capacity=None, feature=None, balance=None))]
    fn new(
        conflict: Option<f64>,
        capacity: Option<f64>,
        feature: Option<f64>,
        balance: Option<f64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            conflict: conflict.unwrap_or(defaults.conflict),
            capacity: capacity.unwrap_or(defaults.capacity),
            feature: feature.unwrap_or(defaults.feature),
            balance: balance.unwrap_or(defaults.balance),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ScoringWeights(conflict={}, capacity={}, feature={}, balance={})",
            self.conflict, self.capacity, self.feature, self.balance
        )
    }
}

/// Weights of the factors that make a session hard to place.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct PriorityWeights {
    /// Expected attendance relative to the most demanded session
    #[pyo3(get, set)]
    pub demand: f64,
    /// Combined audience overlap with every other session
    #[pyo3(get, set)]
    pub overlap: f64,
    /// Duration relative to the longest session
    #[pyo3(get, set)]
    pub duration: f64,
    /// Number of required technical features
    #[pyo3(get, set)]
    pub features: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            demand: 0.40,
            overlap: 0.30,
            duration: 0.20,
            features: 0.10,
        }
    }
}

impl PriorityWeights {
    pub fn total(&self) -> f64 {
        self.demand + self.overlap + self.duration + self.features
    }

    fn validate(&self) -> Result<(), SchedulerError> {
        validate_weight_group(
            "priority",
            &[
                ("demand", self.demand),
                ("overlap", self.overlap),
                ("duration", self.duration),
                ("features", self.features),
            ],
        )
    }
}

#[pymethods]
impl PriorityWeights {
    #[new]
    #[pyo3(signature = (demand=None, overlap=None, duration=None, features=None))]
    fn new(
        demand: Option<f64>,
        overlap: Option<f64>,
        duration: Option<f64>,
        features: Option<f64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            demand: demand.unwrap_or(defaults.demand),
            overlap: overlap.unwrap_or(defaults.overlap),
            duration: duration.unwrap_or(defaults.duration),
            features: features.unwrap_or(defaults.features),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "PriorityWeights(demand={}, overlap={}, duration={}, features={})",
            self.demand, self.overlap, self.duration, self.features
        )
    }
}

/// Tunables for one `generate()` run.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    #[pyo3(get, set)]
    pub scoring_weights: ScoringWeights,
    #[pyo3(get, set)]
    pub priority_weights: PriorityWeights,
    /// Cap on local-search iterations (one swap sweep plus one move sweep each)
    #[pyo3(get, set)]
    pub max_iterations: u32,
    /// Local search stops once the quality score reaches this value (0-100)
    #[pyo3(get, set)]
    pub target_quality_score: f64,
    /// Overlap percentage above which concurrent sessions count as a conflict
    #[pyo3(get, set)]
    pub conflict_threshold: f64,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scoring_weights: ScoringWeights::default(),
            priority_weights: PriorityWeights::default(),
            max_iterations: 1000,
            target_quality_score: 95.0,
            conflict_threshold: 30.0,
            verbosity: 0,
        }
    }
}

impl SchedulerConfig {
    /// Reject configurations the scoring functions cannot normalize.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        self.scoring_weights.validate()?;
        self.priority_weights.validate()?;
        check_percentage("target_quality_score", self.target_quality_score)?;
        check_percentage("conflict_threshold", self.conflict_threshold)?;
        Ok(())
    }
}

#[pymethods]
impl SchedulerConfig {
    #[new]
    #[pyo3(signature = (
        scoring_weights=None,
        priority_weights=None,
        max_iterations=None,
        target_quality_score=None,
        conflict_threshold=None,
        verbosity=None
    ))]
    fn new(
        scoring_weights: Option<ScoringWeights>,
        priority_weights: Option<PriorityWeights>,
        max_iterations: Option<u32>,
        target_quality_score: Option<f64>,
        conflict_threshold: Option<f64>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            scoring_weights: scoring_weights.unwrap_or(defaults.scoring_weights),
            priority_weights: priority_weights.unwrap_or(defaults.priority_weights),
            max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
            target_quality_score: target_quality_score.unwrap_or(defaults.target_quality_score),
            conflict_threshold: conflict_threshold.unwrap_or(defaults.conflict_threshold),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SchedulerConfig(max_iterations={}, target_quality_score={}, conflict_threshold={})",
            self.max_iterations, self.target_quality_score, self.conflict_threshold
        )
    }
}

fn validate_weight_group(group: &str, weights: &[(&str, f64)]) -> Result<(), SchedulerError> {
    for (name, value) in weights {
        if !value.is_finite() || *value < 0.0 {
            return Err(SchedulerError::InvalidConfig(format!(
                "{} weight '{}' must be a non-negative number, got {}",
                group, name, value
            )));
        }
    }
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(SchedulerError::InvalidConfig(format!(
            "{} weights must not all be zero",
            group
        )));
    }
    Ok(())
}

fn check_percentage(name: &str, value: f64) -> Result<(), SchedulerError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(SchedulerError::InvalidConfig(format!(
            "{} must be within 0-100, got {}",
            name, value
        )));
    }
    Ok(())
}
