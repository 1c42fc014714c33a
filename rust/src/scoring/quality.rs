//! Whole-schedule quality function.

use pyo3::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{SchedulerConfig, ScoringWeights};
use crate::constraints::{check_venue_compatibility, estimate_attendance, OverlapMap};
use crate::models::{Assignment, InputIndex, ScheduleInput};

/// Utilization at or above which a venue counts as well matched.
pub const IDEAL_MIN_UTILIZATION: f64 = 0.6;

/// Sub-scores of the quality function, each in 0-1.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    #[pyo3(get)]
    pub conflict_avoidance: f64,
    #[pyo3(get)]
    pub capacity_fit: f64,
    #[pyo3(get)]
    pub feature_compatibility: f64,
    #[pyo3(get)]
    pub demand_balance: f64,
}

impl ScoreBreakdown {
    /// Weighted composite on the 0-100 scale.
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        let sum = weights.conflict * self.conflict_avoidance
            + weights.capacity * self.capacity_fit
            + weights.feature * self.feature_compatibility
            + weights.balance * self.demand_balance;
        (100.0 * sum / total).clamp(0.0, 100.0)
    }
}

#[pymethods]
impl ScoreBreakdown {
    fn __repr__(&self) -> String {
        format!(
            "ScoreBreakdown(conflict={:.3}, capacity={:.3}, feature={:.3}, balance={:.3})",
            self.conflict_avoidance, self.capacity_fit, self.feature_compatibility, self.demand_balance
        )
    }
}

/// Composite score of a full assignment list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QualityScore {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// How well a venue's capacity matches expected attendance (0-1).
///
/// Utilization between `IDEAL_MIN_UTILIZATION` and 1 scores 1. Emptier rooms
/// fall off linearly towards 0; overfilled rooms lose one point per 100% of
/// overflow.
pub fn capacity_fit(expected_attendance: f64, capacity: u32) -> f64 {
    let capacity = f64::from(capacity.max(1));
    let utilization = expected_attendance.max(0.0) / capacity;
    if utilization > 1.0 {
        (2.0 - utilization).max(0.0)
    } else if utilization >= IDEAL_MIN_UTILIZATION {
        1.0
    } else {
        utilization / IDEAL_MIN_UTILIZATION
    }
}

/// Ids of slots the input marks unavailable (breaks, ceremonies).
pub fn unavailable_slot_ids(input: &ScheduleInput) -> FxHashSet<&str> {
    input
        .time_slots
        .iter()
        .filter(|slot| !slot.is_available)
        .map(|slot| slot.id.as_str())
        .collect()
}

/// Sessions per slot: available slots in input order, then any slot unknown to
/// the input that an assignment references (in first-seen order).
///
/// Assignments in unavailable slots are left out; a ceremony locked into a
/// break says nothing about how evenly talks are spread.
pub fn slot_load_counts(assignments: &[Assignment], input: &ScheduleInput) -> Vec<usize> {
    let unavailable = unavailable_slot_ids(input);
    let mut order: Vec<&str> = input.available_slots().map(|s| s.id.as_str()).collect();
    let mut counts: FxHashMap<&str, usize> = order.iter().map(|id| (*id, 0)).collect();
    for assignment in assignments {
        let slot_id = assignment.time_slot_id.as_str();
        if unavailable.contains(slot_id) {
            continue;
        }
        match counts.get_mut(slot_id) {
            Some(count) => *count += 1,
            None => {
                counts.insert(slot_id, 1);
                order.push(slot_id);
            }
        }
    }
    order.iter().map(|id| counts[id]).collect()
}

/// `1 - stddev / mean` of per-slot counts, clamped at 0; 1 when the mean is 0.
pub fn balance_score(counts: &[usize]) -> f64 {
    if counts.is_empty() {
        return 1.0;
    }
    let n = counts.len() as f64;
    let mean = counts.iter().sum::<usize>() as f64 / n;
    if mean == 0.0 {
        return 1.0;
    }
    let variance = counts
        .iter()
        .map(|&c| {
            let d = c as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (1.0 - variance.sqrt() / mean).max(0.0)
}

/// Score a full schedule on the 0-100 scale.
///
/// Zero assignments score 0. A schedule without audience overlap between
/// concurrent sessions, with every venue inside the ideal utilization band,
/// every required feature present and an even spread over slots scores 100.
pub fn calculate_quality_score(
    assignments: &[Assignment],
    input: &ScheduleInput,
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> QualityScore {
    calculate_quality_score_indexed(assignments, &input.index(), overlap_map, config)
}

/// Same as `calculate_quality_score` with a prebuilt id index.
pub fn calculate_quality_score_indexed(
    assignments: &[Assignment],
    index: &InputIndex<'_>,
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> QualityScore {
    // Assignments pointing at unknown sessions or venues carry no signal
    let resolved: Vec<_> = assignments
        .iter()
        .filter_map(|a| Some((a, index.session(&a.session_id)?, index.venue(&a.venue_id)?)))
        .collect();
    if resolved.is_empty() {
        return QualityScore::default();
    }
    let n = resolved.len() as f64;

    let mut overlap_penalty = 0.0;
    for (i, (first, _, _)) in resolved.iter().enumerate() {
        for (second, _, _) in &resolved[i + 1..] {
            if first.time_slot_id == second.time_slot_id {
                overlap_penalty += overlap_map.get(&first.session_id, &second.session_id) / 100.0;
            }
        }
    }
    let conflict_avoidance = (1.0 - overlap_penalty / n).max(0.0);

    let capacity_total: f64 = resolved
        .iter()
        .map(|(_, session, venue)| capacity_fit(estimate_attendance(session), venue.capacity))
        .sum();

    let feature_total: f64 = resolved
        .iter()
        .map(|(_, session, venue)| {
            check_venue_compatibility(session, venue)
                .satisfied_fraction(session.required_features.len())
        })
        .sum();

    let breakdown = ScoreBreakdown {
        conflict_avoidance,
        capacity_fit: capacity_total / n,
        feature_compatibility: feature_total / n,
        demand_balance: balance_score(&slot_load_counts(assignments, index.input)),
    };

    QualityScore {
        score: breakdown.weighted(&config.scoring_weights),
        breakdown,
    }
}
