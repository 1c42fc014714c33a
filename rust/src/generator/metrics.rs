//! Summary metrics of a finished schedule.

use crate::constraints::estimate_attendance;
use crate::models::{Assignment, InputIndex, ScheduleMetrics};
use crate::scoring::{balance_score, slot_load_counts};

/// Mean of `min(expected attendance / capacity, 1)` over resolvable assignments.
pub fn average_capacity_utilization(assignments: &[Assignment], index: &InputIndex<'_>) -> f64 {
    let utilizations: Vec<f64> = assignments
        .iter()
        .filter_map(|a| {
            let session = index.session(&a.session_id)?;
            let venue = index.venue(&a.venue_id)?;
            let capacity = f64::from(venue.capacity.max(1));
            Some((estimate_attendance(session) / capacity).min(1.0))
        })
        .collect();
    if utilizations.is_empty() {
        return 0.0;
    }
    utilizations.iter().sum::<f64>() / utilizations.len() as f64
}

/// Build the metrics block of a result.
pub fn compute_metrics(
    assignments: &[Assignment],
    index: &InputIndex<'_>,
    locked_sessions: usize,
    conflict_count: usize,
    greedy_quality_score: f64,
    optimizer_iterations: u32,
) -> ScheduleMetrics {
    ScheduleMetrics {
        total_sessions: index.input.sessions.len(),
        assigned_sessions: assignments.len(),
        locked_sessions,
        conflict_count,
        avg_capacity_utilization: average_capacity_utilization(assignments, index),
        demand_balance_score: balance_score(&slot_load_counts(assignments, index.input)),
        greedy_quality_score,
        optimizer_iterations,
    }
}
