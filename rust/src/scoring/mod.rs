//! Scoring engine: schedule quality, marginal placement scores and
//! placement priority.
//!
//! All scores share one 0-100 scale built from the same sub-terms (conflict
//! avoidance, capacity fit, feature compatibility, demand balance), so a
//! placement that looks better to the greedy pass also moves the whole
//! schedule score in the same direction.

mod incremental;
mod placement;
mod priority;
mod quality;

pub use incremental::QualityTracker;
pub use placement::score_assignment;
pub use priority::{calculate_priority, order_by_priority};
pub use quality::{
    balance_score, calculate_quality_score, calculate_quality_score_indexed, capacity_fit,
    slot_load_counts, unavailable_slot_ids, QualityScore, ScoreBreakdown, IDEAL_MIN_UTILIZATION,
};
