//! Marginal score of a single candidate placement.

use crate::config::SchedulerConfig;
use crate::constraints::{
    check_venue_compatibility, estimate_attendance, OverlapMap, SlotOccupancy,
};
use crate::models::{Assignment, Session, TimeSlot, Venue};

use super::quality::{capacity_fit, ScoreBreakdown};

/// Score placing `session` into (`venue`, `slot`) given what is already placed.
///
/// Uses the sub-terms of the quality function, restricted to one cell:
/// capacity fit of this venue, share of required features present, audience
/// overlap with sessions already in the same slot, and how busy the slot is.
/// Returns 0-100; higher is better.
pub fn score_assignment(
    session: &Session,
    venue: &Venue,
    slot: &TimeSlot,
    existing_assignments: &[Assignment],
    overlap_map: &OverlapMap,
    occupancy: &SlotOccupancy,
    config: &SchedulerConfig,
) -> f64 {
    let overlap_penalty: f64 = existing_assignments
        .iter()
        .filter(|a| a.time_slot_id == slot.id && a.session_id != session.id)
        .map(|a| overlap_map.get(&session.id, &a.session_id) / 100.0)
        .sum();

    let sub_scores = ScoreBreakdown {
        conflict_avoidance: (1.0 - overlap_penalty).max(0.0),
        capacity_fit: capacity_fit(estimate_attendance(session), venue.capacity),
        feature_compatibility: check_venue_compatibility(session, venue)
            .satisfied_fraction(session.required_features.len()),
        demand_balance: 1.0 / (1.0 + occupancy.venues_in_use(&slot.id) as f64),
    };
    sub_scores.weighted(&config.scoring_weights)
}
