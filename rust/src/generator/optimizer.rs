//! First-improvement hill climbing over swap and move neighborhoods.
//!
//! Only unlocked sessions take part. Each iteration runs a swap sweep and, if
//! that finds nothing, a move sweep; the first strictly improving neighbor is
//! accepted and the next iteration starts from it. Neighborhoods are walked in
//! assignment order, then input slot order, then input venue order, so the
//! result is reproducible.

use crate::config::SchedulerConfig;
use crate::constraints::{build_slot_occupancy, validate_assignment, OverlapMap, SlotOccupancy};
use crate::models::{Assignment, InputIndex};
use crate::scoring::{calculate_quality_score_indexed, QualityTracker};
use crate::{log_changes, log_debug};

/// Score gains at or below this are treated as noise.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Result of a local-search run.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizationOutcome {
    pub assignments: Vec<Assignment>,
    pub initial_score: f64,
    /// Never below `initial_score`
    pub final_score: f64,
    pub iterations: u32,
    pub swaps_accepted: u32,
    pub moves_accepted: u32,
}

/// Occupancy and score sub-totals of the schedule being improved.
///
/// Candidates are applied to both in place and reverted when rejected.
struct Neighborhood<'a> {
    occupancy: SlotOccupancy,
    tracker: QualityTracker<'a>,
}

impl<'a> Neighborhood<'a> {
    fn new(
        assignments: &[Assignment],
        index: &'a InputIndex<'a>,
        overlap_map: &'a OverlapMap,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            occupancy: build_slot_occupancy(assignments),
            tracker: QualityTracker::new(assignments, index, overlap_map, config),
        }
    }
}

/// Improve `assignments` until a local optimum, `max_iterations`, or
/// `target_quality_score` is reached.
pub fn optimize_schedule(
    assignments: Vec<Assignment>,
    index: &InputIndex<'_>,
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> OptimizationOutcome {
    let verbosity = config.verbosity;
    let mut current = assignments;
    let initial_score = calculate_quality_score_indexed(&current, index, overlap_map, config).score;
    let mut current_score = initial_score;
    let mut iterations = 0;
    let mut swaps_accepted = 0;
    let mut moves_accepted = 0;

    let movable: Vec<usize> = current
        .iter()
        .enumerate()
        .filter(|(_, a)| {
            index
                .session(&a.session_id)
                .is_some_and(|session| !session.is_locked)
        })
        .map(|(i, _)| i)
        .collect();
    let mut neighborhood = Neighborhood::new(&current, index, overlap_map, config);

    while iterations < config.max_iterations {
        if current_score >= config.target_quality_score {
            log_debug!(
                verbosity,
                "  Target score {:.2} reached ({:.2})",
                config.target_quality_score,
                current_score
            );
            break;
        }
        iterations += 1;

        let accepted = if let Some(score) =
            try_improving_swap(&mut current, &movable, current_score, index, &mut neighborhood)
        {
            swaps_accepted += 1;
            Some(("swap", score))
        } else if let Some(score) =
            try_improving_move(&mut current, &movable, current_score, index, &mut neighborhood)
        {
            moves_accepted += 1;
            Some(("move", score))
        } else {
            None
        };

        let Some((kind, score)) = accepted else {
            log_debug!(verbosity, "  Local optimum after {} iterations", iterations);
            break;
        };
        log_changes!(
            verbosity,
            "  Iteration {}: {} accepted, score {:.2} -> {:.2}",
            iterations,
            kind,
            current_score,
            score
        );
        // Re-derive from scratch so running sums never drift
        neighborhood = Neighborhood::new(&current, index, overlap_map, config);
        current_score = calculate_quality_score_indexed(&current, index, overlap_map, config).score;
    }

    OptimizationOutcome {
        assignments: current,
        initial_score,
        final_score: current_score,
        iterations,
        swaps_accepted,
        moves_accepted,
    }
}

/// Exchange the cells of the first pair whose swap strictly improves the score.
///
/// Leaves `current` swapped and returns the new score on success; otherwise
/// `current` and `neighborhood` are unchanged.
fn try_improving_swap(
    current: &mut [Assignment],
    movable: &[usize],
    current_score: f64,
    index: &InputIndex<'_>,
    neighborhood: &mut Neighborhood<'_>,
) -> Option<f64> {
    for (pos, &i) in movable.iter().enumerate() {
        for &j in &movable[pos + 1..] {
            if current[i].same_cell(&current[j]) {
                continue;
            }
            let (session_i, session_j) = match (
                index.session(&current[i].session_id),
                index.session(&current[j].session_id),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let (venue_i, slot_i, venue_j, slot_j) = match (
                index.venue(&current[i].venue_id),
                index.time_slot(&current[i].time_slot_id),
                index.venue(&current[j].venue_id),
                index.time_slot(&current[j].time_slot_id),
            ) {
                (Some(vi), Some(ti), Some(vj), Some(tj)) => (vi, ti, vj, tj),
                _ => continue,
            };

            // A swap exchanges two cells, so the set of claimed cells is the
            // same afterwards; only the validation needs both freed.
            let occupancy = &mut neighborhood.occupancy;
            occupancy.release(&slot_i.id, &venue_i.id);
            occupancy.release(&slot_j.id, &venue_j.id);
            let valid = validate_assignment(session_i, venue_j, slot_j, occupancy).valid
                && validate_assignment(session_j, venue_i, slot_i, occupancy).valid;
            occupancy.claim(&slot_i.id, &venue_i.id);
            occupancy.claim(&slot_j.id, &venue_j.id);
            if !valid {
                continue;
            }

            let tracker = &mut neighborhood.tracker;
            tracker.retract(current, i);
            tracker.retract(current, j);
            swap_cells(current, i, j);
            tracker.insert(current, i);
            tracker.insert(current, j);
            let score = tracker.score();
            if score > current_score + IMPROVEMENT_EPSILON {
                return Some(score);
            }
            tracker.retract(current, i);
            tracker.retract(current, j);
            swap_cells(current, i, j);
            tracker.insert(current, i);
            tracker.insert(current, j);
        }
    }
    None
}

/// Relocate the first session whose move to a free cell strictly improves the score.
fn try_improving_move(
    current: &mut [Assignment],
    movable: &[usize],
    current_score: f64,
    index: &InputIndex<'_>,
    neighborhood: &mut Neighborhood<'_>,
) -> Option<f64> {
    for &i in movable {
        let session = match index.session(&current[i].session_id) {
            Some(s) => s,
            None => continue,
        };
        let original = current[i].clone();
        neighborhood
            .occupancy
            .release(&original.time_slot_id, &original.venue_id);
        neighborhood.tracker.retract(current, i);

        for slot in index.input.available_slots() {
            for venue in &index.input.venues {
                if venue.id == original.venue_id && slot.id == original.time_slot_id {
                    continue;
                }
                if !validate_assignment(session, venue, slot, &neighborhood.occupancy).valid {
                    continue;
                }

                current[i].venue_id = venue.id.clone();
                current[i].time_slot_id = slot.id.clone();
                neighborhood.tracker.insert(current, i);
                let score = neighborhood.tracker.score();
                if score > current_score + IMPROVEMENT_EPSILON {
                    neighborhood.occupancy.claim(&slot.id, &venue.id);
                    return Some(score);
                }
                neighborhood.tracker.retract(current, i);
            }
        }

        neighborhood
            .occupancy
            .claim(&original.time_slot_id, &original.venue_id);
        current[i] = original;
        neighborhood.tracker.insert(current, i);
    }
    None
}

fn swap_cells(assignments: &mut [Assignment], i: usize, j: usize) {
    let (venue_i, slot_i) = (
        assignments[i].venue_id.clone(),
        assignments[i].time_slot_id.clone(),
    );
    assignments[i].venue_id = assignments[j].venue_id.clone();
    assignments[i].time_slot_id = assignments[j].time_slot_id.clone();
    assignments[j].venue_id = venue_i;
    assignments[j].time_slot_id = slot_i;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::build_overlap_map;
    use crate::test_support::{input, locked_session, overlap, session, slot, venue};

    #[test]
    fn test_swap_fixes_capacity_mismatch() {
        let snapshot = input(
            vec![session("big", 90), session("small", 15)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![],
        );
        let index = snapshot.index();
        let config = SchedulerConfig::default();
        let start = vec![
            Assignment::new("big", "room", "am"),
            Assignment::new("small", "hall", "pm"),
        ];

        let outcome = optimize_schedule(start, &index, &OverlapMap::default(), &config);

        assert!(outcome.final_score > outcome.initial_score);
        assert!(outcome.swaps_accepted >= 1);
        let big = outcome
            .assignments
            .iter()
            .find(|a| a.session_id == "big")
            .unwrap();
        assert_eq!(big.venue_id, "hall");
    }

    #[test]
    fn test_move_separates_overlapping_sessions() {
        let snapshot = input(
            vec![session("a", 80), session("b", 16)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![overlap("a", "b", 90.0)],
        );
        let index = snapshot.index();
        let map = build_overlap_map(&snapshot.voter_overlap);
        let start = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("b", "room", "am"),
        ];

        let outcome = optimize_schedule(start, &index, &map, &SchedulerConfig::default());

        assert_ne!(
            outcome.assignments[0].time_slot_id,
            outcome.assignments[1].time_slot_id
        );
        assert!((outcome.final_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_locked_sessions_never_move() {
        let snapshot = input(
            vec![locked_session("pinned", 90, "room", "am"), session("free", 15)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![],
        );
        let index = snapshot.index();
        let start = vec![
            Assignment::new("pinned", "room", "am"),
            Assignment::new("free", "hall", "pm"),
        ];

        let outcome = optimize_schedule(start, &index, &OverlapMap::default(), &SchedulerConfig::default());

        assert_eq!(outcome.assignments[0], Assignment::new("pinned", "room", "am"));
        assert!(outcome.final_score >= outcome.initial_score);
    }

    #[test]
    fn test_locked_without_slot_reference_never_moves() {
        let mut floating = session("floating", 90);
        floating.is_locked = true;
        floating.venue_id = Some("room".to_string());
        let snapshot = input(
            vec![floating, session("free", 15)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![],
        );
        let index = snapshot.index();
        let start = vec![
            Assignment::new("floating", "room", "am"),
            Assignment::new("free", "hall", "pm"),
        ];

        let outcome = optimize_schedule(start, &index, &OverlapMap::default(), &SchedulerConfig::default());

        assert_eq!(outcome.assignments[0], Assignment::new("floating", "room", "am"));
        assert_eq!(outcome.swaps_accepted, 0);
    }

    #[test]
    fn test_final_score_matches_full_rescore() {
        let sessions: Vec<_> = (0..8u32).map(|i| session(&format!("s{}", i), 10 + i * 12)).collect();
        let overlaps = vec![
            overlap("s0", "s1", 60.0),
            overlap("s2", "s3", 45.0),
            overlap("s4", "s7", 90.0),
        ];
        let snapshot = input(
            sessions,
            vec![venue("hall", 100), venue("room", 40), venue("nook", 15)],
            vec![slot("am", 9), slot("mid", 11), slot("pm", 14)],
            overlaps,
        );
        let index = snapshot.index();
        let map = build_overlap_map(&snapshot.voter_overlap);
        let config = SchedulerConfig {
            target_quality_score: 100.0,
            ..SchedulerConfig::default()
        };
        let cells = [
            ("nook", "am"),
            ("room", "am"),
            ("hall", "am"),
            ("nook", "mid"),
            ("room", "mid"),
            ("hall", "mid"),
            ("nook", "pm"),
            ("room", "pm"),
        ];
        let start: Vec<Assignment> = cells
            .iter()
            .enumerate()
            .map(|(i, (v, t))| Assignment::new(format!("s{}", i), *v, *t))
            .collect();

        let outcome = optimize_schedule(start, &index, &map, &config);

        let rescored = calculate_quality_score_indexed(&outcome.assignments, &index, &map, &config);
        assert!((rescored.score - outcome.final_score).abs() < 1e-9);
        assert!(outcome.final_score > outcome.initial_score);
        let occupancy = build_slot_occupancy(&outcome.assignments);
        let claimed: usize = ["am", "mid", "pm"].iter().map(|t| occupancy.venues_in_use(t)).sum();
        assert_eq!(claimed, outcome.assignments.len());
    }

    #[test]
    fn test_zero_iterations_returns_input() {
        let snapshot = input(
            vec![session("big", 90), session("small", 15)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9)],
            vec![],
        );
        let config = SchedulerConfig {
            max_iterations: 0,
            ..SchedulerConfig::default()
        };
        let start = vec![
            Assignment::new("big", "room", "am"),
            Assignment::new("small", "hall", "am"),
        ];
        let outcome = optimize_schedule(start.clone(), &snapshot.index(), &OverlapMap::default(), &config);
        assert_eq!(outcome.assignments, start);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.final_score, outcome.initial_score);
    }

    #[test]
    fn test_target_score_stops_early() {
        let snapshot = input(
            vec![session("big", 90), session("small", 15)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9)],
            vec![],
        );
        let config = SchedulerConfig {
            target_quality_score: 0.0,
            ..SchedulerConfig::default()
        };
        let start = vec![
            Assignment::new("big", "room", "am"),
            Assignment::new("small", "hall", "am"),
        ];
        let outcome = optimize_schedule(start.clone(), &snapshot.index(), &OverlapMap::default(), &config);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.assignments, start);
    }
}
