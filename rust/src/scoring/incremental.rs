//! Quality score kept up to date while assignments are moved one at a time.
//!
//! Local search evaluates many neighbors that differ from the current schedule
//! by one or two assignments. Rebuilding the whole score costs O(n²) per
//! neighbor; the tracker instead retracts the moved assignments, lets the
//! caller change them, and inserts them again, touching only the sessions that
//! share the old and new slots.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::{SchedulerConfig, ScoringWeights};
use crate::constraints::{check_venue_compatibility, estimate_attendance, OverlapMap};
use crate::models::{Assignment, InputIndex};

use super::quality::{balance_score, capacity_fit, unavailable_slot_ids, ScoreBreakdown};

/// Running sub-totals of the quality function over an assignment list.
///
/// Indices refer to positions in the slice passed to `new`; the caller must
/// keep that order and call `retract(i)` before changing assignment `i`, then
/// `insert(i)` afterwards.
#[derive(Clone, Debug)]
pub struct QualityTracker<'a> {
    index: &'a InputIndex<'a>,
    overlap_map: &'a OverlapMap,
    weights: ScoringWeights,
    available: Vec<&'a str>,
    available_ids: FxHashSet<&'a str>,
    unavailable: FxHashSet<&'a str>,
    /// Resolved assignments per slot
    slot_members: FxHashMap<String, Vec<usize>>,
    /// Assignments per slot that count toward demand balance
    slot_loads: FxHashMap<String, usize>,
    resolved: usize,
    overlap_penalty: f64,
    capacity_total: f64,
    feature_total: f64,
}

impl<'a> QualityTracker<'a> {
    pub fn new(
        assignments: &[Assignment],
        index: &'a InputIndex<'a>,
        overlap_map: &'a OverlapMap,
        config: &SchedulerConfig,
    ) -> Self {
        let available: Vec<&'a str> = index.input.available_slots().map(|s| s.id.as_str()).collect();
        let mut tracker = Self {
            index,
            overlap_map,
            weights: config.scoring_weights.clone(),
            available_ids: available.iter().copied().collect(),
            available,
            unavailable: unavailable_slot_ids(index.input),
            slot_members: FxHashMap::default(),
            slot_loads: FxHashMap::default(),
            resolved: 0,
            overlap_penalty: 0.0,
            capacity_total: 0.0,
            feature_total: 0.0,
        };
        for i in 0..assignments.len() {
            tracker.insert(assignments, i);
        }
        tracker
    }

    /// Capacity and feature terms of an assignment whose session and venue resolve.
    fn contribution(&self, assignment: &Assignment) -> Option<(f64, f64)> {
        let session = self.index.session(&assignment.session_id)?;
        let venue = self.index.venue(&assignment.venue_id)?;
        let capacity = capacity_fit(estimate_attendance(session), venue.capacity);
        let feature = check_venue_compatibility(session, venue)
            .satisfied_fraction(session.required_features.len());
        Some((capacity, feature))
    }

    /// Add assignment `i` in its current cell.
    pub fn insert(&mut self, assignments: &[Assignment], i: usize) {
        let assignment = &assignments[i];
        if !self.unavailable.contains(assignment.time_slot_id.as_str()) {
            *self
                .slot_loads
                .entry(assignment.time_slot_id.clone())
                .or_insert(0) += 1;
        }
        let Some((capacity, feature)) = self.contribution(assignment) else {
            return;
        };

        let members = self
            .slot_members
            .entry(assignment.time_slot_id.clone())
            .or_default();
        let penalty: f64 = members
            .iter()
            .map(|&j| {
                self.overlap_map
                    .get(&assignment.session_id, &assignments[j].session_id)
                    / 100.0
            })
            .sum();
        members.push(i);

        self.overlap_penalty += penalty;
        self.capacity_total += capacity;
        self.feature_total += feature;
        self.resolved += 1;
    }

    /// Remove assignment `i` from its current cell.
    pub fn retract(&mut self, assignments: &[Assignment], i: usize) {
        let assignment = &assignments[i];
        if let Some(load) = self.slot_loads.get_mut(assignment.time_slot_id.as_str()) {
            *load = load.saturating_sub(1);
        }
        let Some((capacity, feature)) = self.contribution(assignment) else {
            return;
        };
        let Some(members) = self.slot_members.get_mut(assignment.time_slot_id.as_str()) else {
            return;
        };
        members.retain(|&j| j != i);
        let penalty: f64 = members
            .iter()
            .map(|&j| {
                self.overlap_map
                    .get(&assignment.session_id, &assignments[j].session_id)
                    / 100.0
            })
            .sum();

        self.overlap_penalty -= penalty;
        self.capacity_total -= capacity;
        self.feature_total -= feature;
        self.resolved -= 1;
    }

    fn loads(&self) -> Vec<usize> {
        let mut loads: Vec<usize> = self
            .available
            .iter()
            .map(|id| self.slot_loads.get(*id).copied().unwrap_or(0))
            .collect();
        loads.extend(
            self.slot_loads
                .iter()
                .filter(|(id, load)| **load > 0 && !self.available_ids.contains(id.as_str()))
                .map(|(_, load)| *load),
        );
        loads
    }

    pub fn breakdown(&self) -> ScoreBreakdown {
        if self.resolved == 0 {
            return ScoreBreakdown::default();
        }
        let n = self.resolved as f64;
        ScoreBreakdown {
            conflict_avoidance: (1.0 - self.overlap_penalty / n).clamp(0.0, 1.0),
            capacity_fit: self.capacity_total / n,
            feature_compatibility: self.feature_total / n,
            demand_balance: balance_score(&self.loads()),
        }
    }

    /// Current score on the 0-100 scale; 0 with no resolvable assignments.
    pub fn score(&self) -> f64 {
        if self.resolved == 0 {
            return 0.0;
        }
        self.breakdown().weighted(&self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::build_overlap_map;
    use crate::scoring::calculate_quality_score_indexed;
    use crate::test_support::{equipped_venue, input, overlap, session, slot, venue, with_features};

    #[test]
    fn test_initial_score_matches_full_rescore() {
        let snapshot = input(
            vec![
                with_features(session("a", 80), &["stage"]),
                session("b", 16),
                session("c", 40),
            ],
            vec![equipped_venue("hall", 100, &["stage"]), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![overlap("a", "b", 70.0), overlap("b", "c", 20.0)],
        );
        let index = snapshot.index();
        let map = build_overlap_map(&snapshot.voter_overlap);
        let config = SchedulerConfig::default();
        let assignments = vec![
            Assignment::new("a", "room", "am"),
            Assignment::new("b", "hall", "am"),
            Assignment::new("c", "hall", "pm"),
        ];

        let tracker = QualityTracker::new(&assignments, &index, &map, &config);
        let full = calculate_quality_score_indexed(&assignments, &index, &map, &config);
        assert!((tracker.score() - full.score).abs() < 1e-9);
    }

    #[test]
    fn test_move_and_swap_track_full_rescore() {
        let snapshot = input(
            vec![session("a", 80), session("b", 16), session("c", 40), session("d", 5)],
            vec![venue("hall", 100), venue("room", 20)],
            vec![slot("am", 9), slot("pm", 14), slot("late", 16)],
            vec![overlap("a", "b", 90.0), overlap("c", "d", 35.0), overlap("a", "c", 10.0)],
        );
        let index = snapshot.index();
        let map = build_overlap_map(&snapshot.voter_overlap);
        let config = SchedulerConfig::default();
        let mut assignments = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("b", "room", "am"),
            Assignment::new("c", "hall", "pm"),
            Assignment::new("d", "room", "pm"),
        ];
        let mut tracker = QualityTracker::new(&assignments, &index, &map, &config);

        // move b to late
        tracker.retract(&assignments, 1);
        assignments[1].time_slot_id = "late".to_string();
        tracker.insert(&assignments, 1);
        let full = calculate_quality_score_indexed(&assignments, &index, &map, &config);
        assert!((tracker.score() - full.score).abs() < 1e-9);

        // swap a and d
        tracker.retract(&assignments, 0);
        tracker.retract(&assignments, 3);
        let cell_a = (assignments[0].venue_id.clone(), assignments[0].time_slot_id.clone());
        assignments[0].venue_id = assignments[3].venue_id.clone();
        assignments[0].time_slot_id = assignments[3].time_slot_id.clone();
        assignments[3].venue_id = cell_a.0;
        assignments[3].time_slot_id = cell_a.1;
        tracker.insert(&assignments, 0);
        tracker.insert(&assignments, 3);
        let full = calculate_quality_score_indexed(&assignments, &index, &map, &config);
        assert!((tracker.score() - full.score).abs() < 1e-9);
        assert_eq!(tracker.breakdown().demand_balance, full.breakdown.demand_balance);
    }

    #[test]
    fn test_unresolved_assignments_only_count_toward_balance() {
        let snapshot = input(
            vec![session("a", 80)],
            vec![venue("hall", 100)],
            vec![slot("am", 9), slot("pm", 14)],
            vec![],
        );
        let index = snapshot.index();
        let map = OverlapMap::default();
        let config = SchedulerConfig::default();
        let assignments = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("ghost", "hall", "pm"),
        ];
        let tracker = QualityTracker::new(&assignments, &index, &map, &config);
        let full = calculate_quality_score_indexed(&assignments, &index, &map, &config);
        assert!((tracker.score() - full.score).abs() < 1e-9);
        assert!((tracker.score() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tracker_scores_zero() {
        let snapshot = input(vec![], vec![], vec![slot("am", 9)], vec![]);
        let index = snapshot.index();
        let map = OverlapMap::default();
        let tracker = QualityTracker::new(&[], &index, &map, &SchedulerConfig::default());
        assert_eq!(tracker.score(), 0.0);
    }
}
