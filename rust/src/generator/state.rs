//! Mutable state of one `generate()` run.

use rustc_hash::FxHashSet;

use crate::constraints::SlotOccupancy;
use crate::models::{Assignment, ScheduleWarning};

/// Assignments, occupancy and warnings accumulated across phases.
///
/// Created fresh for every run and consumed when the result is assembled.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    pub assignments: Vec<Assignment>,
    /// Kept in step with `assignments` while placing
    pub occupancy: SlotOccupancy,
    pub warnings: Vec<ScheduleWarning>,
    placed: FxHashSet<String>,
    pub locked_count: usize,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a placement. Returns false if the cell was already claimed; the
    /// assignment is recorded either way.
    pub fn place(&mut self, assignment: Assignment) -> bool {
        let fresh = self
            .occupancy
            .claim(&assignment.time_slot_id, &assignment.venue_id);
        self.placed.insert(assignment.session_id.clone());
        self.assignments.push(assignment);
        fresh
    }

    pub fn is_placed(&self, session_id: &str) -> bool {
        self.placed.contains(session_id)
    }

    /// Session currently holding a cell, if any.
    pub fn holder_of(&self, venue_id: &str, slot_id: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.venue_id == venue_id && a.time_slot_id == slot_id)
            .map(|a| a.session_id.as_str())
    }

    pub fn warn(&mut self, warning: ScheduleWarning) {
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_tracks_occupancy() {
        let mut state = RunState::new();
        assert!(state.place(Assignment::new("s1", "hall", "am")));
        assert!(state.is_placed("s1"));
        assert!(!state.is_placed("s2"));
        assert!(state.occupancy.is_claimed("am", "hall"));
        assert_eq!(state.holder_of("hall", "am"), Some("s1"));
        assert_eq!(state.holder_of("hall", "pm"), None);
    }

    #[test]
    fn test_double_claim_is_reported_but_recorded() {
        let mut state = RunState::new();
        state.place(Assignment::new("s1", "hall", "am"));
        assert!(!state.place(Assignment::new("s2", "hall", "am")));
        assert_eq!(state.assignments.len(), 2);
        assert!(state.is_placed("s2"));
    }
}
