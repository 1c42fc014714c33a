//! Venue occupancy per time slot.

use rustc_hash::FxHashMap;

use crate::models::Assignment;

/// Time-slot id -> venue id -> number of assignments holding that cell.
///
/// Claims are counted so that releasing one of two locked sessions sharing a
/// cell leaves the cell taken.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SlotOccupancy {
    claimed: FxHashMap<String, FxHashMap<String, usize>>,
}

impl SlotOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a cell as taken. Returns false if it was already claimed.
    pub fn claim(&mut self, slot_id: &str, venue_id: &str) -> bool {
        let holders = self
            .claimed
            .entry(slot_id.to_string())
            .or_default()
            .entry(venue_id.to_string())
            .or_insert(0);
        *holders += 1;
        *holders == 1
    }

    /// Drop one claim on a cell. Returns false if it was not claimed.
    pub fn release(&mut self, slot_id: &str, venue_id: &str) -> bool {
        let Some(venues) = self.claimed.get_mut(slot_id) else {
            return false;
        };
        let Some(holders) = venues.get_mut(venue_id) else {
            return false;
        };
        *holders -= 1;
        if *holders == 0 {
            venues.remove(venue_id);
        }
        true
    }

    #[inline]
    pub fn is_claimed(&self, slot_id: &str, venue_id: &str) -> bool {
        self.claimed
            .get(slot_id)
            .is_some_and(|venues| venues.contains_key(venue_id))
    }

    /// Number of venues in use during a slot.
    pub fn venues_in_use(&self, slot_id: &str) -> usize {
        self.claimed.get(slot_id).map_or(0, |venues| venues.len())
    }
}

/// Fold assignments into the occupancy index.
pub fn build_slot_occupancy(assignments: &[Assignment]) -> SlotOccupancy {
    build_slot_occupancy_excluding(assignments, &[])
}

/// Occupancy as it would be without the given sessions' assignments.
pub fn build_slot_occupancy_excluding(
    assignments: &[Assignment],
    excluded_session_ids: &[&str],
) -> SlotOccupancy {
    let mut occupancy = SlotOccupancy::new();
    for assignment in assignments {
        if excluded_session_ids.contains(&assignment.session_id.as_str()) {
            continue;
        }
        occupancy.claim(&assignment.time_slot_id, &assignment.venue_id);
    }
    occupancy
}

/// True iff the venue is not claimed in that slot.
#[inline]
pub fn is_slot_venue_available(slot_id: &str, venue_id: &str, occupancy: &SlotOccupancy) -> bool {
    !occupancy.is_claimed(slot_id, venue_id)
}
