//! Constraint engine: pure lookups and feasibility checks over the input model.
//!
//! Nothing in this module fails. Missing lookups fall back to "no conflict",
//! "0% overlap" or "feature-incompatible but still valid".

mod checks;
mod conflicts;
mod occupancy;
mod overlap;

pub use checks::{
    check_duration_fit, check_venue_compatibility, estimate_attendance, validate_assignment,
    AssignmentValidity, DurationFit, VenueCompatibility, ATTENDEES_PER_FAVORITE,
    ATTENDEES_PER_VOTE,
};
pub use conflicts::{find_all_conflicts, Conflict};
pub use occupancy::{
    build_slot_occupancy, build_slot_occupancy_excluding, is_slot_venue_available, SlotOccupancy,
};
pub use overlap::{build_overlap_map, get_overlap, OverlapMap};
