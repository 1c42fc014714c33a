//! Per-placement feasibility checks and demand estimation.

use rustc_hash::FxHashSet;

use crate::models::{Session, TimeSlot, Venue};

use super::occupancy::{is_slot_venue_available, SlotOccupancy};

/// Expected attendees contributed by each vote.
pub const ATTENDEES_PER_VOTE: f64 = 1.0;
/// Expected attendees contributed by each favorite.
pub const ATTENDEES_PER_FAVORITE: f64 = 0.5;

/// Whether a session fits inside a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DurationFit {
    pub fits: bool,
    pub session_minutes: i64,
    pub slot_minutes: i64,
}

/// Feature comparison between a session and a venue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VenueCompatibility {
    pub compatible: bool,
    /// Required features the venue lacks, in the session's order
    pub missing_features: Vec<String>,
}

impl VenueCompatibility {
    /// Share of required features available (1.0 when nothing is required).
    pub fn satisfied_fraction(&self, required: usize) -> f64 {
        if required == 0 {
            return 1.0;
        }
        let missing = self.missing_features.len().min(required);
        (required - missing) as f64 / required as f64
    }
}

/// Outcome of a composite placement check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentValidity {
    pub valid: bool,
    pub reason: Option<String>,
}

impl AssignmentValidity {
    fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn rejected(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Exact containment: the session may not run past the end of the slot.
pub fn check_duration_fit(session: &Session, slot: &TimeSlot) -> DurationFit {
    let session_minutes = i64::from(session.duration_minutes);
    let slot_minutes = slot.span_minutes();
    DurationFit {
        fits: slot_minutes > 0 && session_minutes <= slot_minutes,
        session_minutes,
        slot_minutes,
    }
}

/// Compare required features against what the venue offers.
///
/// Feature names match case-insensitively. Incompatibility is advisory: it
/// lowers the score of a placement but never excludes the venue.
pub fn check_venue_compatibility(session: &Session, venue: &Venue) -> VenueCompatibility {
    let offered: FxHashSet<String> = venue
        .features
        .iter()
        .map(|f| f.trim().to_lowercase())
        .collect();
    let missing_features: Vec<String> = session
        .required_features
        .iter()
        .filter(|f| !offered.contains(&f.trim().to_lowercase()))
        .cloned()
        .collect();
    VenueCompatibility {
        compatible: missing_features.is_empty(),
        missing_features,
    }
}

/// Expected headcount derived from votes and favorites.
pub fn estimate_attendance(session: &Session) -> f64 {
    f64::from(session.votes) * ATTENDEES_PER_VOTE
        + f64::from(session.favorites) * ATTENDEES_PER_FAVORITE
}

/// Duration fit, slot availability and cell occupancy in one check.
///
/// Feature compatibility is not checked here; it only affects scores.
pub fn validate_assignment(
    session: &Session,
    venue: &Venue,
    slot: &TimeSlot,
    occupancy: &SlotOccupancy,
) -> AssignmentValidity {
    if !slot.is_available {
        return AssignmentValidity::rejected(format!("time slot {} is not available", slot.id));
    }
    let fit = check_duration_fit(session, slot);
    if !fit.fits {
        return AssignmentValidity::rejected(format!(
            "session {} needs {} minutes but slot {} spans {}",
            session.id, fit.session_minutes, slot.id, fit.slot_minutes
        ));
    }
    if !is_slot_venue_available(&slot.id, &venue.id, occupancy) {
        return AssignmentValidity::rejected(format!(
            "venue {} is already booked during slot {}",
            venue.id, slot.id
        ));
    }
    AssignmentValidity::ok()
}
