//! Builders shared by unit tests.

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{ScheduleInput, Session, TimeSlot, Venue, VoterOverlap};

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 12)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Unlocked 45-minute talk whose expected attendance equals `votes`.
pub fn session(id: &str, votes: u32) -> Session {
    Session {
        id: id.to_string(),
        title: format!("Session {}", id),
        duration_minutes: 45,
        is_locked: false,
        venue_id: None,
        time_slot_id: None,
        votes,
        favorites: 0,
        required_features: vec![],
        format: "talk".to_string(),
    }
}

pub fn locked_session(id: &str, votes: u32, venue_id: &str, slot_id: &str) -> Session {
    Session {
        is_locked: true,
        venue_id: Some(venue_id.to_string()),
        time_slot_id: Some(slot_id.to_string()),
        ..session(id, votes)
    }
}

pub fn with_features(mut session: Session, features: &[&str]) -> Session {
    session.required_features = features.iter().map(|f| f.to_string()).collect();
    session
}

pub fn venue(id: &str, capacity: u32) -> Venue {
    Venue {
        id: id.to_string(),
        name: format!("Venue {}", id),
        capacity,
        features: vec![],
    }
}

pub fn equipped_venue(id: &str, capacity: u32, features: &[&str]) -> Venue {
    Venue {
        features: features.iter().map(|f| f.to_string()).collect(),
        ..venue(id, capacity)
    }
}

/// Available one-hour slot starting at `hour`.
pub fn slot(id: &str, hour: u32) -> TimeSlot {
    TimeSlot {
        id: id.to_string(),
        start_time: at(hour, 0),
        end_time: at(hour + 1, 0),
        is_available: true,
    }
}

pub fn overlap(a: &str, b: &str, pct: f64) -> VoterOverlap {
    VoterOverlap {
        session_a_id: a.to_string(),
        session_b_id: b.to_string(),
        overlap_percentage: pct,
    }
}

pub fn input(
    sessions: Vec<Session>,
    venues: Vec<Venue>,
    time_slots: Vec<TimeSlot>,
    voter_overlap: Vec<VoterOverlap>,
) -> ScheduleInput {
    ScheduleInput {
        sessions,
        venues,
        time_slots,
        voter_overlap,
    }
}
