//! Core data types for the schedule generator.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use rustc_hash::FxHashMap;
use std::fmt;

use crate::scoring::ScoreBreakdown;

/// A proposed talk, workshop or panel.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub title: String,
    #[pyo3(get, set)]
    pub duration_minutes: u32,
    #[pyo3(get, set)]
    pub is_locked: bool,
    /// Fixed venue when locked
    #[pyo3(get, set)]
    pub venue_id: Option<String>,
    /// Fixed time slot when locked
    #[pyo3(get, set)]
    pub time_slot_id: Option<String>,
    #[pyo3(get, set)]
    pub votes: u32,
    #[pyo3(get, set)]
    pub favorites: u32,
    #[pyo3(get, set)]
    pub required_features: Vec<String>,
    /// Free-form tag: "talk", "workshop", "panel", ...
    #[pyo3(get, set)]
    pub format: String,
}

impl Session {
    /// Locked session carrying both a venue and a slot reference.
    pub fn pinned_cell(&self) -> Option<(&str, &str)> {
        if !self.is_locked {
            return None;
        }
        match (&self.venue_id, &self.time_slot_id) {
            (Some(venue_id), Some(slot_id)) => Some((venue_id.as_str(), slot_id.as_str())),
            _ => None,
        }
    }
}

#[pymethods]
impl Session {
    #[new]
    #[pyo3(signature = (
        id,
        title,
        duration_minutes,
        votes=0,
        favorites=0,
        required_features=Vec::new(),
        format="talk".to_string(),
        is_locked=false,
        venue_id=None,
        time_slot_id=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        id: String,
        title: String,
        duration_minutes: u32,
        votes: u32,
        favorites: u32,
        required_features: Vec<String>,
        format: String,
        is_locked: bool,
        venue_id: Option<String>,
        time_slot_id: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            duration_minutes,
            is_locked,
            venue_id,
            time_slot_id,
            votes,
            favorites,
            required_features,
            format,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Session(id={:?}, duration_minutes={}, votes={}, locked={})",
            self.id, self.duration_minutes, self.votes, self.is_locked
        )
    }
}

/// A room with a seat capacity and a set of technical features.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Venue {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub name: String,
    #[pyo3(get, set)]
    pub capacity: u32,
    #[pyo3(get, set)]
    pub features: Vec<String>,
}

#[pymethods]
impl Venue {
    #[new]
    #[pyo3(signature = (id, name, capacity, features=Vec::new()))]
    fn new(id: String, name: String, capacity: u32, features: Vec<String>) -> Self {
        Self {
            id,
            name,
            capacity,
            features,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Venue(id={:?}, capacity={}, features={})",
            self.id,
            self.capacity,
            self.features.len()
        )
    }
}

/// A bounded period of the event.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSlot {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub start_time: NaiveDateTime,
    #[pyo3(get, set)]
    pub end_time: NaiveDateTime,
    /// Breaks and ceremonies are unavailable
    #[pyo3(get, set)]
    pub is_available: bool,
}

impl TimeSlot {
    /// Length of the slot; zero or negative for malformed slots.
    pub fn span_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

#[pymethods]
impl TimeSlot {
    #[new]
    #[pyo3(signature = (id, start_time, end_time, is_available=true))]
    fn new(
        id: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        is_available: bool,
    ) -> Self {
        Self {
            id,
            start_time,
            end_time,
            is_available,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "TimeSlot(id={:?}, start={}, end={}, available={})",
            self.id, self.start_time, self.end_time, self.is_available
        )
    }
}

/// Share of interested audience two sessions have in common.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct VoterOverlap {
    #[pyo3(get, set)]
    pub session_a_id: String,
    #[pyo3(get, set)]
    pub session_b_id: String,
    /// 0-100
    #[pyo3(get, set)]
    pub overlap_percentage: f64,
}

#[pymethods]
impl VoterOverlap {
    #[new]
    fn new(session_a_id: String, session_b_id: String, overlap_percentage: f64) -> Self {
        Self {
            session_a_id,
            session_b_id,
            overlap_percentage,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "VoterOverlap({:?}, {:?}, {}%)",
            self.session_a_id, self.session_b_id, self.overlap_percentage
        )
    }
}

/// A committed (session, venue, time slot) placement.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Assignment {
    #[pyo3(get, set)]
    pub session_id: String,
    #[pyo3(get, set)]
    pub venue_id: String,
    #[pyo3(get, set)]
    pub time_slot_id: String,
}

impl Assignment {
    pub fn new(
        session_id: impl Into<String>,
        venue_id: impl Into<String>,
        time_slot_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            venue_id: venue_id.into(),
            time_slot_id: time_slot_id.into(),
        }
    }

    pub fn same_cell(&self, other: &Assignment) -> bool {
        self.venue_id == other.venue_id && self.time_slot_id == other.time_slot_id
    }
}

#[pymethods]
impl Assignment {
    #[new]
    fn py_new(session_id: String, venue_id: String, time_slot_id: String) -> Self {
        Self::new(session_id, venue_id, time_slot_id)
    }

    fn __repr__(&self) -> String {
        format!(
            "Assignment(session={:?}, venue={:?}, slot={:?})",
            self.session_id, self.venue_id, self.time_slot_id
        )
    }
}

#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningType {
    Unassigned,
    Conflict,
    Capacity,
    Feature,
}

impl fmt::Display for WarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unassigned => "unassigned",
            Self::Conflict => "conflict",
            Self::Capacity => "capacity",
            Self::Feature => "feature",
        };
        f.write_str(name)
    }
}

#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// Advisory finding attached to a result. Never blocks generation.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleWarning {
    #[pyo3(get)]
    pub warning_type: WarningType,
    #[pyo3(get)]
    pub severity: WarningSeverity,
    #[pyo3(get)]
    pub session_ids: Vec<String>,
    #[pyo3(get)]
    pub message: String,
}

impl ScheduleWarning {
    pub fn new(
        warning_type: WarningType,
        severity: WarningSeverity,
        session_ids: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            warning_type,
            severity,
            session_ids,
            message: message.into(),
        }
    }

    pub fn mentions(&self, session_id: &str) -> bool {
        self.session_ids.iter().any(|id| id == session_id)
    }
}

#[pymethods]
impl ScheduleWarning {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleWarning(type={}, severity={}, sessions={:?}, message={:?})",
            self.warning_type, self.severity, self.session_ids, self.message
        )
    }
}

/// Summary figures of a generated schedule.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleMetrics {
    #[pyo3(get)]
    pub total_sessions: usize,
    #[pyo3(get)]
    pub assigned_sessions: usize,
    #[pyo3(get)]
    pub locked_sessions: usize,
    #[pyo3(get)]
    pub conflict_count: usize,
    /// Mean of min(attendance / capacity, 1) over assignments
    #[pyo3(get)]
    pub avg_capacity_utilization: f64,
    /// 1 - stddev/mean of per-slot session counts, clamped at 0
    #[pyo3(get)]
    pub demand_balance_score: f64,
    /// Quality score after greedy placement, before local search
    #[pyo3(get)]
    pub greedy_quality_score: f64,
    #[pyo3(get)]
    pub optimizer_iterations: u32,
}

#[pymethods]
impl ScheduleMetrics {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleMetrics(assigned={}/{}, locked={}, conflicts={}, utilization={:.2}, balance={:.2})",
            self.assigned_sessions,
            self.total_sessions,
            self.locked_sessions,
            self.conflict_count,
            self.avg_capacity_utilization,
            self.demand_balance_score
        )
    }
}

/// Outcome of one `generate()` call.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleResult {
    /// True iff every session received a placement
    #[pyo3(get)]
    pub success: bool,
    #[pyo3(get)]
    pub assignments: Vec<Assignment>,
    #[pyo3(get)]
    pub quality_score: f64,
    #[pyo3(get)]
    pub breakdown: ScoreBreakdown,
    #[pyo3(get)]
    pub metrics: ScheduleMetrics,
    #[pyo3(get)]
    pub warnings: Vec<ScheduleWarning>,
    #[pyo3(get)]
    pub unassigned_sessions: Vec<String>,
    #[pyo3(get)]
    pub execution_time_ms: f64,
}

impl ScheduleResult {
    pub fn warnings_of(&self, warning_type: WarningType) -> impl Iterator<Item = &ScheduleWarning> {
        self.warnings
            .iter()
            .filter(move |w| w.warning_type == warning_type)
    }

    pub fn assignment_for(&self, session_id: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.session_id == session_id)
    }
}

#[pymethods]
impl ScheduleResult {
    fn __repr__(&self) -> String {
        format!(
            "ScheduleResult(success={}, assignments={}, quality_score={:.2}, warnings={})",
            self.success,
            self.assignments.len(),
            self.quality_score,
            self.warnings.len()
        )
    }
}

/// Snapshot handed to the generator by the surrounding system.
#[derive(Clone, Debug, Default)]
pub struct ScheduleInput {
    pub sessions: Vec<Session>,
    pub venues: Vec<Venue>,
    pub time_slots: Vec<TimeSlot>,
    pub voter_overlap: Vec<VoterOverlap>,
}

impl ScheduleInput {
    pub fn available_slots(&self) -> impl Iterator<Item = &TimeSlot> {
        self.time_slots.iter().filter(|slot| slot.is_available)
    }

    pub fn index(&self) -> InputIndex<'_> {
        InputIndex::new(self)
    }
}

/// Id lookups over a borrowed input snapshot.
///
/// Duplicate ids resolve to the first entity with that id.
#[derive(Clone, Debug)]
pub struct InputIndex<'a> {
    pub input: &'a ScheduleInput,
    sessions: FxHashMap<&'a str, &'a Session>,
    venues: FxHashMap<&'a str, &'a Venue>,
    time_slots: FxHashMap<&'a str, &'a TimeSlot>,
}

impl<'a> InputIndex<'a> {
    pub fn new(input: &'a ScheduleInput) -> Self {
        let mut sessions = FxHashMap::default();
        for session in &input.sessions {
            sessions.entry(session.id.as_str()).or_insert(session);
        }
        let mut venues = FxHashMap::default();
        for venue in &input.venues {
            venues.entry(venue.id.as_str()).or_insert(venue);
        }
        let mut time_slots = FxHashMap::default();
        for slot in &input.time_slots {
            time_slots.entry(slot.id.as_str()).or_insert(slot);
        }
        Self {
            input,
            sessions,
            venues,
            time_slots,
        }
    }

    #[inline]
    pub fn session(&self, id: &str) -> Option<&'a Session> {
        self.sessions.get(id).copied()
    }

    #[inline]
    pub fn venue(&self, id: &str) -> Option<&'a Venue> {
        self.venues.get(id).copied()
    }

    #[inline]
    pub fn time_slot(&self, id: &str) -> Option<&'a TimeSlot> {
        self.time_slots.get(id).copied()
    }
}
