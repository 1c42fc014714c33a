//! Conference schedule generator.
//!
//! Assigns sessions to (venue, time slot) cells, honoring locked placements,
//! avoiding concurrent sessions with shared audiences and matching expected
//! attendance to venue capacity. Exposed to Python as `confsched.rust`.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod config;
pub mod constraints;
pub mod generator;
pub mod logging;
pub mod models;
pub mod scoring;

#[cfg(test)]
mod test_support;

pub use config::{PriorityWeights, SchedulerConfig, ScoringWeights};
pub use constraints::{build_overlap_map, OverlapMap};
pub use generator::{ScheduleGenerator, SchedulerError};
pub use models::{
    Assignment, ScheduleInput, ScheduleMetrics, ScheduleResult, ScheduleWarning, Session,
    TimeSlot, Venue, VoterOverlap, WarningSeverity, WarningType,
};
pub use scoring::{QualityScore, ScoreBreakdown};

impl From<SchedulerError> for PyErr {
    fn from(err: SchedulerError) -> PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

/// Generate a schedule for one event snapshot.
///
/// # Arguments
/// * `sessions` - Sessions to place, locked ones included
/// * `venues` - Rooms that can host sessions
/// * `time_slots` - Event periods; unavailable ones are never used for new placements
/// * `voter_overlap` - Pairwise audience overlap percentages
/// * `config` - Weights and limits; defaults when omitted
///
/// # Returns
/// * ScheduleResult with assignments, score, metrics and warnings
///
/// # Raises
/// * ValueError if the configuration is invalid
#[pyfunction]
#[pyo3(signature = (sessions, venues, time_slots, voter_overlap=Vec::new(), config=None))]
fn generate_schedule(
    sessions: Vec<Session>,
    venues: Vec<Venue>,
    time_slots: Vec<TimeSlot>,
    voter_overlap: Vec<VoterOverlap>,
    config: Option<SchedulerConfig>,
) -> PyResult<ScheduleResult> {
    let input = ScheduleInput {
        sessions,
        venues,
        time_slots,
        voter_overlap,
    };
    let generator = ScheduleGenerator::new(input, config.unwrap_or_default())?;
    Ok(generator.generate())
}

/// Score an existing assignment list on the 0-100 scale.
///
/// # Returns
/// * (score, breakdown) tuple
///
/// # Raises
/// * ValueError if the configuration is invalid
#[pyfunction]
#[pyo3(name = "calculate_quality_score", signature = (assignments, sessions, venues, time_slots, voter_overlap=Vec::new(), config=None))]
fn py_calculate_quality_score(
    assignments: Vec<Assignment>,
    sessions: Vec<Session>,
    venues: Vec<Venue>,
    time_slots: Vec<TimeSlot>,
    voter_overlap: Vec<VoterOverlap>,
    config: Option<SchedulerConfig>,
) -> PyResult<(f64, ScoreBreakdown)> {
    let config = config.unwrap_or_default();
    config.validate()?;
    let input = ScheduleInput {
        sessions,
        venues,
        time_slots,
        voter_overlap,
    };
    let overlap_map = build_overlap_map(&input.voter_overlap);
    let quality = scoring::calculate_quality_score(&assignments, &input, &overlap_map, &config);
    Ok((quality.score, quality.breakdown))
}

/// The confsched.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Input types
    m.add_class::<Session>()?;
    m.add_class::<Venue>()?;
    m.add_class::<TimeSlot>()?;
    m.add_class::<VoterOverlap>()?;

    // Result types
    m.add_class::<Assignment>()?;
    m.add_class::<WarningType>()?;
    m.add_class::<WarningSeverity>()?;
    m.add_class::<ScheduleWarning>()?;
    m.add_class::<ScheduleMetrics>()?;
    m.add_class::<ScheduleResult>()?;
    m.add_class::<ScoreBreakdown>()?;

    // Config types
    m.add_class::<SchedulerConfig>()?;
    m.add_class::<ScoringWeights>()?;
    m.add_class::<PriorityWeights>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(generate_schedule, m)?)?;
    m.add_function(wrap_pyfunction!(py_calculate_quality_score, m)?)?;

    Ok(())
}
