//! End-to-end schedule generation.

use rustc_hash::FxHashMap;
use std::time::Instant;
use thiserror::Error;

use crate::config::SchedulerConfig;
use crate::constraints::{
    build_overlap_map, build_slot_occupancy_excluding, check_duration_fit,
    check_venue_compatibility, estimate_attendance, find_all_conflicts, validate_assignment,
    OverlapMap,
};
use crate::models::{
    Assignment, InputIndex, ScheduleInput, ScheduleResult, ScheduleWarning, Session, TimeSlot,
    Venue, WarningSeverity, WarningType,
};
use crate::scoring::{calculate_quality_score_indexed, order_by_priority, score_assignment};
use crate::{log_changes, log_checks, log_debug};

use super::metrics::compute_metrics;
use super::optimizer::optimize_schedule;
use super::state::RunState;

/// Feature-deficient placements whose placement score or feature score
/// (100 × share of required features present) falls below this get a
/// medium-severity feature warning instead of a low one.
pub const FEATURE_WARNING_SCORE_THRESHOLD: f64 = 50.0;

/// Audience conflicts at or above this overlap are high severity.
const HIGH_SEVERITY_OVERLAP: f64 = 80.0;

/// Errors that can occur while setting up a generator.
///
/// Scheduling difficulties are never errors; they are reported as warnings
/// on the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Assigns sessions to (venue, time slot) cells for one event snapshot.
pub struct ScheduleGenerator {
    input: ScheduleInput,
    config: SchedulerConfig,
    overlap_map: OverlapMap,
}

impl ScheduleGenerator {
    /// Create a generator, rejecting configurations that cannot be scored.
    pub fn new(input: ScheduleInput, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        let overlap_map = build_overlap_map(&input.voter_overlap);
        Ok(Self {
            input,
            config,
            overlap_map,
        })
    }

    /// Run every phase and return the best-effort schedule.
    ///
    /// Never fails: missing sessions, venues or time slots produce an
    /// error-shaped result, everything else becomes a warning.
    pub fn generate(&self) -> ScheduleResult {
        let started = Instant::now();
        let verbosity = self.config.verbosity;
        let index = self.input.index();

        // Phase 1: Validate
        if let Err(reason) = self.validate_input() {
            log_changes!(verbosity, "Validation failed: {}", reason);
            return self.error_result(reason, started);
        }
        let mut state = RunState::new();
        self.check_cell_supply(&mut state);

        // Phase 2: Locked sessions
        self.place_locked_sessions(&index, &mut state);

        // Phase 3: Greedy assignment
        self.assign_greedily(&mut state);

        // Phase 4: Local search
        let greedy_score =
            calculate_quality_score_indexed(&state.assignments, &index, &self.overlap_map, &self.config)
                .score;
        log_changes!(verbosity, "Greedy schedule score: {:.2}", greedy_score);
        let outcome = optimize_schedule(
            std::mem::take(&mut state.assignments),
            &index,
            &self.overlap_map,
            &self.config,
        );
        log_changes!(
            verbosity,
            "Optimized score: {:.2} ({} iterations, {} swaps, {} moves)",
            outcome.final_score,
            outcome.iterations,
            outcome.swaps_accepted,
            outcome.moves_accepted
        );
        state.assignments = outcome.assignments;

        // Phase 5: Assemble
        self.assemble(&index, state, greedy_score, outcome.iterations, started)
    }

    fn validate_input(&self) -> Result<(), String> {
        if self.input.sessions.is_empty() {
            return Err("No sessions to schedule".to_string());
        }
        if self.input.venues.is_empty() {
            return Err("No venues available for scheduling".to_string());
        }
        if self.input.time_slots.is_empty() {
            return Err("No time slots available for scheduling".to_string());
        }
        Ok(())
    }

    /// Warn when more sessions need a cell than there are cells.
    fn check_cell_supply(&self, state: &mut RunState) {
        let pending = self
            .input
            .sessions
            .iter()
            .filter(|s| s.pinned_cell().is_none())
            .count();
        let cells = self.input.venues.len() * self.input.available_slots().count();
        if pending > cells {
            state.warn(ScheduleWarning::new(
                WarningType::Capacity,
                WarningSeverity::High,
                vec![],
                format!(
                    "{} sessions need placement but only {} venue/time-slot combinations exist",
                    pending, cells
                ),
            ));
        }
    }

    /// Place every locked session with a venue and slot reference exactly where
    /// the host put it.
    fn place_locked_sessions(&self, index: &InputIndex<'_>, state: &mut RunState) {
        let verbosity = self.config.verbosity;

        for session in &self.input.sessions {
            let Some((venue_id, slot_id)) = session.pinned_cell() else {
                continue;
            };
            if state.is_placed(&session.id) {
                continue;
            }

            let (venue, slot) = match (index.venue(venue_id), index.time_slot(slot_id)) {
                (Some(v), Some(s)) => (v, s),
                (venue, _) => {
                    let missing = if venue.is_none() {
                        format!("venue {}", venue_id)
                    } else {
                        format!("time slot {}", slot_id)
                    };
                    log_checks!(
                        verbosity,
                        "  Skipping locked session {}: unknown {}",
                        session.id,
                        missing
                    );
                    state.warn(ScheduleWarning::new(
                        WarningType::Unassigned,
                        WarningSeverity::High,
                        vec![session.id.clone()],
                        format!(
                            "Locked session \"{}\" references unknown {}",
                            session.title, missing
                        ),
                    ));
                    continue;
                }
            };

            if let Some(holder) = state.holder_of(&venue.id, &slot.id).map(str::to_string) {
                state.warn(ScheduleWarning::new(
                    WarningType::Conflict,
                    WarningSeverity::High,
                    vec![holder.clone(), session.id.clone()],
                    format!(
                        "Locked sessions {} and {} are both pinned to {} during {}",
                        holder, session.id, venue.name, slot.id
                    ),
                ));
            }
            self.report_locked_anomalies(session, slot, state);

            state.place(Assignment::new(&session.id, &venue.id, &slot.id));
            state.locked_count += 1;
            log_changes!(
                verbosity,
                "  Locked {} in {} during {}",
                session.id,
                venue.id,
                slot.id
            );
        }
    }

    /// Host intent wins, but a pinned session that overruns its slot or sits
    /// in a break is still worth flagging.
    fn report_locked_anomalies(&self, session: &Session, slot: &TimeSlot, state: &mut RunState) {
        let fit = check_duration_fit(session, slot);
        if !fit.fits {
            state.warn(ScheduleWarning::new(
                WarningType::Conflict,
                WarningSeverity::Medium,
                vec![session.id.clone()],
                format!(
                    "Locked session {} runs {} minutes but slot {} spans {}",
                    session.id, fit.session_minutes, slot.id, fit.slot_minutes
                ),
            ));
        }
        if !slot.is_available {
            state.warn(ScheduleWarning::new(
                WarningType::Conflict,
                WarningSeverity::Medium,
                vec![session.id.clone()],
                format!(
                    "Locked session {} is pinned to unavailable slot {}",
                    session.id, slot.id
                ),
            ));
        }
    }

    /// Place remaining sessions, hardest first, into their best valid cell.
    fn assign_greedily(&self, state: &mut RunState) {
        let verbosity = self.config.verbosity;
        let pending: Vec<&Session> = self
            .input
            .sessions
            .iter()
            .filter(|s| s.pinned_cell().is_none())
            .collect();
        let ordered = order_by_priority(
            &pending,
            &self.input.sessions,
            &self.overlap_map,
            &self.config,
        );

        for session in ordered {
            if state.is_placed(&session.id) {
                continue;
            }
            log_checks!(verbosity, "  Considering session {}", session.id);

            match self.best_cell(session, state) {
                Some((venue, slot, score)) => {
                    state.place(Assignment::new(&session.id, &venue.id, &slot.id));
                    log_changes!(
                        verbosity,
                        "  Placed {} in {} during {} (score {:.2})",
                        session.id,
                        venue.id,
                        slot.id,
                        score
                    );
                }
                None => {
                    log_changes!(verbosity, "  No valid cell for {}", session.id);
                    state.warn(ScheduleWarning::new(
                        WarningType::Unassigned,
                        WarningSeverity::High,
                        vec![session.id.clone()],
                        format!(
                            "Session \"{}\" ({} minutes) could not be placed in any free venue and time slot",
                            session.title, session.duration_minutes
                        ),
                    ));
                }
            }
        }
    }

    /// Highest-scoring valid cell; ties go to the earliest slot, then venue.
    fn best_cell(&self, session: &Session, state: &RunState) -> Option<(&Venue, &TimeSlot, f64)> {
        let verbosity = self.config.verbosity;
        let mut best: Option<(&Venue, &TimeSlot, f64)> = None;

        for slot in self.input.available_slots() {
            for venue in &self.input.venues {
                let validity = validate_assignment(session, venue, slot, &state.occupancy);
                if !validity.valid {
                    log_debug!(
                        verbosity,
                        "    Rejected {}/{}: {}",
                        venue.id,
                        slot.id,
                        validity.reason.unwrap_or_default()
                    );
                    continue;
                }
                let score = score_assignment(
                    session,
                    venue,
                    slot,
                    &state.assignments,
                    &self.overlap_map,
                    &state.occupancy,
                    &self.config,
                );
                log_debug!(verbosity, "    {}/{} scores {:.2}", venue.id, slot.id, score);
                if best.map_or(true, |(_, _, top)| score > top) {
                    best = Some((venue, slot, score));
                }
            }
        }
        best
    }

    fn assemble(
        &self,
        index: &InputIndex<'_>,
        mut state: RunState,
        greedy_score: f64,
        optimizer_iterations: u32,
        started: Instant,
    ) -> ScheduleResult {
        let positions: FxHashMap<&str, usize> = self
            .input
            .sessions
            .iter()
            .enumerate()
            .rev()
            .map(|(pos, s)| (s.id.as_str(), pos))
            .collect();
        state
            .assignments
            .sort_by_key(|a| positions.get(a.session_id.as_str()).copied().unwrap_or(usize::MAX));

        let quality = calculate_quality_score_indexed(
            &state.assignments,
            index,
            &self.overlap_map,
            &self.config,
        );

        let conflicts = find_all_conflicts(&state.assignments, &self.overlap_map, &self.config);
        for conflict in &conflicts {
            let severity = if conflict.overlap_percentage >= HIGH_SEVERITY_OVERLAP {
                WarningSeverity::High
            } else {
                WarningSeverity::Medium
            };
            state.warn(ScheduleWarning::new(
                WarningType::Conflict,
                severity,
                vec![conflict.session_a_id.clone(), conflict.session_b_id.clone()],
                format!(
                    "Sessions {} and {} share {:.0}% of their audience and both run during {}",
                    conflict.session_a_id,
                    conflict.session_b_id,
                    conflict.overlap_percentage,
                    conflict.time_slot_id
                ),
            ));
        }

        let placement_warnings = self.placement_warnings(index, &state.assignments);
        state.warnings.extend(placement_warnings);

        let unassigned_sessions: Vec<String> = self
            .input
            .sessions
            .iter()
            .filter(|s| !state.is_placed(&s.id))
            .map(|s| s.id.clone())
            .collect();

        let metrics = compute_metrics(
            &state.assignments,
            index,
            state.locked_count,
            conflicts.len(),
            greedy_score,
            optimizer_iterations,
        );

        log_changes!(
            self.config.verbosity,
            "Schedule complete: {} assigned, {} unassigned, score {:.2}",
            state.assignments.len(),
            unassigned_sessions.len(),
            quality.score
        );

        ScheduleResult {
            success: unassigned_sessions.is_empty(),
            assignments: state.assignments,
            quality_score: quality.score,
            breakdown: quality.breakdown,
            metrics,
            warnings: state.warnings,
            unassigned_sessions,
            execution_time_ms: elapsed_ms(started),
        }
    }

    /// Feature and over-capacity warnings for the final placements.
    fn placement_warnings(
        &self,
        index: &InputIndex<'_>,
        assignments: &[Assignment],
    ) -> Vec<ScheduleWarning> {
        let mut warnings = Vec::new();

        for assignment in assignments {
            let (session, venue, slot) = match (
                index.session(&assignment.session_id),
                index.venue(&assignment.venue_id),
                index.time_slot(&assignment.time_slot_id),
            ) {
                (Some(s), Some(v), Some(t)) => (s, v, t),
                _ => continue,
            };

            let compat = check_venue_compatibility(session, venue);
            if !compat.compatible {
                let others: Vec<Assignment> = assignments
                    .iter()
                    .filter(|a| a.session_id != session.id)
                    .cloned()
                    .collect();
                let occupancy = build_slot_occupancy_excluding(assignments, &[session.id.as_str()]);
                let score = score_assignment(
                    session,
                    venue,
                    slot,
                    &others,
                    &self.overlap_map,
                    &occupancy,
                    &self.config,
                );
                let feature_score = 100.0
                    * compat.satisfied_fraction(session.required_features.len());
                let severity = if score.min(feature_score) < FEATURE_WARNING_SCORE_THRESHOLD {
                    WarningSeverity::Medium
                } else {
                    WarningSeverity::Low
                };
                warnings.push(ScheduleWarning::new(
                    WarningType::Feature,
                    severity,
                    vec![session.id.clone()],
                    format!(
                        "{} lacks features required by session {}: {}",
                        venue.name,
                        session.id,
                        compat.missing_features.join(", ")
                    ),
                ));
            }

            let attendance = estimate_attendance(session);
            if attendance > f64::from(venue.capacity) {
                warnings.push(ScheduleWarning::new(
                    WarningType::Capacity,
                    WarningSeverity::Low,
                    vec![session.id.clone()],
                    format!(
                        "Session {} expects about {:.0} attendees but {} seats {}",
                        session.id, attendance, venue.name, venue.capacity
                    ),
                ));
            }
        }
        warnings
    }

    fn error_result(&self, reason: String, started: Instant) -> ScheduleResult {
        let session_ids: Vec<String> = self.input.sessions.iter().map(|s| s.id.clone()).collect();
        ScheduleResult {
            success: false,
            assignments: Vec::new(),
            quality_score: 0.0,
            breakdown: Default::default(),
            metrics: crate::models::ScheduleMetrics {
                total_sessions: session_ids.len(),
                ..Default::default()
            },
            warnings: vec![ScheduleWarning::new(
                WarningType::Unassigned,
                WarningSeverity::High,
                session_ids.clone(),
                reason,
            )],
            unassigned_sessions: session_ids,
            execution_time_ms: elapsed_ms(started),
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
