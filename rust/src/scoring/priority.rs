//! Placement priority for sessions that still need a cell.
//!
//! Sessions that are hard to place well go first so they get the best cells:
//! - high expected demand (needs one of the few large venues)
//! - audience overlap with many other sessions (fewer conflict-free slots)
//! - long duration (fewer slots fit)
//! - many required features (fewer suitable venues)

use std::cmp::Ordering;

use crate::config::SchedulerConfig;
use crate::constraints::{estimate_attendance, OverlapMap};
use crate::models::Session;

/// Compare f64 values for sorting, treating NaN as equal.
fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Priority of a session on a 0-100 scale (higher = place earlier).
///
/// Demand and duration are relative to the maximum over `all_sessions`.
/// Overlap pressure combines every pairwise overlap as `1 - Π(1 - o/100)`,
/// which grows with both the number and the strength of overlaps.
pub fn calculate_priority(
    session: &Session,
    all_sessions: &[Session],
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> f64 {
    let weights = &config.priority_weights;
    let total_weight = weights.total();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let max_attendance = all_sessions
        .iter()
        .map(estimate_attendance)
        .fold(estimate_attendance(session), f64::max);
    let demand = if max_attendance > 0.0 {
        estimate_attendance(session) / max_attendance
    } else {
        0.0
    };

    let max_duration = all_sessions
        .iter()
        .map(|s| s.duration_minutes)
        .fold(session.duration_minutes, u32::max);
    let duration = if max_duration > 0 {
        f64::from(session.duration_minutes) / f64::from(max_duration)
    } else {
        0.0
    };

    let clear_of_overlap: f64 = all_sessions
        .iter()
        .filter(|other| other.id != session.id)
        .map(|other| 1.0 - overlap_map.get(&session.id, &other.id) / 100.0)
        .product();
    let overlap_pressure = 1.0 - clear_of_overlap;

    let feature_count = session.required_features.len() as f64;
    let features = feature_count / (feature_count + 1.0);

    100.0
        * (weights.demand * demand
            + weights.overlap * overlap_pressure
            + weights.duration * duration
            + weights.features * features)
        / total_weight
}

/// Sort key: descending priority, then input position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PriorityKey {
    priority: f64,
    position: usize,
}

impl Eq for PriorityKey {}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_f64(other.priority, self.priority).then(self.position.cmp(&other.position))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Order `pending` sessions for greedy placement (most urgent first).
///
/// Ties keep the order in which the sessions were given, so repeated runs on
/// the same input process sessions identically.
pub fn order_by_priority<'a>(
    pending: &[&'a Session],
    all_sessions: &[Session],
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> Vec<&'a Session> {
    let mut keyed: Vec<(PriorityKey, &'a Session)> = pending
        .iter()
        .enumerate()
        .map(|(position, session)| {
            let priority = calculate_priority(session, all_sessions, overlap_map, config);
            (PriorityKey { priority, position }, *session)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, session)| session).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::build_overlap_map;
    use crate::test_support::{overlap, session, with_features};

    fn ids(sorted: &[&Session]) -> Vec<String> {
        sorted.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_demand_raises_priority() {
        let sessions = vec![session("small", 10), session("big", 90)];
        let map = OverlapMap::default();
        let config = SchedulerConfig::default();
        let small = calculate_priority(&sessions[0], &sessions, &map, &config);
        let big = calculate_priority(&sessions[1], &sessions, &map, &config);
        assert!(big > small);
    }

    #[test]
    fn test_overlap_raises_priority() {
        let sessions = vec![session("a", 50), session("b", 50), session("c", 50)];
        let map = build_overlap_map(&[overlap("a", "b", 60.0), overlap("a", "c", 60.0)]);
        let config = SchedulerConfig::default();
        let a = calculate_priority(&sessions[0], &sessions, &map, &config);
        let b = calculate_priority(&sessions[1], &sessions, &map, &config);
        assert!(a > b);
    }

    #[test]
    fn test_duration_and_features_raise_priority() {
        let mut long = session("long", 50);
        long.duration_minutes = 90;
        let equipped = with_features(session("equipped", 50), &["stage", "recording"]);
        let plain = session("plain", 50);
        let sessions = vec![long, equipped, plain];
        let map = OverlapMap::default();
        let config = SchedulerConfig::default();

        let plain_p = calculate_priority(&sessions[2], &sessions, &map, &config);
        assert!(calculate_priority(&sessions[0], &sessions, &map, &config) > plain_p);
        assert!(calculate_priority(&sessions[1], &sessions, &map, &config) > plain_p);
    }

    #[test]
    fn test_priority_is_bounded() {
        let sessions = vec![with_features(session("a", 100), &["x", "y"]), session("b", 0)];
        let map = build_overlap_map(&[overlap("a", "b", 100.0)]);
        let config = SchedulerConfig::default();
        for s in &sessions {
            let p = calculate_priority(s, &sessions, &map, &config);
            assert!((0.0..=100.0).contains(&p));
        }
    }

    #[test]
    fn test_order_descending() {
        let sessions = vec![session("low", 5), session("high", 95), session("mid", 40)];
        let pending: Vec<&Session> = sessions.iter().collect();
        let sorted = order_by_priority(
            &pending,
            &sessions,
            &OverlapMap::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(ids(&sorted), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let sessions = vec![session("b", 30), session("a", 30), session("c", 30)];
        let pending: Vec<&Session> = sessions.iter().collect();
        let sorted = order_by_priority(
            &pending,
            &sessions,
            &OverlapMap::default(),
            &SchedulerConfig::default(),
        );
        assert_eq!(ids(&sorted), vec!["b", "a", "c"]);
    }
}
