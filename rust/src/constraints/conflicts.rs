//! Audience conflicts between concurrently scheduled sessions.

use crate::config::SchedulerConfig;
use crate::models::Assignment;

use super::overlap::OverlapMap;

/// Two sessions in the same time slot whose audiences overlap too much.
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub session_a_id: String,
    pub session_b_id: String,
    pub time_slot_id: String,
    pub overlap_percentage: f64,
}

/// Every same-slot pair whose overlap exceeds the configured threshold.
///
/// Venue is irrelevant: attendees cannot be in two rooms at once. Pairs are
/// reported in assignment order, first session first.
pub fn find_all_conflicts(
    assignments: &[Assignment],
    overlap_map: &OverlapMap,
    config: &SchedulerConfig,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, first) in assignments.iter().enumerate() {
        for second in &assignments[i + 1..] {
            if first.time_slot_id != second.time_slot_id {
                continue;
            }
            let pct = overlap_map.get(&first.session_id, &second.session_id);
            if pct > config.conflict_threshold {
                conflicts.push(Conflict {
                    session_a_id: first.session_id.clone(),
                    session_b_id: second.session_id.clone(),
                    time_slot_id: first.time_slot_id.clone(),
                    overlap_percentage: pct,
                });
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::build_overlap_map;
    use crate::test_support::overlap;

    #[test]
    fn test_same_slot_over_threshold_conflicts() {
        let map = build_overlap_map(&[
            overlap("a", "b", 85.0),
            overlap("a", "c", 90.0),
            overlap("b", "c", 10.0),
        ]);
        let assignments = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("b", "room", "am"),
            Assignment::new("c", "hall", "pm"),
        ];

        let conflicts = find_all_conflicts(&assignments, &map, &SchedulerConfig::default());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].session_a_id, "a");
        assert_eq!(conflicts[0].session_b_id, "b");
        assert_eq!(conflicts[0].time_slot_id, "am");
        assert!((conflicts[0].overlap_percentage - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let map = build_overlap_map(&[overlap("a", "b", 30.0)]);
        let assignments = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("b", "room", "am"),
        ];
        let config = SchedulerConfig::default();
        assert!(find_all_conflicts(&assignments, &map, &config).is_empty());

        let lower = SchedulerConfig {
            conflict_threshold: 29.0,
            ..SchedulerConfig::default()
        };
        assert_eq!(find_all_conflicts(&assignments, &map, &lower).len(), 1);
    }

    #[test]
    fn test_no_overlap_data_no_conflicts() {
        let assignments = vec![
            Assignment::new("a", "hall", "am"),
            Assignment::new("b", "room", "am"),
        ];
        let conflicts =
            find_all_conflicts(&assignments, &OverlapMap::default(), &SchedulerConfig::default());
        assert!(conflicts.is_empty());
    }
}
