//! Symmetric voter-overlap index.

use rustc_hash::FxHashMap;

use crate::models::VoterOverlap;

/// Overlap percentages keyed by session id in both directions.
///
/// Records are sparse: a pair without a record has 0% overlap.
#[derive(Clone, Debug, Default)]
pub struct OverlapMap {
    by_session: FxHashMap<String, FxHashMap<String, f64>>,
}

impl OverlapMap {
    /// Overlap between two sessions (0-100), 0 when unknown.
    #[inline]
    pub fn get(&self, session_a: &str, session_b: &str) -> f64 {
        self.by_session
            .get(session_a)
            .and_then(|partners| partners.get(session_b))
            .copied()
            .unwrap_or(0.0)
    }

    fn insert(&mut self, a: &str, b: &str, percentage: f64) {
        let entry = self
            .by_session
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_insert(percentage);
        // Duplicate records for one pair keep the strongest overlap
        if percentage > *entry {
            *entry = percentage;
        }
    }
}

/// Index overlap records for O(1) lookup by unordered pair.
///
/// Percentages are clamped to 0-100; self-pairs are ignored.
pub fn build_overlap_map(overlaps: &[VoterOverlap]) -> OverlapMap {
    let mut map = OverlapMap::default();
    for record in overlaps {
        if record.session_a_id == record.session_b_id {
            continue;
        }
        let pct = if record.overlap_percentage.is_nan() {
            0.0
        } else {
            record.overlap_percentage.clamp(0.0, 100.0)
        };
        map.insert(&record.session_a_id, &record.session_b_id, pct);
        map.insert(&record.session_b_id, &record.session_a_id, pct);
    }
    map
}

/// Overlap percentage between two sessions, 0 if no record exists.
#[inline]
pub fn get_overlap(map: &OverlapMap, session_a: &str, session_b: &str) -> f64 {
    map.get(session_a, session_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(a: &str, b: &str, pct: f64) -> VoterOverlap {
        VoterOverlap {
            session_a_id: a.to_string(),
            session_b_id: b.to_string(),
            overlap_percentage: pct,
        }
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let map = build_overlap_map(&[overlap("a", "b", 42.0)]);
        assert!((get_overlap(&map, "a", "b") - 42.0).abs() < 1e-9);
        assert!((get_overlap(&map, "b", "a") - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_pair_is_zero() {
        let map = build_overlap_map(&[overlap("a", "b", 42.0)]);
        assert_eq!(get_overlap(&map, "a", "c"), 0.0);
        assert_eq!(get_overlap(&map, "x", "y"), 0.0);
    }

    #[test]
    fn test_values_clamped_and_self_pairs_ignored() {
        let map = build_overlap_map(&[
            overlap("a", "b", 140.0),
            overlap("c", "d", -3.0),
            overlap("e", "e", 50.0),
        ]);
        assert!((get_overlap(&map, "a", "b") - 100.0).abs() < 1e-9);
        assert_eq!(get_overlap(&map, "c", "d"), 0.0);
        assert_eq!(get_overlap(&map, "e", "e"), 0.0);
    }

    #[test]
    fn test_duplicate_records_keep_maximum() {
        let map = build_overlap_map(&[overlap("a", "b", 20.0), overlap("b", "a", 60.0)]);
        assert!((get_overlap(&map, "a", "b") - 60.0).abs() < 1e-9);
        assert!((get_overlap(&map, "b", "a") - 60.0).abs() < 1e-9);
    }
}
