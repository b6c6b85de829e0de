//! Nearest-first ordering with a reproducible tie-break.

use crate::core::geodesy;
use crate::domain::model::{Branch, DistanceResult, GeoPoint};
use crate::utils::error::{LocatorError, Result};
use std::cmp::Ordering;

pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(LocatorError::invalid_query("limit must be at least 1"));
    }
    Ok(())
}

/// Orders by ascending distance, then ascending branch id.
pub fn compare_results(a: &DistanceResult, b: &DistanceResult) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.branch.id.cmp(&b.branch.id))
}

/// Sorts already-measured results and truncates to `limit`.
pub fn rank_results(mut results: Vec<DistanceResult>, limit: usize) -> Result<Vec<DistanceResult>> {
    validate_limit(limit)?;
    results.sort_by(compare_results);
    results.truncate(limit);
    Ok(results)
}

pub fn measure(origin: GeoPoint, branch: Branch, include_bearing: bool) -> DistanceResult {
    let distance_km = geodesy::distance_km(origin, branch.location);
    let bearing_degrees = include_bearing.then(|| geodesy::bearing_degrees(origin, branch.location));
    DistanceResult {
        branch,
        distance_km,
        bearing_degrees,
    }
}

pub fn rank_nearest(
    origin: GeoPoint,
    candidates: Vec<Branch>,
    limit: usize,
) -> Result<Vec<DistanceResult>> {
    validate_limit(limit)?;
    let measured = candidates
        .into_iter()
        .map(|branch| measure(origin, branch, false))
        .collect();
    rank_results(measured, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BranchId, BranchStatus, BranchType};
    use chrono::Utc;

    fn branch(id: &str, lat: f64, lon: f64) -> Branch {
        let now = Utc::now();
        Branch {
            id: BranchId::new(id),
            name: format!("Branch {}", id),
            location: GeoPoint::new(lat, lon).unwrap(),
            branch_type: BranchType::Traditional,
            address: String::new(),
            status: BranchStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(results: &[DistanceResult]) -> Vec<&str> {
        results.iter().map(|r| r.branch.id.as_str()).collect()
    }

    #[test]
    fn test_rank_nearest_orders_by_distance() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let candidates = vec![
            branch("far", 0.0, 3.0),
            branch("near", 0.0, 1.0),
            branch("mid", 0.0, 2.0),
        ];
        let ranked = rank_nearest(origin, candidates, 10).unwrap();
        assert_eq!(ids(&ranked), vec!["near", "mid", "far"]);
        assert!(ranked.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
        assert!(ranked.iter().all(|r| r.bearing_degrees.is_none()));
    }

    #[test]
    fn test_ties_break_on_branch_id() {
        let origin = GeoPoint::new(10.0, 10.0).unwrap();
        let candidates = vec![
            branch("c", 10.0, 10.0),
            branch("a", 10.0, 10.0),
            branch("b", 10.0, 10.0),
        ];
        let ranked = rank_nearest(origin, candidates, 2).unwrap();
        assert_eq!(ids(&ranked), vec!["a", "b"]);
        assert!(ranked.iter().all(|r| r.distance_km == 0.0));
    }

    #[test]
    fn test_ranking_is_stable_across_input_orders() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let forward = vec![
            branch("x", 1.0, 0.0),
            branch("y", 0.0, 1.0),
            branch("z", -1.0, 0.0),
            branch("w", 0.0, 2.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = rank_nearest(origin, forward, 3).unwrap();
        let b = rank_nearest(origin, reversed, 3).unwrap();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn test_truncates_after_sorting() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let candidates = vec![branch("far", 0.0, 5.0), branch("near", 0.0, 0.1)];
        let ranked = rank_nearest(origin, candidates, 1).unwrap();
        assert_eq!(ids(&ranked), vec!["near"]);
    }

    #[test]
    fn test_empty_candidates_yield_empty_result() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        assert!(rank_nearest(origin, Vec::new(), 5).unwrap().is_empty());
    }

    #[test]
    fn test_zero_limit_is_invalid() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        assert!(matches!(
            rank_nearest(origin, vec![branch("a", 0.0, 0.0)], 0),
            Err(LocatorError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_measure_with_bearing() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let result = measure(origin, branch("east", 0.0, 1.0), true);
        let bearing = result.bearing_degrees.unwrap();
        assert!((bearing - 90.0).abs() < 1e-9);
    }
}
