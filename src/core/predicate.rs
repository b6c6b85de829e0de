//! Filter predicates over branches. Composition is conjunctive and an absent
//! filter never excludes anything.

use crate::core::geodesy;
use crate::domain::model::{BoundingBox, Branch, BranchType, GeoPoint, StatusFilter};
use crate::utils::error::{LocatorError, Result};
use std::collections::HashSet;

/// Non-positive, NaN or infinite radii are rejected as misconfigured requests.
pub fn validate_radius(radius_km: f64) -> Result<()> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(LocatorError::invalid_query(format!(
            "radius must be a positive number of kilometres, got {}",
            radius_km
        )));
    }
    Ok(())
}

pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_km: f64) -> Result<bool> {
    validate_radius(radius_km)?;
    Ok(geodesy::distance_km(point, center) <= radius_km)
}

/// Inclusive on all four edges.
pub fn within_bounding_box(point: GeoPoint, bounding_box: &BoundingBox) -> bool {
    let ne = bounding_box.north_east;
    let sw = bounding_box.south_west;
    point.latitude() >= sw.latitude()
        && point.latitude() <= ne.latitude()
        && point.longitude() >= sw.longitude()
        && point.longitude() <= ne.longitude()
}

pub fn matches_type(branch: &Branch, types: Option<&HashSet<BranchType>>) -> bool {
    match types {
        Some(types) if !types.is_empty() => types.contains(&branch.branch_type),
        _ => true,
    }
}

pub fn matches_status(branch: &Branch, status_filter: &StatusFilter) -> bool {
    status_filter.allows(branch.status)
}

/// Pre-validated conjunction of the cheap (non-distance) filters.
///
/// Status is checked first, then type, then bounding box. Radius is left to
/// the caller so the distance is computed once and reused for ranking.
#[derive(Debug, Clone)]
pub struct BranchFilter<'a> {
    status: &'a StatusFilter,
    types: Option<&'a HashSet<BranchType>>,
    bounding_box: Option<&'a BoundingBox>,
}

impl<'a> BranchFilter<'a> {
    pub fn new(status: &'a StatusFilter) -> Self {
        Self {
            status,
            types: None,
            bounding_box: None,
        }
    }

    pub fn with_types(mut self, types: Option<&'a HashSet<BranchType>>) -> Self {
        self.types = types;
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: Option<&'a BoundingBox>) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    pub fn is_active_only(&self) -> bool {
        self.status.is_active_only()
    }

    pub fn matches(&self, branch: &Branch) -> bool {
        matches_status(branch, self.status)
            && matches_type(branch, self.types)
            && self
                .bounding_box
                .map_or(true, |bbox| within_bounding_box(branch.location, bbox))
    }
}
