use crate::core::geodesy;
use crate::core::predicate::{self, BranchFilter};
use crate::core::ranking;
use crate::domain::model::{
    BoundingBox, Branch, BranchQuery, BranchType, DistanceResult, GeoPoint, StatusFilter,
};
use crate::domain::ports::{BranchStore, SearchSettings};
use crate::utils::error::{LocatorError, Result};
use std::collections::HashSet;

/// Query orchestration over a [`BranchStore`].
///
/// The repository holds no mutable state; every call works on the snapshot
/// the store returns, so a single instance can serve concurrent queries.
///
/// Nearest-neighbour lookups first ask the store for a pre-filtered
/// neighbourhood of `default_search_radius_km`. When that yields fewer than
/// the requested number of results inside the radius, the radius grows by
/// `widening_factor` up to `max_widening_steps` times and finally falls back
/// to a broad fetch of every eligible branch followed by in-memory filtering.
/// Callers should therefore expect the store to be hit more than once per query.
pub struct BranchRepository<S: BranchStore, C: SearchSettings> {
    store: S,
    settings: C,
}

impl<S: BranchStore, C: SearchSettings> BranchRepository<S, C> {
    pub fn new(store: S, settings: C) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &C {
        &self.settings
    }

    pub async fn find_within_radius(&self, origin: GeoPoint, radius_km: f64) -> Result<Vec<Branch>> {
        self.find_within_radius_with_status(origin, radius_km, &StatusFilter::active_only())
            .await
    }

    pub async fn find_within_radius_with_status(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        status: &StatusFilter,
    ) -> Result<Vec<Branch>> {
        predicate::validate_radius(radius_km)?;
        let filter = BranchFilter::new(status);
        let results = self.collect_within_radius(origin, radius_km, &filter).await?;
        Ok(results.into_iter().map(|r| r.branch).collect())
    }

    pub async fn find_within_radius_by_types(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        types: &HashSet<BranchType>,
    ) -> Result<Vec<Branch>> {
        self.find_within_radius_by_types_with_status(
            origin,
            radius_km,
            types,
            &StatusFilter::active_only(),
        )
        .await
    }

    pub async fn find_within_radius_by_types_with_status(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        types: &HashSet<BranchType>,
        status: &StatusFilter,
    ) -> Result<Vec<Branch>> {
        predicate::validate_radius(radius_km)?;
        validate_types(types)?;
        let filter = BranchFilter::new(status).with_types(Some(types));
        let results = self.collect_within_radius(origin, radius_km, &filter).await?;
        Ok(results.into_iter().map(|r| r.branch).collect())
    }

    pub async fn find_nearest_branches(
        &self,
        origin: GeoPoint,
        max_results: usize,
    ) -> Result<Vec<DistanceResult>> {
        self.find_nearest_branches_with_status(origin, max_results, &StatusFilter::active_only())
            .await
    }

    pub async fn find_nearest_branches_with_status(
        &self,
        origin: GeoPoint,
        max_results: usize,
        status: &StatusFilter,
    ) -> Result<Vec<DistanceResult>> {
        let limit = self.clamp_limit(max_results)?;
        let filter = BranchFilter::new(status);
        self.nearest_with_widening(origin, limit, &filter).await
    }

    pub async fn find_nearest_branches_by_types(
        &self,
        origin: GeoPoint,
        types: &HashSet<BranchType>,
        max_results: usize,
    ) -> Result<Vec<DistanceResult>> {
        self.find_nearest_branches_by_types_with_status(
            origin,
            types,
            max_results,
            &StatusFilter::active_only(),
        )
        .await
    }

    pub async fn find_nearest_branches_by_types_with_status(
        &self,
        origin: GeoPoint,
        types: &HashSet<BranchType>,
        max_results: usize,
        status: &StatusFilter,
    ) -> Result<Vec<DistanceResult>> {
        validate_types(types)?;
        let limit = self.clamp_limit(max_results)?;
        let filter = BranchFilter::new(status).with_types(Some(types));
        self.nearest_with_widening(origin, limit, &filter).await
    }

    pub async fn find_in_bounding_box(&self, bounding_box: BoundingBox) -> Result<Vec<Branch>> {
        self.find_in_bounding_box_with_status(bounding_box, &StatusFilter::active_only())
            .await
    }

    pub async fn find_in_bounding_box_with_status(
        &self,
        bounding_box: BoundingBox,
        status: &StatusFilter,
    ) -> Result<Vec<Branch>> {
        // fields are public, so re-check corners built without BoundingBox::new
        let bounding_box = BoundingBox::new(bounding_box.north_east, bounding_box.south_west)?;
        let filter = BranchFilter::new(status).with_bounding_box(Some(&bounding_box));
        let candidates = self.store.fetch_branches_in_box(bounding_box).await?;
        let total = candidates.len();
        let matched: Vec<Branch> = candidates.into_iter().filter(|b| filter.matches(b)).collect();
        tracing::debug!(
            "Bounding box {} - {}: {} of {} candidates eligible",
            bounding_box.south_west,
            bounding_box.north_east,
            matched.len(),
            total
        );
        Ok(matched)
    }

    /// Approximate radius search: eligible branches inside the rectangular
    /// envelope of `radius_km`, without the exact distance check. Corners of
    /// the envelope lie farther than `radius_km` from `origin`.
    pub async fn find_within_approx_radius(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        status: &StatusFilter,
    ) -> Result<Vec<Branch>> {
        predicate::validate_radius(radius_km)?;
        let bounding_box = geodesy::bounding_box(origin, radius_km).to_bounding_box()?;
        self.find_in_bounding_box_with_status(bounding_box, status).await
    }

    /// General compound query. Filters apply conjunctively; results are
    /// ranked nearest-first and truncated to the clamped limit.
    pub async fn search(&self, query: &BranchQuery) -> Result<Vec<DistanceResult>> {
        let limit = self.clamp_limit(query.limit)?;
        if let Some(radius_km) = query.radius_km {
            predicate::validate_radius(radius_km)?;
        }
        if let Some(types) = &query.types {
            validate_types(types)?;
        }
        if let Some(bbox) = &query.bounding_box {
            BoundingBox::new(bbox.north_east, bbox.south_west)?;
        }

        let filter = BranchFilter::new(&query.status_filter)
            .with_types(query.types.as_ref())
            .with_bounding_box(query.bounding_box.as_ref());

        match (query.radius_km, query.bounding_box) {
            (Some(radius_km), _) => {
                let measured = self
                    .collect_within_radius(query.origin, radius_km, &filter)
                    .await?;
                ranking::rank_results(measured, limit)
            }
            (None, Some(bounding_box)) => {
                let candidates = self.store.fetch_branches_in_box(bounding_box).await?;
                let measured = self.measure_matching(query.origin, candidates, &filter, None);
                ranking::rank_results(measured, limit)
            }
            (None, None) => self.nearest_with_widening(query.origin, limit, &filter).await,
        }
    }

    fn clamp_limit(&self, requested: usize) -> Result<usize> {
        ranking::validate_limit(requested)?;
        let max = self.settings.max_results().max(1);
        if requested > max {
            tracing::debug!("Clamping limit {} to configured maximum {}", requested, max);
        }
        Ok(requested.min(max))
    }

    /// Status and the other cheap filters run before any distance is computed.
    /// `max_distance_km` drops results beyond that distance.
    fn measure_matching(
        &self,
        origin: GeoPoint,
        candidates: Vec<Branch>,
        filter: &BranchFilter<'_>,
        max_distance_km: Option<f64>,
    ) -> Vec<DistanceResult> {
        let include_bearing = self.settings.include_bearing();
        candidates
            .into_iter()
            .filter(|branch| filter.matches(branch))
            .map(|branch| ranking::measure(origin, branch, include_bearing))
            .filter(|result| max_distance_km.map_or(true, |max| result.distance_km <= max))
            .collect()
    }

    async fn collect_within_radius(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        filter: &BranchFilter<'_>,
    ) -> Result<Vec<DistanceResult>> {
        let candidates = match self.prefilter(origin, radius_km).await? {
            Some(candidates) => candidates,
            None => self.fetch_eligible(filter).await?,
        };
        Ok(self.measure_matching(origin, candidates, filter, Some(radius_km)))
    }

    /// Store-side neighbourhood fetch, or `None` when the covering envelope
    /// would leave the globe and the store's box test could drop neighbours.
    async fn prefilter(&self, origin: GeoPoint, radius_km: f64) -> Result<Option<Vec<Branch>>> {
        if !geodesy::covering_box(origin, radius_km).is_within_globe() {
            tracing::debug!(
                "Radius {:.1} km around {} crosses a pole or the antimeridian, scanning all branches",
                radius_km,
                origin
            );
            return Ok(None);
        }
        let candidates = self
            .store
            .fetch_branches_within_approx_radius(origin, radius_km)
            .await?;
        Ok(Some(candidates))
    }

    /// Broad fetch used as the fallback path. Status filtering still happens
    /// in memory so custom predicates are honoured.
    async fn fetch_eligible(&self, filter: &BranchFilter<'_>) -> Result<Vec<Branch>> {
        if filter.is_active_only() {
            self.store.fetch_active_branches().await
        } else {
            self.store.fetch_all_branches().await
        }
    }

    async fn nearest_with_widening(
        &self,
        origin: GeoPoint,
        limit: usize,
        filter: &BranchFilter<'_>,
    ) -> Result<Vec<DistanceResult>> {
        let factor = self.settings.widening_factor();
        let mut radius_km = self.settings.default_search_radius_km();

        for step in 0..=self.settings.max_widening_steps() {
            let Some(candidates) = self.prefilter(origin, radius_km).await? else {
                break;
            };
            // Only results inside the radius are known to beat everything
            // the pre-filter left out.
            let measured = self.measure_matching(origin, candidates, filter, Some(radius_km));
            if measured.len() >= limit {
                tracing::debug!(
                    "Found {} candidates within {:.1} km of {} (step {})",
                    measured.len(),
                    radius_km,
                    origin,
                    step
                );
                return ranking::rank_results(measured, limit);
            }
            tracing::debug!(
                "Only {} of {} wanted within {:.1} km of {}, widening",
                measured.len(),
                limit,
                radius_km,
                origin
            );
            radius_km *= factor;
        }

        tracing::warn!(
            "Nearest search around {} fell back to a full scan",
            origin
        );
        let candidates = self.fetch_eligible(filter).await?;
        let measured = self.measure_matching(origin, candidates, filter, None);
        ranking::rank_results(measured, limit)
    }
}

fn validate_types(types: &HashSet<BranchType>) -> Result<()> {
    if types.is_empty() {
        return Err(LocatorError::invalid_query(
            "branch type filter must name at least one type",
        ));
    }
    Ok(())
}
