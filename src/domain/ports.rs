use crate::domain::model::{BoundingBox, Branch, BranchStatus, GeoPoint};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Read side of the branch dataset.
///
/// Every fetch returns a snapshot and must be idempotent: nearest-neighbour
/// widening may call the same fetch several times within one query.
/// Backends report outages as `LocatorError::StorageUnavailable`.
#[async_trait]
pub trait BranchStore: Send + Sync {
    /// Every branch regardless of status.
    async fn fetch_all_branches(&self) -> Result<Vec<Branch>>;

    async fn fetch_active_branches(&self) -> Result<Vec<Branch>> {
        let branches = self.fetch_all_branches().await?;
        Ok(branches
            .into_iter()
            .filter(|b| b.status == BranchStatus::Active)
            .collect())
    }

    /// Cheap pre-filter: may return branches outside `radius_km` but must not
    /// omit any branch inside it (away from the poles and the antimeridian).
    async fn fetch_branches_within_approx_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Branch>>;

    async fn fetch_branches_in_box(&self, bounding_box: BoundingBox) -> Result<Vec<Branch>>;
}

/// Tuning knobs the repository reads at query time.
pub trait SearchSettings: Send + Sync {
    fn max_results(&self) -> usize;
    fn default_search_radius_km(&self) -> f64;
    fn widening_factor(&self) -> f64;
    fn max_widening_steps(&self) -> u32;
    fn include_bearing(&self) -> bool;
}
