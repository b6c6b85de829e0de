use crate::core::geodesy;
use crate::core::predicate;
use crate::domain::model::{BoundingBox, Branch, BranchId, BranchStatus, GeoPoint};
use crate::domain::ports::BranchStore;
use crate::utils::error::{LocatorError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Branch dataset held in process memory.
///
/// Clones share the same underlying data. Reads hand out owned snapshots, so
/// a write landing mid-query only affects fetches issued after it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBranchStore {
    branches: Arc<RwLock<Vec<Branch>>>,
}

impl InMemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_branches(branches: Vec<Branch>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for branch in &branches {
            if !seen.insert(branch.id.clone()) {
                return Err(LocatorError::DuplicateBranch {
                    id: branch.id.to_string(),
                });
            }
        }
        Ok(Self {
            branches: Arc::new(RwLock::new(branches)),
        })
    }

    pub async fn len(&self) -> usize {
        self.branches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.branches.read().await.is_empty()
    }

    pub async fn register(&self, branch: Branch) -> Result<()> {
        let mut branches = self.branches.write().await;
        if branches.iter().any(|b| b.id == branch.id) {
            return Err(LocatorError::DuplicateBranch {
                id: branch.id.to_string(),
            });
        }
        tracing::debug!("Registered branch {} at {}", branch.id, branch.location);
        branches.push(branch);
        Ok(())
    }

    pub async fn get(&self, id: &BranchId) -> Option<Branch> {
        let branches = self.branches.read().await;
        branches.iter().find(|b| &b.id == id).cloned()
    }

    pub async fn update_status(&self, id: &BranchId, status: BranchStatus) -> Result<Branch> {
        self.modify(id, |branch| branch.status = status).await
    }

    pub async fn relocate(&self, id: &BranchId, location: GeoPoint) -> Result<Branch> {
        self.modify(id, |branch| branch.location = location).await
    }

    async fn modify<F>(&self, id: &BranchId, change: F) -> Result<Branch>
    where
        F: FnOnce(&mut Branch),
    {
        let mut branches = self.branches.write().await;
        let branch = branches
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| LocatorError::BranchNotFound { id: id.to_string() })?;
        change(branch);
        branch.updated_at = Utc::now();
        Ok(branch.clone())
    }

    async fn snapshot_where<F>(&self, keep: F) -> Vec<Branch>
    where
        F: Fn(&Branch) -> bool,
    {
        let branches = self.branches.read().await;
        branches.iter().filter(|b| keep(b)).cloned().collect()
    }
}

#[async_trait]
impl BranchStore for InMemoryBranchStore {
    async fn fetch_all_branches(&self) -> Result<Vec<Branch>> {
        Ok(self.snapshot_where(|_| true).await)
    }

    async fn fetch_active_branches(&self) -> Result<Vec<Branch>> {
        Ok(self
            .snapshot_where(|b| b.status == BranchStatus::Active)
            .await)
    }

    async fn fetch_branches_within_approx_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Branch>> {
        let envelope = geodesy::covering_box(center, radius_km);
        Ok(self.snapshot_where(|b| envelope.contains(b.location)).await)
    }

    async fn fetch_branches_in_box(&self, bounding_box: BoundingBox) -> Result<Vec<Branch>> {
        Ok(self
            .snapshot_where(|b| predicate::within_bounding_box(b.location, &bounding_box))
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::BranchType;

    fn branch(id: &str, lat: f64, lon: f64, status: BranchStatus) -> Branch {
        let now = Utc::now();
        Branch {
            id: BranchId::new(id),
            name: format!("Agência {}", id),
            location: GeoPoint::new(lat, lon).unwrap(),
            branch_type: BranchType::Traditional,
            address: "Av. Paulista, 1000".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_ids() {
        let store = InMemoryBranchStore::new();
        store
            .register(branch("001", 0.0, 0.0, BranchStatus::Active))
            .await
            .unwrap();
        let err = store
            .register(branch("001", 1.0, 1.0, BranchStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, LocatorError::DuplicateBranch { .. }));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_from_branches_rejects_duplicate_ids() {
        let result = InMemoryBranchStore::from_branches(vec![
            branch("001", 0.0, 0.0, BranchStatus::Active),
            branch("001", 1.0, 1.0, BranchStatus::Planned),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_len_tracks_registrations() {
        let store = InMemoryBranchStore::new();
        assert!(tokio_test::block_on(store.is_empty()));
        tokio_test::block_on(store.register(branch("001", 0.0, 0.0, BranchStatus::Planned)))
            .unwrap();
        assert_eq!(tokio_test::block_on(store.len()), 1);
    }

    #[tokio::test]
    async fn test_fetch_active_excludes_other_statuses() {
        let store = InMemoryBranchStore::from_branches(vec![
            branch("a", 0.0, 0.0, BranchStatus::Active),
            branch("b", 0.0, 0.0, BranchStatus::UnderMaintenance),
            branch("c", 0.0, 0.0, BranchStatus::PermanentlyClosed),
        ])
        .unwrap();

        let active = store.fetch_active_branches().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "a");
        assert_eq!(store.fetch_all_branches().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_status_and_relocate_touch_updated_at() {
        let store = InMemoryBranchStore::from_branches(vec![branch(
            "a",
            0.0,
            0.0,
            BranchStatus::Active,
        )])
        .unwrap();
        let id = BranchId::new("a");
        let before = store.get(&id).await.unwrap().updated_at;

        let updated = store
            .update_status(&id, BranchStatus::TemporarilyClosed)
            .await
            .unwrap();
        assert_eq!(updated.status, BranchStatus::TemporarilyClosed);
        assert!(updated.updated_at >= before);

        let moved = store
            .relocate(&id, GeoPoint::new(5.0, 5.0).unwrap())
            .await
            .unwrap();
        assert_eq!(moved.location, GeoPoint::new(5.0, 5.0).unwrap());

        let missing = store
            .update_status(&BranchId::new("zzz"), BranchStatus::Active)
            .await;
        assert!(matches!(missing, Err(LocatorError::BranchNotFound { .. })));
    }

    #[tokio::test]
    async fn test_approx_radius_fetch_is_superset_of_exact_radius() {
        let center = GeoPoint::new(-23.5505, -46.6333).unwrap();
        let store = InMemoryBranchStore::from_branches(vec![
            branch("inside", -23.56, -46.64, BranchStatus::Active),
            branch("edge", -23.5505, -46.53, BranchStatus::Active),
            branch("far", -22.9068, -43.1729, BranchStatus::Active),
        ])
        .unwrap();

        let fetched = store
            .fetch_branches_within_approx_radius(center, 15.0)
            .await
            .unwrap();
        let ids: Vec<&str> = fetched.iter().map(|b| b.id.as_str()).collect();
        assert!(ids.contains(&"inside"));
        assert!(ids.contains(&"edge"));
        assert!(!ids.contains(&"far"));
    }

    #[tokio::test]
    async fn test_fetch_in_box() {
        let store = InMemoryBranchStore::from_branches(vec![
            branch("in", 5.0, 5.0, BranchStatus::Active),
            branch("out", 15.0, 5.0, BranchStatus::Active),
        ])
        .unwrap();
        let bbox = BoundingBox::new(
            GeoPoint::new(10.0, 10.0).unwrap(),
            GeoPoint::new(0.0, 0.0).unwrap(),
        )
        .unwrap();
        let fetched = store.fetch_branches_in_box(bbox).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id.as_str(), "in");
    }
}
