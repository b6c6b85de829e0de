use crate::core::geodesy;
use crate::core::predicate;
use crate::domain::model::{BoundingBox, Branch, BranchStatus, GeoPoint};
use crate::domain::ports::BranchStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Read-through snapshot cache in front of another [`BranchStore`].
///
/// The first fetch loads the full dataset from the inner store; later fetches
/// of any kind are answered from that snapshot until [`invalidate`] is called.
/// Failed loads are not cached.
///
/// [`invalidate`]: CachedBranchStore::invalidate
pub struct CachedBranchStore<S: BranchStore> {
    inner: S,
    snapshot: RwLock<Option<Arc<Vec<Branch>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: BranchStore> CachedBranchStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            snapshot: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub async fn invalidate(&self) {
        let mut snapshot = self.snapshot.write().await;
        *snapshot = None;
        tracing::debug!("Branch cache invalidated");
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    async fn load(&self) -> Result<Arc<Vec<Branch>>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.snapshot.write().await;
        // another task may have filled it while we waited for the write lock
        if let Some(snapshot) = slot.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(snapshot));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let branches = Arc::new(self.inner.fetch_all_branches().await?);
        tracing::debug!("Branch cache loaded {} branches", branches.len());
        *slot = Some(Arc::clone(&branches));
        Ok(branches)
    }

    async fn select<F>(&self, keep: F) -> Result<Vec<Branch>>
    where
        F: Fn(&Branch) -> bool,
    {
        let snapshot = self.load().await?;
        Ok(snapshot.iter().filter(|b| keep(b)).cloned().collect())
    }
}

#[async_trait]
impl<S: BranchStore> BranchStore for CachedBranchStore<S> {
    async fn fetch_all_branches(&self) -> Result<Vec<Branch>> {
        self.select(|_| true).await
    }

    async fn fetch_active_branches(&self) -> Result<Vec<Branch>> {
        self.select(|b| b.status == BranchStatus::Active).await
    }

    async fn fetch_branches_within_approx_radius(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Branch>> {
        let envelope = geodesy::covering_box(center, radius_km);
        self.select(|b| envelope.contains(b.location)).await
    }

    async fn fetch_branches_in_box(&self, bounding_box: BoundingBox) -> Result<Vec<Branch>> {
        self.select(|b| predicate::within_bounding_box(b.location, &bounding_box))
            .await
    }
}
