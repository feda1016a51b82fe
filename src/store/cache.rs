use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{BranchRegistry, StoreError};
use crate::model::branch::Branch;

/// Branch lookups hit on every check-in; branches change rarely.
const BRANCH_CACHE_CAPACITY: u64 = 10_000;

/// TTL cache in front of another registry. Misses are not cached, so a
/// branch created after a failed lookup is visible immediately.
pub struct CachedBranchRegistry {
    inner: Arc<dyn BranchRegistry>,
    cache: Cache<u64, Branch>,
}

impl CachedBranchRegistry {
    pub fn new(inner: Arc<dyn BranchRegistry>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(BRANCH_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Drop a branch after its coordinates or radius changed.
    pub async fn invalidate(&self, id: u64) {
        self.cache.invalidate(&id).await;
    }
}

#[async_trait]
impl BranchRegistry for CachedBranchRegistry {
    async fn get_branch(&self, id: u64) -> Result<Option<Branch>, StoreError> {
        if let Some(branch) = self.cache.get(&id).await {
            return Ok(Some(branch));
        }

        let branch = self.inner.get_branch(id).await?;
        if let Some(b) = &branch {
            debug!(branch_id = id, "Caching branch");
            self.cache.insert(id, b.clone()).await;
        }

        Ok(branch)
    }
}
