use std::sync::Arc;

use crate::error::ActorClientError;
use crate::store::ClusterStore;
use crate::Result;

/// Resolves the address of the current leader from the lease record.
///
/// Nothing is cached: every call reads the store again, since leadership can
/// move between calls.
#[derive(Clone)]
pub struct LeaderLocator {
    store: Arc<dyn ClusterStore>,
}

impl LeaderLocator {
    pub fn new(store: Arc<dyn ClusterStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ClusterStore> {
        &self.store
    }

    /// The lease must hold exactly one row with a non-empty address.
    pub async fn find_leader(&self) -> Result<String> {
        let owners = self.store.lease_owners().await?;
        match owners.as_slice() {
            [] => Err(ActorClientError::NotFound("actor manager lease".into())),
            [address] if address.trim().is_empty() => Err(ActorClientError::NotFound(
                "owner address in actor manager lease".into(),
            )),
            [address] => {
                tracing::debug!(leader = %address, "resolved leader");
                Ok(address.trim().to_string())
            }
            rows => Err(ActorClientError::AmbiguousLease(rows.len())),
        }
    }
}
