//! Read-only access to the shared store: the leader lease record and the
//! deployments table.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::StoreConfig;
use crate::Result;

pub const LEASE_QUERY: &str = "SELECT owner_address FROM actor_manager_lease";
pub const DEPLOYMENT_QUERY: &str = "SELECT id FROM deployments WHERE name = $1";

#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// `owner_address` of every row in the lease record.
    async fn lease_owners(&self) -> Result<Vec<String>>;

    /// Id of the deployment called `name`, if one exists.
    async fn deployment_id(&self, name: &str) -> Result<Option<i64>>;
}

// ─── Postgres ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PgClusterStore {
    pool: PgPool,
}

impl PgClusterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and verify one connection can be established.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await?;
        tracing::debug!(host = %config.host, port = config.port, "connected to cluster store");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ClusterStore for PgClusterStore {
    async fn lease_owners(&self) -> Result<Vec<String>> {
        let owners = sqlx::query_scalar::<_, String>(LEASE_QUERY)
            .fetch_all(&self.pool)
            .await?;
        Ok(owners)
    }

    async fn deployment_id(&self, name: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(DEPLOYMENT_QUERY)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }
}

// ─── StaticStore ──────────────────────────────────────────────────────────

/// In-memory store for pinning a known leader address without a database.
#[derive(Debug, Default)]
pub struct StaticStore {
    owners: RwLock<Vec<String>>,
    deployments: RwLock<HashMap<String, i64>>,
}

impl StaticStore {
    pub fn with_leader(address: impl Into<String>) -> Self {
        let store = Self::default();
        store.set_leader(address);
        store
    }

    /// Replace the lease record with a single row owned by `address`.
    pub fn set_leader(&self, address: impl Into<String>) {
        let mut owners = self.owners.write().unwrap_or_else(|e| e.into_inner());
        *owners = vec![address.into()];
    }

    /// Replace the lease record rows verbatim.
    pub fn set_owners(&self, owners: Vec<String>) {
        *self.owners.write().unwrap_or_else(|e| e.into_inner()) = owners;
    }

    pub fn add_deployment(&self, name: impl Into<String>, id: i64) {
        self.deployments
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.into(), id);
    }
}

#[async_trait]
impl ClusterStore for StaticStore {
    async fn lease_owners(&self) -> Result<Vec<String>> {
        Ok(self.owners.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn deployment_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .deployments
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .copied())
    }
}
