use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::actor::{ActorHandle, WaitOptions};
use crate::config::{ClientConfig, LeaderRefresh, StatusMode, StoreConfig};
use crate::error::ActorClientError;
use crate::leader::LeaderLocator;
use crate::state::RunningState;
use crate::store::{ClusterStore, PgClusterStore};
use crate::transport::{HttpTransport, Reply, Transport, APPLICATION_JSON};
use crate::wire::{
    ListReq, ListResp, PingResp, Route, StartReq, StartResp, StatusReq, StatusResp, StopReq,
    StopResp,
};
use crate::Result;

/// Actors of one deployment, keyed by action id.
pub type ActorList = BTreeMap<i64, ActorHandle>;

// ─── ActorClient ──────────────────────────────────────────────────────────

/// Issues lifecycle RPCs to the current leader.
///
/// All resources (store, transports, leader address) live on this object;
/// clones share them. [`ActorHandle`]s keep only a weak reference back, so
/// they stop working once every clone of the client is dropped.
#[derive(Clone)]
pub struct ActorClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    locator: LeaderLocator,
    rpc: Arc<dyn Transport>,
    actor_transport: Arc<dyn Transport>,
    config: ClientConfig,
    leader: RwLock<String>,
}

impl ActorClient {
    /// Connect to the Postgres store described by `store`, then to the leader.
    pub async fn connect_postgres(store: &StoreConfig, config: ClientConfig) -> Result<Self> {
        let store = PgClusterStore::connect(store).await?;
        Self::connect(Arc::new(store), config).await
    }

    /// Resolve the leader through `store` and talk to it over HTTP.
    pub async fn connect(store: Arc<dyn ClusterStore>, config: ClientConfig) -> Result<Self> {
        let rpc = Arc::new(HttpTransport::new(config.rpc_timeout())?);
        let actor_transport = Arc::new(HttpTransport::new(config.actor_timeout())?);
        Self::with_transports(store, rpc, actor_transport, config).await
    }

    /// Like [`connect`](Self::connect) with caller-supplied transports: `rpc`
    /// for calls to the leader, `actor_transport` for calls to actors.
    pub async fn with_transports(
        store: Arc<dyn ClusterStore>,
        rpc: Arc<dyn Transport>,
        actor_transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Result<Self> {
        let locator = LeaderLocator::new(store);
        let leader = locator.find_leader().await?;
        let ping_on_connect = config.ping_on_connect;
        let client = ActorClient {
            inner: Arc::new(ClientInner {
                locator,
                rpc,
                actor_transport,
                config,
                leader: RwLock::new(leader),
            }),
        };
        if ping_on_connect {
            let message = client.ping().await?;
            tracing::debug!(leader = %client.leader_address(), %message, "leader answered ping");
        }
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Address the next RPC will target (unless `leader_refresh` is
    /// `every_call`, in which case it is re-read first).
    pub fn leader_address(&self) -> String {
        self.inner
            .leader
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the lease record and retarget subsequent RPCs.
    pub async fn refresh_leader(&self) -> Result<String> {
        let leader = self.inner.locator.find_leader().await?;
        let mut current = self.inner.leader.write().unwrap_or_else(|e| e.into_inner());
        if *current != leader {
            tracing::info!(from = %current, to = %leader, "leader changed");
            *current = leader.clone();
        }
        Ok(leader)
    }

    /// Polling options seeded from this client's configuration.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            interval: self.inner.config.poll_interval(),
            ..WaitOptions::default()
        }
    }

    // ── RPCs ─────────────────────────────────────────────────────────────

    pub async fn ping(&self) -> Result<String> {
        let url = self.route_url(Route::Ping).await?;
        let reply = self.inner.rpc.get(&url).await?;
        let resp: PingResp = self.decode(Route::Ping, reply)?;
        Ok(resp.message)
    }

    /// Every actor of `deployment_id`. An empty map is a normal answer.
    pub async fn list(&self, deployment_id: i64) -> Result<ActorList> {
        let resp: ListResp = self.call(Route::List, &ListReq { deployment_id }).await?;
        Ok(resp
            .states
            .into_iter()
            .map(|(action_id, status)| {
                (
                    action_id,
                    self.new_actor(action_id, status.state, status.address),
                )
            })
            .collect())
    }

    /// Ask the leader to start an actor. The returned state is passed through
    /// as reported (normally `PENDING` or `SCHEDULED`); the address is empty.
    pub async fn start(
        &self,
        deployment_id: i64,
        cpus: f32,
        mem: f32,
        args: impl Into<String>,
    ) -> Result<ActorHandle> {
        let req = StartReq {
            deployment_id,
            cpus,
            mem,
            args: args.into(),
        };
        let resp: StartResp = self.call(Route::StartAction, &req).await?;
        tracing::debug!(action_id = resp.action_id, state = %resp.state, "actor started");
        Ok(self.new_actor(resp.action_id, resp.state, String::new()))
    }

    /// Snapshot of one actor. Ids the leader does not know come back with
    /// whatever state it reports for them (`MISSING` by convention).
    pub async fn get(&self, action_id: i64) -> Result<ActorHandle> {
        let resp: StatusResp = self
            .call(Route::ActionStatus, &StatusReq { action_id })
            .await?;
        Ok(self.new_actor(action_id, resp.state, resp.address))
    }

    pub async fn stop(&self, action_id: i64) -> Result<RunningState> {
        let resp: StopResp = self.call(Route::StopAction, &StopReq { action_id }).await?;
        tracing::debug!(action_id, state = %resp.state, "actor stopped");
        Ok(resp.state)
    }

    /// Translate a deployment name to its id with a direct store lookup.
    pub async fn find_deployment_id(&self, name: &str) -> Result<i64> {
        self.inner
            .locator
            .store()
            .deployment_id(name)
            .await?
            .ok_or_else(|| ActorClientError::NotFound(format!("deployment '{name}'")))
    }

    // ── Internal ─────────────────────────────────────────────────────────

    pub(crate) fn new_actor(
        &self,
        action_id: i64,
        state: RunningState,
        address: String,
    ) -> ActorHandle {
        ActorHandle::new(
            action_id,
            state,
            address,
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.actor_transport),
        )
    }

    async fn route_url(&self, route: Route) -> Result<String> {
        let leader = match self.inner.config.leader_refresh {
            LeaderRefresh::EveryCall => self.refresh_leader().await?,
            LeaderRefresh::OnConnect => self.leader_address(),
        };
        Ok(format!("http://{leader}/{}", route.path()))
    }

    async fn call<Req, Resp>(&self, route: Route, req: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Default,
    {
        let body =
            serde_json::to_vec(req).map_err(|source| ActorClientError::Encode { route, source })?;
        let url = self.route_url(route).await?;
        tracing::debug!(%url, "actor rpc");
        let reply = self
            .inner
            .rpc
            .post(&url, APPLICATION_JSON, Bytes::from(body))
            .await?;
        self.decode(route, reply)
    }

    fn decode<Resp>(&self, route: Route, reply: Reply) -> Result<Resp>
    where
        Resp: DeserializeOwned + Default,
    {
        if !reply.is_success() {
            return match self.inner.config.status_mode {
                StatusMode::Strict => Err(ActorClientError::Status {
                    route,
                    status: reply.status,
                    body: reply.body_text(),
                }),
                StatusMode::Compat => {
                    tracing::warn!(%route, status = reply.status, "non-success status, returning zero value");
                    Ok(Resp::default())
                }
            };
        }
        serde_json::from_slice(&reply.body).map_err(|source| ActorClientError::Decode { route, source })
    }
}

impl ClientInner {
    pub(crate) fn client(self: Arc<Self>) -> ActorClient {
        ActorClient { inner: self }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
