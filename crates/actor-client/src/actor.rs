use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use function_client::codec::{self, FrameLimits};
use function_client::OCTET_STREAM;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::client::{ActorClient, ClientInner};
use crate::error::ActorClientError;
use crate::state::RunningState;
use crate::transport::Transport;
use crate::Result;

// ─── ActorHandle ──────────────────────────────────────────────────────────

/// Local mirror of one actor: id, last observed state and address.
///
/// A handle is a snapshot. It changes only by being replaced wholesale with
/// a freshly fetched one ([`refresh`](Self::refresh),
/// [`wait_for_running`](Self::wait_for_running)); nothing is held on the
/// server for it.
#[derive(Clone)]
pub struct ActorHandle {
    pub action_id: i64,
    pub state: RunningState,
    /// `host:port` of the actor process; empty until it is running.
    pub address: String,
    client: Weak<ClientInner>,
    conn: Arc<dyn Transport>,
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("action_id", &self.action_id)
            .field("state", &self.state)
            .field("address", &self.address)
            .finish()
    }
}

impl ActorHandle {
    pub(crate) fn new(
        action_id: i64,
        state: RunningState,
        address: String,
        client: Weak<ClientInner>,
        conn: Arc<dyn Transport>,
    ) -> Self {
        Self {
            action_id,
            state,
            address,
            client,
            conn,
        }
    }

    /// `http://<address>/<route>` on the actor itself.
    pub fn url(&self, route: &str) -> String {
        format!("http://{}/{}", self.address, route.trim_start_matches('/'))
    }

    fn client(&self) -> Result<ActorClient> {
        self.client
            .upgrade()
            .map(ClientInner::client)
            .ok_or(ActorClientError::ClientDropped)
    }

    /// Replace this handle with a fresh snapshot from the leader.
    pub async fn refresh(&mut self) -> Result<()> {
        let fresh = self.client()?.get(self.action_id).await?;
        *self = fresh;
        Ok(())
    }

    /// Ask the leader to stop this actor. The mirrored state is left as is;
    /// call [`refresh`](Self::refresh) to observe the result.
    pub async fn stop(&self) -> Result<RunningState> {
        self.client()?.stop(self.action_id).await
    }

    /// Send `args` to the actor's `/invoke` endpoint as one frame and decode
    /// the reply frame.
    pub async fn invoke<B: AsRef<[u8]>>(
        &self,
        args: &[B],
        limits: &FrameLimits,
    ) -> Result<Vec<Bytes>> {
        if self.address.is_empty() {
            return Err(ActorClientError::NoAddress(self.action_id));
        }
        let url = self.url("invoke");
        tracing::debug!(action_id = self.action_id, %url, args = args.len(), "invoking actor");
        let reply = self.conn.post(&url, OCTET_STREAM, codec::encode(args)).await?;
        if reply.status != 200 {
            return Err(ActorClientError::InvokeStatus {
                action_id: self.action_id,
                status: reply.status,
                body: reply.body_text(),
            });
        }
        Ok(codec::decode_with(&reply.body, limits)?)
    }

    /// Poll the leader until this actor is running.
    ///
    /// Every `opts.interval` (first tick one interval after the call) the
    /// actor is re-fetched with a single `Get`; fetches never overlap.
    ///
    /// - fetched state is `RUNNING`: adopt the snapshot, `Ok(Running)`
    /// - fetched state is in `opts.terminal_states`: adopt it, `Ok(Terminal)`
    /// - the fetch fails: `Err`, handle untouched
    /// - `cancel` fires: `Ok(Cancelled)`, handle untouched
    pub async fn wait_for_running(
        &mut self,
        opts: &WaitOptions,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome> {
        let period = opts.interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut ticks: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(action_id = self.action_id, ticks, "wait for running cancelled");
                    return Ok(WaitOutcome::Cancelled);
                }
                _ = ticker.tick() => {}
            }
            ticks += 1;

            let fresh = match self.client()?.get(self.action_id).await {
                Ok(fresh) => fresh,
                Err(e) => {
                    tracing::warn!(action_id = self.action_id, ticks, error = %e, "actor poll failed");
                    return Err(e);
                }
            };
            tracing::trace!(action_id = self.action_id, ticks, state = %fresh.state, "polled actor");

            if fresh.state == RunningState::Running {
                tracing::debug!(action_id = self.action_id, ticks, address = %fresh.address, "actor running");
                *self = fresh;
                return Ok(WaitOutcome::Running);
            }
            if opts.terminal_states.contains(&fresh.state) {
                let state = fresh.state;
                tracing::debug!(action_id = self.action_id, ticks, %state, "actor cannot reach running");
                *self = fresh;
                return Ok(WaitOutcome::Terminal(state));
            }
        }
    }

    /// Run [`wait_for_running`](Self::wait_for_running) as its own task. The
    /// task hands the handle back alongside the outcome.
    pub fn spawn_wait(
        mut self,
        opts: WaitOptions,
        cancel: CancellationToken,
    ) -> JoinHandle<(ActorHandle, Result<WaitOutcome>)> {
        tokio::spawn(async move {
            let outcome = self.wait_for_running(&opts, &cancel).await;
            (self, outcome)
        })
    }
}

// ─── WaitOptions / WaitOutcome ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    pub interval: Duration,
    /// States that end the wait without success.
    pub terminal_states: Vec<RunningState>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            terminal_states: RunningState::dead_ends().to_vec(),
        }
    }
}

impl WaitOptions {
    /// Only `RUNNING` or cancellation ends the wait.
    pub fn running_only() -> Self {
        Self {
            terminal_states: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Running,
    Terminal(RunningState),
    Cancelled,
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::{ok, scripted_client, Scripted, ScriptedTransport};
    use crate::store::StaticStore;
    use crate::transport::HttpTransport;
    use serde_json::json;

    fn quiet() -> ClientConfig {
        ClientConfig {
            ping_on_connect: false,
            ..ClientConfig::default()
        }
    }

    fn fast() -> WaitOptions {
        WaitOptions::default().with_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn reaches_running_after_a_few_ticks() {
        let rpc = ScriptedTransport::new();
        rpc.script("start_action", vec![ok(json!({"action_id": 11, "state": 2}))]);
        rpc.script(
            "action_status",
            vec![
                ok(json!({"state": 2})),
                ok(json!({"state": 1})),
                ok(json!({"state": 0, "address": "10.0.0.11:4000"})),
            ],
        );
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.start(1, 0.5, 64.0, "").await.unwrap();

        let outcome = actor
            .wait_for_running(&fast(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Running);
        assert_eq!(actor.state, RunningState::Running);
        assert_eq!(actor.address, "10.0.0.11:4000");
        let polls = rpc
            .requests()
            .into_iter()
            .filter(|r| r.url.ends_with("/action_status"))
            .count();
        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn immediate_cancellation_reports_nothing() {
        let rpc = ScriptedTransport::new();
        rpc.script("action_status", vec![ok(json!({"state": 0, "address": "x:1"}))]);
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Pending, String::new());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = actor.wait_for_running(&fast(), &cancel).await.unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert_eq!(actor.state, RunningState::Pending);
        assert!(rpc.requests().is_empty());
    }

    #[tokio::test]
    async fn running_only_keeps_polling_dead_states_until_cancelled() {
        let rpc = ScriptedTransport::new();
        rpc.script("action_status", vec![ok(json!({"state": 7}))]);
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let actor = client.new_actor(5, RunningState::Pending, String::new());

        let cancel = CancellationToken::new();
        let task = actor.spawn_wait(
            WaitOptions::running_only().with_interval(Duration::from_millis(5)),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel.cancel();
        let (actor, outcome) = task.await.unwrap();

        assert_eq!(outcome.unwrap(), WaitOutcome::Cancelled);
        assert_eq!(actor.state, RunningState::Pending);
        assert!(rpc.requests().len() >= 2);
    }

    #[tokio::test]
    async fn dead_end_state_terminates_by_default() {
        let rpc = ScriptedTransport::new();
        rpc.script(
            "action_status",
            vec![ok(json!({"state": 2})), ok(json!({"state": 7}))],
        );
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Pending, String::new());

        let outcome = actor
            .wait_for_running(&fast(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Terminal(RunningState::Missing));
        assert_eq!(actor.state, RunningState::Missing);
    }

    #[tokio::test]
    async fn custom_terminal_set() {
        let rpc = ScriptedTransport::new();
        rpc.script("action_status", vec![ok(json!({"state": 4}))]);
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Pending, String::new());

        let opts = WaitOptions {
            interval: Duration::from_millis(5),
            terminal_states: vec![RunningState::NotLeader],
        };
        let outcome = actor
            .wait_for_running(&opts, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Terminal(RunningState::NotLeader));
    }

    #[tokio::test]
    async fn fetch_failure_ends_wait_with_error() {
        let rpc = ScriptedTransport::new();
        rpc.script(
            "action_status",
            vec![ok(json!({"state": 1})), Scripted::Fail],
        );
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Scheduled, String::new());

        let err = actor
            .wait_for_running(&fast(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ActorClientError::Transport { .. }));
        assert_eq!(actor.state, RunningState::Scheduled);
    }

    #[tokio::test]
    async fn polls_never_overlap() {
        let rpc = ScriptedTransport::with_delay(Duration::from_millis(15));
        rpc.script(
            "action_status",
            vec![
                ok(json!({"state": 2})),
                ok(json!({"state": 2})),
                ok(json!({"state": 0, "address": "a:1"})),
            ],
        );
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Pending, String::new());

        let opts = WaitOptions::default().with_interval(Duration::from_millis(1));
        let outcome = actor
            .wait_for_running(&opts, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, WaitOutcome::Running);
        assert_eq!(rpc.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn handle_outliving_client_reports_dropped() {
        let rpc = ScriptedTransport::new();
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(5, RunningState::Pending, String::new());
        drop(client);

        assert!(matches!(
            actor.refresh().await,
            Err(ActorClientError::ClientDropped)
        ));
        assert!(matches!(
            actor.wait_for_running(&fast(), &CancellationToken::new()).await,
            Err(ActorClientError::ClientDropped)
        ));
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let rpc = ScriptedTransport::new();
        rpc.script(
            "action_status",
            vec![ok(json!({"state": 0, "address": "10.0.0.2:80"}))],
        );
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let mut actor = client.new_actor(2, RunningState::Pending, String::new());

        actor.refresh().await.unwrap();
        assert_eq!(actor.state, RunningState::Running);
        assert_eq!(actor.url("/invoke"), "http://10.0.0.2:80/invoke");
    }

    #[tokio::test]
    async fn stop_reports_state_without_touching_mirror() {
        let rpc = ScriptedTransport::new();
        rpc.script("stop_action", vec![ok(json!({"state": 5}))]);
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let actor = client.new_actor(2, RunningState::Running, "a:1".into());

        assert_eq!(actor.stop().await.unwrap(), RunningState::Stopped);
        assert_eq!(actor.state, RunningState::Running);
    }

    #[tokio::test]
    async fn invoke_without_address_fails() {
        let rpc = ScriptedTransport::new();
        let client = scripted_client(&rpc, quiet()).await.unwrap();
        let actor = client.new_actor(2, RunningState::Pending, String::new());
        assert!(matches!(
            actor.invoke(&[&b"x"[..]], &FrameLimits::default()).await,
            Err(ActorClientError::NoAddress(2))
        ));
    }

    #[tokio::test]
    async fn invoke_round_trips_frames_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/invoke")
            .match_header("content-type", OCTET_STREAM)
            .with_status(200)
            .with_body(codec::encode(&[&b"Got Arg1"[..], &b""[..]]).to_vec())
            .create_async()
            .await;

        let rpc = ScriptedTransport::new();
        let client = ActorClient::with_transports(
            Arc::new(StaticStore::with_leader("leader:9000")),
            rpc,
            Arc::new(HttpTransport::new(Duration::from_secs(10)).unwrap()),
            quiet(),
        )
        .await
        .unwrap();
        let actor = client.new_actor(9, RunningState::Running, server.host_with_port());

        let blobs = actor
            .invoke(&[&b"Arg1"[..]], &FrameLimits::default())
            .await
            .unwrap();
        assert_eq!(blobs, vec![Bytes::from("Got Arg1"), Bytes::new()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invoke_non_ok_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/invoke")
            .with_status(500)
            .with_body("crashed")
            .create_async()
            .await;

        let rpc = ScriptedTransport::new();
        let client = ActorClient::with_transports(
            Arc::new(StaticStore::with_leader("leader:9000")),
            rpc,
            Arc::new(HttpTransport::new(Duration::from_secs(10)).unwrap()),
            quiet(),
        )
        .await
        .unwrap();
        let actor = client.new_actor(9, RunningState::Running, server.host_with_port());

        match actor.invoke::<&[u8]>(&[], &FrameLimits::default()).await {
            Err(ActorClientError::InvokeStatus { status, body, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "crashed");
            }
            other => panic!("expected InvokeStatus, got {other:?}"),
        }
    }
}
