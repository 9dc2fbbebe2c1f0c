use std::sync::Arc;

use actor_client::{
    ActorClient, ActorHandle, CancellationToken, RunningState, StaticStore, WaitOptions,
    WaitOutcome,
};
use anyhow::Context;
use serde::Serialize;

use crate::cmd::{block_on, deadline};
use crate::config::ActorctlConfig;
use crate::output::{print_blobs, print_json, print_table};

/// Where to find the leader: the store from the config, or a fixed address.
pub struct Session {
    pub config: ActorctlConfig,
    pub leader: Option<String>,
}

impl Session {
    async fn connect(&self) -> anyhow::Result<ActorClient> {
        let client = self.config.client.clone();
        match &self.leader {
            Some(leader) => {
                tracing::debug!(%leader, "using fixed leader address");
                let store = Arc::new(StaticStore::with_leader(leader.clone()));
                ActorClient::connect(store, client)
                    .await
                    .with_context(|| format!("cannot reach leader at {leader}"))
            }
            None => {
                let store = &self.config.store;
                ActorClient::connect_postgres(store, client)
                    .await
                    .with_context(|| {
                        format!(
                            "cannot connect through store {}:{}/{}",
                            store.host, store.port, store.dbname
                        )
                    })
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ActorView {
    action_id: i64,
    state: String,
    address: String,
}

impl From<&ActorHandle> for ActorView {
    fn from(actor: &ActorHandle) -> Self {
        Self {
            action_id: actor.action_id,
            state: actor.state.to_string(),
            address: actor.address.clone(),
        }
    }
}

fn print_actors<'a>(
    actors: impl IntoIterator<Item = &'a ActorHandle>,
    json: bool,
) -> anyhow::Result<()> {
    let views: Vec<ActorView> = actors.into_iter().map(ActorView::from).collect();
    if json {
        return print_json(&views);
    }
    if views.is_empty() {
        println!("No actors.");
        return Ok(());
    }
    let rows = views
        .into_iter()
        .map(|v| {
            let address = if v.address.is_empty() {
                "-".to_string()
            } else {
                v.address
            };
            vec![v.action_id.to_string(), v.state, address]
        })
        .collect();
    print_table(&["ACTION", "STATE", "ADDRESS"], rows);
    Ok(())
}

fn print_state(action_id: i64, state: RunningState, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(&serde_json::json!({ "action_id": action_id, "state": state.to_string() }))
    } else {
        println!("{action_id}: {state}");
        Ok(())
    }
}

/// A deployment given either as its numeric id or by name.
async fn resolve_deployment(client: &ActorClient, deployment: &str) -> anyhow::Result<i64> {
    if let Ok(id) = deployment.parse::<i64>() {
        return Ok(id);
    }
    client
        .find_deployment_id(deployment)
        .await
        .with_context(|| format!("cannot resolve deployment '{deployment}'"))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn ping(session: &Session, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let message = client.ping().await?;
        if json {
            print_json(&serde_json::json!({
                "leader": client.leader_address(),
                "message": message,
            }))
        } else {
            println!("{}: {message}", client.leader_address());
            Ok(())
        }
    })
}

pub fn leader(session: &Session, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let leader = client.leader_address();
        if json {
            print_json(&serde_json::json!({ "leader": leader }))
        } else {
            println!("{leader}");
            Ok(())
        }
    })
}

pub fn deployment(session: &Session, name: &str, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let id = client.find_deployment_id(name).await?;
        if json {
            print_json(&serde_json::json!({ "name": name, "deployment_id": id }))
        } else {
            println!("{id}");
            Ok(())
        }
    })
}

pub fn list(session: &Session, deployment: &str, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let id = resolve_deployment(&client, deployment).await?;
        let actors = client.list(id).await?;
        print_actors(actors.values(), json)
    })
}

pub fn start(
    session: &Session,
    deployment: &str,
    cpus: f32,
    mem: f32,
    args: &str,
    json: bool,
) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let id = resolve_deployment(&client, deployment).await?;
        let actor = client.start(id, cpus, mem, args).await?;
        print_actors([&actor], json)
    })
}

pub fn get(session: &Session, action_id: i64, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let actor = client.get(action_id).await?;
        print_actors([&actor], json)
    })
}

pub fn stop(session: &Session, action_id: i64, json: bool) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let state = client.stop(action_id).await?;
        print_state(action_id, state, json)
    })
}

/// Poll until the actor is running. Exits non-zero when it lands in a state
/// that can never become running, or when the timeout or Ctrl-C fires first.
pub fn wait(
    session: &Session,
    action_id: i64,
    timeout_secs: Option<u64>,
    running_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let mut actor = client.get(action_id).await?;

        let opts = if running_only {
            WaitOptions::running_only().with_interval(client.config().poll_interval())
        } else {
            client.wait_options()
        };

        let cancel = CancellationToken::new();
        {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = deadline(timeout_secs) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                cancel.cancel();
            });
        }

        let outcome = if actor.state == RunningState::Running {
            WaitOutcome::Running
        } else {
            actor.wait_for_running(&opts, &cancel).await?
        };
        cancel.cancel();

        match outcome {
            WaitOutcome::Running => print_actors([&actor], json),
            WaitOutcome::Terminal(state) => {
                print_actors([&actor], json)?;
                anyhow::bail!("actor {action_id} ended in {state} and will not run")
            }
            WaitOutcome::Cancelled => {
                anyhow::bail!(
                    "gave up waiting for actor {action_id} (last seen {})",
                    actor.state
                )
            }
        }
    })
}

/// Send `args` to a running actor's `/invoke` endpoint.
pub fn invoke(
    session: &Session,
    action_id: i64,
    args: &[String],
    json: bool,
) -> anyhow::Result<()> {
    block_on(async {
        let client = session.connect().await?;
        let actor = client.get(action_id).await?;
        let blobs = actor
            .invoke(args, &session.config.limits)
            .await
            .with_context(|| format!("invoke on actor {action_id} failed"))?;
        print_blobs(&blobs, json)
    })
}
