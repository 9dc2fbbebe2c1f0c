use std::sync::Arc;

use actor_client::{
    ActorClient, ActorClientError, CancellationToken, ClientConfig, RunningState, StaticStore,
    StatusMode, WaitOutcome,
};
use mockito::{Matcher, Server};
use serde_json::json;

async fn connect(server: &Server, config: ClientConfig) -> ActorClient {
    let store = Arc::new(StaticStore::with_leader(server.host_with_port()));
    ActorClient::connect(store, config).await.unwrap()
}

fn json_reply(status: usize, body: serde_json::Value) -> (usize, String) {
    (status, body.to_string())
}

#[tokio::test]
async fn connect_pings_leader_over_http() {
    let mut server = Server::new_async().await;
    let ping = server
        .mock("GET", "/ping")
        .with_status(200)
        .with_body(r#"{"message":"pong"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = connect(&server, ClientConfig::default()).await;
    assert_eq!(client.leader_address(), server.host_with_port());
    assert_eq!(client.ping().await.unwrap(), "pong");
    ping.assert_async().await;
}

#[tokio::test]
async fn failed_ping_fails_connect() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ping")
        .with_status(503)
        .create_async()
        .await;

    let store = Arc::new(StaticStore::with_leader(server.host_with_port()));
    let err = ActorClient::connect(store, ClientConfig::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ActorClientError::Status { status: 503, .. }));
}

#[tokio::test]
async fn workflow_against_http_leader() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ping")
        .with_status(200)
        .with_body(r#"{"message":"pong"}"#)
        .create_async()
        .await;

    let (status, body) = json_reply(202, json!({"action_id": 77, "state": 1}));
    let start = server
        .mock("POST", "/start_action")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(
            json!({"deployment_id": -1, "cpus": 0.25, "mem": 256.0, "args": "MyArgsssss"}),
        ))
        .with_status(status)
        .with_body(body)
        .create_async()
        .await;

    let status_running = server
        .mock("POST", "/action_status")
        .match_body(Matcher::Json(json!({"action_id": 77})))
        .with_status(200)
        .with_body(r#"{"state":0,"address":"10.2.0.7:5555"}"#)
        .create_async()
        .await;

    let stop = server
        .mock("POST", "/stop_action")
        .match_body(Matcher::Json(json!({"action_id": 77})))
        .with_status(200)
        .with_body(r#"{"state":5}"#)
        .create_async()
        .await;

    let client = connect(&server, ClientConfig::default()).await;

    let mut actor = client.start(-1, 0.25, 256.0, "MyArgsssss").await.unwrap();
    assert_eq!(actor.action_id, 77);
    assert!(matches!(
        actor.state,
        RunningState::Pending | RunningState::Scheduled
    ));
    assert!(actor.address.is_empty());

    let opts = client
        .wait_options()
        .with_interval(std::time::Duration::from_millis(5));
    let outcome = actor
        .wait_for_running(&opts, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome, WaitOutcome::Running);
    assert_eq!(actor.address, "10.2.0.7:5555");

    assert_eq!(client.stop(actor.action_id).await.unwrap(), RunningState::Stopped);

    start.assert_async().await;
    status_running.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn list_of_empty_deployment_over_http() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("POST", "/list")
        .match_body(Matcher::Json(json!({"deployment_id": 3})))
        .with_status(200)
        .with_body(r#"{"states":{}}"#)
        .create_async()
        .await;

    let config = ClientConfig {
        ping_on_connect: false,
        ..ClientConfig::default()
    };
    let client = connect(&server, config).await;
    assert!(client.list(3).await.unwrap().is_empty());
    list.assert_async().await;
}

#[tokio::test]
async fn compat_mode_swallows_rejections_over_http() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/stop_action")
        .with_status(400)
        .with_body("bad request")
        .create_async()
        .await;

    let config = ClientConfig {
        ping_on_connect: false,
        status_mode: StatusMode::Compat,
        ..ClientConfig::default()
    };
    let client = connect(&server, config).await;
    assert_eq!(client.stop(1).await.unwrap(), RunningState::Running);
}
