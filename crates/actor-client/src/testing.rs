//! Scripted transport for driving the client without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::ActorClient;
use crate::config::ClientConfig;
use crate::error::ActorClientError;
use crate::store::StaticStore;
use crate::transport::{Reply, Transport};
use crate::Result;

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(u16, String),
    Fail,
}

pub(crate) fn ok(body: serde_json::Value) -> Scripted {
    Scripted::Reply(200, body.to_string())
}

pub(crate) fn status(code: u16, body: &str) -> Scripted {
    Scripted::Reply(code, body.to_string())
}

#[derive(Debug, Clone)]
pub(crate) struct Sent {
    pub url: String,
    pub body: Bytes,
}

impl Sent {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Replies are queued per last path segment. The final reply of a queue
/// repeats forever; an unscripted route answers 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<Sent>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn script(&self, route: &str, replies: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn requests(&self) -> Vec<Sent> {
        self.requests.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next(&self, url: &str) -> Option<Scripted> {
        let route = url.rsplit('/').next().unwrap_or_default();
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(route)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    async fn respond(&self, url: &str, body: Bytes) -> Result<Reply> {
        self.requests.lock().unwrap().push(Sent {
            url: url.to_string(),
            body,
        });
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.next(url) {
            Some(Scripted::Reply(status, body)) => Ok(Reply {
                status,
                body: Bytes::from(body),
            }),
            Some(Scripted::Fail) => Err(ActorClientError::Transport {
                url: url.to_string(),
                source: Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)),
            }),
            None => Ok(Reply {
                status: 404,
                body: Bytes::from_static(b"unscripted"),
            }),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<Reply> {
        self.respond(url, Bytes::new()).await
    }

    async fn post(&self, url: &str, _content_type: &str, body: Bytes) -> Result<Reply> {
        self.respond(url, body).await
    }
}

/// A client whose leader is `leader:9000` and whose RPCs and actor calls
/// both go through `rpc`.
pub(crate) async fn scripted_client(
    rpc: &Arc<ScriptedTransport>,
    config: ClientConfig,
) -> Result<ActorClient> {
    let store = Arc::new(StaticStore::with_leader("leader:9000"));
    ActorClient::with_transports(store, rpc.clone(), rpc.clone(), config).await
}
