use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::ActorClientError;
use crate::Result;

pub const APPLICATION_JSON: &str = "application/json";

/// Status line and body of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Bytes,
}

impl Reply {
    /// 200 and 202 are the only codes whose body is decoded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 202)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A request/response channel. Connection failures and timeouts are errors;
/// any status code the peer returns is a [`Reply`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Reply>;

    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<Reply>;
}

// ─── HttpTransport ────────────────────────────────────────────────────────

/// [`Transport`] over HTTP with a fixed per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ActorClientError::Config(format!("http client: {e}")))?;
        Ok(Self { http })
    }

    async fn finish(url: &str, sent: reqwest::Result<reqwest::Response>) -> Result<Reply> {
        let resp = sent.map_err(|e| transport_error(url, e))?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(|e| transport_error(url, e))?;
        Ok(Reply { status, body })
    }
}

fn transport_error(url: &str, source: reqwest::Error) -> ActorClientError {
    ActorClientError::Transport {
        url: url.to_string(),
        source: Box::new(source),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Reply> {
        Self::finish(url, self.http.get(url).send().await).await
    }

    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<Reply> {
        let sent = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await;
        Self::finish(url, sent).await
    }
}
