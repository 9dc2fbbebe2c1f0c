use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{FunctionClientError, Result};

/// Content type of a frame on the wire.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// The remote side of an invocation: takes an encoded argument frame and
/// answers with an encoded result frame.
#[async_trait]
pub trait InvocationService: Send + Sync {
    async fn invoke(&self, function_id: i64, frame: Bytes) -> Result<Bytes>;
}

// ─── HttpInvocationService ────────────────────────────────────────────────

/// Posts frames to `<endpoint>/invoke?function_id=<id>`. An endpoint given
/// without a scheme (`host:port`) is reached over plain `http://`.
#[derive(Debug, Clone)]
pub struct HttpInvocationService {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpInvocationService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = base_url(&endpoint.into());
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FunctionClientError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(Self {
            endpoint: url,
            http,
        })
    }

    fn url(&self) -> String {
        format!("{}/invoke", self.endpoint)
    }
}

fn base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[async_trait]
impl InvocationService for HttpInvocationService {
    async fn invoke(&self, function_id: i64, frame: Bytes) -> Result<Bytes> {
        let url = self.url();
        let transport = |source: reqwest::Error| FunctionClientError::Transport {
            url: url.clone(),
            source,
        };

        tracing::debug!(%url, function_id, bytes = frame.len(), "posting invocation frame");
        let resp = self
            .http
            .post(&url)
            .query(&[("function_id", function_id)])
            .header(reqwest::header::CONTENT_TYPE, OCTET_STREAM)
            .body(frame)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(transport)?;
        if status != reqwest::StatusCode::OK {
            return Err(FunctionClientError::Status {
                url,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}
