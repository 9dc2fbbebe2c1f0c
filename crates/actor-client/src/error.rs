use thiserror::Error;

use crate::wire::Route;

#[derive(Debug, Error)]
pub enum ActorClientError {
    #[error("transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to encode {route} request: {source}")]
    Encode {
        route: Route,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {route} response: {source}")]
    Decode {
        route: Route,
        #[source]
        source: serde_json::Error,
    },

    #[error("{route} answered {status}: {body}")]
    Status {
        route: Route,
        status: u16,
        body: String,
    },

    #[error("actor {action_id} /invoke answered {status}: {body}")]
    InvokeStatus {
        action_id: i64,
        status: u16,
        body: String,
    },

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lease record must hold exactly one row, found {0}")]
    AmbiguousLease(usize),

    #[error("actor {0} has no address yet")]
    NoAddress(i64),

    #[error("the client that produced this actor handle was dropped")]
    ClientDropped,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Frame(#[from] function_client::FunctionClientError),
}

impl From<sqlx::Error> for ActorClientError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ActorClientError::NotFound("row".into()),
            other => ActorClientError::Store(other.to_string()),
        }
    }
}
