use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunctionClientError {
    #[error("truncated frame: needed {expected} bytes for {section}, only {available} available")]
    TruncatedStream {
        section: &'static str,
        expected: u64,
        available: u64,
    },

    #[error("frame {what} of {declared} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        declared: u64,
        limit: u64,
    },

    #[error("{0} unexpected bytes after the last blob")]
    TrailingBytes(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invocation endpoint {url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("invocation {0} was interrupted")]
    Interrupted(i64),

    #[error("invocation not found: {0}")]
    InvocationNotFound(i64),

    #[error("invocation task failed: {0}")]
    Task(String),
}
