//! `function-client`: binary framing and the invocation interface.
//!
//! Arguments and results travel as one frame: an 8-byte little-endian blob
//! count, one 8-byte little-endian length per blob, then the blobs
//! back-to-back (see [`codec`]).
//!
//! ```rust,ignore
//! use function_client::{FunctionClient, HttpInvocationService, FrameLimits};
//! use std::{sync::Arc, time::Duration};
//!
//! let service = HttpInvocationService::new("localhost:37000", Duration::from_secs(10))?;
//! let client = FunctionClient::new(Arc::new(service), FrameLimits::default());
//! let info = client.get(7).invoke(&[b"Arg1".as_slice(), b"Arg2"]);
//! let result = info.wait().await;
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod service;
pub mod types;

pub use client::{Function, FunctionClient, InvocationInfo, InvocationResult};
pub use codec::{decode, decode_with, encode, read_frame, FrameLimits};
pub use error::FunctionClientError;
pub use service::{HttpInvocationService, InvocationService, OCTET_STREAM};
pub use types::FunctionState;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, FunctionClientError>;
