//! `actor-client`: drive a leader-elected actor orchestrator.
//!
//! # Architecture
//!
//! ```text
//! ClusterStore ── lease row ──▶ LeaderLocator
//!                                   │ leader address
//!                                   ▼
//! caller ──▶ ActorClient ── JSON over Transport ──▶ leader /list /start_action …
//!                │
//!                ▼
//!           ActorHandle   ← mirrored state; wait_for_running polls `Get`
//!                │
//!                └── frame over Transport ──▶ actor /invoke
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use actor_client::{ActorClient, ClientConfig, StoreConfig, WaitOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = ActorClient::connect_postgres(&StoreConfig::default(), ClientConfig::default()).await?;
//! let deployment = client.find_deployment_id("echo").await?;
//! let mut actor = client.start(deployment, 0.25, 256.0, "args").await?;
//! match actor.wait_for_running(&client.wait_options(), &CancellationToken::new()).await? {
//!     WaitOutcome::Running => println!("running at {}", actor.address),
//!     other => println!("gave up: {other:?}"),
//! }
//! ```

pub mod actor;
pub mod client;
pub mod config;
pub mod error;
pub mod leader;
pub mod state;
pub mod store;
pub mod transport;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::{ActorHandle, WaitOptions, WaitOutcome};
pub use client::{ActorClient, ActorList};
pub use config::{ClientConfig, LeaderRefresh, StatusMode, StoreConfig};
pub use error::ActorClientError;
pub use leader::LeaderLocator;
pub use state::RunningState;
pub use store::{ClusterStore, PgClusterStore, StaticStore};
pub use transport::{HttpTransport, Reply, Transport};

pub use tokio_util::sync::CancellationToken;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ActorClientError>;
