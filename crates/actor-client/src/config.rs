use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ActorClientError;
use crate::Result;

// ---------------------------------------------------------------------------
// StatusMode / LeaderRefresh
// ---------------------------------------------------------------------------

/// What an RPC does with a status other than 200 or 202.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// Fail with [`ActorClientError::Status`] carrying the code and body.
    #[default]
    Strict,
    /// Return the response type's zero value as a success.
    ///
    /// The zero value of a state field is `RUNNING`, so a rejected `Get`
    /// reads as a running actor with no address.
    Compat,
}

/// When the leader address is re-read from the lease record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderRefresh {
    /// Once at connect, then on explicit `refresh_leader`.
    #[default]
    OnConnect,
    /// Before every RPC.
    EveryCall,
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Timeout of the per-actor transport used for calls to the actor itself.
    #[serde(default = "default_timeout_secs")]
    pub actor_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub status_mode: StatusMode,
    #[serde(default)]
    pub leader_refresh: LeaderRefresh,
    #[serde(default = "default_ping_on_connect")]
    pub ping_on_connect: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_ping_on_connect() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_secs: default_timeout_secs(),
            actor_timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            status_mode: StatusMode::default(),
            leader_refresh: LeaderRefresh::default(),
            ping_on_connect: default_ping_on_connect(),
        }
    }
}

impl ClientConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn actor_timeout(&self) -> Duration {
        Duration::from_secs(self.actor_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Connection settings for the Postgres database holding the lease record
/// and the deployments table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub user: String,
    #[serde(default = "default_name")]
    pub dbname: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "default_sslmode")]
    pub sslmode: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "serverless".to_string()
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    4
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_name(),
            dbname: default_name(),
            password: String::new(),
            sslmode: default_sslmode(),
            max_connections: default_max_connections(),
        }
    }
}

impl StoreConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.sslmode)
            .map_err(|e| ActorClientError::Config(format!("sslmode '{}': {e}", self.sslmode)))?;
        let mut opts = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.dbname)
            .ssl_mode(ssl_mode);
        if !self.password.is_empty() {
            opts = opts.password(&self.password);
        }
        Ok(opts)
    }
}
