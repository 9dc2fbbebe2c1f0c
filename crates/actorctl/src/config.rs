use std::path::Path;

use actor_client::{ClientConfig, StoreConfig};
use anyhow::Context;
use function_client::FrameLimits;
use serde::{Deserialize, Serialize};

/// Contents of the file passed with `--config`. Every section is optional.
///
/// ```yaml
/// store:
///   host: db.internal
///   port: 5432
/// client:
///   rpc_timeout_secs: 5
///   status_mode: strict
/// limits:
///   max_blob_count: 1024
/// invoke_endpoint: http://gateway.internal:8080
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorctlConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub limits: FrameLimits,
    /// Base URL of the function invocation gateway used by `actorctl call`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoke_endpoint: Option<String>,
}

impl ActorctlConfig {
    /// Read `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let cfg: ActorctlConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }
}

/// Store settings given on the command line or through the environment.
/// Anything set here wins over the config file.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct StoreOverrides {
    /// Database host
    #[arg(long = "db-host", global = true, env = "ACTORCTL_DB_HOST")]
    pub host: Option<String>,

    /// Database port
    #[arg(long = "db-port", global = true, env = "ACTORCTL_DB_PORT")]
    pub port: Option<u16>,

    /// Database user
    #[arg(long = "db-user", global = true, env = "ACTORCTL_DB_USER")]
    pub user: Option<String>,

    /// Database name
    #[arg(long = "db-name", global = true, env = "ACTORCTL_DB_NAME")]
    pub dbname: Option<String>,

    /// Database password
    #[arg(
        long = "db-password",
        global = true,
        env = "ACTORCTL_DB_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// libpq-style sslmode (disable, prefer, require, ...)
    #[arg(long = "db-sslmode", global = true, env = "ACTORCTL_DB_SSLMODE")]
    pub sslmode: Option<String>,
}

impl StoreOverrides {
    pub fn apply(self, store: &mut StoreConfig) {
        if let Some(host) = self.host {
            store.host = host;
        }
        if let Some(port) = self.port {
            store.port = port;
        }
        if let Some(user) = self.user {
            store.user = user;
        }
        if let Some(dbname) = self.dbname {
            store.dbname = dbname;
        }
        if let Some(password) = self.password {
            store.password = password;
        }
        if let Some(sslmode) = self.sslmode {
            store.sslmode = sslmode;
        }
    }
}
