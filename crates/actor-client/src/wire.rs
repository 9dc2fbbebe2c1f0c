//! JSON bodies exchanged with the leader, one pair per route.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::state::RunningState;

/// Routes served by the leader, relative to its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ping,
    List,
    StartAction,
    ActionStatus,
    StopAction,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Ping => "ping",
            Route::List => "list",
            Route::StartAction => "start_action",
            Route::ActionStatus => "action_status",
            Route::StopAction => "stop_action",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

// ─── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReq {
    pub deployment_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartReq {
    pub deployment_id: i64,
    pub cpus: f32,
    pub mem: f32,
    pub args: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReq {
    pub action_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopReq {
    pub action_id: i64,
}

// ─── Responses ────────────────────────────────────────────────────────────
//
// `Default` is the zero value handed back in compat status mode.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PingResp {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResp {
    #[serde(default)]
    pub states: HashMap<i64, StatusResp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartResp {
    pub action_id: i64,
    pub state: RunningState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResp {
    pub state: RunningState,
    /// Empty until the actor is running.
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopResp {
    pub state: RunningState,
}
