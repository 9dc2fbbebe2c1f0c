use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle token the orchestrator reports for an actor.
///
/// The client never derives a transition itself; it only mirrors the latest
/// value the leader returned. On the wire each state is its integer position
/// in this list, so `Running` is the zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RunningState {
    #[default]
    Running,
    Scheduled,
    Pending,
    Unsatisfiable,
    NotLeader,
    Stopped,
    NotDeployed,
    Missing,
}

impl RunningState {
    pub const ALL: [RunningState; 8] = [
        RunningState::Running,
        RunningState::Scheduled,
        RunningState::Pending,
        RunningState::Unsatisfiable,
        RunningState::NotLeader,
        RunningState::Stopped,
        RunningState::NotDeployed,
        RunningState::Missing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunningState::Running => "RUNNING",
            RunningState::Scheduled => "SCHEDULED",
            RunningState::Pending => "PENDING",
            RunningState::Unsatisfiable => "UNSATISFIABLE",
            RunningState::NotLeader => "NOTLEADER",
            RunningState::Stopped => "STOPPED",
            RunningState::NotDeployed => "NOTDEPLOYED",
            RunningState::Missing => "MISSING",
        }
    }

    /// States from which an actor can never reach `Running`.
    pub fn dead_ends() -> [RunningState; 4] {
        [
            RunningState::Stopped,
            RunningState::Missing,
            RunningState::Unsatisfiable,
            RunningState::NotDeployed,
        ]
    }
}

impl fmt::Display for RunningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunningState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown running state '{s}'"))
    }
}

impl TryFrom<i64> for RunningState {
    type Error = String;

    fn try_from(token: i64) -> Result<Self, Self::Error> {
        usize::try_from(token)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| format!("unknown running state token {token}"))
    }
}

impl From<RunningState> for i64 {
    fn from(state: RunningState) -> Self {
        state as i64
    }
}
