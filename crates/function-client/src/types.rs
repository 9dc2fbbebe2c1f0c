use serde::{Deserialize, Serialize};
use std::fmt;

// ─── FunctionState ────────────────────────────────────────────────────────

/// Lifecycle token reported by the function manager for an invocation.
///
/// Carried on the wire as its integer position in this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum FunctionState {
    Queued,
    Running,
    NotDeployed,
    Interrupted,
    Missing,
}

impl FunctionState {
    pub const ALL: [FunctionState; 5] = [
        FunctionState::Queued,
        FunctionState::Running,
        FunctionState::NotDeployed,
        FunctionState::Interrupted,
        FunctionState::Missing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionState::Queued => "QUEUED",
            FunctionState::Running => "RUNNING",
            FunctionState::NotDeployed => "NOTDEPLOYED",
            FunctionState::Interrupted => "INTERRUPTED",
            FunctionState::Missing => "MISSING",
        }
    }
}

impl fmt::Display for FunctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for FunctionState {
    type Error = String;

    fn try_from(token: i64) -> Result<Self, Self::Error> {
        usize::try_from(token)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| format!("unknown function state token {token}"))
    }
}

impl From<FunctionState> for i64 {
    fn from(state: FunctionState) -> Self {
        state as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_tokens_follow_declaration_order() {
        for (i, state) in FunctionState::ALL.iter().enumerate() {
            assert_eq!(i64::from(*state), i as i64);
        }
    }

    #[test]
    fn serializes_as_integer_token() {
        assert_eq!(serde_json::to_string(&FunctionState::Interrupted).unwrap(), "3");
        let state: FunctionState = serde_json::from_str("1").unwrap();
        assert_eq!(state, FunctionState::Running);
    }

    #[test]
    fn rejects_unknown_token() {
        let err = serde_json::from_str::<FunctionState>("12").unwrap_err();
        assert!(err.to_string().contains("unknown function state token 12"));
        assert!(FunctionState::try_from(-1).is_err());
    }
}
