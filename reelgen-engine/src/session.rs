use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

pub fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Running => "running",
        SessionState::Completed => "completed",
        SessionState::Failed => "failed",
        SessionState::Cancelled => "cancelled",
    }
}

/// Point-in-time view of the current (or most recent) session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub state: SessionState,

    // A stable string label for UI display.
    // This is intentionally not derived from `Debug`.
    pub state_label: String,

    pub percent: u8,
    pub stage_index: usize,
    pub stage_label: Option<String>,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    pub error: Option<String>,
}

/// Identifies one started session; required to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: u64,
}

pub fn ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
