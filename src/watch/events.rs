//! Events fired by the watch loop.

use super::mode::WatchMode;
use serde::Serialize;
use std::time::Duration;

/// Transition points that can trigger a callback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Success,
    Fail,
    Change,
    Timeout,
    Overcount,
    Heartbeat,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::Success,
        Self::Fail,
        Self::Change,
        Self::Timeout,
        Self::Overcount,
        Self::Heartbeat,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Change => "change",
            Self::Timeout => "timeout",
            Self::Overcount => "overcount",
            Self::Heartbeat => "heartbeat",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fired event together with the loop context at the time it fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub mode: WatchMode,
    /// Zero-based iteration the event belongs to.
    pub iteration: u64,
    pub elapsed: Duration,
    /// Outcome of this iteration's command, when it has run.
    pub outcome: Option<bool>,
    /// Total transitions counted so far.
    pub flappings: u64,
}

impl WatchEvent {
    /// Environment variables describing this event, passed to callbacks.
    #[must_use]
    pub fn env(&self, command: &str) -> Vec<(String, String)> {
        let mut env = vec![
            ("WATCHFOR_EVENT".to_string(), self.kind.name().to_string()),
            ("WATCHFOR_MODE".to_string(), self.mode.name().to_string()),
            ("WATCHFOR_ITERATION".to_string(), self.iteration.to_string()),
            (
                "WATCHFOR_ELAPSED".to_string(),
                format!("{:.3}", self.elapsed.as_secs_f64()),
            ),
            ("WATCHFOR_FLAPPINGS".to_string(), self.flappings.to_string()),
            ("WATCHFOR_COMMAND".to_string(), command.to_string()),
        ];
        if let Some(outcome) = self.outcome {
            let value = if outcome { "success" } else { "fail" };
            env.push(("WATCHFOR_OUTCOME".to_string(), value.to_string()));
        }
        env
    }
}
