//! Watch modes and the outcome/flapping state machine.
//!
//! [`evaluate`] is a pure function: given the current and previous outcome,
//! the mode and the flapping counters, it returns which events fire, the
//! updated counters, and whether the run is resolved.

use super::events::EventKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Termination policy of a watch run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum WatchMode {
    /// Stop on the first successful execution.
    #[default]
    Success,
    /// Stop on the first failed execution.
    Fail,
    /// Stop once the outcome changes (or after enough flappings).
    Change,
    /// Report changes but never stop on its own.
    Monitor,
}

impl WatchMode {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Change => "change",
            Self::Monitor => "monitor",
        }
    }
}

impl std::fmt::Display for WatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" | "true" => Ok(Self::Success),
            "fail" | "false" => Ok(Self::Fail),
            "change" => Ok(Self::Change),
            "monitor" | "mon" => Ok(Self::Monitor),
            other => Err(format!(
                "unknown watch mode '{other}'. Valid options: success, fail, change, monitor"
            )),
        }
    }
}

/// Outcome transitions seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlappingCounters {
    /// Transitions since the threshold was last reached.
    pub current: u64,
    /// All transitions counted in this run; never reset.
    pub total: u64,
}

/// What the state machine decided for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The run is over.
    pub terminate: bool,
    /// Result to record when `terminate` is set.
    pub succeeded: bool,
    pub counters: FlappingCounters,
    /// Events to fire, in order.
    pub events: Vec<EventKind>,
}

impl Decision {
    fn carry_on(counters: FlappingCounters, events: Vec<EventKind>) -> Self {
        Self {
            terminate: false,
            succeeded: false,
            counters,
            events,
        }
    }

    fn resolved(counters: FlappingCounters, events: Vec<EventKind>) -> Self {
        Self {
            terminate: true,
            succeeded: true,
            counters,
            events,
        }
    }
}

/// Decide events, counters and termination for one observed outcome.
///
/// `previous` is `None` on the first iteration, which therefore can never be
/// a transition. A `threshold` of `None` means every transition resolves a
/// `change` run immediately.
#[must_use]
pub fn evaluate(
    mode: WatchMode,
    outcome: bool,
    previous: Option<bool>,
    threshold: Option<u64>,
    counters: FlappingCounters,
) -> Decision {
    match mode {
        WatchMode::Success if outcome => Decision::resolved(counters, vec![EventKind::Success]),
        WatchMode::Fail if !outcome => Decision::resolved(counters, vec![EventKind::Fail]),
        WatchMode::Success | WatchMode::Fail => Decision::carry_on(counters, Vec::new()),
        WatchMode::Change | WatchMode::Monitor => {
            evaluate_transition(mode, outcome, previous, threshold, counters)
        }
    }
}

fn evaluate_transition(
    mode: WatchMode,
    outcome: bool,
    previous: Option<bool>,
    threshold: Option<u64>,
    counters: FlappingCounters,
) -> Decision {
    let changed = previous.is_some_and(|prev| prev != outcome);
    if !changed {
        return Decision::carry_on(counters, Vec::new());
    }

    let events = vec![
        EventKind::Change,
        if outcome {
            EventKind::Success
        } else {
            EventKind::Fail
        },
    ];
    let stops = mode != WatchMode::Monitor;

    let Some(threshold) = threshold else {
        return if stops {
            Decision::resolved(counters, events)
        } else {
            Decision::carry_on(counters, events)
        };
    };

    let mut next = FlappingCounters {
        current: counters.current + 1,
        total: counters.total + 1,
    };
    if next.current >= threshold {
        tracing::debug!("{mode}: reached expected flappings: {threshold}");
        next.current = 0;
        if stops {
            return Decision::resolved(next, events);
        }
    }
    Decision::carry_on(next, events)
}
