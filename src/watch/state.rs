//! Watch run state.
//!
//! Tracks the iteration counter, the previous outcome, flapping counters and
//! the overall result for one run of the watch loop.

use super::mode::{Decision, FlappingCounters};
use std::time::{Duration, Instant};

/// Mutable state of a single watch run, owned by the loop.
#[derive(Debug, Clone)]
pub struct WatchState {
    /// When the run started.
    pub started_at: Instant,
    /// Completed iterations; the index of the iteration in progress.
    pub iteration: u64,
    /// Outcome of the previous iteration, `None` before the first one.
    pub previous_outcome: Option<bool>,
    pub flappings: FlappingCounters,
    /// Overall result; decides the exit status.
    pub succeeded: bool,
    /// Successful executions observed.
    pub successes: u64,
    /// Failed executions observed.
    pub failures: u64,
}

impl WatchState {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    #[must_use]
    pub const fn starting_at(started_at: Instant) -> Self {
        Self {
            started_at,
            iteration: 0,
            previous_outcome: None,
            flappings: FlappingCounters {
                current: 0,
                total: 0,
            },
            succeeded: false,
            successes: 0,
            failures: 0,
        }
    }

    /// Time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Tally an observed outcome.
    pub(crate) fn observe(&mut self, outcome: bool) {
        if outcome {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    /// Take the state machine's counters, and its result if it terminated.
    pub(crate) fn apply(&mut self, decision: &Decision) {
        self.flappings = decision.counters;
        if decision.terminate {
            self.succeeded = decision.succeeded;
        }
    }

    /// Move on to the next iteration.
    pub(crate) fn advance(&mut self, outcome: bool) {
        self.previous_outcome = Some(outcome);
        self.iteration += 1;
    }
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a watch run stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The mode's condition was met.
    Resolved,
    /// The iteration budget ran out.
    Overcount,
    /// The time budget ran out.
    Timeout,
    /// The stop flag was raised.
    Interrupted,
    /// An unexpected fault stopped the loop.
    Fault(String),
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Overcount => write!(f, "overcount"),
            Self::Timeout => write!(f, "timeout"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::Fault(msg) => write!(f, "fault: {msg}"),
        }
    }
}

/// Final summary of a watch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub succeeded: bool,
    pub termination: Termination,
    /// Iterations completed (the watched command ran at least this many times).
    pub iterations: u64,
    pub flappings: FlappingCounters,
    pub successes: u64,
    pub failures: u64,
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn from_state(state: &WatchState, termination: Termination) -> Self {
        Self {
            succeeded: state.succeeded,
            termination,
            iterations: state.iteration,
            flappings: state.flappings,
            successes: state.successes,
            failures: state.failures,
            elapsed: state.elapsed(),
        }
    }

    /// Process exit status: `0` when the run succeeded, `1` otherwise.
    #[must_use]
    pub const fn exit_status(&self) -> i32 {
        if self.succeeded {
            0
        } else {
            1
        }
    }
}
