//! Main watch loop.
//!
//! Runs the watched command once per iteration, enforces the iteration and
//! time budgets, feeds outcomes to the mode state machine, fires events, and
//! finalizes the run exactly once on every exit path.

use super::config::WatchConfig;
use super::dispatch::CallbackDispatcher;
use super::events::{EventKind, WatchEvent};
use super::mode;
use super::observers::{build_observers, WatchObserver};
use super::state::{RunReport, Termination, WatchState};
use crate::executor::{CommandExecutor, ShellExecutor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest single sleep before the stop flag is checked again.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// The watch loop engine.
///
/// Owns the executor and observers for the lifetime of the loop. State lives
/// only inside [`WatchLoop::run`].
pub struct WatchLoop<'a, E: CommandExecutor> {
    config: &'a WatchConfig,
    executor: E,
    observers: Vec<Box<dyn WatchObserver>>,
    stop: Arc<AtomicBool>,
}

/// How one iteration ended.
enum Step {
    Continue(bool),
    Stop(Termination),
}

impl<'a, E: CommandExecutor> WatchLoop<'a, E> {
    pub fn new(config: &'a WatchConfig, executor: E) -> Self {
        Self {
            config,
            executor,
            observers: Vec::new(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a stop flag; raising it interrupts the loop at the next check.
    #[must_use]
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn WatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn with_observers(mut self, observers: Vec<Box<dyn WatchObserver>>) -> Self {
        self.observers.extend(observers);
        self
    }

    /// Handle to the stop flag.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    #[must_use]
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// Run the loop until a mode condition, a budget or the stop flag ends it.
    pub fn run(&mut self) -> RunReport {
        log_watch_started(self.config);

        let mut state = WatchState::new();
        let termination = loop {
            match self.iterate(&mut state) {
                Step::Continue(outcome) => {
                    state.advance(outcome);
                    if self.sleep_interruptible(self.config.interval) {
                        break Termination::Interrupted;
                    }
                }
                Step::Stop(termination) => break termination,
            }
        };

        self.finish(&state, termination)
    }

    /// One pass through the loop body, up to but excluding the sleep.
    fn iterate(&mut self, state: &mut WatchState) -> Step {
        if self.stopped() {
            return Step::Stop(Termination::Interrupted);
        }

        let elapsed = state.elapsed();

        if let Some(max) = self.config.max_iterations {
            if state.iteration >= max {
                tracing::debug!(
                    "Max iterations reached at {} iteration at {:.3} second",
                    state.iteration,
                    elapsed.as_secs_f64()
                );
                self.emit(EventKind::Overcount, state, None);
                return Step::Stop(Termination::Overcount);
            }
        }

        if let Some(timeout) = self.config.timeout {
            if elapsed > timeout {
                tracing::debug!("Timeout reached at {:.3} second", elapsed.as_secs_f64());
                self.emit(EventKind::Timeout, state, None);
                return Step::Stop(Termination::Timeout);
            }
        }

        self.emit(EventKind::Heartbeat, state, None);
        if self.stopped() {
            return Step::Stop(Termination::Interrupted);
        }

        let output = match self.executor.run(&self.config.command, &[]) {
            Ok(output) => output,
            Err(e) => {
                tracing::error!("Exception: {e}");
                return Step::Stop(Termination::Fault(e.to_string()));
            }
        };

        // An interrupt delivered while the command ran aborts the iteration.
        if self.stopped() {
            return Step::Stop(Termination::Interrupted);
        }

        let outcome = output.outcome();
        tracing::trace!(
            "Iteration {} exited with {}",
            state.iteration,
            output.exit_code
        );
        state.observe(outcome);
        self.notify(|o| o.on_outcome(state.iteration, outcome));

        let decision = mode::evaluate(
            self.config.mode,
            outcome,
            state.previous_outcome,
            self.config.flapping_threshold,
            state.flappings,
        );
        state.apply(&decision);
        for kind in &decision.events {
            self.emit(*kind, state, Some(outcome));
        }

        if decision.terminate {
            Step::Stop(Termination::Resolved)
        } else {
            Step::Continue(outcome)
        }
    }

    /// Notify observers and run the callback for one event.
    fn emit(&mut self, kind: EventKind, state: &WatchState, outcome: Option<bool>) {
        let event = WatchEvent {
            kind,
            mode: self.config.mode,
            iteration: state.iteration,
            elapsed: state.elapsed(),
            outcome,
            flappings: state.flappings.total,
        };
        self.notify(|o| o.on_event(&event));
        CallbackDispatcher::new(&self.config.callbacks, &self.config.command)
            .fire(&event, &mut self.executor);
    }

    fn notify(&mut self, mut f: impl FnMut(&mut Box<dyn WatchObserver>) -> anyhow::Result<()>) {
        for observer in &mut self.observers {
            if let Err(e) = f(observer) {
                tracing::warn!("Observer error: {e}");
            }
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Sleep for `duration` in slices, returning `true` if the stop flag was raised.
    ///
    /// A duration past the range of `Instant` has no deadline; only the stop
    /// flag ends it.
    fn sleep_interruptible(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.stopped() {
                return true;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(SLEEP_SLICE)
                }
                None => SLEEP_SLICE,
            };
            std::thread::sleep(slice);
        }
    }

    /// The single finalization point for every exit path.
    fn finish(&mut self, state: &WatchState, termination: Termination) -> RunReport {
        let report = RunReport::from_state(state, termination);
        self.notify(|o| o.on_finish(&report));
        tracing::info!(
            "Watch finished ({}) after {} iteration(s), {} flapping(s), {:.3}s",
            report.termination,
            report.iterations,
            report.flappings.total,
            report.elapsed.as_secs_f64()
        );
        tracing::debug!("Return code: {}", report.exit_status());
        report
    }
}

fn log_watch_started(config: &WatchConfig) {
    tracing::debug!("Command: {}", config.command);
    tracing::debug!("Watch mode: {}", config.mode);
    tracing::debug!(
        "Callbacks configured: {}",
        config.callbacks.configured_count()
    );
    match config.flapping_threshold {
        Some(n) => tracing::debug!("Flappings: {n}"),
        None => tracing::debug!("Flappings: not set"),
    }
    match config.timeout {
        Some(t) => tracing::debug!("Timeout is: {:.3}", t.as_secs_f64()),
        None => tracing::debug!("Timeout is not set"),
    }
    tracing::trace!("Config: {config:?}");
}

/// Run a watch loop with the shell executor and configured observers.
///
/// Installs a Ctrl-C handler that raises the stop flag, so an interrupt ends
/// the run through the normal finalization path.
pub fn run_watch_loop(config: &WatchConfig) -> anyhow::Result<RunReport> {
    let observers = build_observers(config)?;
    let mut engine = WatchLoop::new(config, ShellExecutor::new()).with_observers(observers);

    let stop_flag = engine.stop_flag();
    if let Err(e) = ctrlc::set_handler(move || stop_flag.store(true, Ordering::Relaxed)) {
        tracing::warn!("Could not install Ctrl-C handler: {e}");
    }

    Ok(engine.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CallbackConfig;
    use crate::executor::{ExecutorError, ScriptedExecutor};
    use crate::watch::WatchMode;

    fn config(mode: WatchMode) -> WatchConfig {
        WatchConfig::new("probe")
            .with_interval(Duration::ZERO)
            .with_mode(mode)
            .with_callbacks(CallbackConfig {
                on_success: Some("on-success".into()),
                on_fail: Some("on-fail".into()),
                on_change: Some("on-change".into()),
                on_timeout: Some("on-timeout".into()),
                on_overcount: Some("on-overcount".into()),
                on_heartbeat: Some("on-heartbeat".into()),
            })
    }

    #[test]
    fn test_budget_checked_before_command() {
        let config = config(WatchMode::Success).with_max_iterations(Some(2));
        let mut engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![1, 1]));
        let report = engine.run();

        assert_eq!(report.termination, Termination::Overcount);
        assert_eq!(report.iterations, 2);
        assert_eq!(engine.executor().watched_runs(), 2);
        assert_eq!(
            engine.executor().commands(),
            vec!["on-heartbeat", "probe", "on-heartbeat", "probe", "on-overcount"]
        );
    }

    #[test]
    fn test_stop_flag_before_start() {
        let config = config(WatchMode::Success);
        let mut engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![0]));
        engine.stop_flag().store(true, Ordering::Relaxed);
        let report = engine.run();

        assert_eq!(report.termination, Termination::Interrupted);
        assert!(!report.succeeded);
        assert!(engine.executor().invocations().is_empty());
    }

    struct FaultyExecutor;

    impl CommandExecutor for FaultyExecutor {
        fn run(
            &mut self,
            command: &str,
            _env: &[(String, String)],
        ) -> Result<crate::executor::CommandOutput, ExecutorError> {
            Err(ExecutorError::Wait {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"),
            })
        }
    }

    #[test]
    fn test_executor_fault_is_recovered() {
        let config = WatchConfig::new("probe").with_interval(Duration::ZERO);
        let mut engine = WatchLoop::new(&config, FaultyExecutor);
        let report = engine.run();

        assert!(matches!(report.termination, Termination::Fault(ref msg) if msg.contains("pipe closed")));
        assert_eq!(report.exit_status(), 1);
    }

    /// Raises the stop flag while the heartbeat callback runs.
    struct StopOnHeartbeat {
        inner: ScriptedExecutor,
        stop: Arc<AtomicBool>,
    }

    impl CommandExecutor for StopOnHeartbeat {
        fn run(
            &mut self,
            command: &str,
            env: &[(String, String)],
        ) -> Result<crate::executor::CommandOutput, ExecutorError> {
            if command == "on-heartbeat" {
                self.stop.store(true, Ordering::Relaxed);
            }
            self.inner.run(command, env)
        }
    }

    #[test]
    fn test_interrupt_during_heartbeat_skips_command() {
        let config = config(WatchMode::Success);
        let stop = Arc::new(AtomicBool::new(false));
        let exec = StopOnHeartbeat {
            inner: ScriptedExecutor::new("probe", vec![0]),
            stop: Arc::clone(&stop),
        };
        let mut engine = WatchLoop::new(&config, exec).with_stop_flag(stop);
        let report = engine.run();

        assert_eq!(report.termination, Termination::Interrupted);
        assert!(!report.succeeded);
        assert_eq!(engine.executor().inner.watched_runs(), 0);
        assert_eq!(engine.executor().inner.commands(), vec!["on-heartbeat"]);
    }

    #[test]
    fn test_unrepresentable_interval_waits_for_stop() {
        let config = WatchConfig::new("probe")
            .with_interval(Duration::from_secs(10_000_000_000_000_000_000))
            .with_max_iterations(Some(1));
        let mut engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![1]));
        let stop = engine.stop_flag();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            stop.store(true, Ordering::Relaxed);
        });

        let report = engine.run();
        stopper.join().unwrap();

        assert_eq!(report.termination, Termination::Interrupted);
        assert_eq!(engine.executor().watched_runs(), 1);
    }

    #[test]
    fn test_sleep_interruptible_returns_early() {
        let config = WatchConfig::new("probe");
        let engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![]));
        engine.stop_flag().store(true, Ordering::Relaxed);

        let started = Instant::now();
        assert!(engine.sleep_interruptible(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sleep_interruptible_full_duration() {
        let config = WatchConfig::new("probe");
        let engine = WatchLoop::new(&config, ScriptedExecutor::new("probe", vec![]));
        let started = Instant::now();
        assert!(!engine.sleep_interruptible(Duration::from_millis(60)));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
