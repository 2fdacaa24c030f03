//! Observers of a watch run.
//!
//! Provides trait-based output: progress printing (human-readable) and an
//! NDJSON event stream (machine-readable). Observer failures are logged by
//! the loop and never change the run's result.

use super::config::WatchConfig;
use super::events::WatchEvent;
use super::state::RunReport;
use crate::config::EventFormat;
use crate::error::WatchforError;
use std::io::Write;

/// Trait for receiving watch loop notifications.
pub trait WatchObserver {
    /// Called after the watched command ran, before events are evaluated.
    fn on_outcome(&mut self, iteration: u64, outcome: bool) -> anyhow::Result<()>;

    /// Called for every fired event, whether or not a callback is configured.
    fn on_event(&mut self, event: &WatchEvent) -> anyhow::Result<()>;

    /// Called exactly once when the run is over.
    fn on_finish(&mut self, report: &RunReport) -> anyhow::Result<()>;
}

// ============================================================================
// Progress printer
// ============================================================================

/// Prints one status mark per iteration.
///
/// Level 1 writes `.` for success and `!` for failure on a single line;
/// level 2 and above writes `return: success` / `return: fail` lines.
pub struct ProgressPrinter {
    level: u8,
    writer: Box<dyn Write + Send>,
    line_open: bool,
}

impl ProgressPrinter {
    pub fn new(level: u8, writer: Box<dyn Write + Send>) -> Self {
        Self {
            level,
            writer,
            line_open: false,
        }
    }

    pub fn stdout(level: u8) -> Self {
        Self::new(level, Box::new(std::io::stdout()))
    }
}

impl WatchObserver for ProgressPrinter {
    fn on_outcome(&mut self, _iteration: u64, outcome: bool) -> anyhow::Result<()> {
        match self.level {
            0 => return Ok(()),
            1 => {
                self.writer.write_all(if outcome { b"." } else { b"!" })?;
                self.line_open = true;
            }
            _ => {
                let status = if outcome { "success" } else { "fail" };
                writeln!(self.writer, "return: {status}")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    fn on_event(&mut self, _event: &WatchEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_finish(&mut self, _report: &RunReport) -> anyhow::Result<()> {
        if self.line_open {
            writeln!(self.writer)?;
            self.writer.flush()?;
            self.line_open = false;
        }
        Ok(())
    }
}

// ============================================================================
// NDJSON sink: newline-delimited JSON to stdout or file
// ============================================================================

/// Writes one JSON object per line for each outcome, event and the summary.
pub struct NdjsonEventSink {
    writer: Box<dyn Write + Send>,
}

impl NdjsonEventSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    fn write_event(&mut self, event: &serde_json::Value) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl WatchObserver for NdjsonEventSink {
    fn on_outcome(&mut self, iteration: u64, outcome: bool) -> anyhow::Result<()> {
        let event = serde_json::json!({
            "type": "outcome",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "iteration": iteration,
            "success": outcome,
        });
        self.write_event(&event)
    }

    fn on_event(&mut self, event: &WatchEvent) -> anyhow::Result<()> {
        let value = serde_json::json!({
            "type": "event",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "event": event.kind,
            "mode": event.mode,
            "iteration": event.iteration,
            "elapsed_secs": event.elapsed.as_secs_f64(),
            "success": event.outcome,
            "flappings": event.flappings,
        });
        self.write_event(&value)
    }

    fn on_finish(&mut self, report: &RunReport) -> anyhow::Result<()> {
        let event = serde_json::json!({
            "type": "finish",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "succeeded": report.succeeded,
            "termination": report.termination.to_string(),
            "iterations": report.iterations,
            "flappings": report.flappings.total,
            "successes": report.successes,
            "failures": report.failures,
            "elapsed_secs": report.elapsed.as_secs_f64(),
            "exit_status": report.exit_status(),
        });
        self.write_event(&event)
    }
}

// ============================================================================
// Observer builder
// ============================================================================

/// Build observers from the output configuration.
pub fn build_observers(config: &WatchConfig) -> anyhow::Result<Vec<Box<dyn WatchObserver>>> {
    let mut observers: Vec<Box<dyn WatchObserver>> = Vec::new();

    match config.output.format {
        EventFormat::Json => {
            let writer: Box<dyn Write + Send> = match &config.output.file {
                Some(path) => {
                    let file = std::fs::OpenOptions::new()
                        .create(true)
                        .append(true)
                        .open(path)
                        .map_err(|e| WatchforError::io(path, e))?;
                    Box::new(file)
                }
                None => Box::new(std::io::stdout()),
            };
            // Progress marks would corrupt an NDJSON stream on stdout.
            if config.output.file.is_some() && config.output.progress > 0 {
                observers.push(Box::new(ProgressPrinter::stdout(config.output.progress)));
            }
            observers.push(Box::new(NdjsonEventSink::new(writer)));
        }
        EventFormat::Text => {
            if config.output.progress > 0 {
                observers.push(Box::new(ProgressPrinter::stdout(config.output.progress)));
            }
        }
    }

    Ok(observers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::mode::FlappingCounters;
    use crate::watch::state::Termination;
    use crate::watch::{EventKind, WatchMode};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn report(succeeded: bool) -> RunReport {
        RunReport {
            succeeded,
            termination: if succeeded {
                Termination::Resolved
            } else {
                Termination::Overcount
            },
            iterations: 3,
            flappings: FlappingCounters { current: 0, total: 2 },
            successes: 1,
            failures: 2,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_progress_level_one_marks() {
        let buffer = SharedBuffer::default();
        let mut printer = ProgressPrinter::new(1, Box::new(buffer.clone()));
        printer.on_outcome(0, false).unwrap();
        printer.on_outcome(1, false).unwrap();
        printer.on_outcome(2, true).unwrap();
        printer.on_finish(&report(true)).unwrap();
        assert_eq!(buffer.contents(), "!!.\n");
    }

    #[test]
    fn test_progress_level_two_lines() {
        let buffer = SharedBuffer::default();
        let mut printer = ProgressPrinter::new(2, Box::new(buffer.clone()));
        printer.on_outcome(0, true).unwrap();
        printer.on_outcome(1, false).unwrap();
        printer.on_finish(&report(false)).unwrap();
        assert_eq!(buffer.contents(), "return: success\nreturn: fail\n");
    }

    #[test]
    fn test_progress_finish_without_output_prints_nothing() {
        let buffer = SharedBuffer::default();
        let mut printer = ProgressPrinter::new(1, Box::new(buffer.clone()));
        printer.on_finish(&report(false)).unwrap();
        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_ndjson_sink_produces_valid_json() {
        let buffer = SharedBuffer::default();
        let mut sink = NdjsonEventSink::new(Box::new(buffer.clone()));

        sink.on_outcome(1, false).unwrap();
        sink.on_event(&WatchEvent {
            kind: EventKind::Change,
            mode: WatchMode::Change,
            iteration: 1,
            elapsed: Duration::from_secs(1),
            outcome: Some(false),
            flappings: 0,
        })
        .unwrap();
        sink.on_finish(&report(true)).unwrap();

        let output = buffer.contents();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["type"], "outcome");
        assert_eq!(lines[0]["success"], false);
        assert_eq!(lines[1]["event"], "change");
        assert_eq!(lines[1]["mode"], "change");
        assert_eq!(lines[2]["type"], "finish");
        assert_eq!(lines[2]["termination"], "resolved");
        assert_eq!(lines[2]["exit_status"], 0);
        assert_eq!(lines[2]["flappings"], 2);
    }

    #[test]
    fn test_build_observers_unopenable_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut json = WatchConfig::new("true");
        json.output.format = EventFormat::Json;
        json.output.file = Some(dir.path().join("missing").join("events.ndjson"));

        let err = build_observers(&json).err().unwrap();
        let io = err.downcast_ref::<WatchforError>().unwrap();
        assert!(matches!(io, WatchforError::Io { .. }));
        assert!(err.to_string().contains("events.ndjson"));
    }

    #[test]
    fn test_build_observers() {
        let quiet = WatchConfig::new("true");
        assert!(build_observers(&quiet).unwrap().is_empty());

        let mut progress = WatchConfig::new("true");
        progress.output.progress = 1;
        assert_eq!(build_observers(&progress).unwrap().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let mut json = WatchConfig::new("true");
        json.output.format = EventFormat::Json;
        json.output.file = Some(dir.path().join("events.ndjson"));
        json.output.progress = 2;
        assert_eq!(build_observers(&json).unwrap().len(), 2);
    }
}
