//! CLI handler for watching a command.

use crate::config::{load_or_default, AppConfig, CallbackConfig, EventFormat, Validatable};
use crate::error::{ErrorContext, Result, WatchforError};
use crate::watch::{EventKind, WatchConfig, WatchMode};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Values given on the command line. Unset values keep the config file value.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub command: Option<String>,
    pub interval: Option<Duration>,
    pub timeout: Option<Duration>,
    pub count: Option<u64>,
    pub flappings: Option<u64>,
    pub mode: Option<WatchMode>,
    pub callbacks: CallbackConfig,
    /// Progress level; `Some(0)` turns file-configured progress off.
    pub progress: Option<u8>,
    pub verbosity: Option<u8>,
    pub format: Option<EventFormat>,
    pub output_file: Option<PathBuf>,
}

impl CliOverrides {
    /// Layer these values over `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        let watch = &mut config.watch;
        if let Some(ref command) = self.command {
            watch.command = Some(command.clone());
        }
        if let Some(interval) = self.interval {
            watch.interval = interval.as_secs_f64();
        }
        if let Some(timeout) = self.timeout {
            watch.timeout = Some(timeout.as_secs_f64());
        }
        if self.count.is_some() {
            watch.count = self.count;
        }
        if self.flappings.is_some() {
            watch.flappings = self.flappings;
        }
        if let Some(mode) = self.mode {
            watch.mode = mode;
        }

        for kind in EventKind::ALL {
            if let Some(command) = self.callbacks.command_for(kind) {
                *config.callbacks.slot_mut(kind) = Some(command.to_string());
            }
        }

        let output = &mut config.output;
        if let Some(progress) = self.progress {
            output.progress = progress;
        }
        if let Some(verbosity) = self.verbosity {
            output.verbosity = verbosity;
        }
        if let Some(format) = self.format {
            output.format = format;
        }
        if self.output_file.is_some() {
            output.file.clone_from(&self.output_file);
        }
    }
}

/// Load the config file (explicit or discovered), apply CLI overrides and validate.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<(AppConfig, Option<PathBuf>)> {
    let (mut config, loaded_from) = load_or_default(config_path).with_context(|| {
        config_path.map_or_else(
            || "loading discovered config".to_string(),
            |p| format!("loading {}", p.display()),
        )
    })?;
    overrides.apply(&mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(WatchforError::config(joined));
    }

    Ok((config, loaded_from))
}

/// Run the watch loop and return the process exit status.
pub fn run_watch(config: &AppConfig) -> anyhow::Result<i32> {
    let config = WatchConfig::try_from(config)?;
    let report = crate::watch::run_watch_loop(&config)?;
    Ok(report.exit_status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = AppConfig::builder()
            .command("from-file")
            .interval_secs(5.0)
            .count(3)
            .mode(WatchMode::Change)
            .callback(EventKind::Fail, "file-fail")
            .callback(EventKind::Success, "file-success")
            .build();

        let overrides = CliOverrides {
            command: Some("from-cli".into()),
            interval: Some(Duration::from_millis(500)),
            mode: Some(WatchMode::Monitor),
            callbacks: CallbackConfig {
                on_fail: Some("cli-fail".into()),
                ..CallbackConfig::default()
            },
            progress: Some(2),
            ..CliOverrides::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.watch.command.as_deref(), Some("from-cli"));
        assert_eq!(config.watch.interval, 0.5);
        assert_eq!(config.watch.count, Some(3));
        assert_eq!(config.watch.mode, WatchMode::Monitor);
        assert_eq!(config.callbacks.on_fail.as_deref(), Some("cli-fail"));
        assert_eq!(config.callbacks.on_success.as_deref(), Some("file-success"));
        assert_eq!(config.output.progress, 2);
    }

    #[test]
    fn test_zero_progress_turns_file_progress_off() {
        let mut config = AppConfig::builder().command("x").progress(2).build();
        let overrides = CliOverrides {
            progress: Some(0),
            ..CliOverrides::default()
        };
        overrides.apply(&mut config);
        assert_eq!(config.output.progress, 0);
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let original = AppConfig::builder()
            .command("x")
            .timeout_secs(9.0)
            .progress(1)
            .build();
        let mut config = original.clone();
        CliOverrides::default().apply(&mut config);
        assert_eq!(config, original);
    }

    #[test]
    fn test_resolve_config_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("watchfor.yaml");
        std::fs::write(&path, "watch:\n  command: \"true\"\n  count: 4\n").unwrap();

        let overrides = CliOverrides {
            count: Some(7),
            ..CliOverrides::default()
        };
        let (config, loaded_from) = resolve_config(Some(&path), &overrides).unwrap();
        assert_eq!(loaded_from, Some(path));
        assert_eq!(config.watch.command.as_deref(), Some("true"));
        assert_eq!(config.watch.count, Some(7));
    }

    #[test]
    fn test_resolve_config_reports_validation_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("watchfor.yaml");
        std::fs::write(&path, "watch:\n  interval: -3\n").unwrap();

        let err = resolve_config(Some(&path), &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("watch.interval"));
    }
}
