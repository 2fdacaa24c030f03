//! Production executor that hands command strings to the platform shell.

use super::{CommandExecutor, CommandOutput, ExecutorError, LAUNCH_FAILURE_EXIT_CODE};
use std::process::{Command, ExitStatus, Stdio};

/// Runs commands via `sh -c <cmd>` (or `cmd /C <cmd>` on Windows).
///
/// Standard output and error are captured; standard input is inherited.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    _private: (),
}

impl ShellExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Map an exit status to a single integer code.
///
/// On Unix a signal-terminated process has no exit code; it is reported as
/// `128 + signal`, the same convention shells use.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

impl CommandExecutor for ShellExecutor {
    fn run(
        &mut self,
        command: &str,
        env: &[(String, String)],
    ) -> Result<CommandOutput, ExecutorError> {
        let child = shell_command(command)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to launch '{command}': {e}");
                return Ok(CommandOutput::from_exit_code(LAUNCH_FAILURE_EXIT_CODE));
            }
        };

        let output = child.wait_with_output().map_err(|source| ExecutorError::Wait {
            command: command.to_string(),
            source,
        })?;

        Ok(CommandOutput {
            exit_code: exit_code(output.status),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
