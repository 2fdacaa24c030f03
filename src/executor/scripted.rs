//! Deterministic executor that replays preset exit codes.

use super::{CommandExecutor, CommandOutput, ExecutorError};

/// One recorded call to [`ScriptedExecutor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Look up an environment variable passed to this invocation.
    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Test-double executor.
///
/// Only the watched command consumes the script: invocations of any other
/// command (callbacks) always exit 0 and are just recorded. When the script
/// runs out, the executor either repeats the script cyclically or returns
/// [`ExecutorError::ScriptExhausted`], depending on how it was built.
///
/// Commands are told apart by their string alone. A callback configured with
/// exactly the watched command string consumes script entries too, so tests
/// must give callbacks distinct command strings.
#[derive(Debug, Clone)]
pub struct ScriptedExecutor {
    watched: String,
    exit_codes: Vec<i32>,
    cursor: usize,
    cycle: bool,
    invocations: Vec<Invocation>,
}

impl ScriptedExecutor {
    /// Replay `exit_codes` for `watched`, failing once they are used up.
    pub fn new(watched: impl Into<String>, exit_codes: Vec<i32>) -> Self {
        Self {
            watched: watched.into(),
            exit_codes,
            cursor: 0,
            cycle: false,
            invocations: Vec::new(),
        }
    }

    /// Replay `exit_codes` for `watched` forever, wrapping around.
    pub fn cycling(watched: impl Into<String>, exit_codes: Vec<i32>) -> Self {
        Self {
            cycle: true,
            ..Self::new(watched, exit_codes)
        }
    }

    /// Every invocation so far, in order.
    #[must_use]
    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// The command strings of every invocation so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.command.as_str()).collect()
    }

    /// Number of times the watched command itself ran.
    #[must_use]
    pub fn watched_runs(&self) -> usize {
        self.invocations
            .iter()
            .filter(|i| i.command == self.watched)
            .count()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(
        &mut self,
        command: &str,
        env: &[(String, String)],
    ) -> Result<CommandOutput, ExecutorError> {
        self.invocations.push(Invocation {
            command: command.to_string(),
            env: env.to_vec(),
        });

        if command != self.watched {
            return Ok(CommandOutput::from_exit_code(0));
        }

        if self.exit_codes.is_empty() {
            return Err(ExecutorError::ScriptExhausted(0));
        }
        let index = if self.cycle {
            self.cursor % self.exit_codes.len()
        } else if self.cursor < self.exit_codes.len() {
            self.cursor
        } else {
            return Err(ExecutorError::ScriptExhausted(self.cursor));
        };
        self.cursor += 1;
        Ok(CommandOutput::from_exit_code(self.exit_codes[index]))
    }
}
