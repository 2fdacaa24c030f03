//! Callback dispatch.
//!
//! Runs the command configured for a fired event. Callbacks are side effects
//! only: their exit codes and output are logged, never fed back into the loop.

use super::events::WatchEvent;
use crate::config::CallbackConfig;
use crate::executor::CommandExecutor;

/// Runs configured callback commands through an executor.
#[derive(Debug, Clone)]
pub(crate) struct CallbackDispatcher<'a> {
    callbacks: &'a CallbackConfig,
    watched: &'a str,
}

impl<'a> CallbackDispatcher<'a> {
    pub(crate) const fn new(callbacks: &'a CallbackConfig, watched: &'a str) -> Self {
        Self { callbacks, watched }
    }

    /// Run the callback for `event`, if one is configured.
    ///
    /// Returns whether a callback command was run.
    pub(crate) fn fire<E: CommandExecutor>(&self, event: &WatchEvent, executor: &mut E) -> bool {
        let Some(command) = self.callbacks.command_for(event.kind) else {
            return false;
        };

        tracing::debug!("Executing on {} command", event.kind);
        match executor.run(command, &event.env(self.watched)) {
            Ok(output) => {
                tracing::debug!(
                    "{} callback exited with {} at iteration {}",
                    event.kind,
                    output.exit_code,
                    event.iteration
                );
                if !output.stderr.is_empty() {
                    tracing::trace!(
                        "{} callback stderr: {}",
                        event.kind,
                        String::from_utf8_lossy(&output.stderr).trim_end()
                    );
                }
            }
            Err(e) => tracing::warn!("{} callback failed: {e}", event.kind),
        }
        true
    }
}
