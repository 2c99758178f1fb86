//! High-level driver for CLI interaction.
//!
//! The driver layer provides the main API for running commands and moving
//! between CLI modes on a device.

mod builder;
mod generic;
mod mode;

pub use builder::DriverBuilder;
pub use generic::{ExecMode, ExecOptions, GenericDriver};
pub use mode::{ModeManager, ModeProbe};

use std::future::Future;

use crate::error::Result;
use crate::platform::{Mode, ModeTarget};

/// Trait for CLI drivers.
pub trait CliDriver: Send {
    /// Wait for the first prompt and get the CLI ready for commands.
    ///
    /// Launches the vendor CLI when the session starts in a shell and runs
    /// the dialect's on-open commands.
    fn start(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the session.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Probe the prompt to find out which mode the CLI is in.
    fn current_mode(&mut self) -> impl Future<Output = Result<ModeProbe>> + Send;

    /// Move to `target`, doing nothing if already there.
    fn enter_mode(&mut self, target: ModeTarget) -> impl Future<Output = Result<()>> + Send;

    /// Move to `target` with the dialect's forced commands where it has
    /// them, discarding uncommitted changes.
    fn enter_mode_forced(&mut self, target: ModeTarget) -> impl Future<Output = Result<()>> + Send;

    /// Run a command and return its output without echo or prompt.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use promptline::driver::{CliDriver, ExecOptions};
    /// use promptline::platform::Mode;
    ///
    /// # async fn example(driver: &mut impl CliDriver) -> Result<(), promptline::Error> {
    /// let version = driver
    ///     .exec("show version", &ExecOptions::new().in_mode(Mode::Enable))
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    fn exec(
        &mut self,
        command: &str,
        options: &ExecOptions,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Run several commands with the same options, stopping at the first error.
    fn exec_many(
        &mut self,
        commands: &[&str],
        options: &ExecOptions,
    ) -> impl Future<Output = Result<Vec<String>>> + Send {
        async move {
            let mut outputs = Vec::with_capacity(commands.len());
            for command in commands {
                outputs.push(self.exec(command, options).await?);
            }
            Ok(outputs)
        }
    }

    /// List the commands the CLI offers below `root` using inline help.
    fn sub_commands(&mut self, root: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Check if the session is still usable.
    fn is_open(&self) -> bool;

    /// Mode seen by the last probe or transition.
    fn last_known_mode(&self) -> Option<Mode>;
}
