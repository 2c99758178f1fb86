//! Generic driver that works with any dialect.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use super::CliDriver;
use super::mode::{ModeManager, ModeProbe};
use crate::channel::{ExpectMatch, PatternSet, Session};
use crate::error::{DriverError, Result};
use crate::platform::{Dialect, Mode, ModeTarget};
use crate::transport::Transport;

/// Ctrl-U, erases the current input line.
const DELETE_LINE: &str = "\x15";

/// Mode reported in command errors when the prompt matched no mode.
const UNRECOGNIZED: &str = "<unrecognized>";

/// Launching the vendor CLI from a shell can take a while.
const SHELL_LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a command should run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// The dialect's default mode, or wherever the session is if it has none.
    #[default]
    DialectDefault,
    /// Wherever the session is, without probing.
    Current,
    /// A specific mode.
    Target(ModeTarget),
}

/// Options for [`CliDriver::exec`].
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Mode to run the command in.
    pub mode: ExecMode,

    /// Prompt timeout, the session default when unset.
    pub timeout: Option<Duration>,

    /// When set, fail unless the presence of output matches.
    pub output_expected: Option<bool>,

    /// Return error output instead of failing.
    pub error_expected: bool,

    /// Prompts ending the command instead of the dialect's, for dialogs
    /// such as setup wizards that show no regular prompt.
    pub prompt: Option<PatternSet>,

    /// Enter the mode with forced transitions.
    pub force: bool,
}

impl ExecOptions {
    /// Options running in the dialect's default mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run in `target`.
    pub fn in_mode(mut self, target: impl Into<ModeTarget>) -> Self {
        self.mode = ExecMode::Target(target.into());
        self
    }

    /// Run wherever the session currently is.
    pub fn in_current_mode(mut self) -> Self {
        self.mode = ExecMode::Current;
        self
    }

    /// Set the prompt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Require output to be present (`true`) or absent (`false`).
    pub fn output_expected(mut self, expected: bool) -> Self {
        self.output_expected = Some(expected);
        self
    }

    /// Return error output instead of failing.
    pub fn error_expected(mut self, expected: bool) -> Self {
        self.error_expected = expected;
        self
    }

    /// Wait for `patterns` instead of the dialect's prompts.
    pub fn prompt(mut self, patterns: PatternSet) -> Self {
        self.prompt = Some(patterns);
        self
    }

    /// Use forced transitions, discarding uncommitted changes.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Generic driver that works with any dialect.
///
/// This handles:
/// - Waiting for the first prompt and launching the CLI from a shell
/// - Mode detection and transitions
/// - Command execution with echo stripping and error detection
pub struct GenericDriver<T> {
    session: Session<T>,
    dialect: Arc<Dialect>,
    modes: ModeManager,
    enable_password: Option<SecretString>,
    started: bool,
}

impl<T: Transport> GenericDriver<T> {
    /// Create a driver over an open session.
    pub fn new(session: Session<T>, dialect: impl Into<Arc<Dialect>>) -> Self {
        let dialect = dialect.into();
        Self {
            session,
            modes: ModeManager::new(Arc::clone(&dialect)),
            dialect,
            enable_password: None,
            started: false,
        }
    }

    /// Set the password answered on privilege escalation prompts.
    pub fn with_enable_password(mut self, password: SecretString) -> Self {
        self.enable_password = Some(password);
        self
    }

    /// Get a reference to the dialect.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Get the session.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Get a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// Get the mode manager.
    pub fn mode_manager(&self) -> &ModeManager {
        &self.modes
    }

    /// Token that aborts any pending wait when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.session.cancel_token()
    }

    /// Answer login prompts inside the byte stream, then start the CLI.
    pub async fn start_with_login(&mut self, username: &str, password: &str) -> Result<()> {
        let ready = self.dialect.start_prompts();
        let timeout = self.session.timeout();
        self.session.login(username, password, &ready, timeout).await?;
        self.prepare_cli().await
    }

    async fn prepare_cli(&mut self) -> Result<()> {
        if let Some(launch) = self.dialect.shell_launch.clone() {
            if self.modes.current_mode(&mut self.session).await? == ModeProbe::Known(Mode::Shell) {
                info!("Launching CLI with '{}'", launch);
                let normal = self.dialect.prompts.patterns_for(Mode::Normal);
                self.session
                    .send_line_and_wait(&launch, &normal, SHELL_LAUNCH_TIMEOUT)
                    .await?;
            }
        }

        if let Some(mode) = self.dialect.start_mode {
            self.modes
                .transition(&mut self.session, &mode.into(), self.enable_password.as_ref())
                .await?;
        }

        let any = self.dialect.any_prompt();
        let timeout = self.session.timeout();
        for command in self.dialect.on_open_commands.clone() {
            debug!("Running on-open command '{}'", command);
            self.session.send_line_and_wait(&command, &any, timeout).await?;
        }

        self.started = true;
        Ok(())
    }

    fn ensure_started(&self) -> Result<()> {
        if !self.started {
            return Err(DriverError::NotStarted.into());
        }
        Ok(())
    }

    /// Send a line and wait for one of `prompts`.
    async fn send_command_line(
        &mut self,
        command: &str,
        prompts: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectMatch> {
        let line = format!("{}{}", command, self.session.line_ending());
        if self.dialect.flush_before_send {
            return self.session.flush_send_and_wait(&line, prompts, timeout).await;
        }
        self.session.send_and_wait(&line, prompts, timeout).await
    }

    async fn mode_name(&mut self) -> Result<String> {
        Ok(match self.modes.current_mode(&mut self.session).await? {
            ModeProbe::Known(mode) => mode.to_string(),
            ModeProbe::Unrecognized { .. } => UNRECOGNIZED.to_string(),
        })
    }

    /// Wait for the first prompt with explicit patterns.
    pub async fn start_with_prompts(&mut self, prompts: &PatternSet) -> Result<()> {
        let timeout = self.session.timeout();
        self.session.expect(prompts, timeout).await?;
        self.prepare_cli().await
    }
}

impl<T: Transport> CliDriver for GenericDriver<T> {
    async fn start(&mut self) -> Result<()> {
        let prompts = self.dialect.start_prompts();
        self.start_with_prompts(&prompts).await
    }

    async fn close(&mut self) -> Result<()> {
        self.started = false;
        self.session.close().await
    }

    async fn current_mode(&mut self) -> Result<ModeProbe> {
        self.modes.current_mode(&mut self.session).await
    }

    async fn enter_mode(&mut self, target: ModeTarget) -> Result<()> {
        self.ensure_started()?;
        self.modes
            .transition(&mut self.session, &target, self.enable_password.as_ref())
            .await
    }

    async fn enter_mode_forced(&mut self, target: ModeTarget) -> Result<()> {
        self.ensure_started()?;
        self.modes
            .force_transition(&mut self.session, &target, self.enable_password.as_ref())
            .await
    }

    async fn exec(&mut self, command: &str, options: &ExecOptions) -> Result<String> {
        self.ensure_started()?;

        let target = match &options.mode {
            ExecMode::DialectDefault => self.dialect.default_exec_mode.map(ModeTarget::Mode),
            ExecMode::Current => None,
            ExecMode::Target(target) => Some(target.clone()),
        };
        if let Some(target) = &target {
            let password = self.enable_password.as_ref();
            if options.force {
                self.modes.force_transition(&mut self.session, target, password).await?;
            } else {
                self.modes.transition(&mut self.session, target, password).await?;
            }
        }

        debug!("Executing '{}'", command);
        let timeout = options.timeout.unwrap_or(self.session.timeout());
        let prompts = options
            .prompt
            .clone()
            .unwrap_or_else(|| self.dialect.any_prompt());
        let found = self.send_command_line(command, &prompts, timeout).await?;

        // The first line is the echo of the command itself.
        let output = found.output.lines().skip(1).collect::<Vec<_>>().join("\n");
        let mode = target.as_ref().map(ModeTarget::mode).or(self.modes.last_known());
        let output = self.dialect.clean_output(mode, &output);

        if self.dialect.is_error(&output) {
            if options.error_expected {
                return Ok(output);
            }
            let mode = self.mode_name().await?;
            return Err(DriverError::Command {
                command: command.to_string(),
                mode,
                output,
            }
            .into());
        }

        if let Some(expected) = options.output_expected {
            if expected != !output.is_empty() {
                return Err(DriverError::UnexpectedOutput {
                    command: command.to_string(),
                    output,
                    expected,
                }
                .into());
            }
        }

        Ok(output)
    }

    async fn sub_commands(&mut self, root: &str) -> Result<Vec<String>> {
        self.ensure_started()?;
        let any = self.dialect.any_prompt();
        let timeout = self.session.timeout();

        let query = if root.is_empty() {
            "?".to_string()
        } else {
            format!("{} ?", root)
        };
        let found = self.session.send_and_wait(&query, &any, timeout).await?;

        let mut commands = Vec::new();
        for line in found.output.lines().skip(1) {
            let Some(word) = line.split_whitespace().next() else {
                continue;
            };
            if word.starts_with('%') {
                self.session.send_line_and_wait(DELETE_LINE, &any, timeout).await?;
                let mode = self.mode_name().await?;
                return Err(DriverError::Command {
                    command: query,
                    mode,
                    output: found.output.clone(),
                }
                .into());
            }
            if word.chars().all(char::is_alphanumeric) {
                if root.is_empty() {
                    commands.push(word.to_string());
                } else {
                    commands.push(format!("{} {}", root, word));
                }
            }
        }

        // Erase the retyped input before returning to a clean prompt.
        self.session.send_line_and_wait(DELETE_LINE, &any, timeout).await?;
        Ok(commands)
    }

    fn is_open(&self) -> bool {
        self.session.is_open()
    }

    fn last_known_mode(&self) -> Option<Mode> {
        self.modes.last_known()
    }
}
