//! Mode detection and transitions.

use std::sync::Arc;

use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::channel::{ExpectMatch, Session};
use crate::error::{DriverError, Result};
use crate::platform::{Dialect, Mode, ModeTarget, Transition};
use crate::transport::Transport;

/// Outcome of probing the session's prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeProbe {
    /// The prompt identified a mode.
    Known(Mode),
    /// A prompt was seen that belongs to no mode of the dialect.
    Unrecognized { prompt: String },
}

impl ModeProbe {
    /// The identified mode, if any.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            ModeProbe::Known(mode) => Some(*mode),
            ModeProbe::Unrecognized { .. } => None,
        }
    }
}

/// Tracks and changes the mode of a session according to a dialect.
///
/// The mode is never assumed: every transition starts by probing the
/// prompt. The cached mode only reflects the last probe or transition.
#[derive(Debug)]
pub struct ModeManager {
    dialect: Arc<Dialect>,
    current: Option<Mode>,
    interface: Option<String>,
}

impl ModeManager {
    /// Create a manager with no known mode.
    pub fn new(dialect: Arc<Dialect>) -> Self {
        Self {
            dialect,
            current: None,
            interface: None,
        }
    }

    /// Mode seen by the last probe or transition.
    pub fn last_known(&self) -> Option<Mode> {
        self.current
    }

    /// Interface of the sub-interface mode entered last.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Classify a match against [`Dialect::probe_prompts`].
    pub fn classify(&self, found: &ExpectMatch) -> ModeProbe {
        match self.dialect.probe_mode(found.index) {
            Some(mode) => {
                let candidates = self.dialect.prompts.modes_matching(&found.matched);
                if candidates.len() > 1 {
                    warn!(
                        "Prompt '{}' matches modes {:?}, taking {}",
                        found.matched, candidates, mode
                    );
                }
                ModeProbe::Known(mode)
            }
            None => ModeProbe::Unrecognized {
                prompt: found.matched.clone(),
            },
        }
    }

    fn record(&mut self, mode: Option<Mode>) {
        self.current = mode;
        if mode != Some(Mode::SubInterface) {
            self.interface = None;
        }
    }

    /// Send an empty line and identify the prompt that comes back.
    pub async fn current_mode<T: Transport>(&mut self, session: &mut Session<T>) -> Result<ModeProbe> {
        let patterns = self.dialect.probe_prompts();
        let timeout = session.timeout();
        let found = session.send_line_and_wait("", &patterns, timeout).await?;
        let probe = self.classify(&found);
        debug!("Current mode: {:?}", probe);
        self.record(probe.mode());
        Ok(probe)
    }

    /// Like [`current_mode`](Self::current_mode), failing on unrecognized prompts.
    pub async fn require_mode<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Mode> {
        match self.current_mode(session).await? {
            ModeProbe::Known(mode) => Ok(mode),
            ModeProbe::Unrecognized { prompt } => Err(DriverError::UnknownMode { prompt }.into()),
        }
    }

    /// Move the session to `target`.
    ///
    /// Does nothing beyond the probe when the session is already there.
    /// Sub-interface mode for a different (or unknown) interface is left and
    /// entered again.
    pub async fn transition<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        target: &ModeTarget,
        password: Option<&SecretString>,
    ) -> Result<()> {
        self.change_mode(session, target, password, false).await
    }

    /// Like [`transition`](Self::transition), but edges that have a forced
    /// command use it, e.g. to leave configuration mode dropping
    /// uncommitted changes.
    pub async fn force_transition<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        target: &ModeTarget,
        password: Option<&SecretString>,
    ) -> Result<()> {
        self.change_mode(session, target, password, true).await
    }

    async fn change_mode<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        target: &ModeTarget,
        password: Option<&SecretString>,
        force: bool,
    ) -> Result<()> {
        let goal = target.mode();
        let interface = target.interface();
        let current = self.require_mode(session).await?;

        let dialect = Arc::clone(&self.dialect);
        let path: Vec<&Transition> = if current == goal {
            match interface {
                Some(name) if self.interface.as_deref() != Some(name) => {
                    debug!("Re-entering sub-interface mode for {}", name);
                    self.reenter_path(&dialect)?
                }
                _ => {
                    debug!("Already in {} mode", goal);
                    return Ok(());
                }
            }
        } else {
            if goal == Mode::SubInterface && interface.is_none() {
                return Err(DriverError::MissingInterface.into());
            }
            dialect.transitions.find_path(current, goal)?
        };

        for step in path {
            self.run_step(session, step, interface, password, force).await?;
        }
        self.interface = interface.map(str::to_string);
        Ok(())
    }

    /// Leave sub-interface mode to the mode it is entered from, then enter
    /// it again.
    fn reenter_path<'a>(&self, dialect: &'a Dialect) -> Result<Vec<&'a Transition>> {
        let no_path = || DriverError::NoModePath {
            from: Mode::SubInterface.to_string(),
            to: Mode::SubInterface.to_string(),
        };
        let entry = dialect
            .transitions
            .iter()
            .find(|t| t.to == Mode::SubInterface)
            .ok_or_else(no_path)?;
        let exit = dialect
            .transitions
            .get(Mode::SubInterface, entry.from)
            .ok_or_else(no_path)?;
        Ok(vec![exit, entry])
    }

    async fn run_step<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        step: &Transition,
        interface: Option<&str>,
        password: Option<&SecretString>,
        force: bool,
    ) -> Result<()> {
        let forced = force && step.forced_command.is_some();
        let command = step.command_line(interface, force)?;
        info!("Changing mode {} -> {} with '{}'", step.from, step.to, command);

        let target = self.dialect.prompts.patterns_for(step.to);
        let mut patterns = target.clone();
        let failure_index = step.failure_prompt.as_ref().filter(|_| !forced).map(|re| {
            patterns.push(re.clone());
            patterns.len() - 1
        });
        let auth_index = step.auth_prompt.as_ref().map(|re| {
            patterns.push(re.clone());
            patterns.len() - 1
        });

        // Until the step completes the session is somewhere in between.
        self.record(None);
        let timeout = session.timeout();
        let found = session.send_line_and_wait(&command, &patterns, timeout).await?;

        if Some(found.index) == failure_index {
            // The device prints its prompt again after refusing.
            session.expect(&self.dialect.any_prompt(), timeout).await?;
            self.record(Some(step.from));
            return Err(DriverError::Command {
                command,
                mode: step.from.to_string(),
                output: found.matched,
            }
            .into());
        }

        if Some(found.index) == auth_index {
            let password = password.ok_or_else(|| DriverError::InvalidConfig {
                message: format!("'{}' asked for a password but none is configured", command),
            })?;
            let line = format!("{}{}", password.expose_secret(), session.line_ending());
            session.send_hidden(&line).await?;
            session.expect(&target, timeout).await?;
        }

        self.record(Some(step.to));
        Ok(())
    }
}
