//! Dialect definition: everything vendor specific about a CLI.

use std::collections::HashSet;

use regex::Regex;

use super::mode::Mode;
use super::transition::{Transition, TransitionTable};
use crate::channel::PatternSet;
use crate::error::{PlatformError, Result};

/// Password prompt used for privilege escalation unless a dialect says otherwise.
pub const DEFAULT_PASSWORD_PROMPT: &str = r"[Pp]assword: ?$";

/// Prompt patterns tagged with the mode they identify.
///
/// Order matters: the first matching pattern decides the mode.
#[derive(Debug, Clone, Default)]
pub struct PromptSpec {
    entries: Vec<(Mode, Regex)>,
}

impl PromptSpec {
    /// Create an empty prompt list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prompt for `mode`.
    pub fn push(&mut self, mode: Mode, pattern: Regex) {
        self.entries.push((mode, pattern));
    }

    /// Mode identified by the pattern at `index`.
    pub fn mode_at(&self, index: usize) -> Option<Mode> {
        self.entries.get(index).map(|(mode, _)| *mode)
    }

    /// Modes whose prompts match `line`. More than one means the prompts
    /// are ambiguous and only their order decides.
    pub fn modes_matching(&self, line: &str) -> Vec<Mode> {
        let mut modes = Vec::new();
        for (mode, re) in &self.entries {
            if re.is_match(line) && !modes.contains(mode) {
                modes.push(*mode);
            }
        }
        modes
    }

    /// Whether any prompt identifies `mode`.
    pub fn contains(&self, mode: Mode) -> bool {
        self.entries.iter().any(|(m, _)| *m == mode)
    }

    /// All prompts, in order.
    pub fn patterns(&self) -> PatternSet {
        self.entries
            .iter()
            .map(|(_, re)| re.clone())
            .collect::<Vec<_>>()
            .into()
    }

    /// Prompts identifying `mode`.
    pub fn patterns_for(&self, mode: Mode) -> PatternSet {
        self.entries
            .iter()
            .filter(|(m, _)| *m == mode)
            .map(|(_, re)| re.clone())
            .collect::<Vec<_>>()
            .into()
    }

    /// Modes with at least one prompt.
    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        let mut seen = Vec::new();
        self.entries.iter().filter_map(move |(mode, _)| {
            if seen.contains(mode) {
                None
            } else {
                seen.push(*mode);
                Some(*mode)
            }
        })
    }

    /// Number of prompts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no prompts are defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Vendor specific CLI description.
///
/// Dialects are plain data: prompts per mode, the transitions between
/// modes, the error marker and the housekeeping commands run on open.
/// The driver interprets them.
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Dialect name (e.g., "cisco_ios", "vyatta").
    pub name: String,

    /// Prompts identifying each mode.
    pub prompts: PromptSpec,

    /// Prompts recognised as "some prompt" without identifying a mode.
    pub catch_all: Vec<Regex>,

    /// Like `catch_all`, but tried before the mode prompts. For states whose
    /// prompt a mode prompt would also match.
    pub reserved_prompts: Vec<Regex>,

    /// Prompt set a command's completion is detected with. Defaults to
    /// all mode prompts.
    pub any_prompt: Option<PatternSet>,

    /// Prompt set expected right after the session opens. Defaults to
    /// [`any_prompt`](Self::any_prompt).
    pub start_prompts: Option<PatternSet>,

    /// Transitions between modes.
    pub transitions: TransitionTable,

    /// Output beginning with this marker is a command error.
    pub error_marker: Option<Regex>,

    /// Noise lines removed from output produced in a given mode.
    pub discard_lines: Vec<(Mode, String)>,

    /// Mode commands run in unless the caller picks one.
    pub default_exec_mode: Option<Mode>,

    /// Commands run once the CLI is ready (paging off and the like).
    pub on_open_commands: Vec<String>,

    /// Command launching the vendor CLI from the operating system shell.
    pub shell_launch: Option<String>,

    /// Flush pending input before every command.
    pub flush_before_send: bool,

    /// Mode entered once the CLI runs, before the on-open commands.
    pub start_mode: Option<Mode>,
}

impl Dialect {
    /// Create a dialect with no prompts or transitions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompts: PromptSpec::new(),
            catch_all: Vec::new(),
            reserved_prompts: Vec::new(),
            any_prompt: None,
            start_prompts: None,
            transitions: TransitionTable::new(),
            error_marker: None,
            discard_lines: Vec::new(),
            default_exec_mode: None,
            on_open_commands: Vec::new(),
            shell_launch: None,
            flush_before_send: false,
            start_mode: None,
        }
    }

    /// Add a prompt identifying `mode`.
    pub fn with_prompt(mut self, mode: Mode, pattern: &str) -> Result<Self> {
        self.prompts.push(mode, Regex::new(pattern)?);
        Ok(self)
    }

    /// Add a prompt that is recognised but identifies no mode.
    pub fn with_catch_all(mut self, pattern: &str) -> Result<Self> {
        self.catch_all.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Add a prompt that identifies no mode and wins over the mode prompts.
    pub fn with_reserved_prompt(mut self, pattern: &str) -> Result<Self> {
        self.reserved_prompts.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Override the prompt set used to detect command completion.
    pub fn with_any_prompt(mut self, patterns: &[&str]) -> Result<Self> {
        self.any_prompt = Some(PatternSet::new(patterns)?);
        Ok(self)
    }

    /// Override the prompt set expected when the session opens.
    pub fn with_start_prompts(mut self, patterns: &[&str]) -> Result<Self> {
        self.start_prompts = Some(PatternSet::new(patterns)?);
        Ok(self)
    }

    /// Add a transition.
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transitions.insert(transition);
        self
    }

    /// Set the error marker.
    pub fn with_error_marker(mut self, pattern: &str) -> Result<Self> {
        self.error_marker = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Drop `line` from output produced in `mode`.
    pub fn with_discard_line(mut self, mode: Mode, line: impl Into<String>) -> Self {
        self.discard_lines.push((mode, line.into()));
        self
    }

    /// Set the default mode for commands.
    pub fn with_default_exec_mode(mut self, mode: Mode) -> Self {
        self.default_exec_mode = Some(mode);
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Set the command that launches the CLI from the shell.
    pub fn with_shell_launch(mut self, command: impl Into<String>) -> Self {
        self.shell_launch = Some(command.into());
        self
    }

    /// Flush pending input before every command.
    pub fn with_flush_before_send(mut self, flush: bool) -> Self {
        self.flush_before_send = flush;
        self
    }

    /// Enter `mode` when the session starts.
    pub fn with_start_mode(mut self, mode: Mode) -> Self {
        self.start_mode = Some(mode);
        self
    }

    /// Prompt set a command's completion is detected with.
    pub fn any_prompt(&self) -> PatternSet {
        self.any_prompt
            .clone()
            .unwrap_or_else(|| self.prompts.patterns())
    }

    /// Prompt set expected right after the session opens.
    pub fn start_prompts(&self) -> PatternSet {
        self.start_prompts
            .clone()
            .unwrap_or_else(|| self.any_prompt())
    }

    /// Reserved prompts, then mode prompts, then catch-all prompts.
    ///
    /// Use [`probe_mode`](Self::probe_mode) to read a match index.
    pub fn probe_prompts(&self) -> PatternSet {
        let reserved: PatternSet = self.reserved_prompts.clone().into();
        let catch_all: PatternSet = self.catch_all.clone().into();
        reserved.chain(&self.prompts.patterns()).chain(&catch_all)
    }

    /// Mode identified by a match index into [`probe_prompts`](Self::probe_prompts).
    pub fn probe_mode(&self, index: usize) -> Option<Mode> {
        let index = index.checked_sub(self.reserved_prompts.len())?;
        self.prompts.mode_at(index)
    }

    /// Whether `output` begins with the error marker.
    pub fn is_error(&self, output: &str) -> bool {
        self.error_marker
            .as_ref()
            .and_then(|marker| marker.find(output))
            .is_some_and(|m| m.start() == 0)
    }

    /// Remove this dialect's noise lines for output produced in `mode`.
    pub fn clean_output(&self, mode: Option<Mode>, output: &str) -> String {
        let Some(mode) = mode else {
            return output.to_string();
        };
        let noise: Vec<&str> = self
            .discard_lines
            .iter()
            .filter(|(m, _)| *m == mode)
            .map(|(_, line)| line.as_str())
            .collect();
        if noise.is_empty() {
            return output.to_string();
        }
        output
            .lines()
            .filter(|line| !noise.contains(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check the definition for internal consistency.
    ///
    /// Overlapping prompt regexes cannot be detected here; dialects check
    /// their sample prompts with [`PromptSpec::modes_matching`] in tests.
    pub fn validate(&self) -> Result<()> {
        if self.prompts.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: format!("dialect '{}' has no prompts", self.name),
            }
            .into());
        }
        let patterns = self.prompts.patterns();
        let mut seen = HashSet::new();
        for pattern in patterns.iter() {
            if !seen.insert(pattern.as_str()) {
                return Err(PlatformError::InvalidDefinition {
                    message: format!("dialect '{}' repeats prompt '{}'", self.name, pattern.as_str()),
                }
                .into());
            }
        }
        for edge in self.transitions.iter() {
            if !self.prompts.contains(edge.to) {
                return Err(PlatformError::InvalidDefinition {
                    message: format!(
                        "dialect '{}' has a transition to '{}' but no prompt for it",
                        self.name, edge.to
                    ),
                }
                .into());
            }
        }
        for mode in [self.default_exec_mode, self.start_mode].into_iter().flatten() {
            if !self.prompts.contains(mode) {
                return Err(PlatformError::InvalidDefinition {
                    message: format!(
                        "dialect '{}' uses mode '{}' but has no prompt for it",
                        self.name, mode
                    ),
                }
                .into());
            }
        }
        Ok(())
    }
}
