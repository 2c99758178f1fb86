//! Mode transition graph.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::Regex;

use super::mode::Mode;
use crate::error::{DriverError, Result};

/// Command issued to move along one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionCommand {
    /// A fixed command line.
    Literal(String),
    /// `prefix` followed by the target interface name.
    Interface { prefix: String },
}

impl TransitionCommand {
    /// Render the command line for `interface`.
    pub fn render(&self, interface: Option<&str>) -> Result<String> {
        match self {
            TransitionCommand::Literal(command) => Ok(command.clone()),
            TransitionCommand::Interface { prefix } => {
                let interface = interface.ok_or(DriverError::MissingInterface)?;
                Ok(format!("{} {}", prefix, interface))
            }
        }
    }
}

/// A directed edge between two modes.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Mode the command is issued in.
    pub from: Mode,

    /// Mode the command leads to.
    pub to: Mode,

    /// Command to issue.
    pub command: TransitionCommand,

    /// Prompt asking for a password before `to` is reached.
    pub auth_prompt: Option<Regex>,

    /// Output meaning the device refused to leave `from`.
    pub failure_prompt: Option<Regex>,

    /// Command that leaves `from` unconditionally, used by forced transitions.
    pub forced_command: Option<String>,
}

impl Transition {
    /// Create an edge issuing a fixed command.
    pub fn new(from: Mode, to: Mode, command: impl Into<String>) -> Self {
        Self {
            from,
            to,
            command: TransitionCommand::Literal(command.into()),
            auth_prompt: None,
            failure_prompt: None,
            forced_command: None,
        }
    }

    /// Create an edge issuing `prefix <interface>`.
    pub fn interface(from: Mode, to: Mode, prefix: impl Into<String>) -> Self {
        Self {
            from,
            to,
            command: TransitionCommand::Interface {
                prefix: prefix.into(),
            },
            auth_prompt: None,
            failure_prompt: None,
            forced_command: None,
        }
    }

    /// Expect a password prompt on this edge.
    pub fn with_auth(mut self, prompt_pattern: &str) -> std::result::Result<Self, regex::Error> {
        self.auth_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    /// Treat `pattern` as a refusal to leave the current mode.
    pub fn with_failure(mut self, pattern: &str) -> std::result::Result<Self, regex::Error> {
        self.failure_prompt = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Issue `command` instead when the transition is forced.
    pub fn with_forced(mut self, command: impl Into<String>) -> Self {
        self.forced_command = Some(command.into());
        self
    }

    /// Command line for this edge.
    ///
    /// A forced edge without a forced command issues its usual command.
    pub fn command_line(&self, interface: Option<&str>, force: bool) -> Result<String> {
        match &self.forced_command {
            Some(command) if force => Ok(command.clone()),
            _ => self.command.render(interface),
        }
    }
}

/// All transitions of a dialect, keyed by source mode.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    edges: IndexMap<Mode, Vec<Transition>>,
}

impl TransitionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge, replacing any edge with the same endpoints.
    pub fn insert(&mut self, transition: Transition) {
        let edges = self.edges.entry(transition.from).or_default();
        edges.retain(|t| t.to != transition.to);
        edges.push(transition);
    }

    /// Get the edge between two modes.
    pub fn get(&self, from: Mode, to: Mode) -> Option<&Transition> {
        self.edges.get(&from)?.iter().find(|t| t.to == to)
    }

    /// Edges leaving `from`, in insertion order.
    pub fn edges_from(&self, from: Mode) -> impl Iterator<Item = &Transition> {
        self.edges.get(&from).into_iter().flatten()
    }

    /// Iterate over all edges.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.edges.values().flatten()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Whether the table has no edges.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the shortest sequence of edges from `from` to `to`.
    ///
    /// Returns an empty path when both modes are equal.
    pub fn find_path(&self, from: Mode, to: Mode) -> Result<Vec<&Transition>> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<Mode, &Transition> = HashMap::new();

        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = Vec::new();
                let mut node = to;
                while let Some(edge) = parent.get(&node) {
                    path.push(*edge);
                    node = edge.from;
                }
                path.reverse();
                return Ok(path);
            }

            for edge in self.edges_from(current) {
                if visited.insert(edge.to) {
                    parent.insert(edge.to, edge);
                    queue.push_back(edge.to);
                }
            }
        }

        Err(DriverError::NoModePath {
            from: from.to_string(),
            to: to.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios_like() -> TransitionTable {
        let mut table = TransitionTable::new();
        table.insert(Transition::new(Mode::Normal, Mode::Enable, "enable"));
        table.insert(Transition::new(Mode::Enable, Mode::Normal, "disable"));
        table.insert(Transition::new(Mode::Enable, Mode::Config, "config terminal"));
        table.insert(Transition::new(Mode::Config, Mode::Enable, "end"));
        table.insert(Transition::interface(Mode::Config, Mode::SubInterface, "interface"));
        table.insert(Transition::new(Mode::SubInterface, Mode::Config, "exit"));
        table.insert(Transition::new(Mode::SubInterface, Mode::Enable, "end"));
        table
    }

    fn commands(path: &[&Transition]) -> Vec<String> {
        path.iter()
            .map(|t| t.command.render(Some("Gi0/1.10")).unwrap())
            .collect()
    }

    #[test]
    fn test_same_mode_is_empty_path() {
        let table = ios_like();
        assert!(table.find_path(Mode::Config, Mode::Config).unwrap().is_empty());
    }

    #[test]
    fn test_config_to_normal() {
        let table = ios_like();
        let path = table.find_path(Mode::Config, Mode::Normal).unwrap();
        assert_eq!(commands(&path), vec!["end", "disable"]);
    }

    #[test]
    fn test_normal_to_sub_interface() {
        let table = ios_like();
        let path = table.find_path(Mode::Normal, Mode::SubInterface).unwrap();
        assert_eq!(
            commands(&path),
            vec!["enable", "config terminal", "interface Gi0/1.10"]
        );
    }

    #[test]
    fn test_sub_interface_to_normal_uses_shortcut() {
        let table = ios_like();
        let path = table.find_path(Mode::SubInterface, Mode::Normal).unwrap();
        assert_eq!(commands(&path), vec!["end", "disable"]);
    }

    #[test]
    fn test_unreachable_mode() {
        let table = ios_like();
        let err = table.find_path(Mode::Normal, Mode::Shell).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::NoModePath { .. })
        ));
    }

    #[test]
    fn test_interface_command_needs_name() {
        let command = TransitionCommand::Interface {
            prefix: "interface".to_string(),
        };
        assert!(command.render(None).is_err());
    }

    #[test]
    fn test_forced_command_line() {
        let exit = Transition::new(Mode::Config, Mode::Normal, "exit").with_forced("exit discard");
        assert_eq!(exit.command_line(None, false).unwrap(), "exit");
        assert_eq!(exit.command_line(None, true).unwrap(), "exit discard");

        let end = Transition::new(Mode::Config, Mode::Enable, "end");
        assert_eq!(end.command_line(None, true).unwrap(), "end");
    }

    #[test]
    fn test_insert_replaces_edge() {
        let mut table = ios_like();
        let before = table.len();
        table.insert(Transition::new(Mode::Config, Mode::Enable, "exit"));
        assert_eq!(table.len(), before);
        let edge = table.get(Mode::Config, Mode::Enable).unwrap();
        assert_eq!(edge.command, TransitionCommand::Literal("exit".to_string()));
    }
}
