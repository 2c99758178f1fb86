//! CLI modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// The mode a CLI session is in, as told by its prompt.
///
/// Variants are ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// An operating system shell, before the vendor CLI is launched.
    Shell,
    /// Unprivileged CLI mode (`router>`).
    Normal,
    /// Privileged CLI mode (`router#`).
    Enable,
    /// Configuration mode (`router(config)#`).
    Config,
    /// Interface configuration below config mode (`router(config-subif)#`).
    SubInterface,
}

impl Mode {
    /// All modes, in order.
    pub const ALL: [Mode; 5] = [
        Mode::Shell,
        Mode::Normal,
        Mode::Enable,
        Mode::Config,
        Mode::SubInterface,
    ];

    /// Lowercase name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Shell => "shell",
            Mode::Normal => "normal",
            Mode::Enable => "enable",
            Mode::Config => "config",
            Mode::SubInterface => "sub_interface",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shell" => Ok(Mode::Shell),
            "normal" => Ok(Mode::Normal),
            "enable" => Ok(Mode::Enable),
            "config" | "configure" => Ok(Mode::Config),
            "sub_interface" | "subif" => Ok(Mode::SubInterface),
            _ => Err(PlatformError::UnknownMode {
                name: s.to_string(),
            }),
        }
    }
}

/// Where a mode transition should end up.
///
/// Sub-interface mode needs an interface name; entering it with a different
/// name than the current one means leaving and re-entering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeTarget {
    /// A mode without parameters.
    Mode(Mode),
    /// Sub-interface mode for the named interface.
    SubInterface(String),
}

impl ModeTarget {
    /// The mode this target lands in.
    pub fn mode(&self) -> Mode {
        match self {
            ModeTarget::Mode(mode) => *mode,
            ModeTarget::SubInterface(_) => Mode::SubInterface,
        }
    }

    /// Interface name for sub-interface targets.
    pub fn interface(&self) -> Option<&str> {
        match self {
            ModeTarget::Mode(_) => None,
            ModeTarget::SubInterface(name) => Some(name),
        }
    }
}

impl From<Mode> for ModeTarget {
    fn from(mode: Mode) -> Self {
        ModeTarget::Mode(mode)
    }
}

impl fmt::Display for ModeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeTarget::Mode(mode) => write!(f, "{}", mode),
            ModeTarget::SubInterface(name) => write!(f, "sub_interface({})", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>().unwrap(), mode);
        }
        assert_eq!("configure".parse::<Mode>().unwrap(), Mode::Config);
        assert!("privileged".parse::<Mode>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Mode::Normal < Mode::Enable);
        assert!(Mode::Enable < Mode::Config);
        assert!(Mode::Config < Mode::SubInterface);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Mode::SubInterface).unwrap();
        assert_eq!(json, "\"sub_interface\"");
        let mode: Mode = serde_json::from_str("\"enable\"").unwrap();
        assert_eq!(mode, Mode::Enable);
    }

    #[test]
    fn test_target() {
        let target = ModeTarget::SubInterface("eth0.100".to_string());
        assert_eq!(target.mode(), Mode::SubInterface);
        assert_eq!(target.interface(), Some("eth0.100"));
        assert_eq!(ModeTarget::from(Mode::Config).interface(), None);
    }
}
