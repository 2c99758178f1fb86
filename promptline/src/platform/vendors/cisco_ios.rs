//! Cisco IOS dialect.
//!
//! # Prompt Examples
//!
//! ```text
//! router>                            # normal mode
//! router#                            # enable mode
//! router(config)#                    # config mode
//! router(config-subif)#              # sub-interface mode
//! router(config-if)#                 # recognised, but not a known mode
//! ```
//!
//! # Mode Graph
//!
//! ```text
//! ┌────────┐  enable  ┌────────┐ config terminal ┌──────────┐ interface X ┌──────────────┐
//! │ normal ├──────────► enable ├─────────────────► config   ├─────────────► sub_interface│
//! │   >    │ disable  │   #    │       end       │(config)# │    exit     │(config-subif)│
//! └────────┘◄─────────┴────────┘◄────────────────┴──────────┘◄────────────┴──────────────┘
//!                          ▲                end                                │
//!                          └───────────────────────────────────────────────────┘
//! ```

use crate::error::Result;
use crate::platform::{DEFAULT_PASSWORD_PROMPT, Dialect, Mode, Transition};

const HOSTNAME: &str = r"(?P<name>[\w.\-@/:]{1,63})";

/// Create the Cisco IOS dialect.
pub fn dialect() -> Result<Dialect> {
    Ok(Dialect::new("cisco_ios")
        .with_prompt(Mode::Normal, &format!(r"^{HOSTNAME}>\s*$"))?
        .with_prompt(Mode::Enable, &format!(r"^{HOSTNAME}#\s*$"))?
        .with_prompt(Mode::Config, &format!(r"^{HOSTNAME}\(config\)#\s*$"))?
        .with_prompt(Mode::SubInterface, &format!(r"^{HOSTNAME}\(config-subif\)#\s*$"))?
        .with_catch_all(r"^[\w.\-@/:]{1,63}\([\w.\-]+\)#\s*$")?
        .with_transition(
            Transition::new(Mode::Normal, Mode::Enable, "enable").with_auth(DEFAULT_PASSWORD_PROMPT)?,
        )
        .with_transition(Transition::new(Mode::Enable, Mode::Normal, "disable"))
        .with_transition(Transition::new(Mode::Enable, Mode::Config, "config terminal"))
        .with_transition(Transition::new(Mode::Config, Mode::Enable, "end"))
        .with_transition(Transition::interface(Mode::Config, Mode::SubInterface, "interface"))
        .with_transition(Transition::new(Mode::SubInterface, Mode::Config, "exit"))
        .with_transition(Transition::new(Mode::SubInterface, Mode::Enable, "end"))
        .with_error_marker(r"^\s*[\^%]")?
        .with_default_exec_mode(Mode::Config)
        .with_on_open_command("terminal length 0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_of(line: &str) -> Option<Mode> {
        let dialect = dialect().unwrap();
        let found = dialect.probe_prompts().find_match(line)?;
        dialect.probe_mode(found.index)
    }

    #[test]
    fn test_ios_dialect() {
        let dialect = dialect().unwrap();
        assert_eq!(dialect.name, "cisco_ios");
        assert_eq!(dialect.transitions.len(), 7);
        assert!(dialect.validate().is_ok());
    }

    #[test]
    fn test_prompt_modes() {
        assert_eq!(mode_of("router>"), Some(Mode::Normal));
        assert_eq!(mode_of("router#"), Some(Mode::Enable));
        assert_eq!(mode_of("router(config)#"), Some(Mode::Config));
        assert_eq!(mode_of("router(config-subif)#"), Some(Mode::SubInterface));
        assert_eq!(mode_of("t-ios-1# "), Some(Mode::Enable));
    }

    #[test]
    fn test_mode_prompts_do_not_overlap() {
        let dialect = dialect().unwrap();
        for (line, mode) in [
            ("router>", Mode::Normal),
            ("router#", Mode::Enable),
            ("router(config)#", Mode::Config),
            ("router(config-subif)#", Mode::SubInterface),
        ] {
            assert_eq!(dialect.prompts.modes_matching(line), vec![mode], "{line}");
        }
    }

    #[test]
    fn test_other_config_modes_are_unrecognized() {
        let dialect = dialect().unwrap();
        let found = dialect.probe_prompts().find_match("router(config-if)#").unwrap();
        assert!(dialect.probe_mode(found.index).is_none());
    }

    #[test]
    fn test_output_is_not_a_prompt() {
        assert_eq!(mode_of("show date"), None);
        assert_eq!(mode_of("Thu Sep 12 19:50:51 GMT 2013"), None);
        assert_eq!(mode_of("Building configuration..."), None);
    }

    #[test]
    fn test_error_marker() {
        let dialect = dialect().unwrap();
        assert!(dialect.is_error("% Invalid input detected at '^' marker."));
        assert!(dialect.is_error("    ^\n% Invalid input"));
        assert!(!dialect.is_error("Cisco IOS Software, Version 15.2"));
    }

    #[test]
    fn test_enable_requires_password_prompt() {
        let dialect = dialect().unwrap();
        let edge = dialect.transitions.get(Mode::Normal, Mode::Enable).unwrap();
        assert!(edge.auth_prompt.as_ref().unwrap().is_match("Password: "));
    }
}
