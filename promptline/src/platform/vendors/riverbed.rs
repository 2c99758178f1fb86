//! Riverbed (RiOS) dialect.
//!
//! Sessions may land in a root shell (`[admin@host ~]#`) instead of the CLI,
//! in which case the CLI binary is launched first and the session is put in
//! normal mode before paging is turned off. Prompts carry a space before the
//! terminator. The escape codes some releases put in front of the prompt are
//! removed by the session before matching.
//!
//! An unconfigured appliance shows `amnesiac #`, which the enable prompt
//! would also match. It is reserved so that it is never taken for a mode.
//!
//! # Prompt Examples
//!
//! ```text
//! [admin@sh1 ~]#                     # shell
//! sh1 >                              # normal mode
//! sh1 #                              # enable mode
//! sh1 (config) #                     # config mode
//! amnesiac #                         # unconfigured appliance, no mode
//! ```

use crate::error::Result;
use crate::platform::{DEFAULT_PASSWORD_PROMPT, Dialect, Mode, Transition};

const NAME: &str = r"(?P<name>[a-zA-Z0-9_\-.:]+)";

/// Command launching the CLI from the shell.
pub const CLI_BINARY: &str = "/opt/tms/bin/cli";

/// Create the Riverbed dialect.
pub fn dialect() -> Result<Dialect> {
    let shell = r"^\[\S+ \S+\]#";
    let normal = format!("^{NAME} >");
    let enable = format!("^{NAME} #");
    let config = format!(r"^{NAME} \(config\) #");
    let any = format!(r"^{NAME} (>|#|\(config\) #)");

    Ok(Dialect::new("riverbed")
        .with_prompt(Mode::Shell, shell)?
        .with_prompt(Mode::Normal, &normal)?
        .with_prompt(Mode::Enable, &enable)?
        .with_prompt(Mode::Config, &config)?
        .with_reserved_prompt(r"^amnesiac ?#")?
        .with_catch_all(r"^lines \d+-\d+")?
        .with_any_prompt(&[any.as_str()])?
        .with_start_prompts(&[normal.as_str(), shell])?
        .with_transition(
            Transition::new(Mode::Normal, Mode::Enable, "enable").with_auth(DEFAULT_PASSWORD_PROMPT)?,
        )
        .with_transition(Transition::new(Mode::Enable, Mode::Normal, "disable"))
        .with_transition(Transition::new(Mode::Enable, Mode::Config, "config terminal"))
        .with_transition(Transition::new(Mode::Config, Mode::Enable, "exit"))
        .with_error_marker(r"^%")?
        .with_default_exec_mode(Mode::Config)
        .with_shell_launch(CLI_BINARY)
        .with_start_mode(Mode::Normal)
        .with_on_open_command("no cli session paging enable"))
}
