//! Vyatta / VyOS dialect.
//!
//! Two modes: operational (`vyatta@router:~$`) and configuration
//! (`vyatta@router#`). Leaving configuration mode with uncommitted changes
//! is refused with a `Cannot exit` message, which fails the transition. A
//! forced transition leaves with `exit discard` instead, dropping the
//! uncommitted changes.
//! Configuration commands print an `[edit]` marker line that carries no
//! information and is dropped from output.

use crate::error::Result;
use crate::platform::{Dialect, Mode, Transition};

const PREFIX: &str = r"(?P<user>[a-zA-Z][a-zA-Z0-9_\-]*)@(?P<name>[a-zA-Z0-9_\-.]+)";

/// Create the Vyatta dialect.
pub fn dialect() -> Result<Dialect> {
    Ok(Dialect::new("vyatta")
        .with_prompt(Mode::Normal, &format!(r"^{PREFIX}:~[$#]\s*$"))?
        .with_prompt(Mode::Config, &format!(r"^{PREFIX}#\s*$"))?
        .with_transition(Transition::new(Mode::Normal, Mode::Config, "configure"))
        .with_transition(
            Transition::new(Mode::Config, Mode::Normal, "exit")
                .with_failure(r"^Cannot.*")?
                .with_forced("exit discard"),
        )
        .with_discard_line(Mode::Config, "[edit]")
        .with_default_exec_mode(Mode::Config)
        .with_on_open_command("set terminal length 0"))
}
