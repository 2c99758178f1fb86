//! Windows PowerShell dialect.
//!
//! PowerShell echoes pending input late, so pending data is flushed before
//! every command.

use crate::error::Result;
use crate::platform::{Dialect, Mode};

/// `PS C:\Users\admin>` style prompt.
pub const PS_PROMPT: &str = r"^PS.*>\s*$";

/// Create the PowerShell dialect.
pub fn dialect() -> Result<Dialect> {
    Ok(Dialect::new("powershell")
        .with_prompt(Mode::Shell, PS_PROMPT)?
        .with_flush_before_send(true))
}
