//! Generic shell dialect.
//!
//! Recognises the usual `user@host:~$`, `[root@host ~]#` and `host>` shell
//! prompts. There is a single mode and no transitions, so commands simply
//! run wherever the shell is.

use crate::error::Result;
use crate::platform::{Dialect, Mode};

/// Any shell-like prompt, optionally bracketed, ending in `#`, `$`, `>` or `~`.
pub const SHELL_PROMPT: &str = r"^(\[?\S+\s?\S+\]?)(#|\$|>|~)(\s)?$";

/// Create the generic shell dialect.
pub fn dialect() -> Result<Dialect> {
    Dialect::new("generic").with_prompt(Mode::Shell, SHELL_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_dialect() {
        let dialect = dialect().unwrap();
        assert_eq!(dialect.name, "generic");
        assert!(dialect.transitions.is_empty());
        assert!(dialect.default_exec_mode.is_none());
        assert!(dialect.validate().is_ok());
    }

    #[test]
    fn test_shell_prompts() {
        let prompts = dialect().unwrap().any_prompt();
        for prompt in ["[root@vsh1 ~]#", "user@host:~$ ", "bash-4.2$", "switch>"] {
            assert!(prompts.find_match(prompt).is_some(), "{prompt}");
        }
        for line in ["total 0", "drwxr-xr-x 2 root root 40 Sep 12 19:50 tmp"] {
            assert!(prompts.find_match(line).is_none(), "{line}");
        }
    }
}
