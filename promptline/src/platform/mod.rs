//! Dialect definitions for multi-vendor support.
//!
//! A dialect describes one vendor CLI as data: the prompts of each mode,
//! the commands moving between modes and how errors look.

mod dialect;
mod mode;
mod registry;
mod transition;
pub mod vendors;

pub use dialect::{DEFAULT_PASSWORD_PROMPT, Dialect, PromptSpec};
pub use mode::{Mode, ModeTarget};
pub use registry::DialectRegistry;
pub use transition::{Transition, TransitionCommand, TransitionTable};
