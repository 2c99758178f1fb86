//! Channel layer: prompt detection over a transport.
//!
//! Received bytes are decoded and stripped of escape sequences, carriage
//! returns are normalized, and the text is matched line by line against an
//! ordered list of prompt patterns.

mod buffer;
mod normalize;
mod patterns;
mod session;
mod terminal;

pub use buffer::{ExpectMatch, ReceiveBuffer};
pub use normalize::{fixup_carriage_returns, safe_line_feeds};
pub use patterns::{PatternSet, PromptMatch};
pub use session::{Session, SessionConfig};
pub use terminal::TerminalFilter;
