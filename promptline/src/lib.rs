//! # Promptline
//!
//! Async expect-style prompt matching and CLI mode management.
//!
//! Promptline drives interactive command-line sessions on network devices
//! and shells: it sends a command, waits for the prompt that ends its
//! output, and hands back the text in between. On top of that it knows
//! which mode a vendor CLI is in and how to move between modes.
//!
//! ## Features
//!
//! - Line-at-a-time prompt matching with first-pattern-wins ordering
//! - Carriage return normalization and escape sequence stripping that do
//!   not depend on how the data was chunked
//! - Mode detection and shortest-path mode transitions, with password
//!   prompts answered on the way
//! - Built-in dialects for Cisco IOS, Vyatta, Riverbed, PowerShell and
//!   generic shells
//! - Any byte stream as transport; SSH via russh included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptline::{CliDriver, DriverBuilder, ExecOptions, Mode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), promptline::Error> {
//!     let mut driver = DriverBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("secret")
//!         .dialect("cisco_ios")
//!         .connect()
//!         .await?;
//!
//!     let clock = driver
//!         .exec("show clock", &ExecOptions::new().in_mode(Mode::Enable))
//!         .await?;
//!     println!("{}", clock);
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use channel::{ExpectMatch, PatternSet, Session, SessionConfig};
pub use driver::{CliDriver, DriverBuilder, ExecMode, ExecOptions, GenericDriver, ModeProbe};
pub use error::{Error, Result};
pub use platform::{Dialect, Mode, ModeTarget};
pub use transport::{AuthMethod, SshConfig, StreamTransport, Transport};
