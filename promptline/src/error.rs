//! Error types for promptline.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::channel::safe_line_feeds;

/// Main error type for promptline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (connect, authenticate, raw I/O)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Expect loop errors (timeouts, closed channels)
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Mode and command execution errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Dialect definition errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl Error {
    /// Whether this error is a prompt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Timeout { .. }))
    }

    /// Whether this error means the session is gone and must be reopened.
    pub fn is_connection_closed(&self) -> bool {
        matches!(
            self,
            Error::Channel(ChannelError::Closed { .. }) | Error::Transport(TransportError::Disconnected)
        )
    }
}

/// Transport layer errors (connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key not present in known_hosts (strict checking)
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,

    /// Connection setup timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Expect loop errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No pattern matched before the deadline.
    ///
    /// `output` holds everything received (normalized) before giving up.
    #[error(
        "Did not find {patterns:?} after {timeout:?}. Received data: '{}'",
        safe_line_feeds(output)
    )]
    Timeout {
        timeout: Duration,
        output: String,
        patterns: Vec<String>,
    },

    /// The remote side closed the channel while we were waiting.
    #[error("Channel unexpectedly closed ({context}) waiting for {patterns:?}")]
    Closed {
        context: String,
        patterns: Vec<String>,
    },

    /// The wait was aborted through the session's cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Login or password prompt was shown again after credentials were sent.
    #[error("Login failed, still waiting for {prompt} prompt")]
    LoginFailed { prompt: String },

    /// An expect call was made with no patterns.
    #[error("No patterns supplied to wait for")]
    EmptyPatterns,

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (mode handling, command execution).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver used before `start()`
    #[error("Driver not started - call start() first")]
    NotStarted,

    /// The prompt did not correspond to any mode of the dialect
    #[error("Unknown CLI mode, prompt: '{prompt}'")]
    UnknownMode { prompt: String },

    /// The remote CLI reported an error for a command
    #[error("Command '{command}' in mode '{mode}' resulted in an error: '{output}'")]
    Command {
        command: String,
        mode: String,
        output: String,
    },

    /// Presence or absence of output did not match the caller's expectation
    #[error("Command '{command}' returned output '{output}' but output_expected was {expected}")]
    UnexpectedOutput {
        command: String,
        output: String,
        expected: bool,
    },

    /// No transition path exists between two modes
    #[error("No path from mode '{from}' to '{to}'")]
    NoModePath { from: String, to: String },

    /// A sub-interface transition was issued without an interface name
    #[error("Cannot enter sub-interface mode without an interface")]
    MissingInterface,

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Dialect definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid dialect definition
    #[error("Invalid dialect definition: {message}")]
    InvalidDefinition { message: String },

    /// Dialect name not found in the registry
    #[error("Unknown dialect: '{name}'")]
    UnknownDialect { name: String },

    /// Dialect name already registered
    #[error("Dialect '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Mode name could not be parsed
    #[error("Unknown mode name: '{name}'")]
    UnknownMode { name: String },
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Channel(ChannelError::InvalidPattern(err))
    }
}

/// Result type alias using promptline's Error.
pub type Result<T> = std::result::Result<T, Error>;
