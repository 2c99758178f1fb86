//! Settings for opening an SSH shell to a device.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// What to do with the server's host key, like OpenSSH's
/// `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default)]
pub enum HostKeyVerification {
    /// Only hosts already listed in known_hosts are accepted.
    Strict,

    /// Unknown hosts are recorded in known_hosts; a changed key is refused.
    #[default]
    AcceptNew,

    /// No check at all.
    Disabled,
}

/// Where to connect and how to log in.
#[derive(Debug)]
pub struct SshConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMethod,

    /// Limit for TCP connect plus the SSH handshake.
    pub timeout: Duration,

    /// `TERM` requested for the shell's PTY.
    pub terminal_type: String,

    /// PTY columns. Wide enough that devices do not wrap long lines.
    pub terminal_width: u32,

    /// PTY rows.
    pub terminal_height: u32,

    pub host_key_verification: HostKeyVerification,

    /// known_hosts file to use instead of `~/.ssh/known_hosts`.
    pub known_hosts_path: Option<PathBuf>,
}

impl SshConfig {
    /// Port 22, a 30 second connect limit and a 511x24 `vt100` terminal.
    pub fn new(host: impl Into<String>, username: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            auth,
            timeout: Duration::from_secs(30),
            terminal_type: "vt100".to_string(),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// `host:port`, for logs.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Credentials offered to the server.
#[derive(Debug)]
pub enum AuthMethod {
    /// The `none` method, accepted by some lab images and console servers.
    None,

    Password(SecretString),

    /// OpenSSH or PEM private key, optionally encrypted.
    PrivateKey {
        path: PathBuf,
        passphrase: Option<SecretString>,
    },
}
