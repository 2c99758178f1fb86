//! Builder for creating SSH-backed drivers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::info;
use secrecy::SecretString;

use super::CliDriver;
use super::generic::GenericDriver;
use crate::channel::{Session, SessionConfig};
use crate::error::{DriverError, PlatformError, Result};
use crate::platform::{Dialect, DialectRegistry};
use crate::transport::{AuthMethod, HostKeyVerification, SshChannel, SshConfig, SshTransport};

/// Builder for connecting to a device over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use promptline::driver::{CliDriver, DriverBuilder, ExecOptions};
///
/// # async fn example() -> Result<(), promptline::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .dialect("cisco_ios")
///     .connect()
///     .await?;
/// let output = driver.exec("show clock", &ExecOptions::new()).await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
    private_key: Option<(PathBuf, Option<String>)>,
    enable_password: Option<String>,
    dialect_name: Option<String>,
    custom_dialect: Option<Dialect>,
    connect_timeout: Duration,
    session: SessionConfig,
    terminal_type: String,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: None,
            password: None,
            private_key: None,
            enable_password: None,
            dialect_name: None,
            custom_dialect: None,
            connect_timeout: Duration::from_secs(30),
            session: SessionConfig::default(),
            terminal_type: "vt100".to_string(),
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication. The password is also answered on
    /// `enable` prompts unless [`enable_password`](Self::enable_password)
    /// is set.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.private_key = Some((key_path.into(), None));
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.private_key = Some((key_path.into(), Some(passphrase.into())));
        self
    }

    /// Set the password for privilege escalation.
    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = Some(password.into());
        self
    }

    /// Set the dialect name (e.g., "cisco_ios", "vyatta").
    pub fn dialect(mut self, name: impl Into<String>) -> Self {
        self.dialect_name = Some(name.into());
        self
    }

    /// Set a custom dialect.
    pub fn custom_dialect(mut self, dialect: Dialect) -> Self {
        self.custom_dialect = Some(dialect);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the default prompt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.session.timeout = timeout;
        self
    }

    /// Replace the whole session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Set the terminal type sent with the PTY request.
    pub fn terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set the known_hosts file path.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    fn resolve_dialect(&mut self) -> Result<Arc<Dialect>> {
        if let Some(custom) = self.custom_dialect.take() {
            custom.validate()?;
            return Ok(Arc::new(custom));
        }
        match self.dialect_name.as_deref() {
            Some(name) => DialectRegistry::lookup(name),
            None => Err(PlatformError::InvalidDefinition {
                message: "Dialect must be specified".to_string(),
            }
            .into()),
        }
    }

    /// Connect, open a shell and start the driver.
    pub async fn connect(mut self) -> Result<GenericDriver<SshChannel>> {
        let username = self.username.take().ok_or_else(|| DriverError::InvalidConfig {
            message: "Username is required".to_string(),
        })?;
        let dialect = self.resolve_dialect()?;

        let auth = match (self.private_key.take(), self.password.clone()) {
            (Some((path, passphrase)), _) => AuthMethod::PrivateKey {
                path,
                passphrase: passphrase.map(SecretString::from),
            },
            (None, Some(password)) => AuthMethod::Password(SecretString::from(password)),
            (None, None) => AuthMethod::None,
        };
        let enable_password = self.enable_password.take().or(self.password.take());

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth,
            timeout: self.connect_timeout,
            terminal_type: self.terminal_type,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };
        info!("Connecting to {} as '{}' ({})", ssh_config.socket_addr(), ssh_config.username, dialect.name);

        let channel = SshTransport::connect(ssh_config).await?.open_shell().await?;
        let session = Session::new(channel, self.session);
        let mut driver = GenericDriver::new(session, dialect);
        if let Some(password) = enable_password {
            driver = driver.with_enable_password(SecretString::from(password));
        }
        driver.start().await?;
        Ok(driver)
    }
}
