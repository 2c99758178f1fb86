//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::{debug, warn};
use russh::client::{self, Handle, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;

use super::Transport;
use super::config::{AuthMethod, HostKeyVerification, SshConfig};
use crate::error::{Result, TransportError};

/// An authenticated SSH connection.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect to the SSH server and authenticate.
    pub async fn connect(config: SshConfig) -> Result<Self> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        debug!("Connecting to {}", config.socket_addr());
        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed error check_server_key left behind over
            // the generic russh::Error::UnknownKey
            let stored = host_key_error.lock().ok().and_then(|mut slot| slot.take());
            stored.unwrap_or(TransportError::Ssh(e))
        })?;

        Self::authenticate(&mut session, &config).await?;

        Ok(Self { session, config })
    }

    /// Open an interactive shell on this connection.
    ///
    /// The returned channel owns the connection, closing it closes both.
    pub async fn open_shell(self) -> Result<SshChannel> {
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                &self.config.terminal_type,
                self.config.terminal_width,
                self.config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!("Shell opened on {}", self.config.socket_addr());
        Ok(SshChannel {
            session: self.session,
            channel,
            pending: BytesMut::new(),
            closed: false,
            exited: false,
        })
    }

    async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }
}

/// An interactive shell channel on an SSH connection.
///
/// Standard error is merged into the data stream, a CLI prints its error
/// messages wherever it likes.
pub struct SshChannel {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
    pending: BytesMut,
    /// EOF or close received from the server.
    closed: bool,
    /// The remote process reported its exit.
    exited: bool,
}

impl SshChannel {
    fn handle_message(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.pending.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, .. } => self.pending.extend_from_slice(&data),
            ChannelMsg::Eof | ChannelMsg::Close => {
                debug!("Server closed the channel");
                self.closed = true;
            }
            ChannelMsg::ExitStatus { exit_status } => {
                debug!("Remote shell exited with status {}", exit_status);
                self.exited = true;
            }
            ChannelMsg::ExitSignal { .. } => {
                debug!("Remote shell killed by signal");
                self.exited = true;
            }
            _ => {}
        }
    }
}

impl Transport for SshChannel {
    async fn wait_readable(&mut self, slice: Duration) -> Result<bool> {
        if !self.pending.is_empty() || self.closed {
            return Ok(true);
        }
        match tokio::time::timeout(slice, self.channel.wait()).await {
            Err(_) => Ok(false),
            Ok(None) => {
                self.closed = true;
                Ok(true)
            }
            Ok(Some(msg)) => {
                self.handle_message(msg);
                Ok(!self.pending.is_empty() || self.closed)
            }
        }
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        while self.pending.is_empty() && !self.closed {
            match self.channel.wait().await {
                Some(msg) => self.handle_message(msg),
                None => self.closed = true,
            }
        }
        Ok(self.pending.split().freeze())
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Ok(0);
        }
        self.channel.data(data).await.map_err(TransportError::Ssh)?;
        Ok(data.len())
    }

    fn is_open(&self) -> bool {
        !self.closed && !self.exited && !self.session.is_closed()
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            if let Err(e) = self.channel.eof().await {
                debug!("Failed to send EOF: {}", e);
            }
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Host key policy enforcement during the handshake.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Why the key was refused, russh itself only reports `UnknownKey`.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// `Ok(false)` when the host has no known_hosts entry yet.
    fn is_known(&self, key: &PublicKey) -> std::result::Result<bool, TransportError> {
        let checked = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };
        checked.map_err(|e| match e {
            russh::keys::Error::KeyChanged { line } => TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            },
            other => TransportError::KnownHosts(other.to_string()),
        })
    }

    fn remember(&self, key: &PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            warn!("Could not record host key for {}:{}: {}", self.host, self.port, e);
        }
    }

    fn verify(&self, key: &PublicKey) -> std::result::Result<(), TransportError> {
        let strict = match self.host_key_verification {
            HostKeyVerification::Disabled => return Ok(()),
            HostKeyVerification::Strict => true,
            HostKeyVerification::AcceptNew => false,
        };
        if self.is_known(key)? {
            return Ok(());
        }
        if strict {
            return Err(TransportError::HostKeyUnknown {
                host: self.host.clone(),
                port: self.port,
            });
        }
        debug!("Learning host key for {}:{}", self.host, self.port);
        self.remember(key);
        Ok(())
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> std::result::Result<bool, Self::Error> {
        match self.verify(server_public_key) {
            Ok(()) => Ok(true),
            Err(e) => {
                if let Ok(mut slot) = self.host_key_error.lock() {
                    *slot = Some(e);
                }
                Ok(false)
            }
        }
    }
}
