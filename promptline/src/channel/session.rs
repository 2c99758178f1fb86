//! Interactive session: the expect loop over a transport.

use std::time::Duration;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::buffer::{ExpectMatch, ReceiveBuffer};
use super::normalize::safe_line_feeds;
use super::patterns::PatternSet;
use crate::error::{ChannelError, Result};
use crate::transport::Transport;

const LOGIN_PROMPT: &str = r"[Ll]ogin: ?$";
const PASSWORD_PROMPT: &str = r"[Pp]assword: ?$";

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Default time to wait for a prompt. Zero waits forever.
    pub timeout: Duration,

    /// Upper bound for a single readiness wait inside the expect loop.
    pub poll_interval: Duration,

    /// Terminator appended by the `*_line_*` operations.
    pub line_ending: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
            line_ending: "\r".to_string(),
        }
    }
}

/// An interactive CLI session over a [`Transport`].
///
/// All reads go through one [`ReceiveBuffer`]: text that arrives after a
/// matched prompt stays there and is seen by the next expect.
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    buffer: ReceiveBuffer,
    cancel: CancellationToken,
    open: bool,
}

impl<T: Transport> Session<T> {
    /// Create a session over an open transport.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            buffer: ReceiveBuffer::new(),
            cancel: CancellationToken::new(),
            open: true,
        }
    }

    /// Create a session with default configuration.
    pub fn with_defaults(transport: T) -> Self {
        Self::new(transport, SessionConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the default timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Set the default timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Line terminator used by the line-oriented operations.
    pub fn line_ending(&self) -> &str {
        &self.config.line_ending
    }

    /// Token that aborts any pending wait when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replace the cancellation token, e.g. with a child of a service-wide one.
    pub fn set_cancel_token(&mut self, token: CancellationToken) {
        self.cancel = token;
    }

    /// Whether the session and its transport are still usable.
    pub fn is_open(&self) -> bool {
        self.open && self.transport.is_open()
    }

    /// Buffered text not yet consumed by an expect.
    pub fn buffer(&self) -> &ReceiveBuffer {
        &self.buffer
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn closed_error(&self, context: &str, patterns: Option<&PatternSet>) -> ChannelError {
        ChannelError::Closed {
            context: context.to_string(),
            patterns: patterns.map(PatternSet::sources).unwrap_or_default(),
        }
    }

    fn verify_open(&self, patterns: Option<&PatternSet>) -> Result<()> {
        if !self.is_open() {
            return Err(self.closed_error("session is not open", patterns).into());
        }
        Ok(())
    }

    /// Write `text` as is.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        debug!("Sending \"{}\"", safe_line_feeds(text));
        self.write_all(text).await
    }

    /// Write `text` without logging it.
    pub async fn send_hidden(&mut self, text: &str) -> Result<()> {
        debug!("Sending <hidden>");
        self.write_all(text).await
    }

    async fn write_all(&mut self, text: &str) -> Result<()> {
        self.verify_open(None)?;
        let data = text.as_bytes();
        let mut sent = 0;
        while sent < data.len() {
            let n = self.transport.write(&data[sent..]).await?;
            if n == 0 {
                self.open = false;
                return Err(self.closed_error("write refused", None).into());
            }
            sent += n;
        }
        Ok(())
    }

    /// Drain everything currently readable and return it together with any
    /// buffered leftovers. Never waits for more data to arrive.
    pub async fn receive_all(&mut self) -> Result<String> {
        self.verify_open(None)?;
        while self.transport.wait_readable(Duration::ZERO).await? {
            let chunk = self.transport.read_chunk().await?;
            if chunk.is_empty() {
                self.open = false;
                return Err(self.closed_error("remote side closed while flushing", None).into());
            }
            self.buffer.extend(&chunk);
        }
        let flushed = self.buffer.take_all();
        trace!("Flushed \"{}\"", safe_line_feeds(&flushed));
        Ok(flushed)
    }

    /// Wait until one of `patterns` matches a line of received text.
    ///
    /// A zero `timeout` waits forever. The first pattern in declaration order
    /// that matches a line wins, and lines are tried oldest first.
    ///
    /// Buffered text is scanned before cancellation is checked, so a prompt
    /// already received still matches after the token fires. Nothing more is
    /// read from the transport once it has.
    pub async fn expect(&mut self, patterns: &PatternSet, timeout: Duration) -> Result<ExpectMatch> {
        if patterns.is_empty() {
            return Err(ChannelError::EmptyPatterns.into());
        }
        self.verify_open(Some(patterns))?;
        debug!("Waiting for {:?} (timeout {:?})", patterns.sources(), timeout);

        if let Some(found) = self.buffer.scan(patterns) {
            return Ok(self.matched(found));
        }

        let cancel = self.cancel.clone();
        let poll = self.config.poll_interval;
        let started = Instant::now();
        loop {
            let readable = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Wait for {:?} cancelled", patterns.sources());
                    return Err(ChannelError::Cancelled.into());
                }
                readable = self.transport.wait_readable(poll) => readable?,
            };

            if readable {
                let chunk = self.transport.read_chunk().await?;
                if chunk.is_empty() {
                    self.open = false;
                    return Err(self.closed_error("remote side closed the channel", Some(patterns)).into());
                }
                trace!("Received {} bytes", chunk.len());
                self.buffer.extend(&chunk);
                if let Some(found) = self.buffer.scan(patterns) {
                    return Ok(self.matched(found));
                }
            } else if !self.transport.is_open() {
                self.open = false;
                return Err(self.closed_error("remote process exited", Some(patterns)).into());
            }

            if !timeout.is_zero() && started.elapsed() >= timeout {
                let output = self.buffer.as_str().to_string();
                debug!("Timed out, received \"{}\"", safe_line_feeds(&output));
                return Err(ChannelError::Timeout {
                    timeout,
                    output,
                    patterns: patterns.sources(),
                }
                .into());
            }
        }
    }

    fn matched(&self, found: ExpectMatch) -> ExpectMatch {
        debug!(
            "Matched \"{}\" with {:?}",
            safe_line_feeds(&found.matched),
            found.pattern
        );
        found
    }

    /// Send `text` and wait for one of `patterns`.
    pub async fn send_and_wait(
        &mut self,
        text: &str,
        patterns: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectMatch> {
        self.send(text).await?;
        self.expect(patterns, timeout).await
    }

    /// Send `text` plus the line ending and wait for one of `patterns`.
    pub async fn send_line_and_wait(
        &mut self,
        text: &str,
        patterns: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectMatch> {
        let line = format!("{}{}", text, self.config.line_ending);
        self.send_and_wait(&line, patterns, timeout).await
    }

    /// Discard stale input, then send `text` and wait for one of `patterns`.
    ///
    /// Must not be used while the remote side is in the middle of an
    /// interactive exchange, since its pending output would be lost.
    pub async fn flush_send_and_wait(
        &mut self,
        text: &str,
        patterns: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectMatch> {
        let stale = self.receive_all().await?;
        if !stale.is_empty() {
            trace!("Discarded {} stale bytes", stale.len());
        }
        self.send_and_wait(text, patterns, timeout).await
    }

    /// Answer login and password prompts until one of `ready` shows up.
    ///
    /// Used on consoles and telnet-style transports that authenticate inside
    /// the byte stream. Seeing the same credential prompt twice means the
    /// credentials were rejected. The returned match indexes into `ready`.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        ready: &PatternSet,
        timeout: Duration,
    ) -> Result<ExpectMatch> {
        let credentials = PatternSet::new([LOGIN_PROMPT, PASSWORD_PROMPT])?;
        let patterns = credentials.chain(ready);
        let mut sent_username = false;
        let mut sent_password = false;

        loop {
            let mut found = self.expect(&patterns, timeout).await?;
            match found.index {
                0 => {
                    if sent_username {
                        return Err(ChannelError::LoginFailed {
                            prompt: "login".to_string(),
                        }
                        .into());
                    }
                    sent_username = true;
                    let line = format!("{}{}", username, self.config.line_ending);
                    self.send(&line).await?;
                }
                1 => {
                    if sent_password {
                        return Err(ChannelError::LoginFailed {
                            prompt: "password".to_string(),
                        }
                        .into());
                    }
                    sent_password = true;
                    let line = format!("{}{}", password, self.config.line_ending);
                    self.send_hidden(&line).await?;
                }
                index => {
                    debug!("Logged in as {}", username);
                    found.index = index - credentials.len();
                    return Ok(found);
                }
            }
        }
    }

    /// Close the session and its transport.
    pub async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        debug!("Closing session");
        self.open = false;
        self.transport.close().await
    }
}
