//! Scripted transport standing in for a remote CLI.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use promptline::channel::{Session, SessionConfig};
use promptline::{Result, Transport};

/// One write the test expects, and what the "device" answers.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub expect: String,
    pub reply: String,
}

/// Shorthand for an exchange.
pub fn exchange(expect: &str, reply: &str) -> Exchange {
    Exchange {
        expect: expect.to_string(),
        reply: reply.to_string(),
    }
}

/// A transport replaying a fixed conversation.
///
/// Every `write` must equal the next scripted exchange; its reply is then
/// queued for reading, optionally split into small chunks.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<Exchange>,
    pending: BytesMut,
    chunk_size: Option<usize>,
    writes: Arc<Mutex<Vec<String>>>,
    open: bool,
    close_after_script: bool,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Exchange>) -> Self {
        Self {
            script: script.into(),
            pending: BytesMut::new(),
            chunk_size: None,
            writes: Arc::new(Mutex::new(Vec::new())),
            open: true,
            close_after_script: false,
        }
    }

    /// Data available before anything is written, such as a banner or the
    /// first prompt.
    pub fn with_initial(mut self, text: &str) -> Self {
        self.pending.extend_from_slice(text.as_bytes());
        self
    }

    /// Hand out at most `size` bytes per read.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Report the remote process as gone once the script is used up and
    /// everything was read.
    pub fn close_after_script(mut self) -> Self {
        self.close_after_script = true;
        self
    }

    /// Handle on the log of everything written.
    pub fn writes(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.writes)
    }

    fn exhausted(&self) -> bool {
        self.script.is_empty() && self.pending.is_empty()
    }
}

impl Transport for ScriptedTransport {
    async fn wait_readable(&mut self, slice: Duration) -> Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        if self.close_after_script && self.exhausted() {
            self.open = false;
            return Ok(false);
        }
        tokio::time::sleep(slice).await;
        Ok(false)
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        let n = match self.chunk_size {
            Some(size) => size.min(self.pending.len()),
            None => self.pending.len(),
        };
        Ok(self.pending.split_to(n).freeze())
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let text = String::from_utf8_lossy(data).to_string();
        self.writes.lock().unwrap().push(text.clone());
        let next = self
            .script
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected write {:?}", text));
        assert_eq!(text, next.expect, "write does not match the script");
        self.pending.extend_from_slice(next.reply.as_bytes());
        Ok(data.len())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }
}

/// Session configuration with short timeouts for tests.
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(10),
        line_ending: "\r".to_string(),
    }
}

/// A session over `transport` with [`fast_config`].
pub fn session(transport: ScriptedTransport) -> Session<ScriptedTransport> {
    Session::new(transport, fast_config())
}

/// Enable `log` output for a test run (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
