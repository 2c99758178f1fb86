//! Transport layer: the byte stream a session runs over.
//!
//! The expect loop only needs four things from a connection: wait a bounded
//! time for data, read what is there, write bytes and report whether the
//! remote side is still alive. [`Transport`] captures exactly that, so the
//! same session code runs over SSH, raw TCP or an in-memory test double.

pub mod config;
mod ssh;
mod stream;

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::{SshChannel, SshTransport};
pub use stream::StreamTransport;

/// A bidirectional byte channel to a remote CLI.
pub trait Transport: Send {
    /// Wait at most `slice` for data to become readable.
    ///
    /// Returns `true` when a subsequent [`read_chunk`](Self::read_chunk)
    /// will not block. End of stream counts as readable; the read then
    /// returns an empty chunk.
    fn wait_readable(&mut self, slice: Duration) -> impl Future<Output = Result<bool>> + Send;

    /// Read whatever is available. An empty chunk means the remote side
    /// closed the channel.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Bytes>> + Send;

    /// Write some of `data`, returning how many bytes were accepted.
    /// Zero means the channel refused the write.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Whether the remote side is still running.
    fn is_open(&self) -> bool;

    /// Close the channel.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
