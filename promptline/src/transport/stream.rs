//! Transport over any tokio byte stream (raw TCP, telnet-style consoles).

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use crate::error::{Result, TransportError};

const READ_CHUNK_SIZE: usize = 4096;

/// A [`Transport`] wrapping an `AsyncRead + AsyncWrite` stream.
///
/// Readiness is detected by attempting a read bounded by the poll slice;
/// bytes read that way are held until [`Transport::read_chunk`] asks for them.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,
    pending: BytesMut,
    eof: bool,
    closed: bool,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            eof: false,
            closed: false,
        }
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn fill(&mut self) -> Result<usize> {
        self.pending.reserve(READ_CHUNK_SIZE);
        let n = self
            .stream
            .read_buf(&mut self.pending)
            .await
            .map_err(TransportError::Io)?;
        if n == 0 {
            debug!("Stream reached end of file");
            self.eof = true;
        }
        Ok(n)
    }
}

impl StreamTransport<TcpStream> {
    /// Open a TCP connection to `host:port`.
    pub async fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        debug!("Connecting to {}:{}", host, port);
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|source| TransportError::ConnectionFailed {
                host: host.to_string(),
                port,
                source,
            })?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;
        Ok(Self::new(stream))
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn wait_readable(&mut self, slice: Duration) -> Result<bool> {
        if !self.pending.is_empty() || self.eof {
            return Ok(true);
        }
        if self.closed {
            return Ok(false);
        }
        match tokio::time::timeout(slice, self.fill()).await {
            Err(_) => Ok(false),
            Ok(result) => result.map(|_| true),
        }
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        if self.pending.is_empty() && !self.eof && !self.closed {
            self.fill().await?;
        }
        Ok(self.pending.split().freeze())
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Ok(0);
        }
        let n = self.stream.write(data).await.map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(n)
    }

    fn is_open(&self) -> bool {
        !self.closed && !self.eof
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.stream.shutdown().await.map_err(TransportError::Io)?;
        }
        Ok(())
    }
}
