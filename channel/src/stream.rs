//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use crate::{Channel, ChannelError, ChannelResult};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{
    AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Channel over a TCP connection
pub type TcpChannel = StreamChannel<OwnedReadHalf, OwnedWriteHalf>;

/// Channel over one end of an in-memory [`tokio::io::duplex`] pipe
pub type DuplexChannel = StreamChannel<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Sentinel stored in the timeout cell for "no timeout"
const NO_TIMEOUT: u64 = u64::MAX;

/// A [`Channel`] backed by a tokio reader and writer.
///
/// The read and write halves sit behind separate locks so a task blocked in
/// `read` never holds up writers. Closing cancels a shared token that every
/// pending read and write selects on.
pub struct StreamChannel<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
    closed: CancellationToken,
    read_timeout_ns: AtomicU64,
    peer_addr: Option<SocketAddr>,
}

impl<R, W> StreamChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Create a channel from separate read and write halves
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            closed: CancellationToken::new(),
            read_timeout_ns: AtomicU64::new(NO_TIMEOUT),
            peer_addr: None,
        }
    }

    /// Record the address of the remote peer
    pub fn with_peer_addr(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    /// Set the initial read timeout
    pub fn with_read_timeout(self, timeout: Option<Duration>) -> Self {
        self.set_read_timeout(timeout);
        self
    }
}

impl TcpChannel {
    /// Wrap a connected TCP stream
    pub fn tcp(stream: TcpStream) -> Self {
        let peer_addr = stream.peer_addr().ok();
        if let Err(error) = stream.set_nodelay(true) {
            debug!(%error, "Unable to disable Nagle on TCP channel");
        }
        let (reader, writer) = stream.into_split();
        let channel = StreamChannel::new(reader, writer);
        match peer_addr {
            Some(addr) => channel.with_peer_addr(addr),
            None => channel,
        }
    }
}

impl DuplexChannel {
    /// Wrap one end of an in-memory pipe
    pub fn duplex(stream: DuplexStream) -> Self {
        Self::from_stream(stream)
    }
}

impl<S> StreamChannel<ReadHalf<S>, WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite + Send,
{
    /// Wrap any bidirectional stream, e.g. one end of [`tokio::io::duplex`]
    pub fn from_stream(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        StreamChannel::new(reader, writer)
    }
}

#[async_trait]
impl<R, W> Channel for StreamChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::NotOpen);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let timeout = self.read_timeout();
        let mut reader = tokio::select! {
            guard = self.reader.lock() => guard,
            () = self.closed.cancelled() => return Err(ChannelError::Closed),
        };
        let count = tokio::select! {
            result = read_with_timeout(&mut *reader, buf, timeout) => result?,
            () = self.closed.cancelled() => return Err(ChannelError::Closed),
        };
        if count == 0 {
            debug!("Peer closed stream");
            self.closed.cancel();
            return Err(ChannelError::Closed);
        }
        trace!(count, "Read bytes from stream");
        Ok(count)
    }

    async fn write(&self, buf: &[u8]) -> ChannelResult<usize> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::NotOpen);
        }
        let mut writer = self.writer.lock().await;
        tokio::select! {
            result = async {
                writer.write_all(buf).await?;
                writer.flush().await
            } => result?,
            () = self.closed.cancelled() => return Err(ChannelError::Closed),
        }
        trace!(count = buf.len(), "Wrote bytes to stream");
        Ok(buf.len())
    }

    async fn close(&self) -> ChannelResult<()> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.closed.cancel();
        // A writer stuck on a full socket keeps the lock; the token already
        // released it, so only shut down when the half is free.
        if let Ok(mut writer) = self.writer.try_lock() {
            if let Err(error) = writer.shutdown().await {
                trace!(%error, "Shutdown of write half failed");
            }
        }
        debug!(peer_addr = ?self.peer_addr, "Channel closed");
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.is_cancelled()
    }

    fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_ns.load(Ordering::Acquire) {
            NO_TIMEOUT => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) {
        let nanos = timeout.map_or(NO_TIMEOUT, |duration| {
            u64::try_from(duration.as_nanos()).unwrap_or(NO_TIMEOUT - 1)
        });
        self.read_timeout_ns.store(nanos, Ordering::Release);
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

impl<R, W> std::fmt::Debug for StreamChannel<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChannel")
            .field("peer_addr", &self.peer_addr)
            .field("open", &!self.closed.is_cancelled())
            .finish()
    }
}

async fn read_with_timeout<R>(
    reader: &mut R,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> ChannelResult<usize>
where
    R: AsyncRead + Unpin,
{
    match timeout {
        Some(duration) => match tokio::time::timeout(duration, reader.read(buf)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ChannelError::Timeout),
        },
        None => Ok(reader.read(buf).await?),
    }
}
