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

use crate::ChannelResult;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// A bidirectional, timeout-capable stream of raw bytes.
///
/// All methods take `&self`: one task may be blocked in [`Channel::read`] while
/// another writes or closes the channel. Implementations serialize concurrent
/// writers themselves, and [`Channel::close`] must wake a pending reader.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Read at least one byte into `buf`.
    ///
    /// Blocks until data is available, the read timeout elapses
    /// ([`ChannelError::Timeout`](crate::ChannelError::Timeout)), the peer
    /// closes the stream or the channel is closed
    /// ([`ChannelError::Closed`](crate::ChannelError::Closed)).
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize>;

    /// Write all of `buf`, returning the number of bytes accepted.
    async fn write(&self, buf: &[u8]) -> ChannelResult<usize>;

    /// Close the channel. Idempotent.
    async fn close(&self) -> ChannelResult<()>;

    /// Whether the channel is still open.
    fn is_open(&self) -> bool;

    /// Current read timeout, `None` blocks indefinitely.
    fn read_timeout(&self) -> Option<Duration>;

    /// Change the read timeout used by subsequent reads.
    fn set_read_timeout(&self, timeout: Option<Duration>);

    /// Transmit `prefix` in-band followed by one byte of urgent data.
    ///
    /// Both go out as one message so no other writer lands between them.
    /// Transports without an urgent pointer deliver the byte in-band, in the
    /// same write as the prefix.
    async fn send_urgent(&self, prefix: &[u8], byte: u8) -> ChannelResult<()> {
        let mut message = Vec::with_capacity(prefix.len() + 1);
        message.extend_from_slice(prefix);
        message.push(byte);
        self.write(&message).await.map(|_| ())
    }

    /// Ask the far end to echo (or stop echoing) what it types.
    async fn set_local_echo(&self, _enabled: bool) -> ChannelResult<()> {
        Ok(())
    }

    /// Address of the remote peer, when the transport has one.
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

#[async_trait]
impl<C: Channel + ?Sized> Channel for Arc<C> {
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        (**self).read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> ChannelResult<usize> {
        (**self).write(buf).await
    }

    async fn close(&self) -> ChannelResult<()> {
        (**self).close().await
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn read_timeout(&self) -> Option<Duration> {
        (**self).read_timeout()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) {
        (**self).set_read_timeout(timeout)
    }

    async fn send_urgent(&self, prefix: &[u8], byte: u8) -> ChannelResult<()> {
        (**self).send_urgent(prefix, byte).await
    }

    async fn set_local_echo(&self, enabled: bool) -> ChannelResult<()> {
        (**self).set_local_echo(enabled).await
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        (**self).peer_addr()
    }
}
