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
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A channel that reads from one transport and writes to another.
///
/// Each half carries an ownership flag. Closing the pair always makes the
/// pair itself unusable, but only closes the halves it owns; a shared half
/// (for example a console writer used by several pairs) stays open.
pub struct PairChannel {
    reader: Arc<dyn Channel>,
    writer: Arc<dyn Channel>,
    owns_reader: bool,
    owns_writer: bool,
    closed: CancellationToken,
}

impl PairChannel {
    /// Combine a read half and a write half, owning both
    pub fn new(reader: Arc<dyn Channel>, writer: Arc<dyn Channel>) -> Self {
        Self {
            reader,
            writer,
            owns_reader: true,
            owns_writer: true,
            closed: CancellationToken::new(),
        }
    }

    /// Choose which halves are closed along with the pair
    pub fn with_ownership(mut self, owns_reader: bool, owns_writer: bool) -> Self {
        self.owns_reader = owns_reader;
        self.owns_writer = owns_writer;
        self
    }

    /// The read half
    pub fn reader(&self) -> &Arc<dyn Channel> {
        &self.reader
    }

    /// The write half
    pub fn writer(&self) -> &Arc<dyn Channel> {
        &self.writer
    }
}

#[async_trait]
impl Channel for PairChannel {
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::NotOpen);
        }
        tokio::select! {
            result = self.reader.read(buf) => result,
            () = self.closed.cancelled() => Err(ChannelError::Closed),
        }
    }

    async fn write(&self, buf: &[u8]) -> ChannelResult<usize> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::NotOpen);
        }
        self.writer.write(buf).await
    }

    async fn close(&self) -> ChannelResult<()> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.closed.cancel();
        debug!(
            owns_reader = self.owns_reader,
            owns_writer = self.owns_writer,
            "Pair channel closed"
        );
        if self.owns_reader {
            self.reader.close().await?;
        }
        if self.owns_writer {
            self.writer.close().await?;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.is_cancelled() && self.reader.is_open() && self.writer.is_open()
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.reader.read_timeout()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.reader.set_read_timeout(timeout);
    }

    async fn send_urgent(&self, prefix: &[u8], byte: u8) -> ChannelResult<()> {
        if self.closed.is_cancelled() {
            return Err(ChannelError::NotOpen);
        }
        self.writer.send_urgent(prefix, byte).await
    }

    async fn set_local_echo(&self, enabled: bool) -> ChannelResult<()> {
        self.writer.set_local_echo(enabled).await
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.reader.peer_addr()
    }
}

impl std::fmt::Debug for PairChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairChannel")
            .field("owns_reader", &self.owns_reader)
            .field("owns_writer", &self.owns_writer)
            .field("open", &self.is_open())
            .finish()
    }
}
