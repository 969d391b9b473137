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


use crate::consts;
use crate::{
    OptionState, TelnetCommand, TelnetConfig, TelnetEngine, TelnetError, TelnetEvent,
    TelnetOption, TelnetResult,
};
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use telecli_channel::{Channel, ChannelError, ChannelResult};
use tracing::{debug, instrument};

/// A [`Channel`] that speaks Telnet over another channel.
///
/// Reads return only clean data; negotiation, subnegotiation and commands are
/// handled by the embedded [`TelnetEngine`] and any replies are written to
/// the underlying channel before the read returns. Writes escape IAC and, in
/// non-binary mode, bare CR.
pub struct TelnetChannel<C> {
    inner: C,
    engine: Mutex<TelnetEngine>,
    /// Clean bytes decoded but not yet returned. Its lock also serializes readers.
    pending: tokio::sync::Mutex<BytesMut>,
    chunk_size: usize,
}

impl<C: Channel> TelnetChannel<C> {
    /// Wrap `inner` with the default configuration and option policy
    pub fn new(inner: C) -> Self {
        Self::from_engine(inner, TelnetEngine::default())
    }

    /// Wrap `inner` with the given configuration
    pub fn with_config(inner: C, config: TelnetConfig) -> Self {
        Self::from_engine(inner, TelnetEngine::new(config))
    }

    /// Wrap `inner` around a prepared engine
    pub fn from_engine(inner: C, engine: TelnetEngine) -> Self {
        let chunk_size = engine.config().read_chunk_size.max(1);
        TelnetChannel {
            inner,
            engine: Mutex::new(engine),
            pending: tokio::sync::Mutex::new(BytesMut::new()),
            chunk_size,
        }
    }

    /// The underlying channel
    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn engine(&self) -> MutexGuard<'_, TelnetEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> TelnetResult<()> {
        if self.inner.is_open() {
            Ok(())
        } else {
            Err(TelnetError::NotOpen)
        }
    }

    /// Install a callback for protocol events. It runs while a read is
    /// decoding and must not call back into this channel.
    pub fn set_event_handler<F>(&self, handler: F)
    where
        F: FnMut(&TelnetEvent) + Send + 'static,
    {
        self.engine().set_event_handler(Box::new(handler));
    }

    /// Whether we currently perform `option`
    pub fn is_enabled_local(&self, option: TelnetOption) -> bool {
        self.engine().options().is_enabled_local(option)
    }

    /// Whether the peer currently performs `option`
    pub fn is_enabled_remote(&self, option: TelnetOption) -> bool {
        self.engine().options().is_enabled_remote(option)
    }

    /// Policy and negotiation state of `option`
    pub fn option_state(&self, option: TelnetOption) -> OptionState {
        self.engine().options().get(option)
    }

    /// Set whether we agree to perform `option` when asked
    pub fn set_we_can(&self, option: TelnetOption, value: bool) {
        self.engine().options_mut().set_we_can(option, value);
    }

    /// Set whether we let the peer perform `option`
    pub fn set_they_should(&self, option: TelnetOption, value: bool) {
        self.engine().options_mut().set_they_should(option, value);
    }

    /// Terminal type reported by the peer
    pub fn remote_terminal_type(&self) -> Option<String> {
        self.engine().remote_terminal_type().map(str::to_string)
    }

    /// Terminal speed reported by the peer
    pub fn remote_terminal_speed(&self) -> Option<String> {
        self.engine().remote_terminal_speed().map(str::to_string)
    }

    /// Window size reported by the peer as `(columns, rows)`
    pub fn remote_window_size(&self) -> Option<(u16, u16)> {
        self.engine().remote_window_size()
    }

    /// Change the terminal type reported to the peer
    pub fn set_terminal_type(&self, terminal_type: impl Into<String>) {
        self.engine().set_terminal_type(terminal_type);
    }

    /// Change the window size reported to the peer, announcing it when NAWS
    /// is active
    pub async fn set_window_size(&self, columns: u16, rows: u16) -> TelnetResult<()> {
        self.ensure_open()?;
        self.engine().set_window_size(columns, rows);
        self.flush_outbound().await
    }

    /// An urgent notification arrived on the transport
    pub fn on_urgent(&self) {
        self.engine().on_urgent();
    }

    /// Ask the peer to enable `option`; `Ok(false)` when redundant
    pub async fn send_do(&self, option: TelnetOption) -> TelnetResult<bool> {
        self.negotiate(|engine| engine.send_do(option)).await
    }

    /// Ask the peer to disable `option`
    pub async fn send_dont(&self, option: TelnetOption) -> TelnetResult<bool> {
        self.negotiate(|engine| engine.send_dont(option)).await
    }

    /// Offer to perform `option`
    pub async fn send_will(&self, option: TelnetOption) -> TelnetResult<bool> {
        self.negotiate(|engine| engine.send_will(option)).await
    }

    /// Refuse or stop performing `option`
    pub async fn send_wont(&self, option: TelnetOption) -> TelnetResult<bool> {
        self.negotiate(|engine| engine.send_wont(option)).await
    }

    async fn negotiate<F>(&self, request: F) -> TelnetResult<bool>
    where
        F: FnOnce(&mut TelnetEngine) -> bool,
    {
        self.ensure_open()?;
        let sent = request(&mut self.engine());
        self.flush_outbound().await?;
        Ok(sent)
    }

    /// Send a standalone command.
    ///
    /// With `synchronize` set, Interrupt Process, Break, Abort, Suspend and
    /// Abort Output are followed by a Timing Mark request and, except for
    /// Abort Output, a Synch (`IAC DM` with DM sent as urgent data). Pending
    /// input is then discarded.
    #[instrument(skip(self), fields(peer = ?self.inner.peer_addr()))]
    pub async fn send_command(
        &self,
        command: TelnetCommand,
        synchronize: bool,
    ) -> TelnetResult<()> {
        self.ensure_open()?;
        if !command.is_standalone() {
            return Err(TelnetError::InvalidCommand(command));
        }
        let synchronize = synchronize && command.is_synchronizing();
        {
            let mut engine = self.engine();
            engine.send_command(command);
            if synchronize {
                engine.send_timing_mark();
            }
        }
        self.flush_outbound().await?;
        if synchronize {
            if command != TelnetCommand::AbortOutput {
                self.inner.send_urgent(&[consts::IAC], consts::DM).await?;
            }
            self.flush_input().await?;
        }
        Ok(())
    }

    /// Send `IAC SB option data IAC SE`
    pub async fn send_sub_option(&self, option: TelnetOption, data: &[u8]) -> TelnetResult<()> {
        self.ensure_open()?;
        self.engine().send_sub_option(option, data);
        self.flush_outbound().await
    }

    /// Discard input already buffered or immediately available, processing
    /// any protocol it contains. Skipped while another task is reading.
    pub async fn flush_input(&self) -> TelnetResult<()> {
        let Ok(mut pending) = self.pending.try_lock() else {
            debug!("Reader active, input not flushed");
            return Ok(());
        };
        pending.clear();
        let timeout = self.inner.read_timeout();
        self.inner.set_read_timeout(Some(Duration::ZERO));
        let mut raw = vec![0u8; self.chunk_size];
        let mut discarded = 0usize;
        let result = loop {
            match self.inner.read(&mut raw).await {
                Ok(count) => {
                    let outbound = {
                        let mut engine = self.engine();
                        engine.decode(&raw[..count], &mut pending);
                        engine.take_outbound()
                    };
                    discarded += pending.len();
                    pending.clear();
                    if let Some(bytes) = outbound {
                        if let Err(error) = self.inner.write(&bytes).await {
                            break Err(error);
                        }
                    }
                }
                Err(ChannelError::Timeout) => break Ok(()),
                Err(error) => break Err(error),
            }
        };
        self.inner.set_read_timeout(timeout);
        debug!(discarded, "Flushed pending input");
        result.map_err(TelnetError::from)
    }

    async fn flush_outbound(&self) -> TelnetResult<()> {
        let outbound = self.engine().take_outbound();
        if let Some(bytes) = outbound {
            self.inner.write(&bytes).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Channel> Channel for TelnetChannel<C> {
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        if !self.inner.is_open() {
            return Err(ChannelError::NotOpen);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let mut pending = self.pending.lock().await;
        let mut raw = Vec::new();
        loop {
            if !pending.is_empty() {
                let count = buf.len().min(pending.len());
                buf[..count].copy_from_slice(&pending[..count]);
                pending.advance(count);
                return Ok(count);
            }
            // Only reached when decoded input is exhausted
            if raw.is_empty() {
                raw.resize(self.chunk_size, 0);
            }
            let count = self.inner.read(&mut raw).await?;
            let outbound = {
                let mut engine = self.engine();
                engine.decode(&raw[..count], &mut pending);
                engine.take_outbound()
            };
            if let Some(bytes) = outbound {
                self.inner.write(&bytes).await?;
            }
        }
    }

    async fn write(&self, buf: &[u8]) -> ChannelResult<usize> {
        if !self.inner.is_open() {
            return Err(ChannelError::NotOpen);
        }
        let mut encoded = BytesMut::with_capacity(buf.len() + 8);
        self.engine().encode(buf, &mut encoded);
        self.inner.write(&encoded).await?;
        Ok(buf.len())
    }

    async fn close(&self) -> ChannelResult<()> {
        self.inner.close().await
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.inner.read_timeout()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.inner.set_read_timeout(timeout);
    }

    async fn send_urgent(&self, prefix: &[u8], byte: u8) -> ChannelResult<()> {
        self.inner.send_urgent(prefix, byte).await
    }

    async fn set_local_echo(&self, enabled: bool) -> ChannelResult<()> {
        // Our WILL ECHO tells the peer to stop echoing locally
        let result = if enabled {
            self.send_wont(TelnetOption::Echo).await
        } else {
            self.send_will(TelnetOption::Echo).await
        };
        result.map(|_| ()).map_err(ChannelError::from)
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer_addr()
    }
}

impl<C> std::fmt::Debug for TelnetChannel<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetChannel")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}
