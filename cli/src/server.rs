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


//! TCP listeners feeding a [`Cli`]
//!
//! Two serving strategies are available. [`ServeMode::TaskPerConnection`]
//! spawns a task for every accepted connection, so a slow command stalls
//! only its own session. [`ServeMode::Multiplexed`] drives the accept loop
//! and every session from a single task.

use crate::{Cli, CliError, CliResult, Context, ContextId};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use telecli_channel::{Channel, TcpChannel};
use telecli_telnet::{TelnetChannel, TelnetConfig, TelnetOption};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// How accepted connections are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServeMode {
    /// One task per connection
    #[default]
    TaskPerConnection,
    /// A single task multiplexing every connection
    Multiplexed,
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: SocketAddr,
    /// Connection scheduling
    pub mode: ServeMode,
    /// Speak Telnet on accepted connections
    pub telnet: bool,
    /// Telnet settings for accepted connections
    pub telnet_config: TelnetConfig,
    /// Connections beyond this many live contexts are refused
    pub max_contexts: usize,
    /// Read timeout of accepted connections (None blocks indefinitely)
    pub read_timeout: Option<Duration>,
    /// Interval of the garbage collector in task-per-connection mode
    pub gc_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 2323)),
            mode: ServeMode::default(),
            telnet: true,
            telnet_config: TelnetConfig::default(),
            max_contexts: 1000,
            read_timeout: None,
            gc_interval: Some(Duration::from_secs(1)),
        }
    }
}

impl ServerConfig {
    /// Create a configuration for `bind_address`
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Self::default()
        }
    }

    /// Set the scheduling mode
    pub fn with_mode(mut self, mode: ServeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable Telnet
    pub fn with_telnet(mut self, enabled: bool) -> Self {
        self.telnet = enabled;
        self
    }

    /// Set the Telnet settings
    pub fn with_telnet_config(mut self, config: TelnetConfig) -> Self {
        self.telnet_config = config;
        self
    }

    /// Set the maximum number of live contexts
    pub fn with_max_contexts(mut self, max: usize) -> Self {
        self.max_contexts = max;
        self
    }

    /// Set the read timeout of accepted connections
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the garbage collector interval
    pub fn with_gc_interval(mut self, interval: Option<Duration>) -> Self {
        self.gc_interval = interval;
        self
    }
}

/// TCP listener attaching a context to every accepted connection
pub struct CliServer {
    cli: Arc<Cli>,
    config: ServerConfig,
    listener: Mutex<Option<TcpListener>>,
    bind_address: SocketAddr,
    running: AtomicBool,
    shutdown: CancellationToken,
    accept_handle: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl CliServer {
    /// Bind the configured address without accepting yet
    pub async fn bind(cli: Arc<Cli>, config: ServerConfig) -> CliResult<Self> {
        let listener = TcpListener::bind(config.bind_address).await?;
        let bind_address = listener.local_addr()?;
        info!(%bind_address, mode = ?config.mode, telnet = config.telnet, "CLI server bound");
        Ok(Self {
            cli,
            config,
            listener: Mutex::new(Some(listener)),
            bind_address,
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            accept_handle: tokio::sync::Mutex::new(None),
        })
    }

    /// Start accepting connections
    pub async fn start(&self) -> CliResult<()> {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| CliError::Other("Server already started".to_string()))?;
        self.running.store(true, Ordering::SeqCst);

        let cli = Arc::clone(&self.cli);
        let config = self.config.clone();
        let shutdown = self.shutdown.clone();
        let handle = match self.config.mode {
            ServeMode::TaskPerConnection => {
                if let Some(interval) = self.config.gc_interval {
                    self.cli.start_garbage_collector(interval);
                }
                tokio::spawn(serve_tasks(listener, cli, config, shutdown))
            }
            ServeMode::Multiplexed => {
                tokio::spawn(serve_multiplexed(listener, cli, config, shutdown))
            }
        };
        *self.accept_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop accepting, then stop every context
    pub async fn shutdown(&self) -> CliResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(CliError::Other("Server not running".to_string()));
        }
        info!(bind_address = %self.bind_address, "Shutting down CLI server");
        self.shutdown.cancel();
        if let Some(handle) = self.accept_handle.lock().await.take() {
            if tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .is_err()
            {
                warn!("Accept loop did not stop in time");
            }
        }
        self.cli.stop_all().await;
        info!("CLI server shutdown complete");
        Ok(())
    }

    /// Check if the server is accepting connections
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Actual bound address
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// The CLI sessions are attached to
    pub fn cli(&self) -> &Arc<Cli> {
        &self.cli
    }

    /// Listener configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for CliServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliServer")
            .field("bind_address", &self.bind_address)
            .field("mode", &self.config.mode)
            .field("running", &self.is_running())
            .field("contexts", &self.cli.context_count())
            .finish()
    }
}

async fn accept(
    listener: &TcpListener,
    shutdown: &CancellationToken,
) -> Option<std::io::Result<(TcpStream, SocketAddr)>> {
    tokio::select! {
        accepted = listener.accept() => Some(accepted),
        () = shutdown.cancelled() => None,
    }
}

async fn accept_failed(error: &std::io::Error) {
    error!(%error, "Failed to accept connection");
    // Back off to avoid a tight loop on persistent errors
    tokio::time::sleep(Duration::from_millis(100)).await;
}

async fn serve_tasks(
    listener: TcpListener,
    cli: Arc<Cli>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    while let Some(accepted) = accept(&listener, &shutdown).await {
        match accepted {
            Ok((stream, peer_addr)) => match admit(&cli, &config, stream, peer_addr).await {
                Ok(Some(context)) => match context.start() {
                    Ok(session) => {
                        tokio::spawn(reap(Arc::clone(&cli), context.id(), session));
                    }
                    Err(error) => {
                        warn!(context_id = %context.id(), %error, "Unable to start context");
                    }
                },
                Ok(None) => {}
                Err(error) => warn!(%peer_addr, %error, "Unable to set up connection"),
            },
            Err(error) => accept_failed(&error).await,
        }
    }
    debug!("Accept loop terminated");
}

/// Drop a finished session from the context table
async fn reap(cli: Arc<Cli>, id: ContextId, session: JoinHandle<()>) {
    if let Err(error) = session.await {
        warn!(context_id = %id, %error, "Session task failed");
    }
    if let Err(error) = cli.remove_context(id).await {
        debug!(context_id = %id, %error, "Finished context already removed");
    }
}

async fn serve_multiplexed(
    listener: TcpListener,
    cli: Arc<Cli>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    let mut sessions: FuturesUnordered<BoxFuture<'static, ContextId>> = FuturesUnordered::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => match admit(&cli, &config, stream, peer_addr).await {
                    Ok(Some(context)) => sessions.push(session(context)),
                    Ok(None) => {}
                    Err(error) => warn!(%peer_addr, %error, "Unable to set up connection"),
                },
                Err(error) => accept_failed(&error).await,
            },
            Some(id) = sessions.next(), if !sessions.is_empty() => {
                if let Err(error) = cli.remove_context(id).await {
                    debug!(context_id = %id, %error, "Finished context already removed");
                }
            }
            () = shutdown.cancelled() => break,
        }
    }

    // Sessions only make progress while polled here, so close them and
    // drive them to completion before the task ends.
    for id in cli.context_ids() {
        if let Some(context) = cli.context(id) {
            if let Err(error) = context.channel().close().await {
                debug!(context_id = %id, %error, "Close failed");
            }
        }
    }
    while sessions.next().await.is_some() {}
    debug!("Multiplexed loop terminated");
}

fn session(context: Arc<Context>) -> BoxFuture<'static, ContextId> {
    async move {
        if let Err(error) = context.run().await {
            warn!(context_id = %context.id(), %error, "Unable to run context");
        }
        context.id()
    }
    .boxed()
}

#[instrument(skip(cli, config, stream))]
async fn admit(
    cli: &Cli,
    config: &ServerConfig,
    stream: TcpStream,
    peer_addr: SocketAddr,
) -> CliResult<Option<Arc<Context>>> {
    if cli.context_count() >= config.max_contexts {
        warn!(
            max_contexts = config.max_contexts,
            "Context limit reached, refusing connection"
        );
        return Ok(None);
    }

    let channel = TcpChannel::tcp(stream).with_read_timeout(config.read_timeout);
    if !config.telnet {
        return Ok(Some(cli.add_context(channel)));
    }

    let telnet = Arc::new(TelnetChannel::with_config(
        channel,
        config.telnet_config.clone(),
    ));
    telnet.send_will(TelnetOption::SuppressGoAhead).await?;
    telnet.send_will(TelnetOption::Echo).await?;
    let context = cli.add_context(telnet);
    context.set_require_echo(true);
    debug!(context_id = %context.id(), "Telnet context ready");
    Ok(Some(context))
}
