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


//! Multi-context owner
//!
//! A [`Cli`] owns the shared configuration and command registry, and tracks
//! every live [`Context`]. Contexts run on their own tasks (or in the
//! foreground when there is only one) and are reaped by
//! [`Cli::garbage_collect`] once their channel has closed.

use crate::{
    CliConfig, CliError, CliHandler, CliResult, CommandHandler, CommandRegistry, Context,
    ContextId, DefaultCliHandler,
};
use dashmap::DashMap;
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use telecli_channel::{Channel, PairChannel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of a broadcast operation
#[derive(Debug, Clone)]
pub struct BroadcastResult {
    /// Total number of contexts attempted
    pub total: usize,
    /// Number of successful writes
    pub succeeded: usize,
    /// Number of failed writes
    pub failed: usize,
    /// Errors that occurred (ContextId and error message)
    pub errors: Vec<(ContextId, String)>,
}

impl BroadcastResult {
    fn new() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    /// Check if all writes succeeded
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

struct GarbageCollector {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Command line interpreter serving any number of contexts.
///
/// # Example
///
/// ```no_run
/// use telecli_cli::{Cli, CliConfig, handler_fn};
/// use std::fmt::Write;
///
/// # async fn demo(stream: tokio::net::TcpStream) -> telecli_cli::CliResult<()> {
/// let cli = Cli::new(CliConfig::default().with_prompt("demo> "));
/// cli.set_command(
///     "hello\nhi",
///     handler_fn(|args| {
///         writeln!(args, "Hello!")?;
///         Ok(())
///     }),
///     "Say hello",
///     "",
/// );
/// let context = cli.add_context(telecli_channel::TcpChannel::tcp(stream));
/// cli.start_context(context.id())?;
/// # Ok(())
/// # }
/// ```
pub struct Cli {
    config: Arc<CliConfig>,
    registry: Arc<CommandRegistry>,
    handler: Arc<dyn CliHandler>,
    contexts: DashMap<ContextId, Arc<Context>>,
    next_id: AtomicU64,
    collector: Mutex<Option<GarbageCollector>>,
}

impl Cli {
    /// Create a CLI with the default session hooks
    pub fn new(config: CliConfig) -> Self {
        Self::with_handler(config, DefaultCliHandler)
    }

    /// Create a CLI with custom session hooks
    pub fn with_handler(config: CliConfig, handler: impl CliHandler) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(CommandRegistry::new()),
            handler: Arc::new(handler),
            contexts: DashMap::new(),
            next_id: AtomicU64::new(1),
            collector: Mutex::new(None),
        }
    }

    /// Session strings and login settings
    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Shared command registry
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Register newline separated synonyms for a command.
    ///
    /// Returns `false`, registering nothing, if any synonym exists already.
    pub fn set_command(
        &self,
        names: &str,
        handler: impl CommandHandler,
        help: &str,
        usage: &str,
    ) -> bool {
        self.registry.register(names, Arc::new(handler), help, usage)
    }

    /// Remove newline separated command names
    pub fn remove_command(&self, names: &str) -> bool {
        self.registry.remove(names)
    }

    /// Track a new context on a bidirectional channel
    pub fn add_context<C: Channel + 'static>(&self, channel: C) -> Arc<Context> {
        self.attach(Arc::new(channel))
    }

    /// Track a new context reading from `reader` and writing to `writer`.
    ///
    /// Only the halves flagged as owned are closed with the context.
    pub fn add_context_pair(
        &self,
        reader: Arc<dyn Channel>,
        writer: Arc<dyn Channel>,
        owns_reader: bool,
        owns_writer: bool,
    ) -> Arc<Context> {
        let pair = PairChannel::new(reader, writer).with_ownership(owns_reader, owns_writer);
        self.attach(Arc::new(pair))
    }

    fn attach(&self, channel: Arc<dyn Channel>) -> Arc<Context> {
        let id = ContextId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let context = Arc::new(Context::new(
            id,
            channel,
            Arc::clone(&self.config),
            Arc::clone(&self.registry),
            Arc::clone(&self.handler),
        ));
        self.contexts.insert(id, Arc::clone(&context));
        gauge!("telecli.contexts.active").set(self.contexts.len() as f64);
        debug!(context_id = %id, "Context added");
        context
    }

    /// Look up a tracked context
    pub fn context(&self, id: ContextId) -> Option<Arc<Context>> {
        self.contexts.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Identifiers of every tracked context
    pub fn context_ids(&self) -> Vec<ContextId> {
        self.contexts.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of tracked contexts
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Run a tracked context on its own task
    pub fn start_context(&self, id: ContextId) -> CliResult<()> {
        let context = self.context(id).ok_or(CliError::ContextNotFound(id))?;
        context.start()?;
        Ok(())
    }

    /// Stop a context and forget it
    pub async fn remove_context(&self, id: ContextId) -> CliResult<()> {
        let (_, context) = self
            .contexts
            .remove(&id)
            .ok_or(CliError::ContextNotFound(id))?;
        context.stop().await;
        gauge!("telecli.contexts.active").set(self.contexts.len() as f64);
        debug!(context_id = %id, "Context removed");
        Ok(())
    }

    /// Run a single context on the calling task until its channel ends.
    ///
    /// Fails if any other context is tracked.
    pub async fn run_foreground<C: Channel + 'static>(&self, channel: C) -> CliResult<()> {
        let tracked = self.contexts.len();
        if tracked != 0 {
            return Err(CliError::NotSingleContext(tracked + 1));
        }
        let context = self.add_context(channel);
        let result = context.run().await;
        self.contexts.remove(&context.id());
        gauge!("telecli.contexts.active").set(self.contexts.len() as f64);
        result
    }

    /// Forget every context that is closed and not running a command.
    ///
    /// Returns the number of contexts removed.
    pub fn garbage_collect(&self) -> usize {
        let before = self.contexts.len();
        self.contexts
            .retain(|_, context| context.is_processing_command() || context.is_open());
        let removed = before.saturating_sub(self.contexts.len());
        if removed > 0 {
            debug!(removed, "Collected closed contexts");
            counter!("telecli.contexts.collected").increment(removed as u64);
            gauge!("telecli.contexts.active").set(self.contexts.len() as f64);
        }
        removed
    }

    /// Collect closed contexts every `interval` until [`Cli::stop_all`]
    pub fn start_garbage_collector(self: &Arc<Self>, interval: Duration) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let cli: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    () = token.cancelled() => break,
                }
                match cli.upgrade() {
                    Some(cli) => {
                        cli.garbage_collect();
                    }
                    None => break,
                }
            }
            debug!("Garbage collector stopped");
        });

        let previous = self
            .collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(GarbageCollector { cancel, handle });
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }
    }

    /// Write `message` plus a newline to every tracked context
    pub async fn broadcast(&self, message: &str) -> BroadcastResult {
        let mut result = BroadcastResult::new();
        let contexts: Vec<Arc<Context>> = self
            .contexts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        result.total = contexts.len();

        let writes = contexts.iter().map(|context| async move {
            (context.id(), context.write_line(message).await)
        });
        let results = futures_util::future::join_all(writes).await;

        for (id, outcome) in results {
            match outcome {
                Ok(()) => result.succeeded += 1,
                Err(error) => {
                    warn!(context_id = %id, %error, "Broadcast write failed");
                    result.failed += 1;
                    result.errors.push((id, error.to_string()));
                }
            }
        }
        result
    }

    /// Stop the garbage collector and every context, forgetting them all
    pub async fn stop_all(&self) {
        let collector = self
            .collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(collector) = collector {
            collector.cancel.cancel();
            if let Err(error) = collector.handle.await {
                warn!(%error, "Garbage collector task failed");
            }
        }

        let ids = self.context_ids();
        info!(count = ids.len(), "Stopping all contexts");
        let stops = ids.into_iter().map(|id| self.remove_context(id));
        for outcome in futures_util::future::join_all(stops).await {
            if let Err(error) = outcome {
                debug!(%error, "Context already removed");
            }
        }
    }
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("contexts", &self.contexts.len())
            .field("commands", &self.registry.len())
            .finish_non_exhaustive()
    }
}
