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


//! Interactive CLI session bound to a byte channel
//!
//! A [`Context`] reads one character at a time, edits the pending line,
//! walks the login states and hands completed lines through the history
//! stage to the [`CommandRegistry`].

use crate::{
    Arguments, CliConfig, CliError, CliHandler, CliResult, CommandRegistry, ContextId,
    ContextState,
};
use futures::FutureExt;
use metrics::counter;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use telecli_channel::Channel;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

tokio::task_local! {
    static CURRENT_CONTEXT: ContextId;
}

/// Longest [`Context::stop`] waits for another task's session loop
pub const STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Erases one character on the peer's screen
const ERASE_SEQUENCE: &[u8] = b"\x08 \x08";

#[derive(Debug, Default)]
struct Session {
    command_line: String,
    history: Vec<String>,
    ignore_next_eol: bool,
    username: String,
}

enum Echo {
    None,
    Erase,
    Char(u8),
}

/// One interactive session.
///
/// Mutable session state sits behind a short-lived lock that is never held
/// across an await, so a context can be shared between the task running it
/// and tasks that write to or stop it.
pub struct Context {
    id: ContextId,
    channel: Arc<dyn Channel>,
    config: Arc<CliConfig>,
    registry: Arc<CommandRegistry>,
    handler: Arc<dyn CliHandler>,
    state: AtomicU8,
    require_echo: AtomicBool,
    session: Mutex<Session>,
    running: AtomicBool,
    finished: CancellationToken,
}

impl Context {
    /// Create a context reading from and writing to `channel`
    pub fn new(
        id: ContextId,
        channel: Arc<dyn Channel>,
        config: Arc<CliConfig>,
        registry: Arc<CommandRegistry>,
        handler: Arc<dyn CliHandler>,
    ) -> Self {
        let state = config.initial_state();
        let require_echo = config.require_echo;
        Self {
            id,
            channel,
            config,
            registry,
            handler,
            state: AtomicU8::new(state.as_u8()),
            require_echo: AtomicBool::new(require_echo),
            session: Mutex::new(Session::default()),
            running: AtomicBool::new(false),
            finished: CancellationToken::new(),
        }
    }

    /// Context identifier
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Channel the context is attached to
    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// Session strings and login settings
    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Commands available to this context
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Current login/command state
    pub fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ContextState) {
        trace!(context_id = %self.id, %state, "State change");
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Whether a command handler is running
    pub fn is_processing_command(&self) -> bool {
        self.state() == ContextState::ProcessingCommand
    }

    /// Whether the channel is still open
    pub fn is_open(&self) -> bool {
        self.channel.is_open()
    }

    /// Whether a session loop has been started
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether typed characters are echoed back
    pub fn require_echo(&self) -> bool {
        self.require_echo.load(Ordering::Acquire)
    }

    /// Echo typed characters back, for transports that do not echo themselves
    pub fn set_require_echo(&self, enabled: bool) {
        self.require_echo.store(enabled, Ordering::Release);
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completed lines, oldest first
    pub fn history(&self) -> Vec<String> {
        self.session().history.clone()
    }

    /// Line typed so far
    pub fn command_line(&self) -> String {
        self.session().command_line.clone()
    }

    /// User name of the last login attempt
    pub fn username(&self) -> String {
        self.session().username.clone()
    }

    /// Write text, translating every `\n` to the configured newline
    pub async fn write_str(&self, text: &str) -> CliResult<()> {
        let text = translate_newlines(text, &self.config.newline);
        self.channel.write(text.as_bytes()).await?;
        Ok(())
    }

    /// Write text followed by a newline
    pub async fn write_line(&self, text: &str) -> CliResult<()> {
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');
        self.write_str(&line).await
    }

    /// Write bytes untouched
    pub async fn write_bytes(&self, bytes: &[u8]) -> CliResult<()> {
        self.channel.write(bytes).await?;
        Ok(())
    }

    /// Write the prompt for the current state
    pub async fn write_prompt(&self) -> CliResult<()> {
        let prompt = match self.state() {
            ContextState::Username => &self.config.username_prompt,
            ContextState::Password => &self.config.password_prompt,
            ContextState::CommandEntry | ContextState::ProcessingCommand => &self.config.prompt,
        };
        self.write_str(prompt).await
    }

    /// Run the session on the calling task until the channel ends
    pub async fn run(&self) -> CliResult<()> {
        self.claim()?;
        CURRENT_CONTEXT.scope(self.id, self.session_loop()).await;
        Ok(())
    }

    /// Run the session on its own task
    pub fn start(self: &Arc<Self>) -> CliResult<JoinHandle<()>> {
        self.claim()?;
        let context = Arc::clone(self);
        Ok(tokio::spawn(async move {
            CURRENT_CONTEXT
                .scope(context.id, context.session_loop())
                .await;
        }))
    }

    fn claim(&self) -> CliResult<()> {
        if !self.channel.is_open() {
            return Err(CliError::NotOpen);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CliError::AlreadyRunning(self.id));
        }
        Ok(())
    }

    /// Close the channel and wait for the session loop to finish.
    ///
    /// Called from the context's own task (a command handler, the exit
    /// command) this only closes the channel. Idempotent.
    pub async fn stop(&self) {
        debug!(context_id = %self.id, "Stopping context");
        if let Err(error) = self.channel.close().await {
            debug!(context_id = %self.id, %error, "Close failed");
        }
        let own_task = CURRENT_CONTEXT
            .try_with(|current| *current == self.id)
            .unwrap_or(false);
        if own_task || !self.is_running() {
            return;
        }
        if tokio::time::timeout(STOP_TIMEOUT, self.finished.cancelled())
            .await
            .is_err()
        {
            warn!(context_id = %self.id, "Context did not stop within {:?}", STOP_TIMEOUT);
        }
    }

    /// Wait until the session loop has finished
    pub async fn finished(&self) {
        self.finished.cancelled().await;
    }

    #[instrument(name = "session", skip(self), fields(context_id = %self.id))]
    async fn session_loop(&self) {
        info!(peer_addr = ?self.channel.peer_addr(), "Session started");
        counter!("telecli.contexts.started").increment(1);
        self.handler.on_session_start(self).await;

        let mut result = self.begin().await;
        while result.is_ok() {
            result = self.read_and_process_input().await;
        }
        if let Err(error) = result {
            if error.is_terminal() {
                debug!(%error, "Session input ended");
            } else if error.is_timeout() {
                info!("Session idle, read timed out");
            } else {
                warn!(%error, "Session input failed");
            }
        }

        self.handler.on_session_end(self).await;
        if let Err(error) = self.channel.close().await {
            debug!(%error, "Close failed");
        }
        counter!("telecli.contexts.stopped").increment(1);
        info!("Session ended");
        self.finished.cancel();
    }

    async fn begin(&self) -> CliResult<()> {
        self.update_local_echo().await?;
        self.write_prompt().await
    }

    /// Read one character from the channel and process it
    pub async fn read_and_process_input(&self) -> CliResult<()> {
        let mut byte = [0u8; 1];
        self.channel.read(&mut byte).await?;
        self.process_input(byte[0]).await
    }

    /// Feed one character into the line editor and state machine
    pub async fn process_input(&self, byte: u8) -> CliResult<()> {
        if byte == b'\r' || byte == b'\n' {
            let line = {
                let mut session = self.session();
                if session.ignore_next_eol {
                    session.ignore_next_eol = false;
                    return Ok(());
                }
                session.ignore_next_eol = true;
                std::mem::take(&mut session.command_line)
            };
            return self.on_line_terminated(line).await;
        }

        let echo_allowed = self.require_echo() && self.state() != ContextState::Password;
        let echo = {
            let mut session = self.session();
            session.ignore_next_eol = false;
            if self.config.is_edit_character(byte) {
                match session.command_line.pop() {
                    Some(_) => Echo::Erase,
                    None => Echo::None,
                }
            } else if is_printable(byte) {
                session.command_line.push(char::from(byte));
                Echo::Char(byte)
            } else {
                trace!(context_id = %self.id, byte, "Ignored control character");
                Echo::None
            }
        };

        match echo {
            Echo::Erase if echo_allowed => self.write_bytes(ERASE_SEQUENCE).await,
            Echo::Char(byte) if echo_allowed => self.write_bytes(&[byte]).await,
            _ => Ok(()),
        }
    }

    async fn on_line_terminated(&self, line: String) -> CliResult<()> {
        let state = self.state();
        if state == ContextState::Password || self.require_echo() {
            self.write_str("\n").await?;
        }

        match state {
            ContextState::Username => {
                if self.config.password.is_empty() {
                    self.login(&line, "").await?;
                } else {
                    self.session().username = line;
                    self.set_state(ContextState::Password);
                    self.update_local_echo().await?;
                }
            }
            ContextState::Password => {
                let username = std::mem::take(&mut self.session().username);
                self.login(&username, &line).await?;
            }
            ContextState::CommandEntry | ContextState::ProcessingCommand => {
                self.on_completed_line(&line).await?;
            }
        }

        if self.is_open() {
            self.write_prompt().await?;
        }
        Ok(())
    }

    async fn login(&self, username: &str, password: &str) -> CliResult<()> {
        if self.handler.validate(self, username, password).await {
            info!(context_id = %self.id, username, "Login accepted");
            counter!("telecli.contexts.logins").increment(1);
            self.session().username = username.to_string();
            self.set_state(ContextState::CommandEntry);
        } else {
            warn!(context_id = %self.id, username, "Login rejected");
            counter!("telecli.contexts.login_failures").increment(1);
            self.set_state(self.config.initial_state());
        }
        self.update_local_echo().await
    }

    async fn update_local_echo(&self) -> CliResult<()> {
        let enabled = self.state() != ContextState::Password && !self.require_echo();
        self.channel.set_local_echo(enabled).await?;
        Ok(())
    }

    /// Run a completed line through exit, history and help handling, then
    /// dispatch it
    #[instrument(level = "debug", skip(self), fields(context_id = %self.id))]
    pub async fn on_completed_line(&self, line: &str) -> CliResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if self.config.is_exit_command(line) {
            debug!("Exit requested");
            self.stop().await;
            return Ok(());
        }

        let Some(line) = self.substitute_history(line).await? else {
            return Ok(());
        };

        if self.config.is_help_command(&line) {
            return self.show_help().await;
        }

        self.dispatch(&line).await?;
        self.session().history.push(line);
        Ok(())
    }

    /// Resolve `!!` and `!N`, list history for `!`.
    ///
    /// Returns `None` when the line has been fully handled.
    async fn substitute_history(&self, line: &str) -> CliResult<Option<String>> {
        let history_command = self.config.history_command.as_str();

        if line == self.config.repeat_command {
            let last = self.session().history.last().cloned();
            return match last {
                Some(last) => Ok(Some(last)),
                None => self.no_history().await,
            };
        }

        if history_command.is_empty() {
            return Ok(Some(line.to_string()));
        }
        let Some(reference) = line.strip_prefix(history_command) else {
            return Ok(Some(line.to_string()));
        };

        let reference = reference.trim();
        if reference.is_empty() {
            let listing = self.history_listing();
            self.write_str(&listing).await?;
            return Ok(None);
        }

        let entry = reference.parse::<usize>().ok().and_then(|number| {
            number
                .checked_sub(1)
                .and_then(|index| self.session().history.get(index).cloned())
        });
        match entry {
            Some(entry) => Ok(Some(entry)),
            None => self.no_history().await,
        }
    }

    async fn no_history(&self) -> CliResult<Option<String>> {
        self.write_line(&self.config.no_history_error).await?;
        Ok(None)
    }

    fn history_listing(&self) -> String {
        self.session()
            .history
            .iter()
            .enumerate()
            .map(|(index, entry)| format!("{:>3} {entry}\n", index + 1))
            .collect()
    }

    /// Write the help screen
    pub async fn show_help(&self) -> CliResult<()> {
        let help = self.registry.render_help(&self.config);
        self.write_str(&help).await
    }

    async fn dispatch(&self, line: &str) -> CliResult<()> {
        let mut args = Arguments::new(self, line);
        let Some(found) = self.registry.find_longest(args.tokens()) else {
            debug!(context_id = %self.id, line, "Unknown command");
            counter!("telecli.commands.unknown").increment(1);
            return self.write_line(&self.config.unknown_command_error).await;
        };

        args.bind(found.tokens, found.name, found.entry.usage());
        debug!(context_id = %self.id, command = args.command(), "Dispatching command");
        counter!("telecli.commands.dispatched").increment(1);

        let _processing = Processing::enter(self);
        let handler = Arc::clone(found.entry.handler());
        let outcome = AssertUnwindSafe(handler.handle(&mut args))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                warn!(context_id = %self.id, command = args.command(), %error, "Command failed");
                counter!("telecli.commands.failed").increment(1);
                args.write_error(&error.to_string());
            }
            Err(_) => {
                error!(context_id = %self.id, command = args.command(), "Command handler panicked");
                counter!("telecli.commands.failed").increment(1);
                args.write_error("internal error");
            }
        }
        args.flush().await
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("open", &self.is_open())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// Holds a context in `ProcessingCommand` until dropped
struct Processing<'a> {
    context: &'a Context,
}

impl<'a> Processing<'a> {
    fn enter(context: &'a Context) -> Self {
        context.set_state(ContextState::ProcessingCommand);
        Self { context }
    }
}

impl Drop for Processing<'_> {
    fn drop(&mut self) {
        self.context.set_state(ContextState::CommandEntry);
    }
}

fn is_printable(byte: u8) -> bool {
    (0x20..0x7f).contains(&byte)
}

/// Replace every `\n` in `text` with `newline`
pub fn translate_newlines<'a>(text: &'a str, newline: &str) -> Cow<'a, str> {
    if !text.contains('\n') || newline == "\n" {
        return Cow::Borrowed(text);
    }
    let mut translated = String::with_capacity(text.len() + newline.len());
    for (index, segment) in text.split('\n').enumerate() {
        if index > 0 {
            translated.push_str(newline);
        }
        translated.push_str(segment);
    }
    Cow::Owned(translated)
}
