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


//! Handler traits for commands and sessions

use crate::{Arguments, CliResult, Context};
use async_trait::async_trait;

/// Handler invoked when a command line is dispatched to a registered command.
///
/// The matched command tokens have already been removed from `args`; what
/// remains are the parameters. Output written to `args` is flushed to the
/// context once the handler returns. An `Err` is reported to the user as
/// `<command>: error: <message>` and does not end the session.
///
/// # Example
///
/// ```no_run
/// use telecli_cli::{Arguments, CliResult, CommandHandler};
/// use async_trait::async_trait;
/// use std::fmt::Write;
///
/// struct Echo;
///
/// #[async_trait]
/// impl CommandHandler for Echo {
///     async fn handle(&self, args: &mut Arguments<'_>) -> CliResult<()> {
///         let words: Vec<&str> = args.iter().collect();
///         writeln!(args, "{}", words.join(" "))?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Run the command
    async fn handle(&self, args: &mut Arguments<'_>) -> CliResult<()>;
}

/// Command handler wrapping a plain closure, see [`handler_fn`]
pub struct FnHandler<F> {
    f: F,
}

/// Build a [`CommandHandler`] from a synchronous closure
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut Arguments<'_>) -> CliResult<()> + Send + Sync + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(&mut Arguments<'_>) -> CliResult<()> + Send + Sync + 'static,
{
    async fn handle(&self, args: &mut Arguments<'_>) -> CliResult<()> {
        (self.f)(args)
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Session level hooks of a CLI.
///
/// All methods have default implementations; override `validate` to plug in
/// real authentication.
#[async_trait]
pub trait CliHandler: Send + Sync + 'static {
    /// Check a login attempt.
    ///
    /// The default accepts exactly the user name and password configured on
    /// the context's [`CliConfig`](crate::CliConfig).
    async fn validate(&self, context: &Context, username: &str, password: &str) -> bool {
        let config = context.config();
        username == config.username && password == config.password
    }

    /// Called when a context starts processing input
    async fn on_session_start(&self, _context: &Context) {}

    /// Called when a context stops processing input
    async fn on_session_end(&self, _context: &Context) {}
}

#[async_trait]
impl<H: CliHandler + ?Sized> CliHandler for std::sync::Arc<H> {
    async fn validate(&self, context: &Context, username: &str, password: &str) -> bool {
        (**self).validate(context, username, password).await
    }

    async fn on_session_start(&self, context: &Context) {
        (**self).on_session_start(context).await;
    }

    async fn on_session_end(&self, context: &Context) {
        (**self).on_session_end(context).await;
    }
}

/// Handler with every default behaviour
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCliHandler;

#[async_trait]
impl CliHandler for DefaultCliHandler {}
