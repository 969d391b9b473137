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


//! # Telecli Command Line Interpreter
//!
//! Line-oriented interactive sessions over any
//! [`Channel`](telecli_channel::Channel), raw or Telnet-wrapped.
//!
//! ## Overview
//!
//! - **Line editing**: erase characters, optional echo, CR/LF folding
//! - **Login**: optional user name and password prompts with an overridable
//!   validation hook
//! - **History**: `!` lists, `!!` repeats the last line, `!N` repeats line N
//! - **Help**: `?` or `help` prints a preamble and every registered command
//! - **Dispatch**: multi-word commands with synonyms; the longest matching
//!   command name wins
//!
//! ## Core Components
//!
//! ### [`Cli`]
//!
//! Owns the configuration and the [`CommandRegistry`] and tracks every live
//! [`Context`].
//!
//! ### [`Context`]
//!
//! One session: the login/command state machine, line buffer and history.
//!
//! ### [`CliServer`]
//!
//! A TCP listener attaching a context to each accepted connection, either one
//! task per connection or all of them multiplexed on one task.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::fmt::Write;
//! use std::sync::Arc;
//! use telecli_cli::{Cli, CliConfig, CliServer, ServerConfig, handler_fn};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cli = Arc::new(Cli::new(CliConfig::default()));
//! cli.set_command(
//!     "show version",
//!     handler_fn(|args| {
//!         writeln!(args, "telecli {}", env!("CARGO_PKG_VERSION"))?;
//!         Ok(())
//!     }),
//!     "Show the version",
//!     "",
//! );
//!
//! let server = CliServer::bind(cli, ServerConfig::default()).await?;
//! server.start().await?;
//! tokio::signal::ctrl_c().await?;
//! server.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod arguments;
mod cli;
mod config;
mod context;
mod error;
mod handler;
mod registry;
mod server;
mod types;

pub use self::arguments::{Arguments, tokenize};
pub use self::cli::{BroadcastResult, Cli};
pub use self::config::{CliConfig, DEFAULT_HELP_PREAMBLE};
pub use self::context::{Context, STOP_TIMEOUT, translate_newlines};
pub use self::error::{CliError, CliResult};
pub use self::handler::{CliHandler, CommandHandler, DefaultCliHandler, FnHandler, handler_fn};
pub use self::registry::{CommandEntry, CommandMatch, CommandRegistry, normalize_name};
pub use self::server::{CliServer, ServeMode, ServerConfig};
pub use self::types::{ContextId, ContextState};
