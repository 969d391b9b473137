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


//! Error types for CLI sessions

use crate::types::ContextId;
use telecli_channel::ChannelError;
use telecli_telnet::TelnetError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error, usually from binding or accepting on a listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the byte channel a context is attached to
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Error from the Telnet layer
    #[error("Telnet error: {0}")]
    Telnet(#[from] TelnetError),

    /// Formatting into command output failed
    #[error("Format error")]
    Format(#[from] std::fmt::Error),

    /// Context with the given ID is not tracked
    #[error("Context {0} not found")]
    ContextNotFound(ContextId),

    /// Context is already running in a task
    #[error("Context {0} already running")]
    AlreadyRunning(ContextId),

    /// Foreground mode needs exactly one context
    #[error("Foreground mode requires a single context, {0} tracked")]
    NotSingleContext(usize),

    /// The context's channel is closed
    #[error("Context not open")]
    NotOpen,

    /// Generic error with a message
    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Check if the error is the permanent "not open" condition
    pub fn is_not_open(&self) -> bool {
        match self {
            CliError::NotOpen => true,
            CliError::Channel(error) => error.is_not_open(),
            CliError::Telnet(error) => error.is_not_open(),
            _ => false,
        }
    }

    /// Check if the error ends the session reading from a channel
    pub fn is_terminal(&self) -> bool {
        match self {
            CliError::NotOpen => true,
            CliError::Channel(error) => error.is_terminal(),
            CliError::Telnet(TelnetError::Channel(error)) => error.is_terminal(),
            CliError::Telnet(error) => error.is_not_open(),
            _ => false,
        }
    }

    /// Check if the error is a read timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            CliError::Channel(error) => error.is_timeout(),
            CliError::Telnet(TelnetError::Channel(error)) => error.is_timeout(),
            _ => false,
        }
    }
}
