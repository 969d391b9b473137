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

use thiserror::Error;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors reported by a [`Channel`](crate::Channel).
///
/// `NotOpen` is a permanent condition: the channel was closed before the call
/// was made and no later call will succeed. Every other variant describes what
/// happened to one particular operation.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was already closed when the operation was attempted
    #[error("Channel not open")]
    NotOpen,

    /// The peer closed the stream, or the channel was closed while waiting
    #[error("Channel closed")]
    Closed,

    /// No data arrived within the configured read timeout
    #[error("Read timed out")]
    Timeout,

    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Check if the error is the permanent "not open" condition
    pub fn is_not_open(&self) -> bool {
        matches!(self, ChannelError::NotOpen)
    }

    /// Check if the error is a read timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChannelError::Timeout)
    }

    /// Check if the error means the stream has ended for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelError::NotOpen | ChannelError::Closed)
    }
}
