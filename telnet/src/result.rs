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


use telecli_channel::ChannelError;
use thiserror::Error;

/// Result type for Telnet operations
pub type TelnetResult<T> = Result<T, TelnetError>;

/// Errors from a [`TelnetChannel`](crate::TelnetChannel)
#[derive(Debug, Error)]
pub enum TelnetError {
    /// The underlying channel is closed; no protocol operation can succeed
    #[error("Telnet channel not open")]
    NotOpen,

    /// A negotiation or framing byte was passed where a standalone command is required
    #[error("{0} is not a standalone command")]
    InvalidCommand(crate::TelnetCommand),

    /// Transport failure
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

impl TelnetError {
    /// Check if the error is the permanent "not open" condition
    pub fn is_not_open(&self) -> bool {
        matches!(
            self,
            TelnetError::NotOpen | TelnetError::Channel(ChannelError::NotOpen)
        )
    }
}

impl From<TelnetError> for ChannelError {
    fn from(error: TelnetError) -> Self {
        match error {
            TelnetError::NotOpen => ChannelError::NotOpen,
            TelnetError::InvalidCommand(command) => ChannelError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{command} is not a standalone command"),
            )),
            TelnetError::Channel(error) => error,
        }
    }
}
