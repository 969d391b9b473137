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


use crate::{TelnetCommand, TelnetOption, TelnetSide};
use bytes::Bytes;

///
/// `TelnetEvent` reports protocol activity that never reaches the clean data
/// stream: commands, completed negotiations and subnegotiation values.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelnetEvent {
    /// A standalone command (NOP, GA, AYT, DM, ...)
    Command(TelnetCommand),
    /// A negotiation settled.
    /// Parameters: (option, side, enabled)
    OptionStatus(TelnetOption, TelnetSide, bool),
    /// Subnegotiation for an option the engine does not interpret
    Subnegotiation(TelnetOption, Bytes),
    /// The peer reported its terminal type
    TerminalType(String),
    /// The peer reported its terminal speed as `transmit,receive`
    TerminalSpeed(String),
    /// The peer reported its window size
    WindowSize {
        /// Width in characters
        columns: u16,
        /// Height in characters
        rows: u16,
    },
}
