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

/// A Telnet command, the byte following `IAC`.
///
/// Negotiation (`DO`/`DONT`/`WILL`/`WONT`) and subnegotiation framing (`SB`/`SE`)
/// are listed for completeness; the engine handles those itself.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetCommand {
    /// End of File
    EndOfFile,
    /// Suspend Process
    SuspendProcess,
    /// Abort Process
    AbortProcess,
    /// End of Record
    EndOfRecord,
    /// End of subnegotiation
    SubnegotiationEnd,
    /// No Operation
    NoOperation,
    /// Data Mark
    DataMark,
    /// Break
    Break,
    /// Interrupt Process
    InterruptProcess,
    /// Abort Output
    AbortOutput,
    /// Are You There
    AreYouThere,
    /// Erase Character
    EraseCharacter,
    /// Erase Line
    EraseLine,
    /// Go Ahead
    GoAhead,
    /// Start of subnegotiation
    Subnegotiation,
    /// Offer to perform an option
    Will,
    /// Refuse to perform an option
    Wont,
    /// Ask the peer to perform an option
    Do,
    /// Demand the peer stop performing an option
    Dont,
    /// Escaped literal 255
    InterpretAsCommand,
    /// Any other byte
    Unknown(u8),
}

impl TelnetCommand {
    /// Wire value of this command
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetCommand::EndOfFile => consts::EOF,
            TelnetCommand::SuspendProcess => consts::SUSP,
            TelnetCommand::AbortProcess => consts::ABORT,
            TelnetCommand::EndOfRecord => consts::EOR,
            TelnetCommand::SubnegotiationEnd => consts::SE,
            TelnetCommand::NoOperation => consts::NOP,
            TelnetCommand::DataMark => consts::DM,
            TelnetCommand::Break => consts::BRK,
            TelnetCommand::InterruptProcess => consts::IP,
            TelnetCommand::AbortOutput => consts::AO,
            TelnetCommand::AreYouThere => consts::AYT,
            TelnetCommand::EraseCharacter => consts::EC,
            TelnetCommand::EraseLine => consts::EL,
            TelnetCommand::GoAhead => consts::GA,
            TelnetCommand::Subnegotiation => consts::SB,
            TelnetCommand::Will => consts::WILL,
            TelnetCommand::Wont => consts::WONT,
            TelnetCommand::Do => consts::DO,
            TelnetCommand::Dont => consts::DONT,
            TelnetCommand::InterpretAsCommand => consts::IAC,
            TelnetCommand::Unknown(byte) => byte,
        }
    }

    /// Decode a command byte
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            consts::EOF => TelnetCommand::EndOfFile,
            consts::SUSP => TelnetCommand::SuspendProcess,
            consts::ABORT => TelnetCommand::AbortProcess,
            consts::EOR => TelnetCommand::EndOfRecord,
            consts::SE => TelnetCommand::SubnegotiationEnd,
            consts::NOP => TelnetCommand::NoOperation,
            consts::DM => TelnetCommand::DataMark,
            consts::BRK => TelnetCommand::Break,
            consts::IP => TelnetCommand::InterruptProcess,
            consts::AO => TelnetCommand::AbortOutput,
            consts::AYT => TelnetCommand::AreYouThere,
            consts::EC => TelnetCommand::EraseCharacter,
            consts::EL => TelnetCommand::EraseLine,
            consts::GA => TelnetCommand::GoAhead,
            consts::SB => TelnetCommand::Subnegotiation,
            consts::WILL => TelnetCommand::Will,
            consts::WONT => TelnetCommand::Wont,
            consts::DO => TelnetCommand::Do,
            consts::DONT => TelnetCommand::Dont,
            consts::IAC => TelnetCommand::InterpretAsCommand,
            byte => TelnetCommand::Unknown(byte),
        }
    }

    /// Commands that take part in the Synch procedure when sent with
    /// synchronization requested.
    pub fn is_synchronizing(self) -> bool {
        matches!(
            self,
            TelnetCommand::InterruptProcess
                | TelnetCommand::Break
                | TelnetCommand::AbortProcess
                | TelnetCommand::SuspendProcess
                | TelnetCommand::AbortOutput
        )
    }

    /// Whether this is a standalone command that may be sent on its own
    pub fn is_standalone(self) -> bool {
        !matches!(
            self,
            TelnetCommand::Subnegotiation
                | TelnetCommand::SubnegotiationEnd
                | TelnetCommand::Will
                | TelnetCommand::Wont
                | TelnetCommand::Do
                | TelnetCommand::Dont
                | TelnetCommand::InterpretAsCommand
                | TelnetCommand::Unknown(_)
        )
    }
}

impl std::fmt::Display for TelnetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelnetCommand::EndOfFile => write!(f, "EOF"),
            TelnetCommand::SuspendProcess => write!(f, "SUSP"),
            TelnetCommand::AbortProcess => write!(f, "ABORT"),
            TelnetCommand::EndOfRecord => write!(f, "EOR"),
            TelnetCommand::SubnegotiationEnd => write!(f, "SE"),
            TelnetCommand::NoOperation => write!(f, "NOP"),
            TelnetCommand::DataMark => write!(f, "DM"),
            TelnetCommand::Break => write!(f, "BRK"),
            TelnetCommand::InterruptProcess => write!(f, "IP"),
            TelnetCommand::AbortOutput => write!(f, "AO"),
            TelnetCommand::AreYouThere => write!(f, "AYT"),
            TelnetCommand::EraseCharacter => write!(f, "EC"),
            TelnetCommand::EraseLine => write!(f, "EL"),
            TelnetCommand::GoAhead => write!(f, "GA"),
            TelnetCommand::Subnegotiation => write!(f, "SB"),
            TelnetCommand::Will => write!(f, "WILL"),
            TelnetCommand::Wont => write!(f, "WONT"),
            TelnetCommand::Do => write!(f, "DO"),
            TelnetCommand::Dont => write!(f, "DONT"),
            TelnetCommand::InterpretAsCommand => write!(f, "IAC"),
            TelnetCommand::Unknown(byte) => write!(f, "Command #{byte}"),
        }
    }
}

impl From<u8> for TelnetCommand {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelnetCommand> for u8 {
    fn from(command: TelnetCommand) -> Self {
        command.to_u8()
    }
}
