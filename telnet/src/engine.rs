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
use crate::{
    Negotiation, OptionTable, TelnetCommand, TelnetConfig, TelnetEvent, TelnetOption, TelnetSide,
};
use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace, warn};

/// Callback receiving protocol events as they are decoded
pub type EventHandler = Box<dyn FnMut(&TelnetEvent) + Send>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DecoderState {
    Normal,
    CarriageReturn,
    InterpretAsCommand,
    Do,
    Dont,
    Will,
    Wont,
    Subnegotiation,
    EndNegotiation,
}

/// Telnet protocol state machine without I/O.
///
/// [`TelnetEngine::decode`] turns raw transport bytes into clean data and
/// [`TelnetEngine::encode`] escapes clean data for the transport. Every reply
/// the protocol requires (negotiation answers, subnegotiation values, the
/// Are You There acknowledgement) is appended to an outbound queue that the
/// owner drains with [`TelnetEngine::take_outbound`] and writes verbatim.
pub struct TelnetEngine {
    config: TelnetConfig,
    options: OptionTable,
    state: DecoderState,
    /// Option code at index 0, payload after it
    subnegotiation: BytesMut,
    subnegotiation_truncated: bool,
    synchronizing: u32,
    outbound: BytesMut,
    handler: Option<EventHandler>,
    remote_terminal_type: Option<String>,
    remote_terminal_speed: Option<String>,
    remote_window_size: Option<(u16, u16)>,
}

impl Default for TelnetEngine {
    fn default() -> Self {
        TelnetEngine::new(TelnetConfig::default())
    }
}

impl TelnetEngine {
    /// Create an engine with the default option policy
    pub fn new(config: TelnetConfig) -> Self {
        Self::with_options(config, OptionTable::default())
    }

    /// Create an engine with an explicit option policy
    pub fn with_options(config: TelnetConfig, options: OptionTable) -> Self {
        TelnetEngine {
            config,
            options,
            state: DecoderState::Normal,
            subnegotiation: BytesMut::new(),
            subnegotiation_truncated: false,
            synchronizing: 0,
            outbound: BytesMut::new(),
            handler: None,
            remote_terminal_type: None,
            remote_terminal_speed: None,
            remote_window_size: None,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &TelnetConfig {
        &self.config
    }

    /// Option policy and negotiation state
    pub fn options(&self) -> &OptionTable {
        &self.options
    }

    /// Mutable option policy
    pub fn options_mut(&mut self) -> &mut OptionTable {
        &mut self.options
    }

    /// Install the event callback. It runs while the engine is borrowed and
    /// must not call back into the engine.
    pub fn set_event_handler(&mut self, handler: EventHandler) {
        self.handler = Some(handler);
    }

    /// Whether the decoder sits between commands
    pub fn is_idle(&self) -> bool {
        self.state == DecoderState::Normal
    }

    /// Outstanding urgent notifications not yet matched by a Data Mark
    pub fn synchronizing(&self) -> u32 {
        self.synchronizing
    }

    /// Terminal type reported by the peer
    pub fn remote_terminal_type(&self) -> Option<&str> {
        self.remote_terminal_type.as_deref()
    }

    /// Terminal speed reported by the peer
    pub fn remote_terminal_speed(&self) -> Option<&str> {
        self.remote_terminal_speed.as_deref()
    }

    /// Window size reported by the peer as `(columns, rows)`
    pub fn remote_window_size(&self) -> Option<(u16, u16)> {
        self.remote_window_size
    }

    /// Change the terminal type we report
    pub fn set_terminal_type(&mut self, terminal_type: impl Into<String>) {
        self.config.terminal_type = terminal_type.into();
    }

    /// Change the terminal speed we report
    pub fn set_terminal_speed(&mut self, speed: u32) {
        self.config.terminal_speed = speed;
    }

    /// Change the window size we report, announcing it when NAWS is active
    pub fn set_window_size(&mut self, columns: u16, rows: u16) {
        self.config.window_columns = columns;
        self.config.window_rows = rows;
        if self.options.is_enabled_local(TelnetOption::WindowSize) {
            self.send_window_size();
        }
    }

    /// Whether protocol replies are waiting to be written
    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Take every queued protocol reply
    pub fn take_outbound(&mut self) -> Option<Bytes> {
        if self.outbound.is_empty() {
            None
        } else {
            Some(self.outbound.split().freeze())
        }
    }

    // Decoding ////////////////////////////////////////////////////////////////

    /// Decode raw transport bytes, appending the clean data to `out`.
    pub fn decode(&mut self, raw: &[u8], out: &mut BytesMut) {
        trace!(count = raw.len(), "Decoding raw bytes");
        out.reserve(raw.len());
        for &byte in raw {
            self.decode_byte(byte, out);
        }
    }

    fn decode_byte(&mut self, byte: u8, out: &mut BytesMut) {
        match (self.state, byte) {
            (DecoderState::Normal, consts::IAC) => {
                self.state = DecoderState::InterpretAsCommand;
            }
            (DecoderState::Normal, consts::CR) if !self.binary_input() => {
                self.state = DecoderState::CarriageReturn;
                self.deliver(byte, out);
            }
            (DecoderState::Normal, _) => {
                self.deliver(byte, out);
            }
            (DecoderState::CarriageReturn, consts::NUL) => {
                self.state = DecoderState::Normal;
            }
            (DecoderState::CarriageReturn, _) => {
                self.state = DecoderState::Normal;
                self.decode_byte(byte, out);
            }
            (DecoderState::InterpretAsCommand, consts::IAC) => {
                self.state = DecoderState::Normal;
                self.deliver(consts::IAC, out);
            }
            (DecoderState::InterpretAsCommand, consts::DO) => {
                self.state = DecoderState::Do;
            }
            (DecoderState::InterpretAsCommand, consts::DONT) => {
                self.state = DecoderState::Dont;
            }
            (DecoderState::InterpretAsCommand, consts::WILL) => {
                self.state = DecoderState::Will;
            }
            (DecoderState::InterpretAsCommand, consts::WONT) => {
                self.state = DecoderState::Wont;
            }
            (DecoderState::InterpretAsCommand, consts::SB) => {
                self.state = DecoderState::Subnegotiation;
                self.subnegotiation.clear();
                self.subnegotiation_truncated = false;
            }
            (DecoderState::InterpretAsCommand, _) => {
                self.state = DecoderState::Normal;
                self.on_command(byte);
            }
            (DecoderState::Do, _) => {
                self.state = DecoderState::Normal;
                self.on_do(TelnetOption::from_u8(byte));
            }
            (DecoderState::Dont, _) => {
                self.state = DecoderState::Normal;
                self.on_dont(TelnetOption::from_u8(byte));
            }
            (DecoderState::Will, _) => {
                self.state = DecoderState::Normal;
                self.on_will(TelnetOption::from_u8(byte));
            }
            (DecoderState::Wont, _) => {
                self.state = DecoderState::Normal;
                self.on_wont(TelnetOption::from_u8(byte));
            }
            (DecoderState::Subnegotiation, consts::IAC) => {
                self.state = DecoderState::EndNegotiation;
            }
            (DecoderState::Subnegotiation, _) => {
                self.push_subnegotiation(byte);
            }
            (DecoderState::EndNegotiation, consts::IAC) => {
                self.state = DecoderState::Subnegotiation;
                self.push_subnegotiation(consts::IAC);
            }
            (DecoderState::EndNegotiation, consts::SE) => {
                self.state = DecoderState::Normal;
                self.dispatch_subnegotiation();
            }
            (DecoderState::EndNegotiation, _) => {
                // Missing SE: keep what arrived and read the byte as a command
                warn!(
                    "Unterminated subnegotiation, treating {:#04X} as a new command",
                    byte
                );
                self.dispatch_subnegotiation();
                self.state = DecoderState::InterpretAsCommand;
                self.decode_byte(byte, out);
            }
        }
    }

    fn deliver(&self, byte: u8, out: &mut BytesMut) {
        if self.synchronizing > 0 {
            trace!("Discarding {:#04X} while synchronizing", byte);
        } else {
            out.put_u8(byte);
        }
    }

    fn binary_input(&self) -> bool {
        self.options.is_enabled_remote(TelnetOption::TransmitBinary)
    }

    fn binary_output(&self) -> bool {
        self.options.is_enabled_local(TelnetOption::TransmitBinary)
    }

    fn on_command(&mut self, byte: u8) {
        let command = TelnetCommand::from_u8(byte);
        match command {
            TelnetCommand::DataMark => {
                self.synchronizing = self.synchronizing.saturating_sub(1);
                debug!(synchronizing = self.synchronizing, "Received Data Mark");
            }
            TelnetCommand::AreYouThere if self.config.answer_are_you_there => {
                debug!("Answering Are You There");
                let binary = self.binary_output();
                encode_into(binary, b"[Yes]\r\n", &mut self.outbound);
            }
            TelnetCommand::SubnegotiationEnd | TelnetCommand::Unknown(_) => {
                warn!("Received Unknown Command {:#X}", byte);
                return;
            }
            _ => trace!(%command, "Received command"),
        }
        self.emit(&TelnetEvent::Command(command));
    }

    /// An urgent (out-of-band) notification arrived. Data is discarded until
    /// the matching Data Mark is decoded.
    pub fn on_urgent(&mut self) {
        self.synchronizing = self.synchronizing.saturating_add(1);
        debug!(synchronizing = self.synchronizing, "Urgent data notification");
    }

    // Negotiation /////////////////////////////////////////////////////////////

    /// Ask the peer to enable `option`. Returns false when the request is
    /// redundant.
    pub fn send_do(&mut self, option: TelnetOption) -> bool {
        let outcome = self.options.request_do(option);
        self.log_negotiation("Requesting DO", option, outcome);
        self.apply(TelnetSide::Remote, option, outcome)
    }

    /// Ask the peer to disable `option`
    pub fn send_dont(&mut self, option: TelnetOption) -> bool {
        let outcome = self.options.request_dont(option);
        self.log_negotiation("Requesting DONT", option, outcome);
        self.apply(TelnetSide::Remote, option, outcome)
    }

    /// Offer to enable `option` on our side
    pub fn send_will(&mut self, option: TelnetOption) -> bool {
        let outcome = self.options.request_will(option);
        self.log_negotiation("Requesting WILL", option, outcome);
        self.apply(TelnetSide::Local, option, outcome)
    }

    /// Refuse or stop `option` on our side
    pub fn send_wont(&mut self, option: TelnetOption) -> bool {
        let outcome = self.options.request_wont(option);
        self.log_negotiation("Requesting WONT", option, outcome);
        self.apply(TelnetSide::Local, option, outcome)
    }

    /// The peer sent `DO option`
    pub fn on_do(&mut self, option: TelnetOption) {
        if option == TelnetOption::TimingMark {
            // Timing marks are answered every time and never stay enabled
            let reply = if self.options.we_can(option) {
                consts::WILL
            } else {
                consts::WONT
            };
            self.queue_negotiation(reply, option);
            return;
        }
        let before = self.options.is_enabled_local(option);
        let outcome = self.options.receive_do(option);
        self.log_negotiation("Received DO", option, outcome);
        self.apply(TelnetSide::Local, option, outcome);
        self.settle(TelnetSide::Local, option, before);
    }

    /// The peer sent `DONT option`
    pub fn on_dont(&mut self, option: TelnetOption) {
        let before = self.options.is_enabled_local(option);
        let outcome = self.options.receive_dont(option);
        self.log_negotiation("Received DONT", option, outcome);
        self.apply(TelnetSide::Local, option, outcome);
        self.settle(TelnetSide::Local, option, before);
    }

    /// The peer sent `WILL option`
    pub fn on_will(&mut self, option: TelnetOption) {
        if option == TelnetOption::TimingMark {
            self.options
                .reset(option, TelnetSide::Remote, crate::QState::IsNo);
            debug!("Timing mark acknowledged");
            return;
        }
        let before = self.options.is_enabled_remote(option);
        let outcome = self.options.receive_will(option);
        self.log_negotiation("Received WILL", option, outcome);
        self.apply(TelnetSide::Remote, option, outcome);
        self.settle(TelnetSide::Remote, option, before);
    }

    /// The peer sent `WONT option`
    pub fn on_wont(&mut self, option: TelnetOption) {
        if option == TelnetOption::TimingMark {
            self.options
                .reset(option, TelnetSide::Remote, crate::QState::IsNo);
            debug!("Timing mark refused");
            return;
        }
        let before = self.options.is_enabled_remote(option);
        let outcome = self.options.receive_wont(option);
        self.log_negotiation("Received WONT", option, outcome);
        self.apply(TelnetSide::Remote, option, outcome);
        self.settle(TelnetSide::Remote, option, before);
    }

    fn apply(&mut self, side: TelnetSide, option: TelnetOption, outcome: Negotiation) -> bool {
        let command = match (side, outcome) {
            (TelnetSide::Local, Negotiation::SendEnable) => consts::WILL,
            (TelnetSide::Local, Negotiation::SendDisable) => consts::WONT,
            (TelnetSide::Remote, Negotiation::SendEnable) => consts::DO,
            (TelnetSide::Remote, Negotiation::SendDisable) => consts::DONT,
            (_, Negotiation::Updated) => return true,
            (_, Negotiation::Ignored) => return false,
        };
        self.queue_negotiation(command, option);
        true
    }

    fn settle(&mut self, side: TelnetSide, option: TelnetOption, before: bool) {
        let after = match side {
            TelnetSide::Local => self.options.is_enabled_local(option),
            TelnetSide::Remote => self.options.is_enabled_remote(option),
        };
        if before == after {
            return;
        }
        debug!(%option, ?side, enabled = after, "Option negotiated");
        self.emit(&TelnetEvent::OptionStatus(option, side, after));
        if !after {
            return;
        }
        match (side, option) {
            (TelnetSide::Local, TelnetOption::TerminalType) => {
                let value = self.config.terminal_type.clone();
                self.send_value(option, value.as_bytes());
            }
            (TelnetSide::Local, TelnetOption::TerminalSpeed) => {
                let value = self.config.terminal_speed_value();
                self.send_value(option, value.as_bytes());
            }
            (TelnetSide::Local, TelnetOption::WindowSize) => self.send_window_size(),
            (TelnetSide::Remote, TelnetOption::TerminalType | TelnetOption::TerminalSpeed) => {
                self.send_sub_option(option, &[consts::SUB_OPTION_SEND]);
            }
            _ => {}
        }
    }

    fn queue_negotiation(&mut self, command: u8, option: TelnetOption) {
        self.outbound
            .extend_from_slice(&[consts::IAC, command, option.to_u8()]);
    }

    fn log_negotiation(&self, action: &str, option: TelnetOption, outcome: Negotiation) {
        if self.config.log_negotiation {
            debug!(%option, ?outcome, "{}", action);
        } else {
            trace!(%option, ?outcome, "{}", action);
        }
    }

    // Commands and subnegotiation /////////////////////////////////////////////

    /// Queue `IAC command`
    pub fn send_command(&mut self, command: TelnetCommand) {
        trace!(%command, "Sending command");
        self.outbound.extend_from_slice(&[consts::IAC, command.to_u8()]);
    }

    /// Queue `IAC DO TIMING-MARK` regardless of negotiation state
    pub fn send_timing_mark(&mut self) {
        self.options.reset(
            TelnetOption::TimingMark,
            TelnetSide::Remote,
            crate::QState::WantYes,
        );
        self.queue_negotiation(consts::DO, TelnetOption::TimingMark);
    }

    /// Queue `IAC SB option data IAC SE`, escaping IAC within `data`
    pub fn send_sub_option(&mut self, option: TelnetOption, data: &[u8]) {
        trace!(%option, len = data.len(), "Sending subnegotiation");
        self.outbound.reserve(data.len() + 5);
        self.outbound
            .extend_from_slice(&[consts::IAC, consts::SB, option.to_u8()]);
        for &byte in data {
            if byte == consts::IAC {
                self.outbound.put_u8(consts::IAC);
            }
            self.outbound.put_u8(byte);
        }
        self.outbound.extend_from_slice(&[consts::IAC, consts::SE]);
    }

    fn send_value(&mut self, option: TelnetOption, value: &[u8]) {
        let mut data = Vec::with_capacity(value.len() + 1);
        data.push(consts::SUB_OPTION_IS);
        data.extend_from_slice(value);
        self.send_sub_option(option, &data);
    }

    fn send_window_size(&mut self) {
        let mut data = [0u8; 4];
        BigEndian::write_u16(&mut data[0..2], self.config.window_columns);
        BigEndian::write_u16(&mut data[2..4], self.config.window_rows);
        self.send_sub_option(TelnetOption::WindowSize, &data);
    }

    fn push_subnegotiation(&mut self, byte: u8) {
        // One extra slot for the option code
        if self.subnegotiation.len() > self.config.subnegotiation_limit {
            if !self.subnegotiation_truncated {
                warn!(
                    limit = self.config.subnegotiation_limit,
                    "Subnegotiation too long, truncating"
                );
                self.subnegotiation_truncated = true;
            }
            return;
        }
        self.subnegotiation.put_u8(byte);
    }

    fn dispatch_subnegotiation(&mut self) {
        if self.subnegotiation.is_empty() {
            warn!("Received empty subnegotiation");
            return;
        }
        let buffer = self.subnegotiation.split().freeze();
        let option = TelnetOption::from_u8(buffer[0]);
        let data = buffer.slice(1..);
        match option {
            TelnetOption::TerminalType | TelnetOption::TerminalSpeed => match data.first() {
                Some(&consts::SUB_OPTION_SEND) => {
                    if !self.options.is_enabled_local(option) {
                        debug!(%option, "Ignoring SEND for an option we do not perform");
                    } else if option == TelnetOption::TerminalType {
                        let value = self.config.terminal_type.clone();
                        self.send_value(option, value.as_bytes());
                    } else {
                        let value = self.config.terminal_speed_value();
                        self.send_value(option, value.as_bytes());
                    }
                }
                Some(&consts::SUB_OPTION_IS) => {
                    let value = String::from_utf8_lossy(&data[1..]).into_owned();
                    debug!(%option, %value, "Peer reported value");
                    let event = if option == TelnetOption::TerminalType {
                        self.remote_terminal_type = Some(value.clone());
                        TelnetEvent::TerminalType(value)
                    } else {
                        self.remote_terminal_speed = Some(value.clone());
                        TelnetEvent::TerminalSpeed(value)
                    };
                    self.emit(&event);
                }
                _ => warn!(%option, len = data.len(), "Malformed subnegotiation"),
            },
            TelnetOption::WindowSize if data.len() >= 4 => {
                let columns = BigEndian::read_u16(&data[0..2]);
                let rows = BigEndian::read_u16(&data[2..4]);
                debug!(columns, rows, "Peer reported window size");
                self.remote_window_size = Some((columns, rows));
                self.emit(&TelnetEvent::WindowSize { columns, rows });
            }
            _ => {
                debug!(%option, len = data.len(), "Unhandled subnegotiation");
                self.emit(&TelnetEvent::Subnegotiation(option, data));
            }
        }
    }

    fn emit(&mut self, event: &TelnetEvent) {
        if let Some(handler) = self.handler.as_mut() {
            handler(event);
        }
    }

    // Encoding ////////////////////////////////////////////////////////////////

    /// Escape clean data for the transport, appending to `out`.
    ///
    /// IAC is doubled. Unless we transmit binary, a CR not followed by LF in
    /// `data` (including a trailing CR) is followed by NUL.
    pub fn encode(&self, data: &[u8], out: &mut BytesMut) {
        encode_into(self.binary_output(), data, out);
    }
}

fn encode_into(binary: bool, data: &[u8], out: &mut BytesMut) {
    out.reserve(data.len() + data.len() / 8 + 1);
    let mut start = 0;
    for (index, &byte) in data.iter().enumerate() {
        let escape = match byte {
            consts::IAC => Some(consts::IAC),
            consts::CR if !binary && data.get(index + 1) != Some(&consts::LF) => Some(consts::NUL),
            _ => None,
        };
        if let Some(extra) = escape {
            out.extend_from_slice(&data[start..=index]);
            out.put_u8(extra);
            start = index + 1;
        }
    }
    out.extend_from_slice(&data[start..]);
}

impl std::fmt::Debug for TelnetEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelnetEngine")
            .field("state", &self.state)
            .field("synchronizing", &self.synchronizing)
            .field("outbound", &self.outbound.len())
            .field("remote_terminal_type", &self.remote_terminal_type)
            .field("remote_window_size", &self.remote_window_size)
            .finish_non_exhaustive()
    }
}
