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


//! Telnet engine configuration
//!
//! ```
//! use telecli_telnet::TelnetConfig;
//!
//! let config = TelnetConfig::default()
//!     .with_terminal_type("VT100")
//!     .with_window_size(132, 43)
//!     .with_answer_are_you_there(false);
//! assert_eq!(config.terminal_speed, 9600);
//! ```

/// Local values and limits used by the Telnet engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelnetConfig {
    /// Terminal type reported when the peer asks (RFC1091)
    pub terminal_type: String,

    /// Terminal speed in bits per second reported when the peer asks (RFC1079)
    pub terminal_speed: u32,

    /// Window width reported through NAWS
    pub window_columns: u16,

    /// Window height reported through NAWS
    pub window_rows: u16,

    /// Size of each raw read from the transport
    pub read_chunk_size: usize,

    /// Largest subnegotiation payload kept; the rest is dropped
    pub subnegotiation_limit: usize,

    /// Reply `[Yes]` to Are You There
    pub answer_are_you_there: bool,

    /// Log every negotiation at debug level instead of trace
    pub log_negotiation: bool,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            terminal_type: "UNKNOWN".to_string(),
            terminal_speed: 9600,
            window_columns: 80,
            window_rows: 24,
            read_chunk_size: 1024,
            subnegotiation_limit: 4096,
            answer_are_you_there: true,
            log_negotiation: false,
        }
    }
}

impl TelnetConfig {
    /// Set the terminal type
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set the terminal speed
    pub fn with_terminal_speed(mut self, speed: u32) -> Self {
        self.terminal_speed = speed;
        self
    }

    /// Set the window size
    pub fn with_window_size(mut self, columns: u16, rows: u16) -> Self {
        self.window_columns = columns;
        self.window_rows = rows;
        self
    }

    /// Set the raw read chunk size, at least one byte
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the subnegotiation payload limit
    pub fn with_subnegotiation_limit(mut self, limit: usize) -> Self {
        self.subnegotiation_limit = limit;
        self
    }

    /// Enable or disable answering Are You There
    pub fn with_answer_are_you_there(mut self, enabled: bool) -> Self {
        self.answer_are_you_there = enabled;
        self
    }

    /// Enable or disable debug logging of negotiations
    pub fn with_log_negotiation(mut self, enabled: bool) -> Self {
        self.log_negotiation = enabled;
        self
    }

    /// Terminal speed as sent on the wire, `transmit,receive`
    pub fn terminal_speed_value(&self) -> String {
        format!("{0},{0}", self.terminal_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelnetConfig::default();
        assert_eq!(config.terminal_type, "UNKNOWN");
        assert_eq!(config.terminal_speed, 9600);
        assert_eq!((config.window_columns, config.window_rows), (80, 24));
        assert_eq!(config.read_chunk_size, 1024);
        assert_eq!(config.subnegotiation_limit, 4096);
        assert!(config.answer_are_you_there);
        assert_eq!(config.terminal_speed_value(), "9600,9600");
    }

    #[test]
    fn test_builder() {
        let config = TelnetConfig::default()
            .with_terminal_speed(38400)
            .with_read_chunk_size(0)
            .with_log_negotiation(true);
        assert_eq!(config.terminal_speed_value(), "38400,38400");
        assert_eq!(config.read_chunk_size, 1);
        assert!(config.log_negotiation);
    }
}
