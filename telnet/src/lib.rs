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


//! # Telecli Telnet Protocol Engine
//!
//! A Telnet ([RFC854](https://tools.ietf.org/html/rfc854)) implementation
//! that sits between a raw byte [`Channel`](telecli_channel::Channel) and the
//! layer above it, so the layer above sees only clean data.
//!
//! ## Overview
//!
//! - **Data**: IAC escaping and, outside binary mode, CR NUL handling
//! - **Commands**: NOP, GA, AYT, Data Mark and the rest, reported as events
//! - **Option negotiation**: DO, DONT, WILL, WONT following the
//!   [RFC1143](https://tools.ietf.org/html/rfc1143) Q Method, so negotiation
//!   never loops
//! - **Subnegotiation**: terminal type, terminal speed and window size are
//!   interpreted; everything else is reported raw
//! - **Synch**: Data Mark and urgent notifications discard stale input
//!
//! ## Core Components
//!
//! ### [`TelnetEngine`]
//!
//! The protocol state machine with no I/O of its own: feed it raw bytes, get
//! clean bytes plus a queue of wire replies.
//!
//! ### [`TelnetChannel`]
//!
//! Wraps any channel with an engine and implements
//! [`Channel`](telecli_channel::Channel) itself.
//!
//! ### [`OptionTable`]
//!
//! Per-option policy (`we_can` / `they_should`) and negotiation state.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use telecli_channel::{Channel, StreamChannel};
//! use telecli_telnet::{TelnetChannel, TelnetOption};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:23").await?;
//! let telnet = TelnetChannel::new(StreamChannel::tcp(stream));
//! telnet.send_will(TelnetOption::SuppressGoAhead).await?;
//! telnet.write(b"login: ").await?;
//! let mut buf = [0u8; 128];
//! let count = telnet.read(&mut buf).await?;
//! println!("{}", String::from_utf8_lossy(&buf[..count]));
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

mod channel;
mod command;
mod config;
pub mod consts;
mod engine;
mod event;
mod options;
mod result;

pub use self::channel::TelnetChannel;
pub use self::command::TelnetCommand;
pub use self::config::TelnetConfig;
pub use self::engine::{EventHandler, TelnetEngine};
pub use self::event::TelnetEvent;
pub use self::options::{
    Negotiation, OptionState, OptionTable, QState, TelnetOption, TelnetSide, option_name,
};
pub use self::result::{TelnetError, TelnetResult};
