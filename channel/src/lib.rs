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


//! # Telecli Byte Channels
//!
//! The transport abstraction the Telnet engine and the CLI sit on. A
//! [`Channel`] is a bidirectional, timeout-capable stream of raw bytes whose
//! methods all take `&self`, so one task may block in a read while another
//! writes or closes it.
//!
//! ## Implementations
//!
//! - [`StreamChannel`]: any tokio `AsyncRead` + `AsyncWrite` pair, with
//!   [`TcpChannel`] and [`DuplexChannel`] aliases for sockets and in-memory
//!   pipes.
//! - [`PairChannel`]: reads from one channel and writes to another.
//!
//! ## Example
//!
//! ```rust,no_run
//! use telecli_channel::{Channel, StreamChannel};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:2323").await?;
//! let channel = StreamChannel::tcp(stream).with_read_timeout(Some(Duration::from_secs(30)));
//! channel.write(b"hello\r\n").await?;
//! let mut buf = [0u8; 256];
//! let count = channel.read(&mut buf).await?;
//! println!("{:?}", &buf[..count]);
//! channel.close().await?;
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
mod pair;
mod result;
mod stream;

pub use self::channel::Channel;
pub use self::pair::PairChannel;
pub use self::result::{ChannelError, ChannelResult};
pub use self::stream::{DuplexChannel, StreamChannel, TcpChannel};
