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


//! Integration tests for TelnetChannel over in-memory transports

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telecli_channel::{Channel, ChannelError, ChannelResult, DuplexChannel, StreamChannel};
use telecli_telnet::{
    QState, TelnetChannel, TelnetCommand, TelnetConfig, TelnetEvent, TelnetOption, TelnetSide,
};
use tokio::io::duplex;

// ============================================================================
// Helper Functions
// ============================================================================

fn telnet_pair() -> (TelnetChannel<DuplexChannel>, DuplexChannel) {
    let (near, far) = duplex(4096);
    (
        TelnetChannel::new(StreamChannel::duplex(near)),
        StreamChannel::duplex(far),
    )
}

/// Channel that records every write it forwards to the wrapped channel
struct RecordingChannel {
    inner: DuplexChannel,
    writes: Mutex<Vec<Vec<u8>>>,
}

impl RecordingChannel {
    fn new(inner: DuplexChannel) -> Self {
        Self {
            inner,
            writes: Mutex::new(Vec::new()),
        }
    }

    fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn read(&self, buf: &mut [u8]) -> ChannelResult<usize> {
        self.inner.read(buf).await
    }

    async fn write(&self, buf: &[u8]) -> ChannelResult<usize> {
        self.writes.lock().unwrap().push(buf.to_vec());
        self.inner.write(buf).await
    }

    async fn close(&self) -> ChannelResult<()> {
        self.inner.close().await
    }

    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.inner.read_timeout()
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) {
        self.inner.set_read_timeout(timeout);
    }
}

async fn read_exact(channel: &impl Channel, len: usize) -> Vec<u8> {
    let mut collected = Vec::new();
    let mut buf = [0u8; 256];
    while collected.len() < len {
        let count = tokio::time::timeout(Duration::from_secs(2), channel.read(&mut buf))
            .await
            .expect("timed out waiting for data")
            .unwrap();
        collected.extend_from_slice(&buf[..count]);
    }
    collected
}

// ============================================================================
// Data path
// ============================================================================

#[tokio::test]
async fn test_read_strips_protocol() {
    let (telnet, peer) = telnet_pair();
    peer.write(&[b'h', 255, 241, b'i', 255, 255, b'\r', 0])
        .await
        .unwrap();
    let data = read_exact(&telnet, 4).await;
    assert_eq!(data, vec![b'h', b'i', 255, b'\r']);
}

#[tokio::test]
async fn test_read_respects_buffer_size() {
    let (telnet, peer) = telnet_pair();
    peer.write(b"abcdef").await.unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(telnet.read(&mut buf).await.unwrap(), 4);
    assert_eq!(&buf, b"abcd");
    assert_eq!(telnet.read(&mut buf).await.unwrap(), 2);
    assert_eq!(&buf[..2], b"ef");
}

#[tokio::test]
async fn test_single_byte_reads_served_from_decoded_input() {
    let (telnet, peer) = telnet_pair();
    peer.write(b"abc").await.unwrap();
    let mut byte = [0u8; 1];
    assert_eq!(telnet.read(&mut byte).await.unwrap(), 1);
    assert_eq!(byte[0], b'a');

    // Remaining bytes come from decoded input without touching the transport
    drop(peer);
    assert_eq!(telnet.read(&mut byte).await.unwrap(), 1);
    assert_eq!(byte[0], b'b');
    assert_eq!(telnet.read(&mut byte).await.unwrap(), 1);
    assert_eq!(byte[0], b'c');
    assert!(matches!(telnet.read(&mut byte).await, Err(ChannelError::Closed)));
}

#[tokio::test]
async fn test_write_escapes() {
    let (telnet, peer) = telnet_pair();
    assert_eq!(telnet.write(&[b'x', 255, b'\r', b'y']).await.unwrap(), 4);
    let data = read_exact(&peer, 6).await;
    assert_eq!(data, vec![b'x', 255, 255, b'\r', 0, b'y']);
}

// ============================================================================
// Negotiation
// ============================================================================

#[tokio::test]
async fn test_do_binary_answered_with_will() {
    let (telnet, peer) = telnet_pair();
    peer.write(&[255, 253, 0, b'k']).await.unwrap();

    let data = read_exact(&telnet, 1).await;
    assert_eq!(data, b"k");
    assert_eq!(read_exact(&peer, 3).await, vec![255, 251, 0]);
    assert!(telnet.is_enabled_local(TelnetOption::TransmitBinary));
}

#[tokio::test]
async fn test_do_binary_refused_when_not_supported() {
    let (telnet, peer) = telnet_pair();
    telnet.set_we_can(TelnetOption::TransmitBinary, false);
    peer.write(&[255, 253, 0, b'k']).await.unwrap();

    read_exact(&telnet, 1).await;
    assert_eq!(read_exact(&peer, 3).await, vec![255, 252, 0]);
    assert!(!telnet.is_enabled_local(TelnetOption::TransmitBinary));
}

#[tokio::test]
async fn test_repeated_request_is_noop() {
    let (telnet, peer) = telnet_pair();
    assert!(telnet.send_will(TelnetOption::SuppressGoAhead).await.unwrap());
    assert!(!telnet.send_will(TelnetOption::SuppressGoAhead).await.unwrap());
    assert_eq!(read_exact(&peer, 3).await, vec![255, 251, 3]);

    peer.write(&[255, 253, 3, b'.']).await.unwrap();
    read_exact(&telnet, 1).await;
    assert!(telnet.is_enabled_local(TelnetOption::SuppressGoAhead));
    assert!(!telnet.send_will(TelnetOption::SuppressGoAhead).await.unwrap());
}

#[tokio::test]
async fn test_local_echo_control() {
    let (telnet, peer) = telnet_pair();
    telnet.set_local_echo(false).await.unwrap();
    assert_eq!(read_exact(&peer, 3).await, vec![255, 251, 1]);

    // Peer agrees, then we hand echo back
    peer.write(&[255, 253, 1, b'.']).await.unwrap();
    read_exact(&telnet, 1).await;
    assert!(telnet.is_enabled_local(TelnetOption::Echo));
    telnet.set_local_echo(true).await.unwrap();
    assert_eq!(read_exact(&peer, 3).await, vec![255, 252, 1]);
}

#[tokio::test]
async fn test_events_delivered() {
    let (telnet, peer) = telnet_pair();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    telnet.set_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    peer.write(&[
        255, 251, 1, // WILL ECHO
        255, 250, 31, 0, 100, 0, 30, 255, 240, // NAWS 100x30
        b'!',
    ])
    .await
    .unwrap();
    read_exact(&telnet, 1).await;

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            TelnetEvent::OptionStatus(TelnetOption::Echo, TelnetSide::Remote, true),
            TelnetEvent::WindowSize {
                columns: 100,
                rows: 30
            },
        ]
    );
    assert_eq!(telnet.remote_window_size(), Some((100, 30)));
}

#[tokio::test]
async fn test_terminal_type_exchange() {
    let (near, far) = duplex(4096);
    let telnet = TelnetChannel::with_config(
        StreamChannel::duplex(near),
        TelnetConfig::default().with_terminal_type("XTERM"),
    );
    let peer = StreamChannel::duplex(far);

    // Peer asks for our terminal type: DO TTYPE then SB TTYPE SEND
    peer.write(&[255, 253, 24, 255, 250, 24, 1, 255, 240, b'.'])
        .await
        .unwrap();
    read_exact(&telnet, 1).await;

    let mut expected = vec![255, 251, 24, 255, 250, 24, 0];
    expected.extend_from_slice(b"XTERM");
    expected.extend_from_slice(&[255, 240, 255, 250, 24, 0]);
    expected.extend_from_slice(b"XTERM");
    expected.extend_from_slice(&[255, 240]);
    assert_eq!(read_exact(&peer, expected.len()).await, expected);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_send_command_with_synch() {
    let (telnet, peer) = telnet_pair();
    // Stale input waiting to be discarded
    peer.write(b"stale").await.unwrap();
    tokio::task::yield_now().await;

    telnet
        .send_command(TelnetCommand::InterruptProcess, true)
        .await
        .unwrap();
    assert_eq!(
        read_exact(&peer, 7).await,
        vec![255, 244, 255, 253, 6, 255, 242]
    );

    peer.write(b"fresh").await.unwrap();
    assert_eq!(read_exact(&telnet, 5).await, b"fresh");
    assert_eq!(telnet.read_timeout(), None);
}

#[tokio::test]
async fn test_synch_sent_as_single_write() {
    let (near, far) = duplex(4096);
    let telnet = TelnetChannel::new(RecordingChannel::new(StreamChannel::duplex(near)));
    let peer = StreamChannel::duplex(far);

    telnet
        .send_command(TelnetCommand::InterruptProcess, true)
        .await
        .unwrap();
    assert_eq!(
        telnet.inner().writes(),
        vec![vec![255, 244, 255, 253, 6], vec![255, 242]]
    );
    assert_eq!(
        read_exact(&peer, 7).await,
        vec![255, 244, 255, 253, 6, 255, 242]
    );
}

#[tokio::test]
async fn test_abort_output_skips_data_mark() {
    let (telnet, peer) = telnet_pair();
    telnet
        .send_command(TelnetCommand::AbortOutput, true)
        .await
        .unwrap();
    telnet
        .send_command(TelnetCommand::NoOperation, true)
        .await
        .unwrap();
    assert_eq!(read_exact(&peer, 7).await, vec![255, 245, 255, 253, 6, 255, 241]);
}

#[tokio::test]
async fn test_negotiation_command_rejected() {
    let (telnet, _peer) = telnet_pair();
    let err = telnet
        .send_command(TelnetCommand::Will, false)
        .await
        .unwrap_err();
    assert!(!err.is_not_open());
}

#[tokio::test]
async fn test_operations_fail_when_closed() {
    let (telnet, _peer) = telnet_pair();
    telnet.close().await.unwrap();
    assert!(!telnet.is_open());

    assert!(telnet
        .send_do(TelnetOption::Echo)
        .await
        .unwrap_err()
        .is_not_open());
    assert!(telnet
        .send_command(TelnetCommand::AreYouThere, false)
        .await
        .unwrap_err()
        .is_not_open());
    // No state was touched
    assert_eq!(telnet.option_state(TelnetOption::Echo).theirs, QState::IsNo);
    let mut buf = [0u8; 4];
    assert!(matches!(
        telnet.read(&mut buf).await,
        Err(ChannelError::NotOpen)
    ));
}

#[tokio::test]
async fn test_close_wakes_reader() {
    let (telnet, _peer) = telnet_pair();
    let telnet = Arc::new(telnet);
    let reader = telnet.clone();
    let pending = tokio::spawn(async move {
        let mut buf = [0u8; 4];
        reader.read(&mut buf).await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    telnet.close().await.unwrap();
    let result = tokio::time::timeout(Duration::from_secs(1), pending)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(ChannelError::Closed)));
}
