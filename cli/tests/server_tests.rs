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


//! TCP listener tests

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;
use telecli_channel::{Channel, TcpChannel};
use telecli_cli::{Cli, CliConfig, CliServer, ServeMode, ServerConfig, handler_fn};
use tokio::net::TcpStream;

// ============================================================================
// Helper Functions
// ============================================================================

fn echo_cli() -> Arc<Cli> {
    let cli = Arc::new(Cli::new(CliConfig::default()));
    cli.set_command(
        "echo",
        handler_fn(|args| {
            let words: Vec<&str> = args.iter().collect();
            writeln!(args, "{}", words.join(" "))?;
            Ok(())
        }),
        "Echo the arguments",
        "<words>",
    );
    cli
}

async fn start_server(mode: ServeMode, telnet: bool) -> CliServer {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_mode(mode)
        .with_telnet(telnet)
        .with_gc_interval(Some(Duration::from_millis(10)));
    let server = CliServer::bind(echo_cli(), config).await.unwrap();
    server.start().await.unwrap();
    server
}

async fn connect(server: &CliServer) -> TcpChannel {
    let stream = TcpStream::connect(server.bind_address()).await.unwrap();
    TcpChannel::tcp(stream)
}

async fn read_until(client: &TcpChannel, needle: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut buf = [0u8; 512];
    tokio::time::timeout(Duration::from_secs(5), async {
        while !output.ends_with(needle) {
            let count = client.read(&mut buf).await.unwrap();
            output.extend_from_slice(&buf[..count]);
        }
    })
    .await
    .expect("timed out waiting for output");
    output
}

async fn wait_for_contexts(server: &CliServer, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.cli().context_count() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("context count never settled");
}

// ============================================================================
// Raw Sessions
// ============================================================================

#[tokio::test]
async fn test_task_per_connection_raw() {
    let server = start_server(ServeMode::TaskPerConnection, false).await;
    let client = connect(&server).await;

    assert_eq!(read_until(&client, b"CLI> ").await, b"CLI> ");
    client.write(b"echo hello world\r\n").await.unwrap();
    assert_eq!(read_until(&client, b"CLI> ").await, b"hello world\r\nCLI> ");

    client.write(b"quit\r\n").await.unwrap();
    wait_for_contexts(&server, 0).await;
    server.shutdown().await.unwrap();
    assert!(!server.is_running());
}

#[tokio::test]
async fn test_finished_sessions_removed_without_collector() {
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_mode(ServeMode::TaskPerConnection)
        .with_telnet(false)
        .with_gc_interval(None);
    let server = CliServer::bind(echo_cli(), config).await.unwrap();
    server.start().await.unwrap();

    let first = connect(&server).await;
    let second = connect(&server).await;
    read_until(&first, b"CLI> ").await;
    read_until(&second, b"CLI> ").await;
    assert_eq!(server.cli().context_count(), 2);

    first.write(b"quit\r\n").await.unwrap();
    wait_for_contexts(&server, 1).await;
    drop(second);
    wait_for_contexts(&server, 0).await;
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_multiplexed_serves_many_clients() {
    let server = start_server(ServeMode::Multiplexed, false).await;
    let first = connect(&server).await;
    let second = connect(&server).await;
    read_until(&first, b"CLI> ").await;
    read_until(&second, b"CLI> ").await;
    assert_eq!(server.cli().context_count(), 2);

    second.write(b"echo two\r\n").await.unwrap();
    first.write(b"echo one\r\n").await.unwrap();
    assert_eq!(read_until(&first, b"CLI> ").await, b"one\r\nCLI> ");
    assert_eq!(read_until(&second, b"CLI> ").await, b"two\r\nCLI> ");

    first.write(b"exit\r\n").await.unwrap();
    wait_for_contexts(&server, 1).await;

    server.shutdown().await.unwrap();
    assert_eq!(server.cli().context_count(), 0);
    let mut buf = [0u8; 16];
    assert!(second.read(&mut buf).await.unwrap_err().is_terminal());
}

// ============================================================================
// Telnet Sessions
// ============================================================================

#[tokio::test]
async fn test_telnet_announces_echo() {
    let server = start_server(ServeMode::TaskPerConnection, true).await;
    let client = connect(&server).await;

    // IAC WILL SUPPRESS-GO-AHEAD, IAC WILL ECHO, then the prompt
    let greeting = read_until(&client, b"CLI> ").await;
    assert_eq!(greeting, b"\xff\xfb\x03\xff\xfb\x01CLI> ");

    client.write(&[255, 253, 3, 255, 253, 1]).await.unwrap();
    client.write(b"echo hi\r\n").await.unwrap();
    assert_eq!(
        read_until(&client, b"CLI> ").await,
        b"echo hi\r\nhi\r\nCLI> "
    );

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_context_limit() {
    let cli = Arc::new(Cli::new(CliConfig::default()));
    let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
        .with_telnet(false)
        .with_max_contexts(1);
    let server = CliServer::bind(cli, config).await.unwrap();
    server.start().await.unwrap();

    let admitted = connect(&server).await;
    read_until(&admitted, b"CLI> ").await;

    let refused = connect(&server).await;
    let mut buf = [0u8; 16];
    assert!(refused.read(&mut buf).await.unwrap_err().is_terminal());
    assert_eq!(server.cli().context_count(), 1);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_start_twice_fails() {
    let server = start_server(ServeMode::TaskPerConnection, false).await;
    assert!(server.start().await.is_err());
    server.shutdown().await.unwrap();
    assert!(server.shutdown().await.is_err());
}
