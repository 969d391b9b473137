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


//! End-to-end session tests over in-memory channels

use std::fmt::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use telecli_channel::{Channel, DuplexChannel};
use telecli_cli::{
    Cli, CliConfig, CliHandler, Context, ContextState, DEFAULT_HELP_PREAMBLE, handler_fn,
};
use telecli_telnet::{TelnetChannel, TelnetOption};
use tokio::io::duplex;

// ============================================================================
// Helper Functions
// ============================================================================

/// Start a context on `cli` and return the client end of its channel
fn connect(cli: &Cli) -> (Arc<Context>, DuplexChannel) {
    let (server_end, client_end) = duplex(4096);
    let context = cli.add_context(DuplexChannel::duplex(server_end));
    cli.start_context(context.id()).unwrap();
    (context, DuplexChannel::duplex(client_end))
}

async fn read_until(client: &DuplexChannel, needle: &str) -> String {
    let mut output = Vec::new();
    let mut buf = [0u8; 512];
    tokio::time::timeout(Duration::from_secs(5), async {
        while !String::from_utf8_lossy(&output).ends_with(needle) {
            let count = client.read(&mut buf).await.unwrap();
            output.extend_from_slice(&buf[..count]);
        }
    })
    .await
    .expect("timed out waiting for output");
    String::from_utf8_lossy(&output).into_owned()
}

async fn read_to_end(client: &DuplexChannel) -> Vec<u8> {
    let mut output = Vec::new();
    let mut buf = [0u8; 512];
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Ok(count) = client.read(&mut buf).await {
            output.extend_from_slice(&buf[..count]);
        }
    })
    .await
    .expect("timed out waiting for close");
    output
}

fn counting_cli(config: CliConfig) -> (Cli, Arc<AtomicUsize>) {
    let cli = Cli::new(config);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    cli.set_command(
        "count",
        handler_fn(move |_args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        "Count invocations",
        "",
    );
    (cli, count)
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_help_then_quit() {
    let cli = Cli::new(CliConfig::default());
    cli.set_command("show version", handler_fn(|_args| Ok(())), "Show version", "");
    cli.set_command("show status", handler_fn(|_args| Ok(())), "Show status", "");
    let (context, client) = connect(&cli);

    assert_eq!(read_until(&client, "CLI> ").await, "CLI> ");

    client.write(b"help\r\n").await.unwrap();
    let expected = format!(
        "{}\r\nshow status    Show status\r\nshow version   Show version\r\nCLI> ",
        DEFAULT_HELP_PREAMBLE.replace('\n', "\r\n")
    );
    assert_eq!(read_until(&client, "CLI> ").await, expected);

    client.write(b"quit\r\n").await.unwrap();
    assert!(read_to_end(&client).await.is_empty());

    context.finished().await;
    assert!(!context.is_open());
    assert_eq!(cli.garbage_collect(), 1);
    assert_eq!(cli.context_count(), 0);
}

#[tokio::test]
async fn test_repeat_appends_history_twice() {
    let (cli, count) = counting_cli(CliConfig::default());
    let (context, client) = connect(&cli);
    read_until(&client, "CLI> ").await;

    client.write(b"count\r\n").await.unwrap();
    read_until(&client, "CLI> ").await;
    client.write(b"!!\r\n").await.unwrap();
    read_until(&client, "CLI> ").await;

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(context.history(), ["count", "count"]);
}

#[tokio::test]
async fn test_missing_history_entry() {
    let (cli, count) = counting_cli(CliConfig::default());
    let (context, client) = connect(&cli);
    read_until(&client, "CLI> ").await;

    client.write(b"count\r\n").await.unwrap();
    read_until(&client, "CLI> ").await;
    client.write(b"!3\r\n").await.unwrap();
    assert_eq!(
        read_until(&client, "CLI> ").await,
        "No command history\r\nCLI> "
    );

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(context.history().len(), 1);
}

#[tokio::test]
async fn test_multi_word_dispatch() {
    let cli = Cli::new(CliConfig::default());
    let calls = Arc::new(Mutex::new(Vec::new()));
    for name in ["show version", "show status"] {
        let calls = Arc::clone(&calls);
        cli.set_command(
            name,
            handler_fn(move |args| {
                let params: Vec<String> = args.iter().map(str::to_string).collect();
                calls
                    .lock()
                    .unwrap()
                    .push((args.command().to_string(), params));
                writeln!(args, "ok")?;
                Ok(())
            }),
            "",
            "",
        );
    }
    let (_context, client) = connect(&cli);
    read_until(&client, "CLI> ").await;

    client.write(b"show version extra\r\n").await.unwrap();
    assert_eq!(read_until(&client, "CLI> ").await, "ok\r\nCLI> ");
    client.write(b"show\r\n").await.unwrap();
    assert_eq!(read_until(&client, "CLI> ").await, "Unknown command\r\nCLI> ");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "show version");
    assert_eq!(calls[0].1, ["extra"]);
}

#[tokio::test]
async fn test_handler_can_stop_its_own_context() {
    let cli = Cli::new(CliConfig::default());
    let stopped = Arc::new(AtomicUsize::new(0));
    cli.set_command(
        "logout",
        LogoutCommand {
            stopped: Arc::clone(&stopped),
        },
        "Leave the session",
        "",
    );
    let (context, client) = connect(&cli);
    read_until(&client, "CLI> ").await;

    client.write(b"logout\r\n").await.unwrap();
    assert_eq!(read_to_end(&client).await, b"Bye\r\n");
    context.finished().await;
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

struct LogoutCommand {
    stopped: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl telecli_cli::CommandHandler for LogoutCommand {
    async fn handle(&self, args: &mut telecli_cli::Arguments<'_>) -> telecli_cli::CliResult<()> {
        args.context().write_line("Bye").await?;
        args.context().stop().await;
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Login and Session Hooks
// ============================================================================

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CliHandler for RecordingHandler {
    async fn validate(&self, _context: &Context, username: &str, password: &str) -> bool {
        self.events
            .lock()
            .unwrap()
            .push(format!("validate {username}"));
        username == "ops" && password == "hunter2"
    }

    async fn on_session_start(&self, context: &Context) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}", context.id()));
    }

    async fn on_session_end(&self, context: &Context) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end {}", context.id()));
    }
}

#[tokio::test]
async fn test_custom_validation_and_hooks() {
    let handler = Arc::new(RecordingHandler::default());
    let cli = Cli::with_handler(
        CliConfig::default().with_login("unused", "unused"),
        Arc::clone(&handler),
    );
    let (context, client) = connect(&cli);
    assert_eq!(read_until(&client, "Username: ").await, "Username: ");

    client.write(b"ops\r\nbad\r\n").await.unwrap();
    read_until(&client, "Username: ").await;
    assert_eq!(context.state(), ContextState::Username);

    client.write(b"ops\r\nhunter2\r\n").await.unwrap();
    assert_eq!(read_until(&client, "CLI> ").await, "Password: \r\nCLI> ");
    assert_eq!(context.state(), ContextState::CommandEntry);

    client.write(b"exit\n").await.unwrap();
    read_to_end(&client).await;
    context.finished().await;

    let id = context.id();
    assert_eq!(
        *handler.events.lock().unwrap(),
        [
            format!("start {id}"),
            "validate ops".to_string(),
            "validate ops".to_string(),
            format!("end {id}"),
        ]
    );
}

#[tokio::test]
async fn test_telnet_session_echo_and_password() {
    let (server_end, client_end) = duplex(4096);
    let telnet = Arc::new(TelnetChannel::new(DuplexChannel::duplex(server_end)));
    telnet.send_will(TelnetOption::Echo).await.unwrap();

    let cli = Cli::new(CliConfig::default().with_login("admin", "secret"));
    let context = cli.add_context(Arc::clone(&telnet));
    context.set_require_echo(true);
    cli.start_context(context.id()).unwrap();
    let client = DuplexChannel::duplex(client_end);

    assert_eq!(
        read_until(&client, "Username: ").await,
        "\u{fffd}\u{fffd}\u{1}Username: "
    );

    // Agree to the server echoing, then log in
    client.write(&[255, 253, 1]).await.unwrap();
    client.write(b"admin\r\n").await.unwrap();
    assert_eq!(read_until(&client, "Password: ").await, "admin\r\nPassword: ");
    assert!(telnet.is_enabled_local(TelnetOption::Echo));

    client.write(b"secret\r\n").await.unwrap();
    assert_eq!(read_until(&client, "CLI> ").await, "\r\nCLI> ");

    client.write(b"quit\r\n").await.unwrap();
    assert_eq!(read_to_end(&client).await, b"quit\r\n");
    context.finished().await;
}

// ============================================================================
// Multi-context Management
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_context() {
    let cli = Cli::new(CliConfig::default());
    let (_first, first_client) = connect(&cli);
    let (_second, second_client) = connect(&cli);
    read_until(&first_client, "CLI> ").await;
    read_until(&second_client, "CLI> ").await;

    let result = cli.broadcast("System going down").await;
    assert!(result.all_succeeded());
    assert_eq!(result.total, 2);
    assert_eq!(
        read_until(&first_client, "down\r\n").await,
        "System going down\r\n"
    );
    assert_eq!(
        read_until(&second_client, "down\r\n").await,
        "System going down\r\n"
    );

    cli.stop_all().await;
    assert_eq!(cli.context_count(), 0);
    assert!(read_to_end(&first_client).await.is_empty());
}

#[tokio::test]
async fn test_garbage_collector_reaps_closed_contexts() {
    let cli = Arc::new(Cli::new(CliConfig::default()));
    cli.start_garbage_collector(Duration::from_millis(10));
    let (context, client) = connect(&cli);
    read_until(&client, "CLI> ").await;

    client.close().await.unwrap();
    context.finished().await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while cli.context_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("context was not collected");
    cli.stop_all().await;
}

#[tokio::test]
async fn test_foreground_session() {
    let (cli, count) = counting_cli(CliConfig::default().with_prompt("> "));
    let (server_end, client_end) = duplex(4096);
    let client = DuplexChannel::duplex(client_end);

    let session = async {
        cli.run_foreground(DuplexChannel::duplex(server_end))
            .await
            .unwrap();
    };
    let driver = async {
        read_until(&client, "> ").await;
        client.write(b"count\r\ncount\r\n").await.unwrap();
        read_until(&client, "> > ").await;
        client.write(b"exit\r\n").await.unwrap();
    };
    tokio::join!(session, driver);

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(cli.context_count(), 0);
}

#[tokio::test]
async fn test_pair_context_closes_owned_halves() {
    let cli = Cli::new(CliConfig::default());
    let (input_server, input_client) = duplex(256);
    let (output_server, output_client) = duplex(256);
    let reader: Arc<dyn Channel> = Arc::new(DuplexChannel::duplex(input_server));
    let writer: Arc<dyn Channel> = Arc::new(DuplexChannel::duplex(output_server));
    let context = cli.add_context_pair(Arc::clone(&reader), Arc::clone(&writer), true, false);
    cli.start_context(context.id()).unwrap();

    let input = DuplexChannel::duplex(input_client);
    let output = DuplexChannel::duplex(output_client);
    read_until(&output, "CLI> ").await;
    input.write(b"nothing\r\n").await.unwrap();
    assert_eq!(read_until(&output, "CLI> ").await, "Unknown command\r\nCLI> ");

    input.write(b"quit\r\n").await.unwrap();
    context.finished().await;
    assert!(!reader.is_open());
    assert!(writer.is_open());
}
