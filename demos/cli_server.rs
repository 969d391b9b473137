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


//! Telnet CLI Server Example
//!
//! A small router-style command line served over Telnet:
//! - `show version`, `show contexts` and `show history`
//! - `echo <words>` and `wall <message>` (broadcast to every session)
//! - login with `admin` / `telecli` when `--login` is given
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example cli_server -- [--multiplexed] [--raw] [--login] [address]
//! ```
//!
//! Connect with a telnet client:
//! ```bash
//! telnet localhost 2323
//! ```

use async_trait::async_trait;
use std::fmt::Write;
use std::sync::{Arc, Weak};
use telecli_channel::Channel;
use telecli_cli::{
    Arguments, Cli, CliConfig, CliResult, CliServer, CommandHandler, ServeMode, ServerConfig,
    handler_fn,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut mode = ServeMode::TaskPerConnection;
    let mut telnet = true;
    let mut login = false;
    let mut address = "127.0.0.1:2323".to_string();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--multiplexed" => mode = ServeMode::Multiplexed,
            "--raw" => telnet = false,
            "--login" => login = true,
            other => address = other.to_string(),
        }
    }

    let mut config = CliConfig::default().with_prompt("telecli> ");
    if login {
        config = config.with_login("admin", "telecli");
    }
    let cli = Arc::new(Cli::new(config));
    register_commands(&cli);

    let server_config = ServerConfig::new(address.parse()?)
        .with_mode(mode)
        .with_telnet(telnet);
    let server = CliServer::bind(Arc::clone(&cli), server_config).await?;
    server.start().await?;

    println!("Listening on {} ({:?})", server.bind_address(), mode);
    println!("Connect with: telnet {}", server.bind_address());
    println!("Press Ctrl+C to stop the server\n");

    tokio::signal::ctrl_c().await?;
    cli.broadcast("Server shutting down").await;
    server.shutdown().await?;
    println!("Server stopped");
    Ok(())
}

fn register_commands(cli: &Arc<Cli>) {
    cli.set_command(
        "show version",
        handler_fn(|args| {
            writeln!(args, "telecli {}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }),
        "Show the server version",
        "",
    );
    cli.set_command(
        "show history",
        handler_fn(|args| {
            for (index, line) in args.context().history().iter().enumerate() {
                writeln!(args, "{:>3} {line}", index + 1)?;
            }
            Ok(())
        }),
        "Show the commands entered in this session",
        "",
    );
    cli.set_command(
        "echo\nsay",
        handler_fn(|args| {
            if args.is_empty() {
                args.write_usage();
                return Ok(());
            }
            let words: Vec<&str> = args.iter().collect();
            writeln!(args, "{}", words.join(" "))?;
            Ok(())
        }),
        "Repeat the arguments",
        "<words>...",
    );
    cli.set_command(
        "show contexts",
        ShowContexts {
            cli: Arc::downgrade(cli),
        },
        "List connected sessions",
        "",
    );
    cli.set_command(
        "wall",
        Wall {
            cli: Arc::downgrade(cli),
        },
        "Send a message to every session",
        "<message>",
    );
}

/// Lists every tracked context
struct ShowContexts {
    cli: Weak<Cli>,
}

#[async_trait]
impl CommandHandler for ShowContexts {
    async fn handle(&self, args: &mut Arguments<'_>) -> CliResult<()> {
        let Some(cli) = self.cli.upgrade() else {
            return Ok(());
        };
        let current = args.context().id();
        for id in cli.context_ids() {
            let Some(context) = cli.context(id) else {
                continue;
            };
            let marker = if id == current { "*" } else { " " };
            let peer = context
                .channel()
                .peer_addr()
                .map_or_else(|| "-".to_string(), |addr| addr.to_string());
            let state = context.state().to_string();
            writeln!(args, "{marker} {:<8} {state:<20} {peer}", id.to_string())?;
        }
        Ok(())
    }
}

/// Broadcasts a message to every context
struct Wall {
    cli: Weak<Cli>,
}

#[async_trait]
impl CommandHandler for Wall {
    async fn handle(&self, args: &mut Arguments<'_>) -> CliResult<()> {
        if args.is_empty() {
            args.write_usage();
            return Ok(());
        }
        let Some(cli) = self.cli.upgrade() else {
            return Ok(());
        };
        let message = format!(
            "Message from {}: {}",
            args.context().id(),
            args.iter().collect::<Vec<_>>().join(" ")
        );
        let result = cli.broadcast(&message).await;
        if !result.all_succeeded() {
            args.write_error(&format!("{} sessions unreachable", result.failed));
        }
        Ok(())
    }
}
