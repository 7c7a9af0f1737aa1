// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Main entry point for the mist tool and client
use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use mist::config::{parse_timeout, Config};
use mist::mist_core::constants::{cli, limits};
use mist::tool::BuiltinTool;
use mist::transport::codec::EnvelopeCodec;
use mist::transport::StdioServer;
use mist::utils::binary::binary_name;
use mist::{Client, Message, TransportKind};

#[derive(Parser, Debug)]
#[command(name = "mist", version, about = "MIST protocol tool and dispatch client", long_about = None)]
struct Cli {
    /// Serve one request envelope over this transport (e.g. "stdio")
    #[arg(long)]
    transport: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the version of mist, or of a tool
    Version {
        /// Ask this tool for its version instead
        #[arg(long)]
        tool: Option<String>,
    },

    /// Send one envelope to a tool and print the response envelope
    Send {
        #[arg(long)]
        tool: String,

        /// Message type, e.g. "health.ping"
        #[arg(long = "type")]
        message_type: String,

        /// Payload as a JSON object
        #[arg(long)]
        payload: Option<String>,

        #[arg(long)]
        source: Option<String>,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<String>,
    },

    /// Run a tool with raw arguments and print its stdout
    Call {
        #[arg(long)]
        tool: String,

        /// Text written to the tool's stdin
        #[arg(long)]
        stdin: Option<String>,

        /// Tool arguments
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Validate newline-delimited envelopes read from stdin
    Validate,

    /// Print the platform-specific binary file name of a tool
    BinaryName { tool: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    install_panic_hook();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config from env, using defaults: {}",
            e
        );
        Config::default()
    });

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to init tracing: {}", e);
    }

    if let Some(transport) = &cli.transport {
        return serve(transport).await;
    }

    match cli.command {
        Some(Commands::Version { tool: None }) => {
            println!("{} {}", cli::DEFAULT_TOOL, env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Version { tool: Some(tool) }) => {
            let client = Client::with_config(tool, config);
            println!("{}", client.version().await?);
        }
        Some(Commands::Send {
            tool,
            message_type,
            payload,
            source,
            timeout,
        }) => {
            let payload = match payload {
                Some(raw) => parse_payload(&raw)?,
                None => mist::Payload::new(),
            };
            let mut client = Client::with_config(tool, config);
            if let Some(raw) = timeout {
                let secs =
                    parse_timeout(&raw).with_context(|| format!("invalid --timeout '{}'", raw))?;
                client = client.with_timeout(Duration::from_secs_f64(secs));
            }
            let response = client
                .send(&message_type, payload, source.as_deref())
                .await?;
            println!("{}", serde_json::to_string(&response)?);
        }
        Some(Commands::Call { tool, stdin, args }) => {
            let client = Client::with_config(tool, config);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let out = client.call(&args, stdin.as_deref()).await?;
            print!("{}", out);
        }
        Some(Commands::Validate) => validate().await?,
        Some(Commands::BinaryName { tool }) => {
            println!("{}", binary_name(&tool));
        }
        None => bail!("no command given (see --help)"),
    }

    Ok(())
}

/// Tool mode: answer exactly one envelope.
async fn serve(transport: &str) -> anyhow::Result<()> {
    match transport.parse::<TransportKind>()? {
        TransportKind::Stdio => {
            info!("Serving one request over stdio");
            let tool = BuiltinTool::new(cli::DEFAULT_TOOL, env!("CARGO_PKG_VERSION"));
            let response = StdioServer::new()
                .serve_one(&tool)
                .await
                .context("stdio request failed")?;
            debug!("Answered with '{}'", response.message_type);
            Ok(())
        }
        other => Err(anyhow!("transport '{}' cannot serve requests", other)),
    }
}

fn parse_payload(raw: &str) -> anyhow::Result<mist::Payload> {
    match serde_json::from_str::<Value>(raw).context("--payload is not valid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("--payload must be a JSON object"),
    }
}

async fn validate() -> anyhow::Result<()> {
    let mut lines = FramedRead::new(
        tokio::io::stdin(),
        EnvelopeCodec::with_max_length(limits::MAX_LINE_BYTES),
    );
    let mut valid = 0usize;
    let mut invalid = 0usize;
    let mut line_no = 0usize;

    while let Some(line) = lines.next().await {
        line_no += 1;
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match Message::decode(&line).and_then(|msg| msg.validate()) {
            Ok(()) => valid += 1,
            Err(e) => {
                warn!("line {}: {}", line_no, e);
                invalid += 1;
            }
        }
    }

    println!("{}", serde_json::json!({ "valid": valid, "invalid": invalid }));
    if invalid > 0 {
        bail!("{} invalid envelope(s)", invalid);
    }
    Ok(())
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC: {} at {}", message, location);
    }));
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries envelopes, so logs always go to stderr
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        subscriber.json().try_init().map_err(|e| anyhow!(e))?;
    } else {
        subscriber.try_init().map_err(|e| anyhow!(e))?;
    }

    Ok(())
}
