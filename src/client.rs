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

//! Dispatch client.
//!
//! A [`Client`] binds a logical tool name to a resolved executable and runs
//! one subprocess per call. It holds no per-call state, so clones and
//! concurrent calls on one instance are independent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::mist_core::constants::cli;
use crate::mist_core::errors::MistError;
use crate::protocol::message::{to_payload, Message, Payload};
use crate::runner::{Capture, Invocation, ProcessRunner};
use crate::transport::{StdioTransport, Transport, TransportKind};
use crate::utils::binary::BinaryResolver;

#[derive(Debug, Clone)]
pub struct Client {
    tool: String,
    binary: PathBuf,
    runner: ProcessRunner,
    config: Config,
}

impl Client {
    /// Client for `tool`, configured from the environment.
    ///
    /// Invalid environment values are logged and replaced by defaults; use
    /// [`Client::from_env`] to surface them instead.
    pub fn new(tool: impl Into<String>) -> Self {
        let config = Config::from_env().unwrap_or_else(|e| {
            warn!("Ignoring invalid MIST environment: {}", e);
            Config::default()
        });
        Self::with_config(tool, config)
    }

    pub fn from_env(tool: impl Into<String>) -> Result<Self, MistError> {
        Ok(Self::with_config(tool, Config::from_env()?))
    }

    /// Client for `tool` with an explicit configuration. The binary is
    /// resolved once, here.
    pub fn with_config(tool: impl Into<String>, config: Config) -> Self {
        let tool = tool.into();
        let binary = BinaryResolver::from_config(&config).resolve(&tool);
        Self {
            tool,
            binary,
            runner: ProcessRunner::from_config(&config),
            config,
        }
    }

    /// Use `binary` instead of the resolved executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner = ProcessRunner::new(timeout).with_kill_grace(self.config.kill_grace());
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.runner.timeout()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the tool with `args` and optional stdin text; return its stdout.
    ///
    /// Stdout is decoded as UTF-8, with invalid sequences replaced.
    pub async fn call(&self, args: &[&str], stdin: Option<&str>) -> Result<String, MistError> {
        let mut invocation = Invocation::new(&self.binary, args.iter().copied())
            .with_capture(Capture::Raw);
        if let Some(text) = stdin {
            invocation = invocation.with_input(Bytes::copy_from_slice(text.as_bytes()));
        }

        let output = self.runner.run(invocation).await?;
        Ok(String::from_utf8_lossy(&output.stdout.into_bytes()).into_owned())
    }

    /// Build an envelope and exchange it with the tool.
    ///
    /// `source` defaults to the configured source. Unless disabled in the
    /// configuration, the envelope gets a fresh id and timestamp.
    pub async fn send(
        &self,
        message_type: &str,
        payload: Payload,
        source: Option<&str>,
    ) -> Result<Message, MistError> {
        let source = source.unwrap_or(&self.config.source);
        let request = if self.config.stamp_envelopes {
            Message::new(source, message_type, payload)
        } else {
            Message::unstamped(source, message_type, payload)
        };
        self.send_message(&request).await
    }

    /// Like [`Client::send`], for any payload serializing to a JSON object.
    pub async fn send_payload<T: Serialize>(
        &self,
        message_type: &str,
        payload: &T,
        source: Option<&str>,
    ) -> Result<Message, MistError> {
        self.send(message_type, to_payload(payload)?, source).await
    }

    /// Exchange a caller-built envelope with the tool, unchanged.
    pub async fn send_message(&self, request: &Message) -> Result<Message, MistError> {
        let transport = self.transport()?;
        let response = transport.exchange(request).await?;

        if !request.id.is_empty() && !response.id.is_empty() && response.id != request.id {
            debug!(
                "Response id '{}' does not match request id '{}'",
                response.id, request.id
            );
        }
        Ok(response)
    }

    /// The tool's version string, trimmed.
    pub async fn version(&self) -> Result<String, MistError> {
        let out = self.call(&[cli::VERSION_ARG], None).await?;
        Ok(out.trim().to_string())
    }

    /// The transport selected by the configuration.
    pub fn transport(&self) -> Result<Box<dyn Transport>, MistError> {
        match self.config.transport.parse::<TransportKind>()? {
            TransportKind::Stdio => Ok(Box::new(StdioTransport::new(
                self.binary.clone(),
                self.runner.clone(),
            ))),
        }
    }
}
