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

//! Synchronous façade over [`Client`].
//!
//! Each call blocks the calling thread until the tool has exited. Do not use
//! it from within an async runtime; use [`Client`] there.

use std::time::Duration;

use serde::Serialize;

use crate::client::Client;
use crate::config::Config;
use crate::mist_core::errors::MistError;
use crate::protocol::message::{Message, Payload};

pub struct BlockingClient {
    inner: Client,
    runtime: tokio::runtime::Runtime,
}

impl BlockingClient {
    pub fn new(tool: impl Into<String>) -> Result<Self, MistError> {
        Self::from_client(Client::new(tool))
    }

    pub fn with_config(tool: impl Into<String>, config: Config) -> Result<Self, MistError> {
        Self::from_client(Client::with_config(tool, config))
    }

    pub fn from_client(inner: Client) -> Result<Self, MistError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { inner, runtime })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    pub fn client(&self) -> &Client {
        &self.inner
    }

    pub fn call(&self, args: &[&str], stdin: Option<&str>) -> Result<String, MistError> {
        self.runtime.block_on(self.inner.call(args, stdin))
    }

    pub fn send(
        &self,
        message_type: &str,
        payload: Payload,
        source: Option<&str>,
    ) -> Result<Message, MistError> {
        self.runtime
            .block_on(self.inner.send(message_type, payload, source))
    }

    pub fn send_payload<T: Serialize>(
        &self,
        message_type: &str,
        payload: &T,
        source: Option<&str>,
    ) -> Result<Message, MistError> {
        self.runtime
            .block_on(self.inner.send_payload(message_type, payload, source))
    }

    pub fn send_message(&self, request: &Message) -> Result<Message, MistError> {
        self.runtime.block_on(self.inner.send_message(request))
    }

    pub fn version(&self) -> Result<String, MistError> {
        self.runtime.block_on(self.inner.version())
    }
}

impl std::fmt::Debug for BlockingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingClient")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
