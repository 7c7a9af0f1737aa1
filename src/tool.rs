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

//! Tool-side request handling.

use std::time::Instant;

use async_trait::async_trait;

use crate::mist_core::constants::types;
use crate::mist_core::errors::MistError;
use crate::protocol::message::Message;
use crate::protocol::payload::HealthPong;

/// Turns one request envelope into one response envelope.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, request: Message) -> Result<Message, MistError>;
}

/// Handler behind `mist --transport stdio`.
///
/// Answers `health.ping` with `health.pong` and echoes every other message
/// type back with its payload. Responses carry the request id.
#[derive(Debug, Clone)]
pub struct BuiltinTool {
    name: String,
    version: String,
    started: Instant,
}

impl BuiltinTool {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            started: Instant::now(),
        }
    }

    fn pong(&self) -> HealthPong {
        HealthPong {
            from: self.name.clone(),
            version: self.version.clone(),
            uptime: i64::try_from(self.started.elapsed().as_secs()).unwrap_or(i64::MAX),
        }
    }
}

#[async_trait]
impl ToolHandler for BuiltinTool {
    async fn handle(&self, request: Message) -> Result<Message, MistError> {
        let response = if request.message_type == types::HEALTH_PING {
            Message::from_payload(&self.name, types::HEALTH_PONG, &self.pong())?
        } else {
            Message::new(&self.name, request.message_type, request.payload)
        };
        Ok(response.with_id(request.id))
    }
}
