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

//! Transport bindings.
//!
//! A transport delivers one encoded request envelope to a tool and returns
//! the tool's response envelope. Only the stdio binding is implemented; any
//! other binding must keep the same envelope format and the same
//! one-request/one-response pairing.

pub mod codec;
pub mod stdio;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::mist_core::constants::transports;
use crate::mist_core::errors::MistError;
use crate::protocol::message::{is_envelope, Message};

pub use stdio::{StdioServer, StdioTransport};

/// Request/response exchange with a tool.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name passed to the tool's `--transport` flag
    fn name(&self) -> &'static str;

    /// Deliver `request` and wait for the response envelope.
    async fn exchange(&self, request: &Message) -> Result<Message, MistError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum TransportKind {
    Stdio,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => transports::STDIO,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = MistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            transports::STDIO => Ok(TransportKind::Stdio),
            other => Err(MistError::UnsupportedTransport(other.to_string())),
        }
    }
}

/// Outcome of scanning a tool's output for its response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The last non-empty line that decodes as an envelope
    Envelope(Bytes),
    /// Output had content, but no line decoded as an envelope; holds the last
    /// non-empty line
    Noise(Bytes),
    /// No non-whitespace output at all
    Empty,
}

impl Selection {
    /// Decode the selected envelope. Empty output yields a default message.
    pub fn into_message(self) -> Result<Message, MistError> {
        match self {
            Selection::Envelope(line) => Message::decode(&line),
            Selection::Empty => Ok(Message::default()),
            Selection::Noise(line) => Err(MistError::MalformedEnvelope(format!(
                "no decodable envelope in tool output (last line: {:?})",
                preview(&line)
            ))),
        }
    }
}

/// Streaming picker for the authoritative response line.
///
/// Feed it every output line in order. Only the current candidate is kept,
/// so memory use is bounded by the longest line rather than total output.
#[derive(Debug, Default)]
pub struct ResponseSelector {
    envelope: Option<Bytes>,
    last_non_empty: Option<Bytes>,
}

impl ResponseSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: Bytes) {
        let trimmed = trim_ascii(&line);
        if trimmed.is_empty() {
            return;
        }
        let line = line.slice_ref(trimmed);
        if is_envelope(&line) {
            self.envelope = Some(line.clone());
        }
        self.last_non_empty = Some(line);
    }

    pub fn finish(self) -> Selection {
        match (self.envelope, self.last_non_empty) {
            (Some(line), _) => Selection::Envelope(line),
            (None, Some(line)) => Selection::Noise(line),
            (None, None) => Selection::Empty,
        }
    }
}

/// Select the response envelope from fully buffered output.
pub fn select_response(output: &[u8]) -> Selection {
    let mut selector = ResponseSelector::new();
    let mut rest = Bytes::copy_from_slice(output);
    while !rest.is_empty() {
        let line = match rest.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let line = rest.slice(..pos);
                rest = rest.slice(pos + 1..);
                line
            }
            None => std::mem::take(&mut rest),
        };
        selector.feed(line);
    }
    selector.finish()
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn preview(line: &[u8]) -> String {
    const MAX: usize = 120;
    let text = String::from_utf8_lossy(line);
    if text.chars().count() > MAX {
        let cut: String = text.chars().take(MAX).collect();
        format!("{}...", cut)
    } else {
        text.into_owned()
    }
}
