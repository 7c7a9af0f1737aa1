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

//! Stdio binding.
//!
//! Client side: spawn the tool with `--transport stdio`, write one envelope
//! line to its stdin, close stdin, and select the response from its stdout.
//! Tool side: read stdin to EOF, handle exactly one envelope, write exactly
//! one envelope line to stdout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tokio_util::codec::FramedRead;
use tracing::debug;

use crate::mist_core::constants::{cli, limits, transports};
use crate::mist_core::errors::MistError;
use crate::protocol::message::Message;
use crate::runner::{Capture, CapturedStdout, Invocation, ProcessRunner};
use crate::tool::ToolHandler;
use crate::transport::codec::{encode_line, EnvelopeCodec};
use crate::transport::{select_response, Transport};

/// Client half: one subprocess per exchange.
#[derive(Debug, Clone)]
pub struct StdioTransport {
    program: PathBuf,
    runner: ProcessRunner,
}

impl StdioTransport {
    pub fn new(program: impl Into<PathBuf>, runner: ProcessRunner) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn name(&self) -> &'static str {
        transports::STDIO
    }

    async fn exchange(&self, request: &Message) -> Result<Message, MistError> {
        let line = encode_line(request)?;
        debug!(
            "Sending '{}' ({} bytes) to {}",
            request.message_type,
            line.len(),
            self.program.display()
        );

        let invocation = Invocation::new(&self.program, [cli::TRANSPORT_FLAG, self.name()])
            .with_input(line)
            .with_capture(Capture::Envelope);
        let output = self.runner.run(invocation).await?;

        let selection = match output.stdout {
            CapturedStdout::Envelope(selection) => selection,
            CapturedStdout::Raw(bytes) => select_response(&bytes),
        };
        selection.into_message()
    }
}

/// Tool half: serves a single request over a reader/writer pair.
pub struct StdioServer<R, W> {
    reader: FramedRead<R, EnvelopeCodec>,
    writer: W,
}

impl StdioServer<Stdin, Stdout> {
    /// Serve on the process's own stdin and stdout.
    pub fn new() -> Self {
        Self::from_io(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioServer<Stdin, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioServer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn from_io(reader: R, writer: W) -> Self {
        Self {
            reader: FramedRead::new(reader, EnvelopeCodec::with_max_length(limits::MAX_LINE_BYTES)),
            writer,
        }
    }

    /// Read input to EOF and decode the request envelope: the first
    /// non-empty line.
    pub async fn read_request(&mut self) -> Result<Message, MistError> {
        let mut request = None;
        let mut ignored = 0usize;

        while let Some(line) = self.reader.next().await {
            let line = line?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            if request.is_none() {
                request = Some(line);
            } else {
                ignored += 1;
            }
        }

        if ignored > 0 {
            debug!("Ignoring {} extra input lines after the request", ignored);
        }
        match request {
            Some(line) => Message::decode(&line),
            None => Err(MistError::MalformedEnvelope("empty input".to_string())),
        }
    }

    /// Write one envelope line and flush.
    pub async fn write_response(&mut self, response: &Message) -> Result<(), MistError> {
        let line = encode_line(response)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Read, handle and answer exactly one request.
    pub async fn serve_one<H>(&mut self, handler: &H) -> Result<Message, MistError>
    where
        H: ToolHandler + ?Sized,
    {
        let request = self.read_request().await?;
        debug!("Received '{}' from '{}'", request.message_type, request.source);

        let response = handler.handle(request).await?;
        self.write_response(&response).await?;
        Ok(response)
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader.into_inner(), self.writer)
    }
}
