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

//! Pipe tasks of a running tool.
//!
//! Writing stdin and draining stdout/stderr all happen concurrently, each on
//! its own task, so a tool that fills one pipe while we block on another can
//! never deadlock the exchange.

use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, trace};

use crate::mist_core::constants::limits;
use crate::mist_core::errors::MistError;
use crate::transport::codec::EnvelopeCodec;
use crate::transport::{ResponseSelector, Selection};

/// How a tool's stdout is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Keep every byte
    Raw,
    /// Stream lines through a [`ResponseSelector`], keeping only the
    /// response candidate
    Envelope,
}

/// Collected stdout, shaped by the [`Capture`] mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedStdout {
    Raw(Vec<u8>),
    Envelope(Selection),
}

impl CapturedStdout {
    /// The captured bytes; for envelope capture, the selected line.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            CapturedStdout::Raw(bytes) => bytes,
            CapturedStdout::Envelope(Selection::Envelope(line))
            | CapturedStdout::Envelope(Selection::Noise(line)) => line.to_vec(),
            CapturedStdout::Envelope(Selection::Empty) => Vec::new(),
        }
    }
}

/// Spawns a task writing `input` to the tool's stdin, then closing it.
///
/// A tool may exit without reading its input; the resulting broken pipe is
/// not an error.
pub fn spawn_stdin_writer<W>(mut stream: W, input: Bytes) -> JoinHandle<Result<(), MistError>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let written = async {
            stream.write_all(&input).await?;
            stream.flush().await?;
            stream.shutdown().await
        }
        .await;

        match written {
            Ok(()) => {
                trace!("Wrote {} bytes to tool stdin", input.len());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("Tool closed stdin before reading all input");
                Ok(())
            }
            Err(e) => Err(MistError::Io(e)),
        }
    })
}

/// Spawns a task reading the tool's stdout until EOF.
///
/// Envelope capture fails on any line longer than
/// [`limits::MAX_LINE_BYTES`].
pub fn spawn_stdout_reader<R>(stream: R, capture: Capture) -> JoinHandle<Result<CapturedStdout, MistError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match capture {
            Capture::Raw => {
                let mut stream = stream;
                let mut buf = Vec::new();
                stream.read_to_end(&mut buf).await?;
                Ok(CapturedStdout::Raw(buf))
            }
            Capture::Envelope => {
                let mut framed =
                    FramedRead::new(stream, EnvelopeCodec::with_max_length(limits::MAX_LINE_BYTES));
                let mut selector = ResponseSelector::new();
                while let Some(line) = framed.next().await {
                    selector.feed(line?);
                }
                Ok(CapturedStdout::Envelope(selector.finish()))
            }
        }
    })
}

/// Spawns a task draining the tool's stderr until EOF.
pub fn spawn_stderr_drain<R>(mut stream: R) -> JoinHandle<Result<Vec<u8>, MistError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        if !buf.is_empty() {
            trace!("Tool stderr: {}", String::from_utf8_lossy(&buf).trim_end());
        }
        Ok(buf)
    })
}
