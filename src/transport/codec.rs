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

//! Envelope Transport Codec.
//!
//! Handles the low-level framing of MIST envelopes on byte streams: one JSON
//! object per line, terminated by `\n`. A trailing `\r` is stripped so
//! CRLF-emitting tools frame the same way. There is no length prefix.

use crate::mist_core::errors::MistError;
use crate::protocol::message::Message;
use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

pub struct EnvelopeCodec {
    // Bytes already scanned for a newline in the pending buffer
    next_index: usize,
    max_length: Option<usize>,
}

impl EnvelopeCodec {
    /// Codec without a line length limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_length: None,
        }
    }

    /// Codec that rejects lines longer than `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length: Some(max_length),
        }
    }

    fn check_length(&self, len: usize) -> Result<(), MistError> {
        match self.max_length {
            Some(max) if len > max => Err(MistError::MalformedEnvelope(format!(
                "line of {} bytes exceeds limit of {} bytes",
                len, max
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn finish_line(mut line: BytesMut) -> Bytes {
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line.freeze()
}

impl Decoder for EnvelopeCodec {
    type Item = Bytes;
    type Error = MistError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.next_index.min(src.len());
        match src[start..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let end = start + offset;
                self.next_index = 0;
                self.check_length(end)?;
                let mut line = src.split_to(end + 1);
                line.truncate(end);
                trace!("Decoded line of {} bytes", end);
                Ok(Some(finish_line(line)))
            }
            None => {
                self.check_length(src.len())?;
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                // Final line without a terminator
                self.next_index = 0;
                let line = src.split_to(src.len());
                Ok(Some(finish_line(line)))
            }
        }
    }
}

impl<'a> Encoder<&'a Message> for EnvelopeCodec {
    type Error = MistError;

    fn encode(&mut self, item: &'a Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let body = item.encode()?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Encode `message` as one newline-terminated line.
pub fn encode_line(message: &Message) -> Result<Bytes, MistError> {
    let mut buf = BytesMut::new();
    EnvelopeCodec::new().encode(message, &mut buf)?;
    Ok(buf.freeze())
}
