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

//! The MIST message envelope.
//!
//! A `Message` is the only entity that crosses a transport. It encodes to a
//! single JSON object with the fields `version`, `id`, `source`, `type`,
//! `timestamp_ns` and `payload`. Decoding fills every missing (or `null`)
//! field with its default, so partial envelopes from older or sloppier
//! tools never fail on absence alone.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::mist_core::constants::{limits, version};
use crate::mist_core::errors::MistError;
use crate::protocol::negotiation;
use crate::utils::time::now_ns;

/// Free-form JSON mapping carried by an envelope. Its shape is owned by the
/// message `type`.
pub type Payload = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "current_version", deserialize_with = "version_or_current")]
    pub version: String,
    /// Correlation id; empty means unset
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub message_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp_ns: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: Payload,
}

fn current_version() -> String {
    version::CURRENT.to_string()
}

fn version_or_current<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(current_version))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for Message {
    fn default() -> Self {
        Self {
            version: current_version(),
            id: String::new(),
            source: String::new(),
            message_type: String::new(),
            timestamp_ns: 0,
            payload: Payload::new(),
        }
    }
}

impl Message {
    /// Create a message with a fresh random id and the current timestamp.
    pub fn new(source: impl Into<String>, message_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            version: current_version(),
            id: new_id(),
            source: source.into(),
            message_type: message_type.into(),
            timestamp_ns: now_ns(),
            payload,
        }
    }

    /// Create an unstamped message: empty id and zero timestamp.
    pub fn unstamped(
        source: impl Into<String>,
        message_type: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            source: source.into(),
            message_type: message_type.into(),
            payload,
            ..Self::default()
        }
    }

    /// Create a stamped message from any serializable payload. The payload
    /// must serialize to a JSON object.
    pub fn from_payload<T: Serialize>(
        source: impl Into<String>,
        message_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, MistError> {
        Ok(Self::new(source, message_type, to_payload(payload)?))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Serialize to a single JSON object, without framing.
    pub fn encode(&self) -> Result<Vec<u8>, MistError> {
        serde_json::to_vec(self).map_err(|e| MistError::Protocol(format!("encode failed: {}", e)))
    }

    /// Parse one envelope. Fails only if `bytes` is not JSON, is not an
    /// object at the top level, or carries a field of the wrong JSON type.
    pub fn decode(bytes: &[u8]) -> Result<Self, MistError> {
        match first_significant_byte(bytes) {
            Some(b'{') => {
                // Duplicate keys keep their last value
                let object: Map<String, Value> = serde_json::from_slice(bytes)?;
                Ok(Message::deserialize(Value::Object(object))?)
            }
            Some(_) => Err(MistError::MalformedEnvelope(
                "top-level JSON value is not an object".to_string(),
            )),
            None => Err(MistError::MalformedEnvelope("empty input".to_string())),
        }
    }

    /// Interpret the payload as a typed structure.
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, MistError> {
        T::deserialize(Value::Object(self.payload.clone())).map_err(|e| {
            MistError::Protocol(format!(
                "payload of '{}' does not match the expected shape: {}",
                self.message_type, e
            ))
        })
    }

    /// Check the envelope has everything a routed message needs.
    pub fn validate(&self) -> Result<(), MistError> {
        let missing = [
            ("version", &self.version),
            ("id", &self.id),
            ("source", &self.source),
            ("type", &self.message_type),
        ]
        .into_iter()
        .find(|(_, value)| value.is_empty());

        if let Some((field, _)) = missing {
            return Err(MistError::Protocol(format!("message: missing {}", field)));
        }

        negotiation::check_version(&self.version)?;

        let size = serde_json::to_vec(&self.payload)
            .map_err(|e| MistError::Protocol(format!("encode failed: {}", e)))?
            .len();
        if size > limits::MAX_MESSAGE_SIZE_BYTES {
            return Err(MistError::Protocol(format!(
                "message: payload too large: {} bytes (max {})",
                size,
                limits::MAX_MESSAGE_SIZE_BYTES
            )));
        }
        Ok(())
    }
}

/// Serialize any value into a payload mapping.
pub fn to_payload<T: Serialize>(value: &T) -> Result<Payload, MistError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(MistError::Protocol(format!(
            "payload must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(MistError::Protocol(format!("payload encode failed: {}", e))),
    }
}

/// True if `bytes` decodes as an envelope.
pub fn is_envelope(bytes: &[u8]) -> bool {
    Message::decode(bytes).is_ok()
}

fn first_significant_byte(bytes: &[u8]) -> Option<u8> {
    bytes.iter().copied().find(|b| !b.is_ascii_whitespace())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}
