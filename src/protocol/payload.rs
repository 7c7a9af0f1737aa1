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

//! Typed payloads of the well-known message types.
//!
//! The envelope treats payloads as opaque mappings; these structs give the
//! established MIST tools' payloads a concrete shape for callers that want
//! one. Convert with [`Message::from_payload`](crate::Message::from_payload)
//! and [`Message::decode_payload`](crate::Message::decode_payload).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// `infer.request`: ask InferMux to run an LLM inference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferRequest {
    /// Model name, or "auto" for routing
    pub model: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
    pub messages: Vec<ChatMessage>,
    /// temperature, max_tokens, ...
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// Trace context and request tags
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// `infer.response`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferResponse {
    pub model: String,
    pub provider: String,
    pub content: String,
    pub tokens_in: i64,
    pub tokens_out: i64,
    pub cost_usd: f64,
    pub latency_ms: i64,
    pub finish_reason: String,
}

/// `eval.run`: start an evaluation job in MatchSpec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRun {
    pub suite: String,
    /// Specific tasks, or empty for all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,
    /// Run without tools as baseline
    pub baseline: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub infer_url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

/// `eval.result`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub suite: String,
    pub task: String,
    pub passed: bool,
    pub score: f64,
    #[serde(rename = "baseline_score")]
    pub baseline: f64,
    pub delta: f64,
    pub duration_ms: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// `trace.span`: one span of the token trace protocol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSpan {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent_id: String,
    pub operation: String,
    pub start_ns: i64,
    pub end_ns: i64,
    /// "ok" or "error"
    pub status: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

/// `trace.alert`: emitted when a threshold is breached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceAlert {
    /// "warning" or "critical"
    pub level: String,
    /// "latency_p99", "cost_hourly", "error_rate", ...
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

/// `data.entities`: a batch of structured entities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEntities {
    pub count: i64,
    /// "json", "jsonl" or "csv"
    pub format: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

/// `data.schema`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
}

/// `health.ping`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPing {
    #[serde(default)]
    pub from: String,
}

/// `health.pong`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthPong {
    pub from: String,
    pub version: String,
    #[serde(rename = "uptime_s")]
    pub uptime: i64,
}
