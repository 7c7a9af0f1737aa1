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

//! MIST constants - single source of truth for protocol and configuration values.
//!
//! Message types, source identifiers, environment variable names and limits
//! live here so the client, the tool side and the CLI agree on them.

/// Protocol versions understood by this library.
pub mod version {
    /// Version stamped on every envelope this library creates.
    pub const CURRENT: &str = "1";
    /// Oldest version this library can read.
    pub const MIN_SUPPORTED: &str = "1";
    /// Newest version this library understands.
    pub const MAX_SUPPORTED: &str = "1";
}

/// Well-known message types (`namespace.verb`).
pub mod types {
    /// Batch of compiled entities (SchemaFlux)
    pub const DATA_ENTITIES: &str = "data.entities";
    /// Schema definition (SchemaFlux)
    pub const DATA_SCHEMA: &str = "data.schema";
    /// LLM inference request (InferMux)
    pub const INFER_REQUEST: &str = "infer.request";
    /// LLM inference response (InferMux)
    pub const INFER_RESPONSE: &str = "infer.response";
    /// Start an evaluation (MatchSpec)
    pub const EVAL_RUN: &str = "eval.run";
    /// Evaluation outcome (MatchSpec)
    pub const EVAL_RESULT: &str = "eval.result";
    /// A single trace span (TokenTrace)
    pub const TRACE_SPAN: &str = "trace.span";
    /// Quality/cost/latency alert (TokenTrace)
    pub const TRACE_ALERT: &str = "trace.alert";
    pub const HEALTH_PING: &str = "health.ping";
    pub const HEALTH_PONG: &str = "health.pong";
}

/// Source identifiers of the MIST tools.
pub mod sources {
    pub const SCHEMAFLUX: &str = "schemaflux";
    pub const INFERMUX: &str = "infermux";
    pub const MATCHSPEC: &str = "matchspec";
    pub const TOKENTRACE: &str = "tokentrace";
    /// Source used by this binding when the caller does not name one
    pub const DEFAULT: &str = "rust";
}

/// Tool command-line contract.
pub mod cli {
    /// Flag selecting the transport a tool speaks
    pub const TRANSPORT_FLAG: &str = "--transport";
    /// Argument asking a tool for its version string
    pub const VERSION_ARG: &str = "version";
    /// Tool name used when none is given
    pub const DEFAULT_TOOL: &str = "mist";
}

/// Transport names accepted by `--transport`.
pub mod transports {
    pub const STDIO: &str = "stdio";
}

/// Configuration Environment Variables
pub mod config {
    /// Directory searched first for platform-specific binaries
    pub const ENV_BIN_DIR: &str = "MIST_BIN_DIR";
    pub const ENV_TIMEOUT_SECS: &str = "MIST_TIMEOUT_SECS";
    pub const ENV_KILL_GRACE_MS: &str = "MIST_KILL_GRACE_MS";
    pub const ENV_SOURCE: &str = "MIST_SOURCE";
    pub const ENV_TRANSPORT: &str = "MIST_TRANSPORT";
    pub const ENV_STAMP_ENVELOPES: &str = "MIST_STAMP_ENVELOPES";
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

    pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;
    pub const DEFAULT_KILL_GRACE_MS: u64 = 0;
    /// Directory next to the running executable holding bundled tool binaries
    pub const BUNDLED_DIR_NAME: &str = "bin";
}

/// Size Limits
pub mod limits {
    /// Maximum encoded payload accepted by `Message::validate` (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: usize = 10 * 1024 * 1024;
    /// Longest line the tool-side codec will buffer (10 MB)
    pub const MAX_LINE_BYTES: usize = MAX_MESSAGE_SIZE_BYTES;
}
