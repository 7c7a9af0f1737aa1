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

//! mist: MIST message protocol for Rust.
//!
//! This library implements the MIST envelope format, the newline-delimited
//! stdio transport and the subprocess dispatch client used to talk to
//! MIST tool binaries. It also provides the tool-side half of the stdio
//! convention so Rust binaries can act as MIST tools.
//!
//! ```no_run
//! # async fn demo() -> Result<(), mist::MistError> {
//! use mist::Client;
//!
//! let client = Client::new("matchspec");
//! let mut payload = serde_json::Map::new();
//! payload.insert("from".into(), "rust".into());
//! let reply = client.send("health.ping", payload, None).await?;
//! println!("{} answered {}", reply.source, reply.message_type);
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod mist_core;
pub mod protocol;
pub mod runner;
pub mod tool;
pub mod transport;
pub mod utils;

pub use blocking::BlockingClient;
pub use client::Client;
pub use config::Config;
pub use mist_core::errors::{ErrorKind, MistError};
pub use protocol::message::{Message, Payload};
pub use transport::{Transport, TransportKind};
