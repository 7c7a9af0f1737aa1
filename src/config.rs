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

use crate::mist_core::constants::{config as keys, sources, transports};
use crate::mist_core::errors::MistError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory searched first for platform-specific binaries
    pub bin_dir: Option<PathBuf>,
    pub bundled_dir: Option<PathBuf>,
    pub timeout_secs: f64,
    /// SIGTERM grace period before SIGKILL on timeout; 0 kills immediately
    pub kill_grace_ms: u64,
    pub source: String,
    pub transport: String,
    /// Stamp a fresh id and timestamp on envelopes built by `send`
    pub stamp_envelopes: bool,
    pub log_level: String,
    pub log_format: String, // "json" or "text"
}

impl Config {
    pub fn from_env() -> Result<Self, MistError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MistError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = match lookup(keys::ENV_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => defaults.timeout_secs,
        };

        let kill_grace_ms = match lookup(keys::ENV_KILL_GRACE_MS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                MistError::Configuration(format!(
                    "{}='{}': {}",
                    keys::ENV_KILL_GRACE_MS,
                    raw,
                    e
                ))
            })?,
            None => defaults.kill_grace_ms,
        };

        let stamp_envelopes = match lookup(keys::ENV_STAMP_ENVELOPES) {
            Some(raw) => parse_bool(keys::ENV_STAMP_ENVELOPES, &raw)?,
            None => defaults.stamp_envelopes,
        };

        Ok(Self {
            bin_dir: lookup(keys::ENV_BIN_DIR)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            bundled_dir: defaults.bundled_dir,
            timeout_secs,
            kill_grace_ms,
            source: lookup(keys::ENV_SOURCE).unwrap_or(defaults.source),
            transport: lookup(keys::ENV_TRANSPORT)
                .map(|s| s.to_lowercase())
                .unwrap_or(defaults.transport),
            stamp_envelopes,
            log_level: lookup(keys::ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_format: lookup(keys::ENV_LOG_FORMAT).unwrap_or(defaults.log_format),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_dir: None,
            bundled_dir: crate::utils::binary::default_bundled_dir(),
            timeout_secs: keys::DEFAULT_TIMEOUT_SECS,
            kill_grace_ms: keys::DEFAULT_KILL_GRACE_MS,
            source: sources::DEFAULT.to_string(),
            transport: transports::STDIO.to_string(),
            stamp_envelopes: true,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Timeouts must be finite and positive; `Duration::from_secs_f64` panics otherwise.
pub fn parse_timeout(raw: &str) -> Result<f64, MistError> {
    let secs = raw.trim().parse::<f64>().map_err(|e| {
        MistError::Configuration(format!("{}='{}': {}", keys::ENV_TIMEOUT_SECS, raw, e))
    })?;
    if !secs.is_finite() || secs <= 0.0 || secs >= u64::MAX as f64 {
        return Err(MistError::Configuration(format!(
            "{} must be a positive number of seconds, got '{}'",
            keys::ENV_TIMEOUT_SECS,
            raw
        )));
    }
    Ok(secs)
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, MistError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MistError::Configuration(format!(
            "{}='{}' is not a boolean",
            key, raw
        ))),
    }
}
