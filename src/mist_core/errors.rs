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

//! Error taxonomy for every MIST operation.
//!
//! All failures surface as a single `MistError`; callers that need to branch
//! on the failure class use [`MistError::kind`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Main error type for the MIST client, transport and tool side.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MistError {
    /// Resolution or spawn of the tool binary failed
    #[error("binary not found: {}", .path.display())]
    BinaryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool did not exit within the budget and was killed
    #[error("timeout after {}s", .budget.as_secs_f64())]
    Timeout { budget: Duration },

    /// The tool exited unsuccessfully. The message is the trimmed stderr
    /// text, or a fallback naming the exit code.
    #[error("{message}")]
    NonZeroExit { code: Option<i32>, message: String },

    /// Bytes that should hold an envelope are not a JSON object
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// Envelope validation or version negotiation failure
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discriminant of a [`MistError`], for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    BinaryNotFound,
    Timeout,
    NonZeroExit,
    MalformedEnvelope,
    UnsupportedTransport,
    Protocol,
    Configuration,
    Io,
}

impl MistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MistError::BinaryNotFound { .. } => ErrorKind::BinaryNotFound,
            MistError::Timeout { .. } => ErrorKind::Timeout,
            MistError::NonZeroExit { .. } => ErrorKind::NonZeroExit,
            MistError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            MistError::UnsupportedTransport(_) => ErrorKind::UnsupportedTransport,
            MistError::Protocol(_) => ErrorKind::Protocol,
            MistError::Configuration(_) => ErrorKind::Configuration,
            MistError::Io(_) => ErrorKind::Io,
        }
    }

    /// Build the nonzero-exit error from captured stderr and the exit code.
    pub(crate) fn non_zero_exit(code: Option<i32>, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        let message = if !trimmed.is_empty() {
            trimmed.to_string()
        } else {
            match code {
                Some(c) => format!("exit code {}", c),
                None => "terminated by signal".to_string(),
            }
        };
        MistError::NonZeroExit { code, message }
    }
}

impl From<serde_json::Error> for MistError {
    fn from(err: serde_json::Error) -> Self {
        MistError::MalformedEnvelope(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_prefers_stderr() {
        let err = MistError::non_zero_exit(Some(1), "  something broke\n");
        assert_eq!(err.to_string(), "something broke");
        assert_eq!(err.kind(), ErrorKind::NonZeroExit);
    }

    #[test]
    fn test_non_zero_exit_fallbacks() {
        assert_eq!(
            MistError::non_zero_exit(Some(3), " \n").to_string(),
            "exit code 3"
        );
        assert_eq!(
            MistError::non_zero_exit(None, "").to_string(),
            "terminated by signal"
        );
    }

    #[test]
    fn test_timeout_message_names_budget() {
        let err = MistError::Timeout {
            budget: Duration::from_millis(100),
        };
        assert_eq!(err.to_string(), "timeout after 0.1s");
    }

    #[test]
    fn test_binary_not_found_names_path() {
        let err = MistError::BinaryNotFound {
            path: PathBuf::from("/nowhere/tool"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("binary not found: /nowhere/tool"));
    }
}
