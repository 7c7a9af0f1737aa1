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

//! Time utilities.
//!
//! This module provides `now_ns()` for stamping envelopes with the
//! nanosecond wall-clock time.

use chrono::Utc;

/// Nanoseconds since the Unix epoch, or 0 if the clock is out of range.
pub fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}
