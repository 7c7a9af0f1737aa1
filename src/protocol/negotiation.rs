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

//! Protocol version negotiation.
//!
//! Versions are small integers carried as strings. A side advertises the
//! range it supports as `"min-max"` or a single `"n"`; negotiation picks the
//! highest version both ranges contain.

use crate::mist_core::constants::version;
use crate::mist_core::errors::MistError;
use tracing::debug;

/// Check that `v` lies within the range this library supports.
pub fn check_version(v: &str) -> Result<(), MistError> {
    if v.trim().is_empty() {
        return Err(MistError::Protocol("empty version".to_string()));
    }

    let parsed = parse_version(v)
        .map_err(|e| MistError::Protocol(format!("invalid version '{}': {}", v, e)))?;
    let (min, max) = supported_range();

    if parsed < min {
        return Err(MistError::Protocol(format!(
            "version '{}' is too old (min supported: {})",
            v,
            version::MIN_SUPPORTED
        )));
    }
    if parsed > max {
        return Err(MistError::Protocol(format!(
            "version '{}' is too new (max supported: {})",
            v,
            version::MAX_SUPPORTED
        )));
    }
    Ok(())
}

pub fn is_compatible(v: &str) -> bool {
    check_version(v).is_ok()
}

/// Highest version contained in both ranges.
pub fn negotiate_version(local: &str, remote: &str) -> Result<String, MistError> {
    let (local_min, local_max) = parse_range(local).map_err(|e| {
        MistError::Protocol(format!("invalid local version range '{}': {}", local, e))
    })?;
    let (remote_min, remote_max) = parse_range(remote).map_err(|e| {
        MistError::Protocol(format!("invalid remote version range '{}': {}", remote, e))
    })?;

    let low = local_min.max(remote_min);
    let high = local_max.min(remote_max);
    if low > high {
        return Err(MistError::Protocol(format!(
            "no compatible version (local {}, remote {})",
            local, remote
        )));
    }

    debug!("Negotiated protocol version {} ({} vs {})", high, local, remote);
    Ok(high.to_string())
}

/// The range this library advertises, e.g. `"1"` or `"1-3"`.
pub fn supported_range_string() -> String {
    if version::MIN_SUPPORTED == version::MAX_SUPPORTED {
        version::CURRENT.to_string()
    } else {
        format!("{}-{}", version::MIN_SUPPORTED, version::MAX_SUPPORTED)
    }
}

/// Human-readable description of the supported versions.
pub fn version_info() -> String {
    if version::MIN_SUPPORTED == version::MAX_SUPPORTED {
        format!("MIST protocol version {}", version::CURRENT)
    } else {
        format!(
            "MIST protocol version {} (supports {}-{})",
            version::CURRENT,
            version::MIN_SUPPORTED,
            version::MAX_SUPPORTED
        )
    }
}

fn supported_range() -> (u32, u32) {
    // The constants are numeric literals.
    let min = parse_version(version::MIN_SUPPORTED).unwrap_or(1);
    let max = parse_version(version::MAX_SUPPORTED).unwrap_or(min);
    (min, max)
}

fn parse_version(s: &str) -> Result<u32, std::num::ParseIntError> {
    s.trim().parse::<u32>()
}

fn parse_range(s: &str) -> Result<(u32, u32), String> {
    let s = s.trim();
    match s.split_once('-') {
        Some((lo, hi)) => {
            let min = parse_version(lo).map_err(|e| e.to_string())?;
            let max = parse_version(hi).map_err(|e| e.to_string())?;
            if min > max {
                return Err(format!("min {} > max {}", min, max));
            }
            Ok((min, max))
        }
        None => {
            let v = parse_version(s).map_err(|e| e.to_string())?;
            Ok((v, v))
        }
    }
}
