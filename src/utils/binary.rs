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

//! Platform-specific tool binary naming and resolution.
//!
//! Packaged MIST tools are named `{tool}-{os}-{arch}{ext}`. Resolution checks
//! the override directory (`MIST_BIN_DIR`), then the bundled directory, and
//! finally falls back to the bare tool name so the OS executable search
//! applies at spawn time.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Operating system name as used in binary file names.
///
/// Matches the Go toolchain names the tool binaries are built with, so
/// macOS is `darwin`.
pub fn platform_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Fold architecture aliases onto the `amd64`/`arm64` names.
pub fn normalize_arch(machine: &str) -> String {
    let machine = machine.to_lowercase();
    match machine.as_str() {
        "x86_64" | "amd64" | "x64" => "amd64".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        _ => machine,
    }
}

/// `{tool}-{os}-{arch}{ext}` for an explicit platform.
pub fn binary_name_for(tool: &str, os: &str, machine: &str) -> String {
    let os = os.to_lowercase();
    let ext = if os == "windows" { ".exe" } else { "" };
    format!("{}-{}-{}{}", tool, os, normalize_arch(machine), ext)
}

/// Binary file name of `tool` for the running platform.
pub fn binary_name(tool: &str) -> String {
    binary_name_for(tool, platform_os(), std::env::consts::ARCH)
}

/// Default bundled location: a `bin` directory next to the running executable.
pub fn default_bundled_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent()
        .map(|dir| dir.join(crate::mist_core::constants::config::BUNDLED_DIR_NAME))
}

/// Resolves a logical tool name to the executable that will be spawned.
#[derive(Debug, Clone, Default)]
pub struct BinaryResolver {
    override_dir: Option<PathBuf>,
    bundled_dir: Option<PathBuf>,
}

impl BinaryResolver {
    pub fn new(override_dir: Option<PathBuf>, bundled_dir: Option<PathBuf>) -> Self {
        Self {
            override_dir,
            bundled_dir,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.bin_dir.clone(), config.bundled_dir.clone())
    }

    /// Resolve `tool`: override dir, then bundled dir, then the bare name.
    pub fn resolve(&self, tool: &str) -> PathBuf {
        let name = binary_name(tool);

        for dir in [&self.override_dir, &self.bundled_dir].into_iter().flatten() {
            if let Some(found) = existing(dir, &name) {
                debug!("Resolved tool '{}' to {}", tool, found.display());
                return found;
            }
        }

        debug!("Tool '{}' not packaged, deferring to executable search", tool);
        PathBuf::from(tool)
    }
}

fn existing(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(name);
    candidate.exists().then_some(candidate)
}
