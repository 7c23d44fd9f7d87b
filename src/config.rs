// Copyright 2024 FastLabs Developers
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

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Level;

pub(crate) const DEFAULT_MAX_FILE_SIZE: u64 = 1024;
pub(crate) const DEFAULT_MAX_BACKUPS: usize = 3;
pub(crate) const DEFAULT_MAX_AGE: u32 = 7;

/// The configuration of an [`Adapter`](crate::Adapter).
///
/// Every field but `path` has a default, so a minimal configuration file only names the log file:
///
/// ```
/// use logtee::LoggerConfig;
///
/// let config: LoggerConfig = serde_json::from_str(r#"{"path": "/var/log/app.log"}"#).unwrap();
/// assert_eq!(config.level, "info");
/// assert_eq!(config.max_file_size, 1024);
/// assert!(config.compress);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Location of the active log file.
    pub path: PathBuf,
    /// Name of the minimum level; unrecognized names mean `info`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Maximum size of the active log file in megabytes before it is rotated.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of rotated files to retain. Zero retains all of them.
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Maximum age of rotated files in days. Zero disables age-based removal.
    #[serde(default = "default_max_age")]
    pub max_age: u32,
    /// Whether rotated files are gzip-compressed.
    #[serde(default = "default_true")]
    pub compress: bool,
    /// Whether records carry the call site.
    #[serde(default)]
    pub show_caller: bool,
    /// Whether level labels are colorized.
    #[serde(default = "default_true")]
    pub color: bool,
    /// Whether rotated file names use local time instead of UTC.
    #[serde(default)]
    pub local_time: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

fn default_max_age() -> u32 {
    DEFAULT_MAX_AGE
}

fn default_true() -> bool {
    true
}

impl LoggerConfig {
    /// Create a configuration for the given file and level name, with every other field at its
    /// default.
    pub fn new(path: impl Into<PathBuf>, level: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            level: level.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: DEFAULT_MAX_AGE,
            compress: true,
            show_caller: false,
            color: true,
            local_time: false,
        }
    }

    /// The minimum level records must have to be emitted.
    pub fn threshold(&self) -> Level {
        Level::from_name(&self.level)
    }

    /// The rotation threshold in bytes.
    pub fn max_size_bytes(&self) -> u64 {
        self.max_file_size.saturating_mul(1024 * 1024)
    }
}
