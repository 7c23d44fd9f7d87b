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

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use jiff::SignedDuration;
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::Error;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";
pub(crate) const COMPRESS_SUFFIX: &str = ".gz";

/// How backups of one log file are named: `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm><ext>`, optionally
/// followed by `.gz` once compressed.
#[derive(Debug, Clone)]
pub(crate) struct Naming {
    dir: PathBuf,
    stem: String,
    ext: String,
    timezone: TimeZone,
}

/// A rotated file found next to the active log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Backup {
    pub(crate) path: PathBuf,
    pub(crate) timestamp: Timestamp,
    pub(crate) compressed: bool,
}

impl Backup {
    /// The file name with any compression suffix removed, so that a backup and its compressed
    /// form are the same logical backup.
    pub(crate) fn logical_name(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.compressed {
            if let Some(stripped) = name.strip_suffix(COMPRESS_SUFFIX) {
                return stripped.to_string();
            }
        }
        name
    }
}

impl Naming {
    pub(crate) fn new(filename: &Path, local_time: bool) -> Result<Self, Error> {
        let stem = filename
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                Error::new("log filename must be valid UTF-8 and not empty")
                    .with_context("path", filename.display())
            })?;
        let ext = filename
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let dir = match filename.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let timezone = if local_time {
            TimeZone::system()
        } else {
            TimeZone::UTC
        };

        Ok(Self {
            dir,
            stem: stem.to_string(),
            ext,
            timezone,
        })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn backup_path(&self, timestamp: Timestamp) -> PathBuf {
        let time = self.timezone.to_datetime(timestamp);
        let millis = time.subsec_nanosecond() / 1_000_000;
        let filename = format!(
            "{stem}-{time}.{millis:03}{ext}",
            stem = self.stem,
            time = time.strftime(BACKUP_TIME_FORMAT),
            ext = self.ext,
        );
        self.dir.join(filename)
    }

    fn parse_timestamp(&self, filename: &str) -> Option<Timestamp> {
        let rest = filename.strip_prefix(&self.stem)?.strip_prefix('-')?;
        let rest = rest.strip_suffix(self.ext.as_str())?;
        let (time, millis) = rest.split_once('.')?;
        if millis.len() != 3 || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let millis = millis.parse::<i64>().ok()?;
        let time = DateTime::strptime(BACKUP_TIME_FORMAT, time).ok()?;
        let time = time.checked_add(SignedDuration::from_millis(millis)).ok()?;
        time.to_zoned(self.timezone.clone())
            .ok()
            .map(|zoned| zoned.timestamp())
    }

    fn parse_backup(&self, filename: &str) -> Option<(Timestamp, bool)> {
        if let Some(timestamp) = self.parse_timestamp(filename) {
            return Some((timestamp, false));
        }
        let uncompressed = filename.strip_suffix(COMPRESS_SUFFIX)?;
        self.parse_timestamp(uncompressed)
            .map(|timestamp| (timestamp, true))
    }

    /// List all backups of the log file, newest first.
    pub(crate) fn list_backups(&self) -> Result<Vec<Backup>, Error> {
        let read_dir = fs::read_dir(&self.dir).map_err(|err| {
            Error::new("failed to read log dir")
                .with_context("dir", self.dir.display())
                .with_source(err)
        })?;

        let mut backups = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let metadata = entry.metadata().ok()?;
                // the writer only creates files, not directories or symlinks
                if !metadata.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                // if the filename is not a UTF-8 string, skip it.
                let filename = filename.to_str()?;
                let (timestamp, compressed) = self.parse_backup(filename)?;
                Some(Backup {
                    path: entry.path(),
                    timestamp,
                    compressed,
                })
            })
            .collect::<Vec<_>>();

        backups.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(backups)
    }
}
