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

use std::io::Write;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::rotate::RotatingFile;
use crate::sink::Sink;

/// A sink that appends log lines to a [`RotatingFile`].
#[derive(Debug)]
pub struct FileSink {
    writer: Mutex<RotatingFile>,
}

impl FileSink {
    /// Create a sink writing through the given rotating file.
    pub fn new(writer: RotatingFile) -> Self {
        let writer = Mutex::new(writer);
        Self { writer }
    }

    fn writer(&self) -> MutexGuard<'_, RotatingFile> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Rotate the underlying file now, regardless of its size.
    pub fn rotate(&self) -> Result<(), Error> {
        self.writer().rotate()
    }
}

impl Sink for FileSink {
    fn write(&self, line: &[u8]) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.write_all(line).map_err(|err| {
            Error::new("failed to write log file")
                .with_context("path", writer.filename().display())
                .with_source(err)
        })
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer();
        writer.flush().map_err(Error::from_io_error)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_forced_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let writer = RotatingFile::builder(&path)
            .max_backups(0)
            .max_age(0)
            .compress(false)
            .build()
            .unwrap();
        let sink = FileSink::new(writer);

        sink.write(b"before\n").unwrap();
        sink.rotate().unwrap();
        sink.write(b"after\n").unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
        let backups = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p != &path)
            .collect::<Vec<_>>();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "before\n");
    }

    #[test]
    fn test_oversized_line_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let writer = RotatingFile::builder(&path)
            .max_size_bytes(4)
            .build()
            .unwrap();
        let sink = FileSink::new(writer);

        let err = sink.write(b"too long\n").unwrap_err();
        assert_eq!(err.message(), "failed to write log file");
        assert!(err.to_string().contains(&path.display().to_string()), "{err}");
    }
}
