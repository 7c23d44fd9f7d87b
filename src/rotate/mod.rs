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

//! A size-rotated log file.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//!
//! use logtee::rotate::RotatingFile;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut writer = RotatingFile::builder(dir.path().join("app.log"))
//!     .max_size_mb(100)
//!     .max_backups(5)
//!     .max_age(30)
//!     .compress(true)
//!     .build()
//!     .unwrap();
//!
//! writeln!(writer, "hello rotating file").unwrap();
//! ```

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use jiff::Timestamp;

use crate::DefaultTrap;
use crate::Error;
use crate::Trap;
use crate::config::DEFAULT_MAX_AGE;
use crate::config::DEFAULT_MAX_BACKUPS;
use crate::config::DEFAULT_MAX_FILE_SIZE;

use self::backup::Naming;
use self::mill::Mill;
use self::mill::Policy;

mod backup;
mod mill;

const MEGABYTE: u64 = 1024 * 1024;

/// Where backup timestamps and mill cutoffs come from.
#[derive(Debug, Clone, Copy, Default)]
enum Clock {
    #[default]
    System,
    #[cfg(test)]
    Pinned(Timestamp),
}

impl Clock {
    fn now(self) -> Timestamp {
        match self {
            Clock::System => Timestamp::now(),
            #[cfg(test)]
            Clock::Pinned(now) => now,
        }
    }
}

/// A writer to a log file that is rotated once it would grow past a maximum size.
///
/// The file is opened on the first write, appending to an existing file when there is room left.
/// When a write would push the file past the maximum size, the file is renamed to
/// `<stem>-<YYYY-MM-DDTHH-MM-SS.mmm><ext>` and a fresh file takes its place. Old backups are then
/// pruned and compressed by a background worker, according to the retention policy.
#[derive(Debug)]
pub struct RotatingFile {
    filename: PathBuf,
    naming: Naming,
    max_size: u64,
    size: u64,
    file: Option<File>,
    clock: Clock,
    // declared last: dropping it waits for pending runs, after the file is closed
    mill: Mill,
}

impl RotatingFile {
    /// Creates a new [`RotatingFileBuilder`] for the given file.
    ///
    /// # Examples
    ///
    /// ```
    /// use logtee::rotate::RotatingFile;
    ///
    /// let builder = RotatingFile::builder("/var/log/app.log");
    /// ```
    #[must_use]
    pub fn builder(filename: impl Into<PathBuf>) -> RotatingFileBuilder {
        RotatingFileBuilder::new(filename)
    }

    /// The location of the active log file.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Close the active file, move it aside as a backup and start a new one.
    pub fn rotate(&mut self) -> Result<(), Error> {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(Error::from_io_error)?;
        }

        let now = self.clock.now();
        self.open_new()?;
        self.mill.schedule(now);
        Ok(())
    }

    fn open_existing_or_new(&mut self, write_len: u64) -> Result<(), Error> {
        self.mill.schedule(self.clock.now());

        let metadata = match fs::metadata(&self.filename) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return self.open_new(),
            Err(err) => {
                return Err(Error::new("failed to get log file info")
                    .with_context("path", self.filename.display())
                    .with_source(err));
            }
        };

        if metadata.len() + write_len >= self.max_size {
            return self.rotate();
        }

        match OpenOptions::new().append(true).open(&self.filename) {
            Ok(file) => {
                self.file = Some(file);
                self.size = metadata.len();
                Ok(())
            }
            // start over if the existing file cannot be appended to
            Err(_) => self.open_new(),
        }
    }

    fn open_new(&mut self) -> Result<(), Error> {
        fs::create_dir_all(self.naming.dir()).map_err(|err| {
            Error::new("failed to create log directory")
                .with_context("dir", self.naming.dir().display())
                .with_source(err)
        })?;

        let permissions = match fs::metadata(&self.filename) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(Error::new("failed to get log file info")
                    .with_context("path", self.filename.display())
                    .with_source(err));
            }
        };

        if permissions.is_some() {
            let backup = self.naming.backup_path(self.clock.now());
            fs::rename(&self.filename, &backup).map_err(|err| {
                Error::new("failed to rotate log")
                    .with_context("from", self.filename.display())
                    .with_context("to", backup.display())
                    .with_source(err)
            })?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let file = options.open(&self.filename).map_err(|err| {
            Error::new("failed to create log file")
                .with_context("path", self.filename.display())
                .with_source(err)
        })?;

        if let Some(permissions) = permissions {
            file.set_permissions(permissions).map_err(|err| {
                Error::new("failed to keep log file permissions")
                    .with_context("path", self.filename.display())
                    .with_source(err)
            })?;
        }

        self.file = Some(file);
        self.size = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let write_len = buf.len() as u64;
        if write_len > self.max_size {
            return Err(io::Error::other(format!(
                "write length {write_len} exceeds maximum file size {}",
                self.max_size
            )));
        }

        if self.file.is_none() {
            self.open_existing_or_new(write_len)
                .map_err(io::Error::other)?;
        }

        if self.size + write_len > self.max_size {
            self.rotate().map_err(io::Error::other)?;
        }

        let Some(file) = self.file.as_mut() else {
            return Err(io::Error::other("log file is not open"));
        };
        let n = file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RotatingFile {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// A builder for configuring [`RotatingFile`].
///
/// Defaults to a maximum size of 1024 MB, 3 backups and 7 days of retention, with compression.
#[derive(Debug)]
pub struct RotatingFileBuilder {
    filename: PathBuf,
    max_size: u64,
    max_backups: usize,
    max_age: u32,
    compress: bool,
    local_time: bool,
    clock: Clock,
    trap: Arc<dyn Trap>,
}

impl RotatingFileBuilder {
    /// Creates a new [`RotatingFileBuilder`].
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            max_size: DEFAULT_MAX_FILE_SIZE * MEGABYTE,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age: DEFAULT_MAX_AGE,
            compress: true,
            local_time: false,
            clock: Clock::default(),
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Set the maximum size of the log file in megabytes.
    #[must_use]
    pub fn max_size_mb(mut self, n: u64) -> Self {
        self.max_size = n.saturating_mul(MEGABYTE);
        self
    }

    /// Set the maximum size of the log file in bytes.
    #[must_use]
    pub fn max_size_bytes(mut self, n: u64) -> Self {
        self.max_size = n;
        self
    }

    /// Set the maximum number of backups to keep. Zero keeps all of them.
    #[must_use]
    pub fn max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    /// Set the maximum age of backups in days. Zero disables age-based removal.
    #[must_use]
    pub fn max_age(mut self, days: u32) -> Self {
        self.max_age = days;
        self
    }

    /// Set whether backups are gzip-compressed.
    #[must_use]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set whether backup names use local time instead of UTC.
    #[must_use]
    pub fn local_time(mut self, local_time: bool) -> Self {
        self.local_time = local_time;
        self
    }

    /// Set the trap for errors raised by the background maintenance of backups.
    #[must_use]
    pub fn trap(mut self, trap: Arc<dyn Trap>) -> Self {
        self.trap = trap;
        self
    }

    #[cfg(test)]
    fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the [`RotatingFile`].
    ///
    /// No file is touched until the first write.
    ///
    /// # Errors
    ///
    /// Return an error if either:
    ///
    /// * The filename is empty or not valid UTF-8.
    /// * The maximum size is zero.
    /// * The background worker cannot be spawned.
    pub fn build(self) -> Result<RotatingFile, Error> {
        let Self {
            filename,
            max_size,
            max_backups,
            max_age,
            compress,
            local_time,
            clock,
            trap,
        } = self;

        if filename.as_os_str().is_empty() {
            return Err(Error::new("log filename must not be empty"));
        }
        if max_size == 0 {
            return Err(Error::new("maximum log file size must be positive")
                .with_context("path", filename.display()));
        }

        let naming = Naming::new(&filename, local_time)?;
        let policy = Policy {
            max_backups,
            max_age,
            compress,
        };
        let mill = Mill::spawn(naming.clone(), policy, trap)?;

        Ok(RotatingFile {
            filename,
            naming,
            max_size,
            size: 0,
            file: None,
            clock,
            mill,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;
    use std::io::Write;
    use std::path::Path;
    use std::str::FromStr;

    use flate2::read::GzDecoder;
    use jiff::SignedDuration;
    use jiff::Timestamp;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;

    fn start_time() -> Timestamp {
        Timestamp::from_str("2024-08-10T00:00:00Z").unwrap()
    }

    fn builder(dir: &Path) -> RotatingFileBuilder {
        RotatingFileBuilder::new(dir.join("app.log"))
            .max_backups(0)
            .max_age(0)
            .compress(false)
            .clock(Clock::Pinned(start_time()))
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect()
    }

    #[test]
    fn test_file_rolling_via_file_size() {
        test_file_rolling_for_specific_file_size(1000);
        test_file_rolling_for_specific_file_size(6666);
        test_file_rolling_for_specific_file_size(10000);
    }

    fn test_file_rolling_for_specific_file_size(max_size: u64) {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = builder(temp_dir.path()).max_size_bytes(max_size).build().unwrap();

        let mut now = start_time();
        let mut expected_size = 0;
        let mut expected_backups = 0;
        for _ in 0..500 {
            // distinct backup names
            now += SignedDuration::from_secs(1);
            writer.clock = Clock::Pinned(now);

            let rand_str = generate_random_string();
            if expected_size + rand_str.len() as u64 > max_size {
                expected_backups += 1;
                expected_size = 0;
            }
            expected_size += rand_str.len() as u64;

            assert_eq!(writer.write(rand_str.as_bytes()).unwrap(), rand_str.len());
            assert_eq!(writer.size, expected_size);
            assert!(writer.size <= max_size);
        }

        writer.flush().unwrap();
        assert!(expected_backups > 0);
        assert_eq!(file_count(temp_dir.path()), expected_backups + 1);
        assert_eq!(writer.naming.list_backups().unwrap().len(), expected_backups);
    }

    #[test]
    fn test_write_larger_than_max_size() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = builder(temp_dir.path()).max_size_bytes(10).build().unwrap();

        let err = writer.write(b"this line is too long").unwrap_err();
        assert!(
            err.to_string()
                .contains("write length 21 exceeds maximum file size 10"),
            "{err}"
        );
        // nothing was opened for an oversized write
        assert_eq!(file_count(temp_dir.path()), 0);
    }

    #[test]
    fn test_append_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let mut writer = builder(temp_dir.path()).max_size_bytes(100).build().unwrap();
        writer.write_all(b"new\n").unwrap();
        drop(writer);

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
        assert_eq!(file_count(temp_dir.path()), 1);
    }

    #[test]
    fn test_full_existing_file_is_rotated_first() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        fs::write(&path, "x".repeat(95)).unwrap();

        let mut writer = builder(temp_dir.path()).max_size_bytes(100).build().unwrap();
        writer.write_all(b"fresh\n").unwrap();

        let backups = writer.naming.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].timestamp, start_time());
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "x".repeat(95));
        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_create_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let mut writer = builder(&nested).build().unwrap();
        writer.write_all(b"hello\n").unwrap();

        assert_eq!(
            fs::read_to_string(nested.join("app.log")).unwrap(),
            "hello\n"
        );
    }

    #[test]
    fn test_explicit_rotate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.log");
        let mut writer = builder(temp_dir.path()).build().unwrap();

        writer.write_all(b"before\n").unwrap();
        writer.clock = Clock::Pinned(start_time() + SignedDuration::from_secs(5));
        writer.rotate().unwrap();
        writer.write_all(b"after\n").unwrap();

        let backups = writer.naming.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            backups[0].path.file_name().unwrap(),
            "app-2024-08-10T00-00-05.000.log"
        );
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
    }

    #[test]
    fn test_max_backups_retained() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = builder(temp_dir.path()).max_backups(2).build().unwrap();

        let mut now = start_time();
        for i in 0..5 {
            now += SignedDuration::from_secs(1);
            writer.clock = Clock::Pinned(now);
            writeln!(writer, "generation {i}").unwrap();
            writer.rotate().unwrap();
        }
        let naming = writer.naming.clone();
        drop(writer);

        let backups = naming.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "generation 4\n");
        assert_eq!(fs::read_to_string(&backups[1].path).unwrap(), "generation 3\n");
    }

    #[test]
    fn test_expired_backups_removed() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = builder(temp_dir.path()).max_age(1).build().unwrap();

        writer.write_all(b"day one\n").unwrap();
        writer.rotate().unwrap();

        writer.clock = Clock::Pinned(start_time() + SignedDuration::from_hours(72));
        writer.write_all(b"day four\n").unwrap();
        writer.rotate().unwrap();

        let naming = writer.naming.clone();
        drop(writer);

        let backups = naming.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0].path).unwrap(), "day four\n");
    }

    #[test]
    fn test_backups_compressed() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = builder(temp_dir.path()).compress(true).build().unwrap();

        writer.write_all(b"compress me\n").unwrap();
        writer.rotate().unwrap();
        writer.write_all(b"still active\n").unwrap();

        let naming = writer.naming.clone();
        drop(writer);

        let backups = naming.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].compressed);
        assert_eq!(file_count(temp_dir.path()), 2);

        let mut content = String::new();
        GzDecoder::new(fs::File::open(&backups[0].path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "compress me\n");
    }

    #[test]
    fn test_max_size_units() {
        let builder = RotatingFileBuilder::new("app.log").max_size_mb(2);
        assert_eq!(builder.max_size, 2 * 1024 * 1024);
        let builder = builder.max_size_bytes(17);
        assert_eq!(builder.max_size, 17);
        let builder = builder.max_size_mb(u64::MAX);
        assert_eq!(builder.max_size, u64::MAX);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(RotatingFileBuilder::new("").build().is_err());
        assert!(RotatingFileBuilder::new("app.log").max_size_mb(0).build().is_err());
    }
}
