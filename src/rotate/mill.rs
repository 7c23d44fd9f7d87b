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

//! Background maintenance of rotated files: retention by count and age, then compression.

use std::collections::HashSet;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;
use flate2::Compression;
use flate2::write::GzEncoder;
use jiff::SignedDuration;
use jiff::Timestamp;

use crate::Error;
use crate::Trap;
use crate::rotate::backup::Backup;
use crate::rotate::backup::COMPRESS_SUFFIX;
use crate::rotate::backup::Naming;

/// What to keep of the rotated files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Policy {
    /// Zero keeps every backup.
    pub(crate) max_backups: usize,
    /// In days; zero disables age-based removal.
    pub(crate) max_age: u32,
    pub(crate) compress: bool,
}

impl Policy {
    fn is_noop(&self) -> bool {
        self.max_backups == 0 && self.max_age == 0 && !self.compress
    }
}

/// Apply `policy` to the backups of `naming` as of `now`.
///
/// Every removal and compression is attempted; the first failure is returned.
pub(crate) fn run_once(naming: &Naming, policy: &Policy, now: Timestamp) -> Result<(), Error> {
    if policy.is_noop() {
        return Ok(());
    }

    let mut remaining = naming.list_backups()?;
    let mut remove = vec![];

    if policy.max_backups > 0 && policy.max_backups < remaining.len() {
        let mut preserved = HashSet::new();
        let mut kept = vec![];
        for backup in remaining {
            preserved.insert(backup.logical_name());
            if preserved.len() > policy.max_backups {
                remove.push(backup);
            } else {
                kept.push(backup);
            }
        }
        remaining = kept;
    }

    if policy.max_age > 0 {
        let max_age = SignedDuration::from_hours(24 * i64::from(policy.max_age));
        if let Ok(cutoff) = now.checked_sub(max_age) {
            let (expired, kept) = remaining
                .into_iter()
                .partition::<Vec<_>, _>(|backup| backup.timestamp < cutoff);
            remove.extend(expired);
            remaining = kept;
        }
    }

    let compress: Vec<Backup> = if policy.compress {
        remaining
            .into_iter()
            .filter(|backup| !backup.compressed)
            .collect()
    } else {
        vec![]
    };

    let mut first_err = None;
    for backup in &remove {
        if let Err(err) = fs::remove_file(&backup.path) {
            let err = Error::new("failed to remove old log")
                .with_context("path", backup.path.display())
                .with_source(err);
            first_err.get_or_insert(err);
        }
    }
    for backup in &compress {
        if let Err(err) = compress_backup(backup) {
            first_err.get_or_insert(err);
        }
    }

    match first_err {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn compress_backup(backup: &Backup) -> Result<(), Error> {
    let src = &backup.path;
    let dst = PathBuf::from(format!("{}{COMPRESS_SUFFIX}", src.display()));

    if let Err(err) = gzip(src, &dst) {
        let _ = fs::remove_file(&dst);
        return Err(Error::new("failed to compress log")
            .with_context("path", src.display())
            .with_source(err));
    }

    fs::remove_file(src).map_err(|err| {
        Error::new("failed to remove compressed log")
            .with_context("path", src.display())
            .with_source(err)
    })
}

fn gzip(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = File::open(src)?;
    let permissions = input.metadata()?.permissions();

    let output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)?;
    output.set_permissions(permissions)?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    let output = encoder.finish()?;
    output.sync_all()
}

/// A worker thread that runs [`run_once`] for every request, in order.
///
/// Dropping the mill waits for the pending requests to finish.
#[derive(Debug)]
pub(crate) struct Mill {
    sender: Option<Sender<Timestamp>>,
    handle: Option<JoinHandle<()>>,
}

impl Mill {
    /// Spawn the worker; no thread is started if `policy` never touches any file.
    pub(crate) fn spawn(
        naming: Naming,
        policy: Policy,
        trap: Arc<dyn Trap>,
    ) -> Result<Mill, Error> {
        if policy.is_noop() {
            return Ok(Mill {
                sender: None,
                handle: None,
            });
        }

        let (sender, receiver) = unbounded();
        let handle = std::thread::Builder::new()
            .name("logtee-mill".to_string())
            .spawn(move || work(receiver, naming, policy, trap))
            .map_err(|err| Error::new("failed to spawn the log mill thread").with_source(err))?;

        Ok(Mill {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Request a run as of `now`.
    pub(crate) fn schedule(&self, now: Timestamp) {
        if let Some(sender) = &self.sender {
            // only fails once the worker is gone, and then there is nobody left to run
            let _ = sender.send(now);
        }
    }
}

fn work(receiver: Receiver<Timestamp>, naming: Naming, policy: Policy, trap: Arc<dyn Trap>) {
    for now in receiver {
        if let Err(err) = run_once(&naming, &policy, now) {
            trap.trap(&err);
        }
    }
}

impl Drop for Mill {
    fn drop(&mut self) {
        // disconnect, so the worker stops after the pending requests
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::str::FromStr;

    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    use super::*;

    struct Fixture {
        dir: TempDir,
        naming: Naming,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let naming = Naming::new(&dir.path().join("app.log"), false).unwrap();
            Fixture { dir, naming }
        }

        fn backup(&self, time: &str, content: &str) -> PathBuf {
            let path = self.naming.backup_path(Timestamp::from_str(time).unwrap());
            fs::write(&path, content).unwrap();
            path
        }

        fn names(&self) -> Vec<String> {
            let mut names = fs::read_dir(self.dir.path())
                .unwrap()
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            names.sort();
            names
        }
    }

    fn now() -> Timestamp {
        Timestamp::from_str("2024-08-20T00:00:00Z").unwrap()
    }

    #[test]
    fn test_keep_newest_backups() {
        let fixture = Fixture::new();
        fixture.backup("2024-08-10T00:00:00Z", "1");
        fixture.backup("2024-08-11T00:00:00Z", "2");
        fixture.backup("2024-08-12T00:00:00Z", "3");
        fixture.backup("2024-08-13T00:00:00Z", "4");

        let policy = Policy {
            max_backups: 2,
            max_age: 0,
            compress: false,
        };
        run_once(&fixture.naming, &policy, now()).unwrap();

        assert_eq!(
            fixture.names(),
            [
                "app-2024-08-12T00-00-00.000.log",
                "app-2024-08-13T00-00-00.000.log"
            ]
        );
    }

    #[test]
    fn test_compressed_and_plain_count_once() {
        let fixture = Fixture::new();
        let plain = fixture.backup("2024-08-12T00:00:00Z", "3");
        fs::write(format!("{}.gz", plain.display()), "3").unwrap();
        fixture.backup("2024-08-11T00:00:00Z", "2");

        let policy = Policy {
            max_backups: 1,
            max_age: 0,
            compress: false,
        };
        run_once(&fixture.naming, &policy, now()).unwrap();

        assert_eq!(
            fixture.names(),
            [
                "app-2024-08-12T00-00-00.000.log",
                "app-2024-08-12T00-00-00.000.log.gz"
            ]
        );
    }

    #[test]
    fn test_remove_expired_backups() {
        let fixture = Fixture::new();
        fixture.backup("2024-08-10T00:00:00Z", "old");
        fixture.backup("2024-08-18T00:00:00Z", "recent");

        let policy = Policy {
            max_backups: 0,
            max_age: 7,
            compress: false,
        };
        run_once(&fixture.naming, &policy, now()).unwrap();

        assert_eq!(fixture.names(), ["app-2024-08-18T00-00-00.000.log"]);
    }

    #[test]
    fn test_compress_remaining_backups() {
        let fixture = Fixture::new();
        let content = "first line\nsecond line\n".repeat(100);
        let path = fixture.backup("2024-08-18T00:00:00Z", &content);
        fs::write(fixture.dir.path().join("app.log"), "active").unwrap();

        let policy = Policy {
            max_backups: 3,
            max_age: 7,
            compress: true,
        };
        run_once(&fixture.naming, &policy, now()).unwrap();

        assert_eq!(
            fixture.names(),
            ["app-2024-08-18T00-00-00.000.log.gz", "app.log"]
        );

        let compressed = File::open(format!("{}.gz", path.display())).unwrap();
        let mut decompressed = String::new();
        GzDecoder::new(compressed)
            .read_to_string(&mut decompressed)
            .unwrap();
        assert_eq!(decompressed, content);
    }

    #[test]
    fn test_noop_policy_touches_nothing() {
        let fixture = Fixture::new();
        fixture.backup("2000-01-01T00:00:00Z", "ancient");

        let policy = Policy {
            max_backups: 0,
            max_age: 0,
            compress: false,
        };
        run_once(&fixture.naming, &policy, now()).unwrap();
        assert_eq!(fixture.names(), ["app-2000-01-01T00-00-00.000.log"]);
    }

    #[test]
    fn test_mill_drains_on_drop() {
        let fixture = Fixture::new();
        fixture.backup("2024-08-10T00:00:00Z", "1");
        fixture.backup("2024-08-11T00:00:00Z", "2");

        let policy = Policy {
            max_backups: 1,
            max_age: 0,
            compress: true,
        };
        let trap: Arc<dyn Trap> = Arc::new(crate::DefaultTrap::default());
        let mill = Mill::spawn(fixture.naming.clone(), policy, trap).unwrap();
        mill.schedule(now());
        drop(mill);

        assert_eq!(fixture.names(), ["app-2024-08-11T00-00-00.000.log.gz"]);
    }
}
