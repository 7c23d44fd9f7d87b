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
use std::sync::Arc;

use crate::DefaultTrap;
use crate::Error;
use crate::Logger;
use crate::LoggerConfig;
use crate::Trap;
use crate::layout::ConsoleLayout;
use crate::rotate::RotatingFile;
use crate::sink::FileSink;
use crate::sink::Sink;
use crate::sink::Stdout;

/// The unbuilt, configurable state of a logger.
///
/// Create one with [`Adapter::new`] or [`Adapter::from_config`], adjust it with the setters, then
/// call [`Adapter::build`] to get the [`Logger`]. Building consumes the adapter, so the
/// configuration cannot change once records flow.
///
/// # Examples
///
/// ```
/// use logtee::Adapter;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut adapter = Adapter::new(dir.path().join("app.log"), "warn");
/// adapter
///     .set_max_file_size(64)
///     .set_max_backups(10)
///     .set_max_age(14)
///     .set_compress(false)
///     .set_show_caller(true);
///
/// let logger = adapter.build().unwrap();
/// logger.warn(&[&"disk almost full"]);
/// ```
#[must_use = "call `build` to get a logger"]
#[derive(Debug)]
pub struct Adapter {
    config: LoggerConfig,
    console: Box<dyn Sink>,
    trap: Arc<dyn Trap>,
}

impl Adapter {
    /// Create an adapter for the given log file and level name.
    ///
    /// Rotation defaults to 1024 MB files, 3 backups and 7 days, compressed. Unrecognized level
    /// names mean `info`.
    pub fn new(path: impl Into<PathBuf>, level: impl Into<String>) -> Self {
        Self::from_config(LoggerConfig::new(path, level))
    }

    /// Create an adapter from a complete configuration.
    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            console: Box::new(Stdout::default()),
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// The configuration as set so far.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Set the maximum size of the log file in megabytes before it is rotated.
    pub fn set_max_file_size(&mut self, megabytes: u64) -> &mut Self {
        self.config.max_file_size = megabytes;
        self
    }

    /// Set the maximum number of rotated files to retain.
    pub fn set_max_backups(&mut self, n: usize) -> &mut Self {
        self.config.max_backups = n;
        self
    }

    /// Set the maximum number of days to retain rotated files.
    pub fn set_max_age(&mut self, days: u32) -> &mut Self {
        self.config.max_age = days;
        self
    }

    /// Set whether rotated files are gzip-compressed.
    pub fn set_compress(&mut self, compress: bool) -> &mut Self {
        self.config.compress = compress;
        self
    }

    /// Set whether records carry the location of the logging call.
    pub fn set_show_caller(&mut self, show_caller: bool) -> &mut Self {
        self.config.show_caller = show_caller;
        self
    }

    /// Set whether level labels are colorized. Default to `true`.
    pub fn set_color(&mut self, color: bool) -> &mut Self {
        self.config.color = color;
        self
    }

    /// Set whether rotated file names use local time instead of UTC.
    pub fn set_local_time(&mut self, local_time: bool) -> &mut Self {
        self.config.local_time = local_time;
        self
    }

    /// Replace the console sink. Default to [`Stdout`].
    pub fn set_console(&mut self, console: impl Into<Box<dyn Sink>>) -> &mut Self {
        self.console = console.into();
        self
    }

    /// Replace the handler of write errors. Default to [`DefaultTrap`].
    pub fn set_trap(&mut self, trap: impl Trap) -> &mut Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Build the logger: the console sink and the rotating file, filtered at the configured level.
    ///
    /// The log file is opened on the first record.
    ///
    /// # Errors
    ///
    /// Return an error if the path is empty or the maximum file size is zero.
    pub fn build(self) -> Result<Logger, Error> {
        let Adapter {
            config,
            console,
            trap,
        } = self;

        if config.path.as_os_str().is_empty() {
            return Err(Error::new("log file path must not be empty"));
        }
        if config.max_file_size == 0 {
            return Err(Error::new("maximum log file size must be positive")
                .with_context("path", config.path.display()));
        }

        let mut layout = ConsoleLayout::default().show_caller(config.show_caller);
        if !config.color {
            layout = layout.no_color();
        }

        let file = RotatingFile::builder(config.path.clone())
            .max_size_bytes(config.max_size_bytes())
            .max_backups(config.max_backups)
            .max_age(config.max_age)
            .compress(config.compress)
            .local_time(config.local_time)
            .trap(trap.clone())
            .build()?;

        let sinks: Vec<Box<dyn Sink>> = vec![console, Box::new(FileSink::new(file))];
        Ok(Logger::new(config.threshold(), layout, sinks, trap))
    }
}
