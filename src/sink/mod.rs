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

//! Destinations that receive encoded log lines.

use std::fmt;

use crate::Error;

mod capture;
mod file;
mod stdio;

pub use self::capture::Capture;
pub use self::file::FileSink;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;

/// A destination for encoded log lines.
///
/// Every record is encoded once and the same bytes, including the trailing newline, are handed to
/// each sink. Sinks are shared by all clones of a [`Logger`](crate::Logger), so they must
/// serialize concurrent writes themselves.
pub trait Sink: fmt::Debug + Send + Sync + 'static {
    /// Write one encoded line.
    fn write(&self, line: &[u8]) -> Result<(), Error>;

    /// Flush any buffered lines.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Sink> From<T> for Box<dyn Sink> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
