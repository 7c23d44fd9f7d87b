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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::Error;
use crate::sink::Sink;

/// A sink that keeps every line in memory.
///
/// Clones share the same buffer, so one clone can be handed to the logger while another inspects
/// what was written. This is mostly useful in tests, or to keep console output out of stdout.
///
/// # Examples
///
/// ```
/// use logtee::Adapter;
/// use logtee::sink::Capture;
///
/// let dir = tempfile::tempdir().unwrap();
/// let console = Capture::default();
///
/// let mut adapter = Adapter::new(dir.path().join("app.log"), "info");
/// adapter.set_color(false).set_console(console.clone());
/// let logger = adapter.build().unwrap();
///
/// logger.info(&[&"hello", &42]);
/// assert!(console.contents().ends_with("\tINFO\thello 42\n"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer()).into_owned()
    }

    /// Everything written so far, split into lines without their newlines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Drop everything written so far.
    pub fn clear(&self) {
        self.buffer().clear();
    }
}

impl Sink for Capture {
    fn write(&self, line: &[u8]) -> Result<(), Error> {
        self.buffer().extend_from_slice(line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_and_clear_the_buffer() {
        let capture = Capture::default();
        let reader = capture.clone();

        capture.write(b"first\n").unwrap();
        capture.write(b"second\n").unwrap();
        assert_eq!(reader.lines(), ["first", "second"]);

        reader.clear();
        assert!(capture.contents().is_empty());

        capture.write(b"third\n").unwrap();
        assert_eq!(reader.contents(), "third\n");
    }
}
