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

//! Termination actions that follow a `PANIC` or `FATAL` record.
//!
//! Logging at these levels never terminates by itself. The logging call returns a token and the
//! caller decides when to act on it.
//!
//! ```should_panic
//! use logtee::Adapter;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = Adapter::new(dir.path().join("app.log"), "info").build().unwrap();
//!
//! logger.panicf(format_args!("invariant broken: {}", 42)).raise();
//! ```

/// The message of a `PANIC` record, ready to be raised as a panic.
#[must_use = "call `raise` to panic with the logged message"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panicking {
    message: String,
}

impl Panicking {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }

    /// The logged message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Panic with the logged message.
    #[track_caller]
    pub fn raise(self) -> ! {
        panic!("{}", self.message)
    }
}

/// The message of a `FATAL` record, ready to terminate the process.
#[must_use = "call `exit` to terminate the process"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exiting {
    message: String,
}

impl Exiting {
    pub(crate) fn new(message: String) -> Self {
        Self { message }
    }

    /// The logged message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Terminate the process with exit status 1.
    ///
    /// Destructors of the current stack do not run. The record has been flushed already.
    pub fn exit(self) -> ! {
        std::process::exit(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panicking_message() {
        let token = Panicking::new("boom".to_string());
        assert_eq!(token.message(), "boom");
    }

    #[test]
    #[should_panic(expected = "connection pool exhausted")]
    fn test_raise_panics_with_message() {
        Panicking::new("connection pool exhausted".to_string()).raise();
    }

    #[test]
    fn test_exiting_message() {
        let token = Exiting::new("cannot bind".to_string());
        assert_eq!(token.message(), "cannot bind");
    }
}
