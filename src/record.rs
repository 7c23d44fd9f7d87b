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

//! Severity levels and the log record passed to the layout.

use std::fmt;

use jiff::Timestamp;

use crate::kv::Value;

/// An enum representing the available severity levels, from the least to the most severe.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates errors.
    Error,
    /// Designates errors that should never happen.
    DPanic,
    /// Designates errors after which the caller panics.
    Panic,
    /// Designates errors after which the process exits.
    Fatal,
}

impl Level {
    /// Return the capitalized label of the `Level`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::DPanic => "DPANIC",
            Level::Panic => "PANIC",
            Level::Fatal => "FATAL",
        }
    }

    /// Map a configured level name to a level.
    ///
    /// Only `debug`, `info`, `warn`, `error` and `panic` are recognized, matched exactly. Any
    /// other name falls back to [`Level::Info`].
    ///
    /// # Examples
    ///
    /// ```
    /// use logtee::Level;
    ///
    /// assert_eq!(Level::from_name("warn"), Level::Warn);
    /// assert_eq!(Level::from_name("verbose"), Level::Info);
    /// ```
    pub fn from_name(name: &str) -> Level {
        match name {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" => Level::Warn,
            "error" => Level::Error,
            "panic" => Level::Panic,
            _ => Level::Info,
        }
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The source location of a logging call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Caller<'a> {
    pub(crate) file: &'a str,
    pub(crate) line: u32,
}

/// The payload of a log message.
#[derive(Clone, Debug)]
pub(crate) struct Record<'a> {
    time: Timestamp,
    level: Level,
    caller: Option<Caller<'a>>,
    message: &'a str,
    // fields bound to the logger via `with`
    context: &'a [(String, Value)],
    // fields passed to the call
    fields: &'a [(&'a str, Value)],
}

impl<'a> Record<'a> {
    pub(crate) fn new(level: Level, message: &'a str) -> Self {
        Self {
            time: Timestamp::now(),
            level,
            caller: None,
            message,
            context: &[],
            fields: &[],
        }
    }

    #[cfg(test)]
    pub(crate) fn with_time(mut self, time: Timestamp) -> Self {
        self.time = time;
        self
    }

    pub(crate) fn with_caller(mut self, caller: Option<Caller<'a>>) -> Self {
        self.caller = caller;
        self
    }

    pub(crate) fn with_context(mut self, context: &'a [(String, Value)]) -> Self {
        self.context = context;
        self
    }

    pub(crate) fn with_fields(mut self, fields: &'a [(&'a str, Value)]) -> Self {
        self.fields = fields;
        self
    }

    pub(crate) fn time(&self) -> Timestamp {
        self.time
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    pub(crate) fn caller(&self) -> Option<Caller<'a>> {
        self.caller
    }

    pub(crate) fn message(&self) -> &'a str {
        self.message
    }

    /// Context fields first, then the fields of this call.
    pub(crate) fn fields(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        let context = self.context.iter().map(|(k, v)| (k.as_str(), v));
        let fields = self.fields.iter().map(|(k, v)| (*k, v));
        context.chain(fields)
    }

    pub(crate) fn has_fields(&self) -> bool {
        !self.context.is_empty() || !self.fields.is_empty()
    }
}
