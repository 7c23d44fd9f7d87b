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

use std::fmt::Write;

use colored::Color;
use jiff::tz::TimeZone;

use crate::Error;
use crate::Level;
use crate::record::Caller;
use crate::record::Record;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A layout that formats log records as tab-separated console lines.
///
/// Output format:
///
/// ```text
/// 2024-08-11 22:44:57	INFO	event
/// 2024-08-11 22:44:57	WARN	logtee/app.rs:52	disk almost full	{"free_mb": 12}
/// 2024-08-11 22:44:57	ERROR	request failed	{"status": 503, "retry": true}
/// ```
///
/// The caller column only appears when enabled, and the fields column only when the record has
/// fields. The same bytes are written to every sink, so colorized labels end up in the log file
/// as escape sequences too.
#[derive(Debug, Clone)]
pub(crate) struct ConsoleLayout {
    colors: LevelColor,
    no_color: bool,
    show_caller: bool,
    timezone: TimeZone,
}

impl Default for ConsoleLayout {
    fn default() -> Self {
        Self {
            colors: LevelColor::default(),
            no_color: false,
            show_caller: false,
            timezone: TimeZone::system(),
        }
    }
}

impl ConsoleLayout {
    pub(crate) fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub(crate) fn show_caller(mut self, show_caller: bool) -> Self {
        self.show_caller = show_caller;
        self
    }

    #[cfg(test)]
    fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    pub(crate) fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let time = self.timezone.to_datetime(record.time());
        let mut text = time.strftime(TIMESTAMP_FORMAT).to_string();

        let level = self.colors.colorize_record_level(self.no_color, record.level());
        // SAFETY: write to a string always succeeds
        write!(&mut text, "\t{level}").unwrap();

        if self.show_caller {
            if let Some(caller) = record.caller() {
                write!(&mut text, "\t{}", short_caller(caller)).unwrap();
            }
        }

        text.push('\t');
        text.push_str(record.message());

        if record.has_fields() {
            text.push_str("\t{");
            for (i, (key, value)) in record.fields().enumerate() {
                if i > 0 {
                    text.push_str(", ");
                }
                let key = serde_json::to_string(key)
                    .map_err(|err| Error::new("failed to encode field key").with_source(err))?;
                let value = serde_json::to_string(value).map_err(|err| {
                    Error::new("failed to encode field value")
                        .with_context("key", &key)
                        .with_source(err)
                })?;
                write!(&mut text, "{key}: {value}").unwrap();
            }
            text.push('}');
        }

        text.push('\n');
        Ok(text.into_bytes())
    }
}

/// Keep the last directory and the file name of the call site.
fn short_caller(caller: Caller) -> String {
    let file = caller.file;
    let trimmed = match file.rfind(['/', '\\']) {
        Some(last) => match file[..last].rfind(['/', '\\']) {
            Some(prev) => &file[prev + 1..],
            None => file,
        },
        None => file,
    };
    format!("{trimmed}:{}", caller.line)
}

/// Colors for different log levels.
#[derive(Debug, Clone)]
struct LevelColor {
    debug: Color,
    info: Color,
    warn: Color,
    error: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            debug: Color::Magenta,
            info: Color::Blue,
            warn: Color::Yellow,
            error: Color::Red,
        }
    }
}

impl LevelColor {
    /// Colorize the log level.
    ///
    /// The escape sequence does not depend on whether stdout is a terminal.
    fn colorize_record_level(&self, no_color: bool, level: Level) -> String {
        if no_color {
            return level.as_str().to_string();
        }

        let color = match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error | Level::DPanic | Level::Panic | Level::Fatal => self.error,
        };
        format!("\x1b[{}m{}\x1b[0m", color.to_fg_str(), level.as_str())
    }
}
