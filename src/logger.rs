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

use std::fmt;
use std::fmt::Write;
use std::panic::Location;
use std::sync::Arc;

use crate::Error;
use crate::Exiting;
use crate::Level;
use crate::Panicking;
use crate::Trap;
use crate::Value;
use crate::layout::ConsoleLayout;
use crate::record::Caller;
use crate::record::Record;
use crate::sink::Sink;

/// A built logger.
///
/// Every level comes in three call shapes:
///
/// * plain, e.g. [`Logger::info`], joins the arguments with single spaces;
/// * formatted, e.g. [`Logger::infof`], takes [`format_args!`];
/// * keyed, e.g. [`Logger::infow`], takes a message and typed key-value fields.
///
/// Each record is encoded once and written to every sink in order. Write failures go to the
/// configured [`Trap`] and never reach the caller.
///
/// Cloning is cheap; clones share the sinks.
#[derive(Debug, Clone)]
pub struct Logger {
    core: Arc<Core>,
    context: Arc<[(String, Value)]>,
}

#[derive(Debug)]
struct Core {
    threshold: Level,
    layout: ConsoleLayout,
    sinks: Vec<Box<dyn Sink>>,
    trap: Arc<dyn Trap>,
}

impl Core {
    fn log(&self, record: &Record) {
        let line = match self.layout.format(record) {
            Ok(line) => line,
            Err(err) => {
                self.trap.trap(&err);
                return;
            }
        };

        for sink in &self.sinks {
            if let Err(err) = sink.write(&line) {
                self.trap.trap(&err);
            }
        }

        if record.level() > Level::Error {
            for sink in &self.sinks {
                if let Err(err) = sink.flush() {
                    self.trap.trap(&err);
                }
            }
        }
    }

    fn flush(&self) -> Result<(), Error> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(err) = sink.flush() {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

fn join(args: &[&dyn fmt::Display]) -> String {
    let mut message = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            message.push(' ');
        }
        let _ = write!(&mut message, "{arg}");
    }
    message
}

fn render(args: fmt::Arguments) -> String {
    match args.as_str() {
        Some(message) => message.to_string(),
        None => args.to_string(),
    }
}

fn call_site(location: &'static Location<'static>) -> Option<Caller<'static>> {
    Some(Caller {
        file: location.file(),
        line: location.line(),
    })
}

macro_rules! leveled_methods {
    ($level:expr, $name:literal, $plain:ident, $formatted:ident, $keyed:ident) => {
        #[doc = concat!("Log the arguments at `", $name, "`, joined by single spaces.")]
        #[track_caller]
        pub fn $plain(&self, args: &[&dyn fmt::Display]) {
            if self.enabled($level) {
                self.emit($level, call_site(Location::caller()), &join(args), &[]);
            }
        }

        #[doc = concat!("Log a formatted message at `", $name, "`.")]
        #[track_caller]
        pub fn $formatted(&self, args: fmt::Arguments) {
            if self.enabled($level) {
                self.emit($level, call_site(Location::caller()), &render(args), &[]);
            }
        }

        #[doc = concat!("Log a message with key-value fields at `", $name, "`.")]
        #[track_caller]
        pub fn $keyed(&self, msg: &str, fields: &[(&str, Value)]) {
            if self.enabled($level) {
                self.emit($level, call_site(Location::caller()), msg, fields);
            }
        }
    };
}

impl Logger {
    pub(crate) fn new(
        threshold: Level,
        layout: ConsoleLayout,
        sinks: Vec<Box<dyn Sink>>,
        trap: Arc<dyn Trap>,
    ) -> Self {
        let core = Core {
            threshold,
            layout,
            sinks,
            trap,
        };
        Self {
            core: Arc::new(core),
            context: Arc::from(Vec::new()),
        }
    }

    /// The minimum level of emitted records.
    pub fn level(&self) -> Level {
        self.core.threshold
    }

    /// Whether records at `level` are emitted.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.core.threshold
    }

    /// Create a child logger whose records carry `fields` before the fields of each call.
    ///
    /// # Examples
    ///
    /// ```
    /// use logtee::Adapter;
    /// use logtee::Value;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let logger = Adapter::new(dir.path().join("app.log"), "info").build().unwrap();
    ///
    /// let requests = logger.with(&[("component", Value::from("http"))]);
    /// requests.infow("request served", &[("status", Value::from(200))]);
    /// ```
    pub fn with(&self, fields: &[(&str, Value)]) -> Logger {
        let context = self
            .context
            .iter()
            .cloned()
            .chain(fields.iter().map(|(k, v)| (k.to_string(), v.clone())))
            .collect::<Vec<_>>();
        Logger {
            core: self.core.clone(),
            context: Arc::from(context),
        }
    }

    /// Flush every sink.
    ///
    /// # Errors
    ///
    /// Every sink is flushed; the first failure is returned.
    pub fn flush(&self) -> Result<(), Error> {
        self.core.flush()
    }

    fn emit(
        &self,
        level: Level,
        caller: Option<Caller>,
        message: &str,
        fields: &[(&str, Value)],
    ) {
        let record = Record::new(level, message)
            .with_caller(caller)
            .with_context(&self.context)
            .with_fields(fields);
        self.core.log(&record);
    }

    #[track_caller]
    fn emit_terminal(&self, level: Level, message: String, fields: &[(&str, Value)]) -> String {
        if self.enabled(level) {
            self.emit(level, call_site(Location::caller()), &message, fields);
        }
        message
    }

    leveled_methods!(Level::Debug, "DEBUG", debug, debugf, debugw);
    leveled_methods!(Level::Info, "INFO", info, infof, infow);
    leveled_methods!(Level::Warn, "WARN", warn, warnf, warnw);
    leveled_methods!(Level::Error, "ERROR", error, errorf, errorw);
    leveled_methods!(Level::DPanic, "DPANIC", dpanic, dpanicf, dpanicw);

    /// Log the arguments at `PANIC`, joined by single spaces.
    ///
    /// Call [`Panicking::raise`] on the result to panic with the same message.
    #[track_caller]
    pub fn panic(&self, args: &[&dyn fmt::Display]) -> Panicking {
        Panicking::new(self.emit_terminal(Level::Panic, join(args), &[]))
    }

    /// Log a formatted message at `PANIC`.
    ///
    /// Call [`Panicking::raise`] on the result to panic with the same message.
    #[track_caller]
    pub fn panicf(&self, args: fmt::Arguments) -> Panicking {
        Panicking::new(self.emit_terminal(Level::Panic, render(args), &[]))
    }

    /// Log a message with key-value fields at `PANIC`.
    ///
    /// Call [`Panicking::raise`] on the result to panic with the message.
    #[track_caller]
    pub fn panicw(&self, msg: &str, fields: &[(&str, Value)]) -> Panicking {
        Panicking::new(self.emit_terminal(Level::Panic, msg.to_string(), fields))
    }

    /// Log the arguments at `FATAL`, joined by single spaces.
    ///
    /// Call [`Exiting::exit`] on the result to terminate the process.
    #[track_caller]
    pub fn fatal(&self, args: &[&dyn fmt::Display]) -> Exiting {
        Exiting::new(self.emit_terminal(Level::Fatal, join(args), &[]))
    }

    /// Log a formatted message at `FATAL`.
    ///
    /// Call [`Exiting::exit`] on the result to terminate the process.
    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments) -> Exiting {
        Exiting::new(self.emit_terminal(Level::Fatal, render(args), &[]))
    }

    /// Log a message with key-value fields at `FATAL`.
    ///
    /// Call [`Exiting::exit`] on the result to terminate the process.
    #[track_caller]
    pub fn fatalw(&self, msg: &str, fields: &[(&str, Value)]) -> Exiting {
        Exiting::new(self.emit_terminal(Level::Fatal, msg.to_string(), fields))
    }
}

#[cfg(feature = "bridge-log")]
mod log_bridge {
    use super::*;

    impl Logger {
        /// Install a clone of this logger as the global logger of the `log` crate.
        ///
        /// `log::trace!` records are emitted at `DEBUG`.
        ///
        /// # Errors
        ///
        /// Return an error if a global logger has been installed already.
        pub fn install_log_crate(&self) -> Result<(), log::SetLoggerError> {
            log::set_boxed_logger(Box::new(self.clone()))?;
            log::set_max_level(match self.core.threshold {
                Level::Debug => log::LevelFilter::Trace,
                Level::Info => log::LevelFilter::Info,
                Level::Warn => log::LevelFilter::Warn,
                Level::Error => log::LevelFilter::Error,
                Level::DPanic | Level::Panic | Level::Fatal => log::LevelFilter::Off,
            });
            Ok(())
        }
    }

    fn from_log_level(level: log::Level) -> Level {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }

    fn from_log_value(value: &log::kv::Value) -> Value {
        if let Some(v) = value.to_borrowed_str() {
            Value::from(v)
        } else if let Some(v) = value.to_bool() {
            Value::Bool(v)
        } else if let Some(v) = value.to_i64() {
            Value::I64(v)
        } else if let Some(v) = value.to_u64() {
            Value::U64(v)
        } else if let Some(v) = value.to_f64() {
            Value::F64(v)
        } else {
            Value::display(value)
        }
    }

    struct KeyValueVisitor<'a> {
        fields: &'a mut Vec<(String, Value)>,
    }

    impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor<'_> {
        fn visit_pair(
            &mut self,
            key: log::kv::Key<'kvs>,
            value: log::kv::Value<'kvs>,
        ) -> Result<(), log::kv::Error> {
            self.fields
                .push((key.as_str().to_string(), from_log_value(&value)));
            Ok(())
        }
    }

    impl log::Log for Logger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            Logger::enabled(self, from_log_level(metadata.level()))
        }

        fn log(&self, record: &log::Record) {
            let level = from_log_level(record.level());
            if !Logger::enabled(self, level) {
                return;
            }

            let mut owned = Vec::new();
            let mut visitor = KeyValueVisitor { fields: &mut owned };
            if let Err(err) = record.key_values().visit(&mut visitor) {
                let err =
                    Error::new("failed to collect log key-values").with_context("cause", err);
                self.core.trap.trap(&err);
            }
            let fields = owned
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect::<Vec<_>>();

            let caller = match (record.file(), record.line()) {
                (Some(file), Some(line)) => Some(Caller { file, line }),
                _ => None,
            };
            let message = render(*record.args());
            self.emit(level, caller, &message, &fields);
        }

        fn flush(&self) {
            if let Err(err) = self.core.flush() {
                self.core.trap.trap(&err);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::logger::tests::capture_logger;

        #[test]
        fn test_log_records_are_bridged() {
            let (logger, console) = capture_logger(Level::Info);
            let kvs: &[(&str, &str)] = &[("user", "alice")];

            log::Log::log(
                &logger,
                &log::Record::builder()
                    .args(format_args!("signed in"))
                    .level(log::Level::Warn)
                    .key_values(&kvs)
                    .build(),
            );
            log::Log::log(
                &logger,
                &log::Record::builder()
                    .args(format_args!("ignored"))
                    .level(log::Level::Trace)
                    .build(),
            );

            let lines = console.lines();
            assert_eq!(lines.len(), 1);
            assert!(
                lines[0].ends_with("\tWARN\tsigned in\t{\"user\": \"alice\"}"),
                "{}",
                lines[0]
            );
        }

        #[test]
        fn test_log_levels_map_to_thresholds() {
            let (logger, _console) = capture_logger(Level::Debug);
            let metadata = |level| log::Metadata::builder().level(level).build();
            assert!(log::Log::enabled(&logger, &metadata(log::Level::Trace)));

            let (logger, _console) = capture_logger(Level::Error);
            assert!(!log::Log::enabled(&logger, &metadata(log::Level::Warn)));
            assert!(log::Log::enabled(&logger, &metadata(log::Level::Error)));
        }
    }
}
