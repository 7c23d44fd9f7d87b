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

//! Shorthands for the call shapes of [`Logger`](crate::Logger).
//!
//! For each level `lvl`:
//!
//! * `lvl!(logger, a, b, ...)` calls `logger.lvl(&[&a, &b, ...])`;
//! * `lvlf!(logger, "template", args...)` calls `logger.lvlf(format_args!(...))`;
//! * `lvlw!(logger, "message", "key" => value, ...)` calls `logger.lvlw(...)`, converting each
//!   value with [`Value::from`](crate::Value).
//!
//! There is no plain form for `panic`, which would shadow the standard macro. Use
//! [`Logger::panic`](crate::Logger::panic) directly.
//!
//! # Examples
//!
//! ```
//! use logtee::Adapter;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let logger = Adapter::new(dir.path().join("app.log"), "debug").build().unwrap();
//!
//! logtee::info!(logger, "listening on", 8080);
//! logtee::warnf!(logger, "{} retries left", 2);
//! logtee::errorw!(logger, "request failed", "status" => 503, "path" => "/health");
//! ```

#[macro_export]
#[doc(hidden)]
macro_rules! __plain {
    ($method:ident, $logger:expr $(, $arg:expr)* $(,)?) => {
        $logger.$method(&[$(&$arg as &dyn ::std::fmt::Display),*])
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __formatted {
    ($method:ident, $logger:expr, $($arg:tt)+) => {
        $logger.$method(::std::format_args!($($arg)+))
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __keyed {
    ($method:ident, $logger:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.$method($msg, &[$(($key, $crate::Value::from($value))),*])
    };
}

/// Log space-joined arguments at `DEBUG`.
#[macro_export]
macro_rules! debug {
    ($($t:tt)+) => { $crate::__plain!(debug, $($t)+) };
}

/// Log a formatted message at `DEBUG`.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(debugf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `DEBUG`.
#[macro_export]
macro_rules! debugw {
    ($($t:tt)+) => { $crate::__keyed!(debugw, $($t)+) };
}

/// Log space-joined arguments at `INFO`.
#[macro_export]
macro_rules! info {
    ($($t:tt)+) => { $crate::__plain!(info, $($t)+) };
}

/// Log a formatted message at `INFO`.
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(infof, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `INFO`.
#[macro_export]
macro_rules! infow {
    ($($t:tt)+) => { $crate::__keyed!(infow, $($t)+) };
}

/// Log space-joined arguments at `WARN`.
#[macro_export]
macro_rules! warn {
    ($($t:tt)+) => { $crate::__plain!(warn, $($t)+) };
}

/// Log a formatted message at `WARN`.
#[macro_export]
macro_rules! warnf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(warnf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `WARN`.
#[macro_export]
macro_rules! warnw {
    ($($t:tt)+) => { $crate::__keyed!(warnw, $($t)+) };
}

/// Log space-joined arguments at `ERROR`.
#[macro_export]
macro_rules! error {
    ($($t:tt)+) => { $crate::__plain!(error, $($t)+) };
}

/// Log a formatted message at `ERROR`.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(errorf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `ERROR`.
#[macro_export]
macro_rules! errorw {
    ($($t:tt)+) => { $crate::__keyed!(errorw, $($t)+) };
}

/// Log space-joined arguments at `DPANIC`.
#[macro_export]
macro_rules! dpanic {
    ($($t:tt)+) => { $crate::__plain!(dpanic, $($t)+) };
}

/// Log a formatted message at `DPANIC`.
#[macro_export]
macro_rules! dpanicf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(dpanicf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `DPANIC`.
#[macro_export]
macro_rules! dpanicw {
    ($($t:tt)+) => { $crate::__keyed!(dpanicw, $($t)+) };
}

/// Log a formatted message at `PANIC`, evaluating to a [`Panicking`](crate::Panicking).
#[macro_export]
macro_rules! panicf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(panicf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `PANIC`, evaluating to a
/// [`Panicking`](crate::Panicking).
#[macro_export]
macro_rules! panicw {
    ($($t:tt)+) => { $crate::__keyed!(panicw, $($t)+) };
}

/// Log space-joined arguments at `FATAL`, evaluating to an [`Exiting`](crate::Exiting).
#[macro_export]
macro_rules! fatal {
    ($($t:tt)+) => { $crate::__plain!(fatal, $($t)+) };
}

/// Log a formatted message at `FATAL`, evaluating to an [`Exiting`](crate::Exiting).
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => { $crate::__formatted!(fatalf, $logger, $($arg)+) };
}

/// Log a message with key-value fields at `FATAL`, evaluating to an [`Exiting`](crate::Exiting).
#[macro_export]
macro_rules! fatalw {
    ($($t:tt)+) => { $crate::__keyed!(fatalw, $($t)+) };
}
