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

//! Logtee is a leveled logging adapter that writes every record to the console and to a rotating
//! log file.
//!
//! # Overview
//!
//! An [`Adapter`] holds the configuration: the log file, the minimum level, the rotation policy
//! and whether records carry their call site. [`Adapter::build`] turns it into a [`Logger`], the
//! handle the application passes around and logs through. Records are tab-separated console
//! lines with a timestamp, a colorized level and optional fields; the same bytes go to stdout and
//! to the file.
//!
//! The file is rotated once it would grow past the maximum size. Old files are pruned by count
//! and age and gzip-compressed in the background.
//!
//! # Examples
//!
//! ```
//! use logtee::Adapter;
//! use logtee::Value;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut adapter = Adapter::new(dir.path().join("app.log"), "info");
//! adapter.set_max_file_size(100).set_show_caller(true);
//! let logger = adapter.build().unwrap();
//!
//! logger.info(&[&"server started on port", &8080]);
//! logger.warnf(format_args!("{} connections dropped", 3));
//! logger.errorw(
//!     "request failed",
//!     &[("status", Value::from(503)), ("path", Value::from("/health"))],
//! );
//! ```
//!
//! `PANIC` and `FATAL` records return a token and leave termination to the caller:
//!
//! ```no_run
//! # let logger = logtee::Adapter::new("app.log", "info").build().unwrap();
//! let config_loaded = false;
//! if !config_loaded {
//!     logger.fatal(&[&"no configuration found"]).exit();
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod adapter;
mod config;
mod error;
mod kv;
mod layout;
mod logger;
mod macros;
mod record;
mod termination;

pub mod rotate;
pub mod sink;
pub mod trap;

pub use self::adapter::Adapter;
pub use self::config::LoggerConfig;
pub use self::error::Error;
pub use self::kv::Value;
pub use self::logger::Logger;
pub use self::record::Level;
pub use self::sink::Sink;
pub use self::termination::Exiting;
pub use self::termination::Panicking;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
