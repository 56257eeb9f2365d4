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

//! Logflush is a buffered write-back logger for a single process.
//!
//! # Overview
//!
//! Messages are timestamped, optionally echoed to the console, and buffered in memory. The
//! buffer is flushed to every registered sink file when it overflows, on a recurring timer, or
//! on demand. Flushes either block until written or are handed to a background writer. A
//! [`lifecycle::LifecycleGuard`] flushes the buffer before the process ends, on normal
//! completion, explicit exit, `SIGINT`, `SIGTERM` or an uncaught panic.
//!
//! # Examples
//!
//! ```no_run
//! use logflush::lifecycle::LifecycleGuard;
//!
//! let logger = logflush::builder().buffer_capacity(100).build().unwrap();
//! logger.pipe("logs/app.log").unwrap();
//! let _guard = LifecycleGuard::install(&logger).unwrap();
//!
//! logger.info("service started").unwrap();
//! logger.in_context("http").info("listening on :8080").unwrap();
//!
//! // route the `log` facade into the same buffer
//! logger.apply().unwrap();
//! log::warn!("cache is cold");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod banner;
pub mod bridge;
pub mod buffer;
pub mod console;
pub mod layout;
pub mod lifecycle;
pub mod sink;
pub mod trap;

mod config;
mod error;
mod level;
mod logger;
mod timer;

pub use self::config::LoggerConfig;
pub use self::error::Error;
pub use self::level::Level;
pub use self::logger::*;
