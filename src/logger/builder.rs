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

use std::time::Duration;

use super::log_impl::Logger;
use crate::Error;
use crate::LoggerConfig;
use crate::config::normalize_capacity;
use crate::console::Console;
use crate::console::Stdout;
use crate::layout::LineLayout;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// Create a new empty [`LoggerBuilder`] with the default configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// let logger = logflush::builder()
///     .console(false)
///     .buffer_capacity(50)
///     .flush_interval(Duration::from_secs(30))
///     .build()
///     .unwrap();
/// logger.info("ready").unwrap();
/// ```
pub fn builder() -> LoggerBuilder {
    LoggerBuilder::default()
}

/// A builder to configure and create a [`Logger`].
#[must_use = "call `build` to construct the logger"]
#[derive(Debug)]
pub struct LoggerBuilder {
    config: LoggerConfig,
    layout: LineLayout,
    console: Box<dyn Console>,
    trap: Box<dyn Trap>,
    thread_name: String,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            config: LoggerConfig::default(),
            layout: LineLayout::default(),
            console: Box::new(Stdout::default()),
            trap: Box::new(DefaultTrap::default()),
            thread_name: "logflush".to_string(),
        }
    }
}

impl LoggerBuilder {
    /// Start from an existing configuration.
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Mirror leveled messages to the console.
    ///
    /// Default to `true`.
    pub fn console(mut self, enabled: bool) -> Self {
        self.config.set_console_output(enabled);
        self
    }

    /// Set the overflow threshold of the buffer.
    ///
    /// Negative values fall back to the default of 100.
    pub fn buffer_capacity(mut self, capacity: i64) -> Self {
        self.config.set_buffer_capacity(normalize_capacity(capacity));
        self
    }

    /// Set the period of the timer-driven flush.
    ///
    /// Default to three minutes.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.set_flush_interval(interval);
        self
    }

    /// Choose whether buffered flushes block until written.
    ///
    /// Default to `true`. When `false`, flushes are handed to a background writer and write
    /// failures are discarded.
    pub fn synchronous(mut self, synchronous: bool) -> Self {
        self.config.set_synchronous(synchronous);
        self
    }

    /// Set the line layout.
    ///
    /// Default to [`LineLayout`].
    pub fn layout(mut self, layout: LineLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the console that mirrors lines.
    ///
    /// Default to [`Stdout`].
    pub fn console_writer(mut self, console: impl Into<Box<dyn Console>>) -> Self {
        self.console = console.into();
        self
    }

    /// Set the trap for errors raised off the caller's path.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Set the name prefix of the background threads.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Build the [`Logger`] and start its flush timer.
    ///
    /// # Errors
    ///
    /// Return an error if a background thread cannot be spawned.
    pub fn build(self) -> Result<Logger, Error> {
        let LoggerBuilder {
            config,
            layout,
            console,
            trap,
            thread_name,
        } = self;
        Logger::new(config, layout, console, trap, thread_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_keep_other_fields() {
        let builder = builder()
            .console(false)
            .buffer_capacity(-1)
            .flush_interval(Duration::from_millis(250))
            .synchronous(false);
        assert_eq!(
            builder.config,
            LoggerConfig::new(false, 100, Duration::from_millis(250), false)
        );

        let builder = super::builder()
            .config(LoggerConfig::new(true, 0, Duration::from_secs(5), true))
            .buffer_capacity(7)
            .flush_interval(Duration::ZERO);
        assert_eq!(builder.config.buffer_capacity(), 7);
        assert_eq!(
            builder.config.flush_interval(),
            LoggerConfig::DEFAULT_FLUSH_INTERVAL
        );
        assert!(builder.config.console_output());
    }
}
