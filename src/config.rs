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

/// The normalized, immutable configuration of a [`Logger`](crate::Logger).
///
/// Construct it through [`LoggerBuilder`](crate::LoggerBuilder) or [`LoggerConfig::new`]; both
/// normalize out-of-range values instead of rejecting them.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawConfig"))]
pub struct LoggerConfig {
    console_output: bool,
    buffer_capacity: usize,
    flush_interval: Duration,
    synchronous: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console_output: true,
            buffer_capacity: Self::DEFAULT_BUFFER_CAPACITY,
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
            synchronous: true,
        }
    }
}

impl LoggerConfig {
    pub const DEFAULT_BUFFER_CAPACITY: usize = 100;
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(3 * 60);

    /// Creates a configuration.
    ///
    /// A negative `buffer_capacity` becomes [`Self::DEFAULT_BUFFER_CAPACITY`]. Zero is kept and
    /// makes every append flush. A zero interval becomes [`Self::DEFAULT_FLUSH_INTERVAL`].
    pub fn new(
        console_output: bool,
        buffer_capacity: i64,
        flush_interval: Duration,
        synchronous: bool,
    ) -> Self {
        Self {
            console_output,
            buffer_capacity: normalize_capacity(buffer_capacity),
            flush_interval: normalize_interval(flush_interval),
            synchronous,
        }
    }

    pub fn console_output(&self) -> bool {
        self.console_output
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    pub fn synchronous(&self) -> bool {
        self.synchronous
    }

    pub(crate) fn set_console_output(&mut self, console_output: bool) {
        self.console_output = console_output;
    }

    pub(crate) fn set_buffer_capacity(&mut self, buffer_capacity: usize) {
        self.buffer_capacity = buffer_capacity;
    }

    pub(crate) fn set_flush_interval(&mut self, flush_interval: Duration) {
        self.flush_interval = normalize_interval(flush_interval);
    }

    pub(crate) fn set_synchronous(&mut self, synchronous: bool) {
        self.synchronous = synchronous;
    }
}

pub(crate) fn normalize_capacity(capacity: i64) -> usize {
    usize::try_from(capacity).unwrap_or(LoggerConfig::DEFAULT_BUFFER_CAPACITY)
}

fn normalize_interval(interval: Duration) -> Duration {
    if interval.is_zero() {
        LoggerConfig::DEFAULT_FLUSH_INTERVAL
    } else {
        interval
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RawConfig {
    console_output: bool,
    buffer_capacity: i64,
    flush_interval_millis: u64,
    synchronous: bool,
}

#[cfg(feature = "serde")]
impl Default for RawConfig {
    fn default() -> Self {
        Self {
            console_output: true,
            buffer_capacity: LoggerConfig::DEFAULT_BUFFER_CAPACITY as i64,
            flush_interval_millis: LoggerConfig::DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            synchronous: true,
        }
    }
}

#[cfg(feature = "serde")]
impl From<RawConfig> for LoggerConfig {
    fn from(raw: RawConfig) -> Self {
        LoggerConfig::new(
            raw.console_output,
            raw.buffer_capacity,
            Duration::from_millis(raw.flush_interval_millis),
            raw.synchronous,
        )
    }
}
