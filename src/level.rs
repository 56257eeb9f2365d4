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

use colored::Color;

/// The severity tag of a formatted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Debug,
    Warn,
    Error,
    /// The stack trace line that follows an [`Level::Error`] line written by
    /// [`Logger::throw`](crate::Logger::throw).
    ErrorStack,
    /// Process termination notices.
    Exit,
    /// Lines written by [`Logger::print`](crate::Logger::print).
    ConsoleOutput,
}

impl Level {
    /// The tag rendered between the timestamp and the message.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::ErrorStack => "ERRORSTACK",
            Level::Exit => "EXIT",
            Level::ConsoleOutput => "CONSOLE OUTPUT",
        }
    }

    pub(crate) fn color(&self) -> Color {
        match self {
            Level::Info => Color::Green,
            Level::Debug => Color::Blue,
            Level::Warn => Color::Yellow,
            Level::Error | Level::ErrorStack => Color::Red,
            Level::Exit => Color::Magenta,
            Level::ConsoleOutput => Color::White,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::Error,
            log::Level::Warn => Level::Warn,
            log::Level::Info => Level::Info,
            log::Level::Debug | log::Level::Trace => Level::Debug,
        }
    }
}
