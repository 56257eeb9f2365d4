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

//! Line formatting.

use colored::Colorize;
use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::level::Level;

/// Renders messages as `[<timestamp>: <LEVEL>] <message>`.
///
/// # Examples
///
/// ```
/// use logflush::Level;
/// use logflush::layout::LineLayout;
///
/// let layout = LineLayout::default();
/// let line = layout.format(Level::Info, "hello");
/// assert!(line.ends_with(": INFO] hello"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineLayout {
    tz: Option<TimeZone>,
    no_color: bool,
}

impl LineLayout {
    const TIME_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S.%3f";

    /// Renders timestamps in the given time zone instead of the system one.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Disables colored level tags on the console.
    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// Formats the current time.
    pub fn timestamp(&self) -> String {
        let now = match self.tz.clone() {
            Some(tz) => Zoned::now().with_time_zone(tz),
            None => Zoned::now(),
        };
        now.strftime(Self::TIME_FORMAT).to_string()
    }

    /// Formats a line for a file sink.
    pub fn format(&self, level: Level, message: &str) -> String {
        let time = self.timestamp();
        format!("[{time}: {level}] {message}")
    }

    /// Formats a line for the console, coloring the level tag unless disabled.
    ///
    /// The console and file variants share one timestamp so both render the same instant.
    pub(crate) fn format_pair(&self, level: Level, message: &str) -> (String, String) {
        let time = self.timestamp();
        let plain = format!("[{time}: {level}] {message}");
        if self.no_color {
            return (plain.clone(), plain);
        }
        let tag = level.name().color(level.color());
        (format!("[{time}: {tag}] {message}"), plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_shape() {
        let layout = LineLayout::default().timezone(TimeZone::UTC);
        let line = layout.format(Level::Warn, "disk almost full");
        assert!(line.starts_with('['));
        assert!(line.ends_with(": WARN] disk almost full"));

        // [YYYY-MM-DD HH:MM:SS.mmm: WARN]
        let time = &line[1..line.find(": WARN").unwrap()];
        assert_eq!(time.len(), "2024-01-01 00:00:00.000".len());
    }

    #[test]
    fn test_console_pair_without_color() {
        let layout = LineLayout::default().no_color();
        let (console, file) = layout.format_pair(Level::ConsoleOutput, "x");
        assert_eq!(console, file);
        assert!(file.ends_with(": CONSOLE OUTPUT] x"));
    }
}
