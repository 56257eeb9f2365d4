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

//! Console echo targets.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use crate::Error;

/// A console that mirrors log lines.
pub trait Console: fmt::Debug + Send + Sync + 'static {
    /// Echo a rendered line.
    fn echo(&self, line: &str) -> Result<(), Error>;

    /// Echo a raw error report.
    ///
    /// Default to [`Console::echo`].
    fn echo_error(&self, report: &str) -> Result<(), Error> {
        self.echo(report)
    }
}

impl<T: Console> From<T> for Box<dyn Console> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A console that writes lines to stdout and error reports to stderr.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct Stdout {}

impl Console for Stdout {
    fn echo(&self, line: &str) -> Result<(), Error> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{line}").map_err(Error::from_io_error)
    }

    fn echo_error(&self, report: &str) -> Result<(), Error> {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{report}").map_err(Error::from_io_error)
    }
}

/// A console that keeps every echoed line in memory.
///
/// Clones share the same storage, so a clone can be handed to the logger while the test keeps
/// the other one to inspect output.
///
/// # Examples
///
/// ```
/// use logflush::console::Testing;
///
/// let console = Testing::default();
/// let logger = logflush::builder()
///     .console_writer(console.clone())
///     .build()
///     .unwrap();
/// logger.printr(["hello"]).unwrap();
/// assert_eq!(console.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Testing {
    lines: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
}

impl Testing {
    /// All lines echoed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// All error reports echoed so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Console for Testing {
    fn echo(&self, line: &str) -> Result<(), Error> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push(line.to_string());
        Ok(())
    }

    fn echo_error(&self, report: &str) -> Result<(), Error> {
        let mut errors = self.errors.lock().unwrap_or_else(|e| e.into_inner());
        errors.push(report.to_string());
        Ok(())
    }
}
