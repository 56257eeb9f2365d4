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
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;

use super::context::ContextLogger;
use crate::Error;
use crate::Level;
use crate::LoggerConfig;
use crate::banner::SessionBanner;
use crate::buffer::LogBuffer;
use crate::console::Console;
use crate::layout::LineLayout;
use crate::sink::SinkSet;
use crate::sink::SinkWriter;
use crate::sink::WriteMode;
use crate::sink::append_to_file;
use crate::timer::FlushTimer;
use crate::trap::Trap;

/// A buffered write-back logger.
///
/// Leveled messages are formatted, optionally echoed to the console, and buffered in memory.
/// The buffer is flushed to every sink when it overflows its capacity, on every tick of the flush
/// timer, and on demand. Immediate operations such as [`Logger::exit_msg`] bypass the buffer.
///
/// `Logger` is a cheap handle: clones share the same buffer and sinks. The flush timer stops and
/// the remaining buffer is flushed once the last clone is dropped.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
    _timer: Arc<FlushTimer>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.inner.config)
            .field("mode", &self.inner.writer.mode())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Inner {
    config: LoggerConfig,
    layout: LineLayout,
    console: Box<dyn Console>,
    trap: Box<dyn Trap>,
    writer: SinkWriter,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    buffer: LogBuffer,
    sinks: SinkSet,
}

/// Where an immediate line goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    ConsoleAndFile,
    FileOnly,
}

impl Logger {
    pub(super) fn new(
        config: LoggerConfig,
        layout: LineLayout,
        console: Box<dyn Console>,
        trap: Box<dyn Trap>,
        thread_name: String,
    ) -> Result<Logger, Error> {
        let writer = if config.synchronous() {
            SinkWriter::blocking()
        } else {
            SinkWriter::non_blocking(format!("{thread_name}-writer"))?
        };

        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                buffer: LogBuffer::new(config.buffer_capacity()),
                sinks: SinkSet::default(),
            }),
            config,
            layout,
            console,
            trap,
            writer,
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let timer = FlushTimer::spawn(
            format!("{thread_name}-timer"),
            inner.config.flush_interval(),
            move || match weak.upgrade() {
                Some(inner) => {
                    if let Err(err) = inner.flush() {
                        inner.trap.trap(&err);
                    }
                    true
                }
                None => false,
            },
        )?;

        Ok(Logger {
            inner,
            _timer: Arc::new(timer),
        })
    }

    /// The configuration this logger was built with.
    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    /// Whether buffered flushes block.
    pub fn write_mode(&self) -> WriteMode {
        self.inner.writer.mode()
    }

    /// The registered sink paths, in registration order.
    pub fn sinks(&self) -> Vec<PathBuf> {
        self.inner.state().sinks.iter().map(Path::to_path_buf).collect()
    }

    /// Number of lines waiting in the buffer.
    pub fn pending(&self) -> usize {
        self.inner.state().buffer.len()
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.inner.trap.trap(err);
    }

    /// Buffer an INFO line and echo it to the console if enabled.
    pub fn info(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Info, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Buffer a DEBUG line and echo it to the console if enabled.
    pub fn debug(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Debug, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Buffer a WARN line and echo it to the console if enabled.
    pub fn warn(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Warn, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Buffer an ERROR line and echo it to the console if enabled.
    pub fn error(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Error, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Buffer an INFO line that never reaches the console.
    pub fn file_info(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Info, &message.to_string(), Target::FileOnly)
    }

    /// Buffer a DEBUG line that never reaches the console.
    pub fn file_debug(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Debug, &message.to_string(), Target::FileOnly)
    }

    /// Buffer a WARN line that never reaches the console.
    pub fn file_warn(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Warn, &message.to_string(), Target::FileOnly)
    }

    /// Buffer an ERROR line that never reaches the console.
    pub fn file_error(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(Level::Error, &message.to_string(), Target::FileOnly)
    }

    /// Buffer a line at the given level.
    pub fn log(&self, level: Level, message: impl fmt::Display) -> Result<(), Error> {
        self.inner.append(level, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Write an EXIT line to the console and every sink, bypassing the buffer.
    pub fn exit_msg(&self, message: impl fmt::Display) -> Result<(), Error> {
        self.write_console_and_file(Some(Level::Exit), message)
    }

    /// Log an error as an ERROR line with its type and message, followed by an ERRORSTACK line
    /// with its source chain and a backtrace captured here.
    ///
    /// The error's debug representation is always echoed to the console, whatever the console
    /// setting.
    pub fn throw<E>(&self, err: &E) -> Result<(), Error>
    where
        E: std::error::Error + ?Sized,
    {
        let report = format!("{err:?}");
        if let Err(echo_err) = self.inner.console.echo_error(&report) {
            self.trap(&echo_err);
        }

        let name = short_type_name::<E>();
        self.inner
            .append(Level::Error, &format!("{name}: {err}"), Target::FileOnly)?;

        let mut stack = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str(&format!("caused by: {cause}\n"));
            source = cause.source();
        }
        let backtrace = std::backtrace::Backtrace::force_capture();
        stack.push_str(&format!("stack backtrace:\n{backtrace}"));
        self.inner
            .append(Level::ErrorStack, stack.trim_end(), Target::FileOnly)
    }

    /// Write the parts as a CONSOLE OUTPUT line to the console and every sink, immediately.
    ///
    /// Parts are joined by a single space.
    pub fn print<I, S>(&self, parts: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_console_and_file(Some(Level::ConsoleOutput), join_parts(parts))
    }

    /// Write the parts raw, without timestamp or level, to the console and every sink.
    pub fn printr<I, S>(&self, parts: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_console_and_file(None, join_parts(parts))
    }

    /// Write the parts raw to every sink only.
    pub fn printrf<I, S>(&self, parts: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_file_only(None, join_parts(parts))
    }

    /// Format (or pass through raw when `level` is `None`) and write a line to the console, if
    /// enabled, and synchronously to every sink.
    pub fn write_console_and_file(
        &self,
        level: Option<Level>,
        message: impl fmt::Display,
    ) -> Result<(), Error> {
        self.inner
            .write_immediate(level, &message.to_string(), Target::ConsoleAndFile)
    }

    /// Like [`Logger::write_console_and_file`] without the console.
    pub fn write_file_only(
        &self,
        level: Option<Level>,
        message: impl fmt::Display,
    ) -> Result<(), Error> {
        self.inner
            .write_immediate(level, &message.to_string(), Target::FileOnly)
    }

    /// Flush the buffer in the configured write mode.
    pub fn write_now(&self) -> Result<(), Error> {
        self.inner.flush()
    }

    /// Alias of [`Logger::write_now`].
    pub fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }

    /// Flush the buffer and wait for every write to complete, whatever the write mode.
    pub fn flush_sync(&self) -> Result<(), Error> {
        self.inner.flush_sync()
    }

    /// A handle that prefixes messages with `[<context>] ` and logs them to console and file.
    pub fn in_context(&self, context: impl Into<String>) -> ContextLogger {
        ContextLogger::new(self.clone(), context.into(), false)
    }

    /// A handle that prefixes messages with `[<context>] ` and logs them to file only.
    pub fn in_file_context(&self, context: impl Into<String>) -> ContextLogger {
        ContextLogger::new(self.clone(), context.into(), true)
    }

    /// Register a new sink file and write a session banner to it immediately.
    ///
    /// The same path may be registered more than once; it then receives every flush once per
    /// registration.
    pub fn pipe(&self, path: impl Into<PathBuf>) -> Result<(), Error> {
        let path = path.into();
        let banner = SessionBanner::collect(&path, self.inner.layout.timestamp());

        let mut state = self.inner.state();
        self.inner.writer.wait_idle();
        append_to_file(&path, banner.render().as_bytes())
            .map_err(|err| Error::sink_write(&path, err))?;
        state.sinks.push(path);
        Ok(())
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn echo(&self, line: &str) {
        if let Err(err) = self.console.echo(line) {
            self.trap.trap(&err);
        }
    }

    fn append(&self, level: Level, message: &str, target: Target) -> Result<(), Error> {
        let (console_line, line) = self.layout.format_pair(level, message);
        if target == Target::ConsoleAndFile && self.config.console_output() {
            self.echo(&console_line);
        }

        let mut state = self.state();
        if state.buffer.push(line) {
            self.flush_locked(&mut state, self.writer.mode())?;
        }
        Ok(())
    }

    fn write_immediate(
        &self,
        level: Option<Level>,
        message: &str,
        target: Target,
    ) -> Result<(), Error> {
        let (console_line, mut line) = match level {
            Some(level) => self.layout.format_pair(level, message),
            None => (message.to_string(), message.to_string()),
        };
        if target == Target::ConsoleAndFile && self.config.console_output() {
            self.echo(&console_line);
        }

        line.push('\n');
        let state = self.state();
        self.writer.write_sync(&state.sinks, &line)
    }

    fn flush(&self) -> Result<(), Error> {
        let mut state = self.state();
        self.flush_locked(&mut state, self.writer.mode())
    }

    fn flush_sync(&self) -> Result<(), Error> {
        let mut state = self.state();
        // earlier non-blocking flushes must land even when the buffer is empty now
        self.writer.wait_idle();
        self.flush_locked(&mut state, WriteMode::Blocking)
    }

    /// Drains the buffer and hands it to the sinks. A failed hand-off puts the lines back.
    fn flush_locked(&self, state: &mut State, mode: WriteMode) -> Result<(), Error> {
        let Some(snapshot) = state.buffer.drain_snapshot() else {
            return Ok(());
        };
        let result = self.writer.deliver(&mut state.sinks, &snapshot, mode);
        if result.is_err() {
            state.buffer.restore(snapshot);
        }
        result
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Err(err) = self.flush_sync() {
            self.trap.trap(&err);
        }
    }
}

fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(part.as_ref());
    }
    text
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    // strip generics before taking the last path segment
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_parts() {
        assert_eq!(join_parts(["a", "b", "c"]), "a b c");
        assert_eq!(join_parts(Vec::<String>::new()), "");
        assert_eq!(join_parts([String::from("only")]), "only");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<std::fmt::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }
}
