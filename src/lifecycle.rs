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

//! Flush-on-exit guarantees.
//!
//! A [`LifecycleGuard`] makes sure buffered lines reach the sinks before the process goes away,
//! whichever way it goes:
//!
//! * normal completion, when the guard is dropped at the end of `main`;
//! * an explicit [`LifecycleGuard::exit`];
//! * `SIGINT` or `SIGTERM`;
//! * a panic that ends the process (see [`FatalPanics`]).
//!
//! Every path flushes synchronously first. The first path to run also writes one EXIT line; any
//! later path only repeats the flush, which is a no-op on an empty buffer.
//!
//! Panic hooks run for every panic, including the ones a host later catches with
//! `std::panic::catch_unwind` or observes through `JoinHandle::join`. By default only a panic on
//! the `main` thread is treated as fatal; any other panic only flushes the buffer and leaves the
//! process running. A `catch_unwind` on the main thread is still treated as fatal, since the hook
//! cannot know whether the unwind will be caught.
//!
//! # Examples
//!
//! ```no_run
//! use logflush::lifecycle::LifecycleGuard;
//!
//! let logger = logflush::builder().build().unwrap();
//! logger.pipe("app.log").unwrap();
//! let _guard = LifecycleGuard::install(&logger).unwrap();
//!
//! logger.info("working").unwrap();
//! // dropping `_guard` flushes and records the exit
//! ```

use std::fmt;
use std::os::raw::c_int;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use signal_hook::consts::SIGINT;
use signal_hook::consts::SIGTERM;
use signal_hook::iterator::Handle;
use signal_hook::iterator::Signals;

use crate::Error;
use crate::Level;
use crate::Logger;

/// Ends the process once the guard has flushed.
pub trait Terminate: fmt::Debug + Send + Sync + 'static {
    /// Terminate with the given exit status.
    fn terminate(&self, code: i32);
}

impl<T: Terminate> From<T> for Box<dyn Terminate> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Terminates through [`std::process::exit`].
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ProcessExit {}

impl Terminate for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// The phase of the guarded process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Running = 0,
    Flushing = 1,
    Terminated = 2,
}

impl Phase {
    fn from_u8(value: u8) -> Phase {
        match value {
            0 => Phase::Running,
            1 => Phase::Flushing,
            _ => Phase::Terminated,
        }
    }
}

/// Which panics end the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalPanics {
    /// Panics on the thread named `main`. Others only flush.
    MainThread,
    /// Every panic, on any thread.
    AnyThread,
}

/// What ended the process.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Termination {
    Exit(i32),
    Signal(c_int),
    Panic(String),
}

#[derive(Debug)]
struct Shared {
    logger: Logger,
    phase: AtomicU8,
    terminate: Box<dyn Terminate>,
}

impl Shared {
    /// Flushes, writes the EXIT line on the first call, and returns the status to exit with.
    fn finish(&self, termination: Termination) -> i32 {
        let first = self
            .phase
            .compare_exchange(
                Phase::Running as u8,
                Phase::Flushing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if let Err(err) = self.logger.flush_sync() {
            self.logger.trap(&err);
        }

        let pid = std::process::id();
        let (message, code) = match &termination {
            Termination::Exit(code) => (format!("process {pid} exited with code {code}"), *code),
            Termination::Signal(signal) => (
                format!(
                    "received {}, process {pid} exiting with code 0",
                    signal_name(*signal)
                ),
                0,
            ),
            Termination::Panic(info) => (
                format!("uncaught panic, process {pid} exiting with code 1: {info}"),
                1,
            ),
        };

        if first {
            if let Err(err) = self.logger.write_console_and_file(Some(Level::Exit), message) {
                self.logger.trap(&err);
            }
            self.phase.store(Phase::Terminated as u8, Ordering::SeqCst);
        }
        code
    }
}

fn signal_name(signal: c_int) -> String {
    match signal {
        SIGINT => "SIGINT".to_string(),
        SIGTERM => "SIGTERM".to_string(),
        other => format!("signal {other}"),
    }
}

/// A builder to configure and install a [`LifecycleGuard`].
#[must_use = "call `install` to register the guard"]
#[derive(Debug)]
pub struct LifecycleGuardBuilder {
    terminate: Box<dyn Terminate>,
    signals: bool,
    panic_hook: bool,
    fatal_panics: FatalPanics,
    thread_name: String,
}

impl Default for LifecycleGuardBuilder {
    fn default() -> Self {
        Self {
            terminate: Box::new(ProcessExit::default()),
            signals: true,
            panic_hook: true,
            fatal_panics: FatalPanics::MainThread,
            thread_name: "logflush-signals".to_string(),
        }
    }
}

impl LifecycleGuardBuilder {
    /// Set how the process ends after a signal, a panic or an explicit exit.
    ///
    /// Default to [`ProcessExit`].
    pub fn terminate(mut self, terminate: impl Into<Box<dyn Terminate>>) -> Self {
        self.terminate = terminate.into();
        self
    }

    /// Whether to handle `SIGINT` and `SIGTERM`.
    ///
    /// Default to `true`.
    pub fn signals(mut self, enabled: bool) -> Self {
        self.signals = enabled;
        self
    }

    /// Whether to chain a panic hook.
    ///
    /// The hook always flushes. For a fatal panic it also writes the EXIT line and terminates
    /// with status 1.
    ///
    /// Default to `true`.
    pub fn panic_hook(mut self, enabled: bool) -> Self {
        self.panic_hook = enabled;
        self
    }

    /// Set which panics the hook treats as fatal.
    ///
    /// Default to [`FatalPanics::MainThread`].
    pub fn fatal_panics(mut self, fatal_panics: FatalPanics) -> Self {
        self.fatal_panics = fatal_panics;
        self
    }

    /// Sets the name of the signal handling thread.
    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Register the guard for `logger`.
    ///
    /// # Errors
    ///
    /// Return an error if the signal handlers cannot be registered or their thread cannot be
    /// spawned.
    pub fn install(self, logger: &Logger) -> Result<LifecycleGuard, Error> {
        let LifecycleGuardBuilder {
            terminate,
            signals,
            panic_hook,
            fatal_panics,
            thread_name,
        } = self;

        let shared = Arc::new(Shared {
            logger: logger.clone(),
            phase: AtomicU8::new(Phase::Running as u8),
            terminate,
        });

        let listener = if signals {
            Some(SignalListener::spawn(thread_name, Arc::downgrade(&shared))?)
        } else {
            None
        };

        if panic_hook {
            install_panic_hook(Arc::downgrade(&shared), fatal_panics);
        }

        Ok(LifecycleGuard { shared, listener })
    }
}

/// Flushes the logger before the process terminates.
///
/// Keep the guard alive in `main`; dropping it is the normal completion path.
#[derive(Debug)]
pub struct LifecycleGuard {
    shared: Arc<Shared>,
    listener: Option<SignalListener>,
}

impl LifecycleGuard {
    /// Create a builder for a guard.
    pub fn builder() -> LifecycleGuardBuilder {
        LifecycleGuardBuilder::default()
    }

    /// Install a guard with signal handling and the panic hook enabled.
    ///
    /// # Errors
    ///
    /// Return an error if the signal handlers cannot be registered.
    pub fn install(logger: &Logger) -> Result<LifecycleGuard, Error> {
        Self::builder().install(logger)
    }

    /// The current phase of the process.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.shared.phase.load(Ordering::SeqCst))
    }

    /// Flush, record the exit code and terminate the process with it.
    pub fn exit(&self, code: i32) {
        let code = self.shared.finish(Termination::Exit(code));
        self.shared.terminate.terminate(code);
    }

    /// Run the signal path as if `signal` had been delivered.
    pub fn trigger_signal(&self, signal: c_int) {
        handle_signal(&self.shared, signal);
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        // stop listening first so a late signal cannot race the exit line
        drop(self.listener.take());
        self.shared.finish(Termination::Exit(0));
    }
}

fn handle_signal(shared: &Shared, signal: c_int) {
    let code = shared.finish(Termination::Signal(signal));
    shared.terminate.terminate(code);
}

struct SignalListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl fmt::Debug for SignalListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalListener")
            .field("thread", &self.thread)
            .finish_non_exhaustive()
    }
}

impl SignalListener {
    fn spawn(thread_name: String, shared: Weak<Shared>) -> Result<Self, Error> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|err| {
            Error::new("failed to register signal handlers").with_source(err)
        })?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                for signal in signals.forever() {
                    match shared.upgrade() {
                        Some(shared) => handle_signal(&shared, signal),
                        None => break,
                    }
                }
            })
            .map_err(|err| {
                Error::new("failed to spawn the signal handling thread").with_source(err)
            })?;

        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() != std::thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

fn install_panic_hook(shared: Weak<Shared>, fatal_panics: FatalPanics) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        let Some(shared) = shared.upgrade() else {
            return;
        };

        let fatal = match fatal_panics {
            FatalPanics::MainThread => std::thread::current().name() == Some("main"),
            FatalPanics::AnyThread => true,
        };
        if fatal {
            let code = shared.finish(Termination::Panic(describe_panic(info)));
            shared.terminate.terminate(code);
        } else if let Err(err) = shared.logger.flush_sync() {
            shared.logger.trap(&err);
        }
    }));
}

/// Renders a panic as `<message> at <file>:<line>:<column>` on a single line.
fn describe_panic(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "Box<dyn Any>"
    };
    let message = message.replace(['\r', '\n'], " ");
    match info.location() {
        Some(location) => format!(
            "{message} at {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ),
        None => message,
    }
}
