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

//! Sink files and the writers that append flushed content to them.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Error;
use crate::buffer::Snapshot;

mod file;
mod non_blocking;
mod worker;

pub(crate) use self::file::append_to_file;
pub(crate) use self::non_blocking::NonBlocking;

/// The ordered set of files that receive flushed content.
///
/// Duplicates are kept: a path added twice receives every flush twice.
#[derive(Debug, Default, Clone)]
pub struct SinkSet {
    sinks: Vec<Sink>,
}

#[derive(Debug, Clone)]
struct Sink {
    path: PathBuf,
    /// Leading lines of the pending snapshot this sink received before a failed flush.
    delivered: usize,
}

impl SinkSet {
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.sinks.push(Sink {
            path: path.into(),
            delivered: 0,
        });
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Path> {
        self.sinks.iter().map(|sink| sink.path.as_path())
    }
}

/// How buffered flushes reach the sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every append blocks until the file write completes and failures reach the caller.
    Blocking,
    /// Appends are handed to a background thread and failures are discarded.
    ///
    /// This is fire-and-forget: a write that fails in the background is lost without any
    /// report. Callers that need durability use [`Logger::flush_sync`](crate::Logger::flush_sync).
    NonBlocking,
}

/// Writes text to every sink of a [`SinkSet`].
#[derive(Debug)]
pub(crate) struct SinkWriter {
    background: Option<NonBlocking>,
}

impl SinkWriter {
    pub(crate) fn blocking() -> Self {
        Self { background: None }
    }

    pub(crate) fn non_blocking(thread_name: String) -> Result<Self, Error> {
        let background = NonBlocking::new(thread_name)?;
        Ok(Self {
            background: Some(background),
        })
    }

    pub(crate) fn mode(&self) -> WriteMode {
        match self.background {
            Some(_) => WriteMode::NonBlocking,
            None => WriteMode::Blocking,
        }
    }

    /// Hands `snapshot` to every sink, in `mode`.
    ///
    /// A sink only receives the lines it did not get from an earlier failed attempt on the same
    /// snapshot. Every sink is tried and the first failure is returned; the caller then restores
    /// the snapshot and the sinks that succeeded are not written those lines again.
    pub(crate) fn deliver(
        &self,
        sinks: &mut SinkSet,
        snapshot: &Snapshot,
        mode: WriteMode,
    ) -> Result<(), Error> {
        let background = match (&self.background, mode) {
            (Some(background), WriteMode::NonBlocking) => Some(background),
            _ => {
                self.wait_idle();
                None
            }
        };

        let mut first_err = None;
        for sink in &mut sinks.sinks {
            if sink.delivered >= snapshot.len() {
                continue;
            }
            let text = snapshot.text_from(sink.delivered);
            let result = match background {
                Some(background) => background.send(sink.path.clone(), Arc::from(text.as_bytes())),
                None => append_to_file(&sink.path, text.as_bytes())
                    .map_err(|err| Error::sink_write(&sink.path, err)),
            };
            match result {
                Ok(()) => sink.delivered = snapshot.len(),
                Err(err) => {
                    first_err.get_or_insert(err);
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => {
                sinks.sinks.iter_mut().for_each(|sink| sink.delivered = 0);
                Ok(())
            }
        }
    }

    /// Writes `text` to every sink and waits for completion regardless of the mode.
    ///
    /// Writes still queued on the background thread complete first, so per-sink order is kept.
    pub(crate) fn write_sync(&self, sinks: &SinkSet, text: &str) -> Result<(), Error> {
        self.wait_idle();
        write_all_sinks(sinks, text)
    }

    /// Blocks until the background thread, if any, has written everything queued so far.
    pub(crate) fn wait_idle(&self) {
        if let Some(background) = &self.background {
            background.barrier();
        }
    }
}

fn write_all_sinks(sinks: &SinkSet, text: &str) -> Result<(), Error> {
    for path in sinks.iter() {
        append_to_file(path, text.as_bytes()).map_err(|err| Error::sink_write(path, err))?;
    }
    Ok(())
}
