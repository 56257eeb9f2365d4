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

//! The in-memory line buffer.

use std::collections::VecDeque;

/// An ordered buffer of formatted lines.
///
/// Insertion order is flush order. The capacity is an overflow threshold: the buffer may hold
/// exactly `capacity` lines, and the push that makes it hold more reports an overflow.
#[derive(Debug)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

/// The drained content of a [`LogBuffer`].
#[derive(Debug)]
pub struct Snapshot {
    lines: Vec<String>,
}

impl Snapshot {
    /// Number of drained lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the snapshot holds no line.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The lines joined by newline, with a trailing newline.
    pub fn text(&self) -> String {
        self.text_from(0)
    }

    /// Like [`Snapshot::text`], leaving out the first `skip` lines.
    pub fn text_from(&self, skip: usize) -> String {
        let lines = self.lines.get(skip..).unwrap_or_default();
        let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Appends a line and returns whether the buffer now overflows its capacity.
    #[must_use]
    pub fn push(&mut self, line: String) -> bool {
        self.lines.push_back(line);
        self.lines.len() > self.capacity
    }

    /// Takes the whole content and leaves the buffer empty.
    ///
    /// Returns `None` when there is nothing to flush.
    pub fn drain_snapshot(&mut self) -> Option<Snapshot> {
        if self.lines.is_empty() {
            return None;
        }
        let lines = self.lines.drain(..).collect();
        Some(Snapshot { lines })
    }

    /// Puts back a snapshot whose hand-off failed, ahead of anything appended since.
    pub fn restore(&mut self, snapshot: Snapshot) {
        for line in snapshot.lines.into_iter().rev() {
            self.lines.push_front(line);
        }
    }
}
