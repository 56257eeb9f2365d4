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

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use crossbeam_channel::unbounded;

use super::worker::Message;
use super::worker::Worker;
use crate::Error;

/// A handle to the background thread that performs fire-and-forget sink writes.
///
/// Dropping the handle closes the channel and waits for queued writes to finish.
#[derive(Debug)]
pub(crate) struct NonBlocking(Option<State>);

#[derive(Debug)]
struct State {
    sender: Sender<Message>,
    handle: JoinHandle<()>,
}

impl NonBlocking {
    pub(crate) fn new(thread_name: String) -> Result<Self, Error> {
        let (sender, receiver) = unbounded();
        let worker = Worker::new(receiver);
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker.run())
            .map_err(|err| {
                Error::new("failed to spawn the non-blocking writer thread").with_source(err)
            })?;
        Ok(Self(Some(State { sender, handle })))
    }

    pub(crate) fn send(&self, path: PathBuf, bytes: Arc<[u8]>) -> Result<(), Error> {
        let Some(State { sender, .. }) = self.0.as_ref() else {
            return Err(Error::new("non-blocking writer is shut down"));
        };
        sender
            .send(Message::Write { path, bytes })
            .map_err(|_| Error::new("failed to send write task to non-blocking writer"))
    }

    /// Waits until every write queued before this call has been performed.
    pub(crate) fn barrier(&self) {
        let Some(State { sender, .. }) = self.0.as_ref() else {
            return;
        };
        let (ack, done) = bounded(1);
        if sender.send(Message::Barrier(ack)).is_ok() {
            // a disconnected worker has nothing left to wait for
            let _ = done.recv();
        }
    }
}

impl Drop for NonBlocking {
    fn drop(&mut self) {
        if let Some(State { sender, handle }) = self.0.take() {
            // the worker drains the queue and stops once the channel is closed
            drop(sender);
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
