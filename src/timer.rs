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

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossbeam_channel::bounded;
use crossbeam_channel::select;
use crossbeam_channel::tick;

use crate::Error;

/// A background thread that runs a callback on a fixed period.
///
/// The callback returns `false` to stop the timer. Dropping the timer stops it as well.
#[derive(Debug)]
pub(crate) struct FlushTimer {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FlushTimer {
    pub(crate) fn spawn<F>(thread_name: String, period: Duration, mut f: F) -> Result<Self, Error>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (shutdown, stopped) = bounded::<()>(0);
        let ticker = tick(period);
        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if !f() {
                                break;
                            }
                        }
                        recv(stopped) -> _ => break,
                    }
                }
            })
            .map_err(|err| Error::new("failed to spawn the flush timer thread").with_source(err))?;

        Ok(Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        // disconnecting wakes the thread up
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
