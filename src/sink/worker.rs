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

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use super::append_to_file;

pub(crate) enum Message {
    Write { path: PathBuf, bytes: Arc<[u8]> },
    Barrier(Sender<()>),
}

pub(crate) struct Worker {
    receiver: Receiver<Message>,
}

impl Worker {
    pub(crate) fn new(receiver: Receiver<Message>) -> Self {
        Self { receiver }
    }

    pub(crate) fn run(self) {
        while let Ok(message) = self.receiver.recv() {
            match message {
                Message::Write { path, bytes } => {
                    // fire-and-forget: failures are dropped
                    let _ = append_to_file(&path, &bytes);
                }
                Message::Barrier(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }
}
