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

use super::log_impl::Logger;
use crate::Error;

/// A logger handle bound to a fixed context label.
///
/// Every message is prefixed with `[<context>] ` and logged at INFO level, either to console and
/// file or to file only depending on how the handle was created.
///
/// # Examples
///
/// ```
/// let logger = logflush::builder().console(false).build().unwrap();
/// let db = logger.in_context("db");
/// db.info("connected").unwrap();
/// assert_eq!(db.context(), "db");
/// ```
#[derive(Debug, Clone)]
pub struct ContextLogger {
    logger: Logger,
    context: String,
    file_only: bool,
}

impl ContextLogger {
    pub(super) fn new(logger: Logger, context: String, file_only: bool) -> Self {
        Self {
            logger,
            context,
            file_only,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn info(&self, message: impl fmt::Display) -> Result<(), Error> {
        let message = format!("[{}] {message}", self.context);
        if self.file_only {
            self.logger.file_info(message)
        } else {
            self.logger.info(message)
        }
    }
}
