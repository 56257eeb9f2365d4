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

use env_filter::Filter;
use log::LevelFilter;

use crate::Error;
use crate::Level;
use crate::Logger;

/// A [`log::Log`] implementation that buffers `log` records in a [`Logger`].
///
/// Records are filtered with an [`env_filter::Filter`]. Trace records are written at DEBUG level.
#[derive(Debug)]
pub struct LogBridge {
    logger: Logger,
    filter: Filter,
}

impl LogBridge {
    /// Create a bridge filtered by the `RUST_LOG` environment variable.
    ///
    /// Without `RUST_LOG`, records at info level and above pass.
    pub fn new(logger: Logger) -> Self {
        let mut builder = env_filter::Builder::new();
        match std::env::var("RUST_LOG") {
            Ok(directives) => builder.parse(&directives),
            Err(_) => builder.filter_level(LevelFilter::Info),
        };
        Self {
            logger,
            filter: builder.build(),
        }
    }

    /// Create a bridge filtered by explicit directives, in `RUST_LOG` syntax.
    pub fn with_directives(logger: Logger, directives: &str) -> Self {
        let filter = env_filter::Builder::new().parse(directives).build();
        Self { logger, filter }
    }

    /// The most verbose level this bridge lets through.
    pub fn max_level(&self) -> LevelFilter {
        self.filter.filter()
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !self.filter.matches(record) {
            return;
        }
        let level = Level::from(record.level());
        if let Err(err) = self.logger.log(level, record.args()) {
            self.logger.trap(&err);
        }
    }

    fn flush(&self) {
        if let Err(err) = self.logger.write_now() {
            self.logger.trap(&err);
        }
    }
}

/// Install `bridge` as the global `log` logger.
///
/// # Errors
///
/// Return an error if a global logger has already been set.
pub fn try_setup_log_crate(bridge: LogBridge) -> Result<(), Error> {
    let max_level = bridge.max_level();
    log::set_boxed_logger(Box::new(bridge))
        .map_err(|err| Error::new("failed to set up the log crate logger").with_source(err))?;
    log::set_max_level(max_level);
    Ok(())
}

impl Logger {
    /// Install this logger as the global `log` logger, filtered by `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Return an error if a global logger has already been set.
    pub fn apply(&self) -> Result<(), Error> {
        try_setup_log_crate(LogBridge::new(self.clone()))
    }
}
