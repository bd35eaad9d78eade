//   interpret-trailers - minimal stderr logger
//   Copyright (C) 2016 Matthias Beyer <mail@beyermatthias.de>
//   Copyright (C) 2016 Julian Ganz <neither@nut.email>
//
//   This program is free software; you can redistribute it and/or modify
//   it under the terms of the GNU General Public License version 2 as
//   published by the Free Software Foundation.
//

use std::io::{stderr, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Basic logger
///
/// Logs to stderr, one line per record, no timestamps or target prefixes.
pub struct Logger {
    level: LevelFilter,
}

impl Logger {
    /// Install this logger as the global logger at the given level
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_max_level(level);
        log::set_boxed_logger(Box::new(Logger { level }))
    }

    /// Map a `-v` repeat count onto a level, `Warn` by default
    pub fn level_for_verbosity(count: u8) -> LevelFilter {
        match count {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            writeln!(stderr(), "{}", record.args()).ok();
        }
    }

    fn flush(&self) {}
}

/// Convenience trait for logging every layer of an `error-chain` error
pub trait LoggableError {
    fn log(&self);
}

impl LoggableError for trailer_core::error::Error {
    fn log(&self) {
        for err in self.iter() {
            log::error!("{}", err);
        }
    }
}
