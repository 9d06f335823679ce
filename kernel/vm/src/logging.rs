//! Routing of `log` records to the kernel console

use core::fmt::{self, Write};
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// The console device log output is printed on.
///
/// Like the other hardware seams this takes shared references; the console
/// is machine-global state.
pub trait ConsoleSink: Sync + Send {
    /// Put a chunk of characters on the console.
    fn write(&self, message: &str);
}

/// A [`Log`] implementation printing every record to a [`ConsoleSink`].
pub struct KernelLogger<C> {
    max_log_level: Level,
    console: C,
}

impl<C> KernelLogger<C> {
    pub const fn new(max_log_level: Level, console: C) -> Self {
        Self {
            max_log_level,
            console,
        }
    }
}

impl<C: ConsoleSink + 'static> KernelLogger<C> {
    /// Register this logger as the global `log` sink.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self).map(|_| log::set_max_level(self.max_log_level.to_level_filter()))
    }
}

/// Adapter that gives [`fmt::Write`] over a shared sink reference.
struct SinkWriter<'a, C> {
    sink: &'a C,
}

impl<C: ConsoleSink> fmt::Write for SinkWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.sink.write(s);
        Ok(())
    }
}

impl<C: ConsoleSink> Log for KernelLogger<C> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_log_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            SinkWriter {
                sink: &self.console,
            }
            .write_fmt(format_args!(
                "{} - {}: {}\n",
                record.level(),
                record.target(),
                record.args(),
            ))
            .expect("could not write log message to the console")
        }
    }

    fn flush(&self) {}
}
