use std::fmt::Arguments;

use super::{LogLevel, Logger};

/// Logger that forwards to the `tracing` macros under the `vatfeed` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "vatfeed", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "vatfeed", "{}", args),
            LogLevel::Info => tracing::info!(target: "vatfeed", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "vatfeed", "{}", args),
            LogLevel::Error => tracing::error!(target: "vatfeed", "{}", args),
        }
    }
}
