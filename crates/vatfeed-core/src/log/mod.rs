//! Logging handle injected into every component.
//!
//! Parsers, sync engines and the [`FeedClient`](crate::FeedClient) facade take an
//! `Arc<dyn Logger>` at construction instead of reaching for a process-wide
//! logger. Production code passes [`TracingLogger`]; tests pass [`NoOpLogger`]
//! or a [`MemoryLogger`] when they want to assert on what was logged.
//!
//! ```
//! use std::sync::Arc;
//! use vatfeed_core::log::{Logger, NoOpLogger};
//! use vatfeed_core::log_debug;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_debug!(logger, "cache file {} saved", "status.txt");
//! ```

mod logger;
mod memory;
mod noop;
mod tracing_adapter;

pub use logger::{LogLevel, Logger};
pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use tracing_adapter::TracingLogger;
