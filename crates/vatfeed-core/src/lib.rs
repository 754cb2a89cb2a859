//! # Vatfeed Core
//!
//! Fetch, cache and parse the VATSIM network status feeds.
//!
//! ## Overview
//!
//! This crate provides the building blocks of the `vatfeed` toolkit:
//!
//! - **Lazy line filters** that classify sectioned feed text
//! - **Feed parsers** for the status file, the legacy data feed, the JSON
//!   data feed and per-airport METAR reports
//! - **A sync engine** that prefers a fresh cache file and fails over across
//!   shuffled mirrors, accumulating per-candidate failures
//! - **A facade** ([`FeedClient`]) with search and listing queries
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Cache file access and atomic writes |
//! | [`client`] | High-level facade |
//! | [`config`] | Client configuration |
//! | [`error`] | Configuration, source and sync errors |
//! | [`feed`] | Feed kinds, data formats and airport codes |
//! | [`filter`] | Lazy line filters over sectioned text |
//! | [`http_client`] | HTTP client abstraction |
//! | [`log`] | Injected logging handle |
//! | [`parser`] | Feed parsers and parser registry |
//! | [`record`] | Records and record sets |
//! | [`result`] | Named record sets produced by a parse |
//! | [`sync`] | Cache-or-mirror synchronization |
//! | [`timestamp`] | Feed timestamp conversion |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vatfeed_core::{FeedClient, FeedConfig, TracingLogger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = FeedConfig::from_env()?.with_cache_dir("/var/cache/vatfeed");
//!     let mut client = FeedClient::from_config(config, Arc::new(TracingLogger))?;
//!
//!     if client.load_data().await {
//!         for pilot in client.pilots().records() {
//!             println!("{}", pilot.get("callsign").unwrap_or_default());
//!         }
//!     } else {
//!         eprintln!("{:?}", client.errors());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  FeedClient     │────▶│ Status FeedSync  │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data / Metar    │────▶│ HTTP Client      │
//! │ FeedSync        │────▶│ Cache File       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ FeedParser      │
//! │ (line filters)  │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Configuration problems are returned immediately. Failed candidates are
//! collected, and only running out of candidates fails a cycle:
//!
//! ```rust
//! use vatfeed_core::{SourceFailureKind, SyncError};
//!
//! fn report(error: &SyncError) {
//!     for failure in error.failures() {
//!         match failure.kind {
//!             SourceFailureKind::Network => { /* mirror down */ }
//!             SourceFailureKind::Expired => { /* cache too old */ }
//!             _ => {}
//!         }
//!     }
//! }
//! ```
//!
//! ## Caveats
//!
//! - In cache-only mode a present cache file is used however old it is.
//! - A multi-field search matches records where *any* field matches, and a
//!   record matching several queried fields is returned once per match.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod filter;
pub mod http_client;
pub mod log;
pub mod parser;
pub mod record;
pub mod result;
pub mod sync;
pub mod timestamp;

pub use cache::{CacheFile, CacheMode};
pub use client::FeedClient;
pub use config::FeedConfig;
pub use error::{ConfigError, SourceFailure, SourceFailureKind, SyncError};
pub use feed::{normalize_icao, DataFormat, FeedKind, DEFAULT_STATUS_URL};
pub use filter::{LineFilter, SectionData};
pub use http_client::{
    FetchOptions, HttpClient, HttpError, HttpRequest, HttpResponse, OfflineHttpClient,
    ReqwestHttpClient, StaticHttpClient,
};
pub use log::{LogLevel, Logger, MemoryLogger, NoOpLogger, TracingLogger};
pub use parser::{FeedParser, ParserKind};
pub use record::{Entry, Record, RecordSet};
pub use result::ResultContainer;
pub use sync::{Candidate, FeedSync};
pub use timestamp::convert_timestamp;
