use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal configuration problems; raised before any source is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("cache file name cannot be empty")]
    EmptyCacheFile,
    #[error("cache file '{}' is not writable", path.display())]
    CacheNotWritable { path: PathBuf },
    #[error("cache directory '{}' is not writable", path.display())]
    CacheDirNotWritable { path: PathBuf },
    #[error("no parser is bound to this feed")]
    ParserMissing,
    #[error("unknown parser '{name}', expected one of status, data, datav3, metar")]
    UnknownParser { name: String },
    #[error("unknown data format '{value}', expected one of legacy, json")]
    UnknownFormat { value: String },
    #[error("invalid feed url '{url}'")]
    InvalidUrl { url: String },
    #[error("airport code must be exactly four letters: '{code}'")]
    InvalidAirport { code: String },
    #[error("invalid value '{value}' for {key}")]
    Env { key: String, value: String },
    #[error("http transport could not be built: {message}")]
    Transport { message: String },
}

/// Why one candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFailureKind {
    Network,
    Invalid,
    Expired,
    Io,
}

impl SourceFailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Invalid => "invalid",
            Self::Expired => "expired",
            Self::Io => "io",
        }
    }
}

impl Display for SourceFailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed candidate: where it came from and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub kind: SourceFailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, kind: SourceFailureKind, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn network(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(source, SourceFailureKind::Network, message)
    }

    pub fn invalid(source: impl Into<String>) -> Self {
        Self::new(
            source,
            SourceFailureKind::Invalid,
            "Data not valid according to parser",
        )
    }

    pub fn expired(source: impl Into<String>) -> Self {
        Self::new(source, SourceFailureKind::Expired, "Local cache is expired")
    }

    pub fn io(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(source, SourceFailureKind::Io, message)
    }
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.source, self.message, self.kind)
    }
}

/// Failure of a whole synchronization cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no location(s) available to sync from")]
    NoLocations { failures: Vec<SourceFailure> },
    #[error("unable to download data or data invalid")]
    Exhausted { failures: Vec<SourceFailure> },
    #[error("status feed lists no '{key}' urls")]
    MissingStatusUrls { key: String },
}

impl SyncError {
    /// Per-candidate failures collected before giving up.
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            Self::NoLocations { failures } | Self::Exhausted { failures } => failures,
            Self::Config(_) | Self::MissingStatusUrls { .. } => &[],
        }
    }
}
