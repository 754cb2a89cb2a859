use thiserror::Error;
use vatfeed_core::{SourceFailure, SyncError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] vatfeed_core::ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Command(_) => 2,
            Self::Sync(SyncError::Config(_)) => 2,
            Self::Sync(_) => 3,
            Self::Serialization(_) => 4,
        }
    }

    /// Per-candidate failures behind a sync error.
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            Self::Sync(error) => error.failures(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vatfeed_core::ConfigError;

    #[test]
    fn configuration_problems_exit_with_usage_code() {
        assert_eq!(CliError::from(ConfigError::EmptyCacheFile).exit_code(), 2);
        assert_eq!(
            CliError::from(SyncError::Config(ConfigError::ParserMissing)).exit_code(),
            2
        );
        let transport = ConfigError::Transport {
            message: String::from("tls backend unavailable"),
        };
        assert_eq!(CliError::from(transport).exit_code(), 2);
    }

    #[test]
    fn exhausted_sync_exposes_failures() {
        let error = CliError::from(SyncError::Exhausted {
            failures: vec![SourceFailure::invalid("http://a.example")],
        });
        assert_eq!(error.exit_code(), 3);
        assert_eq!(error.failures().len(), 1);
    }
}
