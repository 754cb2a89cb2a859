use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parser::ParserKind;

/// Bootstrap file listing the mirrors of every other feed.
pub const DEFAULT_STATUS_URL: &str = "http://status.vatsim.net/status.txt";

/// Logical feeds, each synced into its own cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Status,
    Data,
    Metar,
}

impl FeedKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Data => "data",
            Self::Metar => "metar",
        }
    }

    /// Seconds before the cache file of this feed is considered stale.
    pub const fn default_refresh(self) -> u64 {
        match self {
            Self::Status => 86_400,
            Self::Data => 180,
            Self::Metar => 600,
        }
    }
}

impl Display for FeedKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire format of the data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Colon-delimited sectioned text.
    #[default]
    Legacy,
    /// JSON feed, mapped back onto legacy records.
    Json,
}

impl DataFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Json => "json",
        }
    }

    pub const fn parser_kind(self) -> ParserKind {
        match self {
            Self::Legacy => ParserKind::Data,
            Self::Json => ParserKind::DataV3,
        }
    }

    pub const fn cache_file(self) -> &'static str {
        match self {
            Self::Legacy => "vatsim-data.txt",
            Self::Json => "vatsim-data.json",
        }
    }
}

impl Display for DataFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "legacy" | "text" => Ok(Self::Legacy),
            "json" | "v3" => Ok(Self::Json),
            other => Err(ConfigError::UnknownFormat {
                value: other.to_owned(),
            }),
        }
    }
}

/// Uppercased four-letter airport code.
pub fn normalize_icao(code: &str) -> Result<String, ConfigError> {
    let trimmed = code.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return Err(ConfigError::InvalidAirport {
            code: code.to_owned(),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}
