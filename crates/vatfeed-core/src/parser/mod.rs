//! Feed parsers.
//!
//! Every parser follows the same cycle: [`FeedParser::set_raw_input`] resets
//! it with new bytes, [`FeedParser::parse`] builds a fresh
//! [`ResultContainer`] and decides validity, and the accessors expose the
//! outcome. The sync engine only ever talks to the trait.

mod data;
mod data_v3;
mod metar;
mod status;

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ConfigError;
use crate::log::Logger;
use crate::result::ResultContainer;

pub use data::{DataParser, GENERAL_KEYS, LEGACY_SECTIONS};
pub use data_v3::{DataV3Parser, CLIENT_TYPE_ATC, CLIENT_TYPE_FIELD, CLIENT_TYPE_PILOT};
pub use metar::{MetarParser, NO_METAR_SENTINEL};
pub use status::{StatusParser, STATUS_KEYS};

/// Parser contract shared by every feed kind.
pub trait FeedParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    /// Replaces the input, fingerprints it and marks the parser invalid.
    fn set_raw_input(&mut self, raw: &[u8]);

    /// Rebuilds the result from the current input and decides validity.
    fn parse(&mut self);

    fn is_valid(&self) -> bool;

    fn result(&self) -> &ResultContainer;

    /// Input split into lines.
    fn raw_lines(&self) -> &[String];

    /// Hex SHA-256 of the current input.
    fn fingerprint(&self) -> &str;

    /// Expiry window for the feed's own update stamp; ignored by parsers
    /// whose input carries none.
    fn set_data_expire(&mut self, _seconds: u64) {}

    /// Update stamp of the last parse as epoch seconds, when the feed has one.
    fn update_timestamp(&self) -> Option<i64> {
        None
    }
}

/// Registered parser names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    Status,
    Data,
    #[serde(rename = "datav3")]
    DataV3,
    Metar,
}

impl ParserKind {
    pub const ALL: [Self; 4] = [Self::Status, Self::Data, Self::DataV3, Self::Metar];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Data => "data",
            Self::DataV3 => "datav3",
            Self::Metar => "metar",
        }
    }

    /// Builds a parser of this kind with no data expiry configured.
    pub fn build(self, logger: Arc<dyn Logger>) -> Box<dyn FeedParser> {
        match self {
            Self::Status => Box::new(StatusParser::new(logger)),
            Self::Data => Box::new(DataParser::new(logger)),
            Self::DataV3 => Box::new(DataV3Parser::new(logger)),
            Self::Metar => Box::new(MetarParser::new(logger)),
        }
    }
}

impl Display for ParserKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "data" => Ok(Self::Data),
            "datav3" | "datav3compat" => Ok(Self::DataV3),
            "metar" => Ok(Self::Metar),
            other => Err(ConfigError::UnknownParser {
                name: other.to_owned(),
            }),
        }
    }
}

/// Input held by a parser between `set_raw_input` and the next reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RawInput {
    pub(crate) text: String,
    pub(crate) lines: Vec<String>,
    pub(crate) fingerprint: String,
}

impl RawInput {
    pub(crate) fn new(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw).into_owned();
        let lines = text.lines().map(str::to_owned).collect();
        Self {
            fingerprint: hex::encode(Sha256::digest(raw)),
            lines,
            text,
        }
    }
}

/// Lowercases a name and turns spaces into underscores.
pub(crate) fn scrub_key(key: &str) -> String {
    key.to_lowercase().replace(' ', "_")
}

/// Whether an update stamp is older than `expire` seconds.
///
/// An `expire` of zero disables the check.
pub(crate) fn timestamp_expired(timestamp: i64, expire: u64, now: i64) -> bool {
    if expire == 0 {
        return false;
    }
    let expire = i64::try_from(expire).unwrap_or(i64::MAX);
    now.saturating_sub(timestamp) > expire
}
