use std::sync::Arc;

use crate::filter::{section_header, LineFilter, SectionData};
use crate::log::Logger;
use crate::parser::{scrub_key, timestamp_expired, FeedParser, ParserKind, RawInput};
use crate::record::{Record, RecordSet};
use crate::result::ResultContainer;
use crate::timestamp::{convert_timestamp, now_epoch};
use crate::{log_debug, log_trace};

/// Sections of the legacy feed, in publication order.
pub const LEGACY_SECTIONS: [&str; 4] = ["clients", "prefile", "servers", "voice servers"];

/// Keys kept from the `!GENERAL:` section.
pub const GENERAL_KEYS: [&str; 5] = [
    "version",
    "reload",
    "update",
    "atis_allow_min",
    "connected_clients",
];

const GENERAL_SECTION: &str = "general";
const GENERAL_SEPARATOR: &str = " = ";

/// Parser for the legacy colon-delimited data feed.
///
/// Valid when the general section carries a well-formed update stamp that is
/// not older than the configured expiry window.
pub struct DataParser {
    logger: Arc<dyn Logger>,
    input: RawInput,
    result: ResultContainer,
    valid: bool,
    data_expire: u64,
    update: Option<i64>,
}

impl DataParser {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            input: RawInput::default(),
            result: ResultContainer::new(),
            valid: false,
            data_expire: 0,
            update: None,
        }
    }

    /// Seconds after which the feed's own update stamp counts as stale; 0 disables.
    pub fn with_data_expire(mut self, seconds: u64) -> Self {
        self.data_expire = seconds;
        self
    }

    pub fn data_expire(&self) -> u64 {
        self.data_expire
    }

    fn parse_sections(&self, result: &mut ResultContainer) {
        let lines = &self.input.lines;
        for section in LEGACY_SECTIONS {
            let Some(header) = section_header(lines, section) else {
                log_debug!(self.logger, "no header for section {section}");
                continue;
            };

            let name = scrub_key(section);
            result.append(&format!("{name}_header"), header.clone());
            result.append(&name, SectionData::new(lines, section, header).to_record_set());
            log_debug!(self.logger, "parsed section '{name}'");
        }
    }

    fn parse_general(&self) -> Record {
        let mut general = Record::blank(GENERAL_KEYS);
        for entry in &LineFilter::section(&self.input.lines, GENERAL_SECTION) {
            let mut parts = entry.split(GENERAL_SEPARATOR);
            let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                continue;
            };

            let key = scrub_key(key);
            if general.contains(&key) {
                log_trace!(self.logger, "general section: {key} -> {value}");
                general.insert(key, value);
            }
        }
        general
    }
}

/// Replaces the raw update stamp with epoch seconds, or empty when malformed.
pub(crate) fn finish_general(general: &mut Record) -> Option<i64> {
    let update = general.get("update").and_then(convert_timestamp);
    general.insert(
        "update",
        update.map(|epoch| epoch.to_string()).unwrap_or_default(),
    );
    update
}

/// Validity rule shared by both data parsers.
pub(crate) fn update_is_valid(logger: &dyn Logger, update: Option<i64>, data_expire: u64) -> bool {
    let Some(update) = update else {
        return false;
    };
    if timestamp_expired(update, data_expire, now_epoch()) {
        log_debug!(logger, "data with timestamp {update} has expired");
        return false;
    }
    log_debug!(logger, "valid data with timestamp {update}");
    true
}

impl FeedParser for DataParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Data
    }

    fn set_raw_input(&mut self, raw: &[u8]) {
        self.input = RawInput::new(raw);
        self.valid = false;
        self.update = None;
    }

    fn parse(&mut self) {
        let mut result = ResultContainer::new();
        self.parse_sections(&mut result);

        let mut general = self.parse_general();
        self.update = finish_general(&mut general);
        result.append(GENERAL_SECTION, general);
        result.append("raw", RecordSet::from(self.input.lines.clone()));

        self.valid = update_is_valid(self.logger.as_ref(), self.update, self.data_expire);
        self.result = result;
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn result(&self) -> &ResultContainer {
        &self.result
    }

    fn raw_lines(&self) -> &[String] {
        &self.input.lines
    }

    fn fingerprint(&self) -> &str {
        &self.input.fingerprint
    }

    fn set_data_expire(&mut self, seconds: u64) {
        self.data_expire = seconds;
    }

    fn update_timestamp(&self) -> Option<i64> {
        self.update
    }
}
