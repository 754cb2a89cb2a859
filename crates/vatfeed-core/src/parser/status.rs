use std::sync::Arc;

use crate::filter::variables;
use crate::log::Logger;
use crate::parser::{FeedParser, ParserKind, RawInput};
use crate::record::RecordSet;
use crate::result::ResultContainer;
use crate::log_debug;

/// Status file variables and the result names their values are published under.
pub const STATUS_KEYS: [(&str, &str); 4] = [
    ("url0", "dataUrls"),
    ("url1", "serverUrls"),
    ("metar0", "metarUrls"),
    ("atis0", "atisUrls"),
];

/// Parses the bootstrap status file into endpoint lists.
///
/// Valid as soon as at least one data URL is listed.
pub struct StatusParser {
    logger: Arc<dyn Logger>,
    input: RawInput,
    result: ResultContainer,
    valid: bool,
}

impl StatusParser {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            input: RawInput::default(),
            result: ResultContainer::new(),
            valid: false,
        }
    }
}

impl FeedParser for StatusParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Status
    }

    fn set_raw_input(&mut self, raw: &[u8]) {
        self.input = RawInput::new(raw);
        self.valid = false;
    }

    fn parse(&mut self) {
        let mut result = ResultContainer::new();
        for (key, target) in STATUS_KEYS {
            let urls: RecordSet = variables(&self.input.lines, key).collect();
            result.append(target, urls);
        }

        self.valid = !result.get("dataUrls").is_empty();
        if self.valid {
            log_debug!(self.logger, "status data validated, data urls available");
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoOpLogger;

    const STATUS: &str = "\
; comment
msg0=Welcome
url0=http://one.example/vatsim-data.txt
url0=http://two.example/vatsim-data.txt
url1=http://one.example/vatsim-servers.txt
metar0=http://metar.example/metar.php
atis0=http://atis.example/atis.php
";

    #[test]
    fn endpoints_are_published_per_key() {
        let mut parser = StatusParser::new(Arc::new(NoOpLogger));
        parser.set_raw_input(STATUS.as_bytes());
        parser.parse();

        assert!(parser.is_valid());
        let result = parser.result();
        assert_eq!(
            result.get_list(),
            vec!["dataUrls", "serverUrls", "metarUrls", "atisUrls"]
        );
        assert_eq!(
            result.get("dataUrls").values().collect::<Vec<_>>(),
            vec![
                "http://one.example/vatsim-data.txt",
                "http://two.example/vatsim-data.txt",
            ]
        );
        assert_eq!(
            result.get("metarUrls").values().collect::<Vec<_>>(),
            vec!["http://metar.example/metar.php"]
        );
    }

    #[test]
    fn status_without_data_urls_is_invalid() {
        let mut parser = StatusParser::new(Arc::new(NoOpLogger));
        parser.set_raw_input(b"url1=http://one.example/servers.txt\n");
        parser.parse();

        assert!(!parser.is_valid());
        assert!(parser.result().get("dataUrls").is_empty());
        assert_eq!(parser.result().get("serverUrls").len(), 1);
    }

    #[test]
    fn new_input_resets_validity() {
        let mut parser = StatusParser::new(Arc::new(NoOpLogger));
        parser.set_raw_input(STATUS.as_bytes());
        parser.parse();
        assert!(parser.is_valid());

        parser.set_raw_input(b"");
        assert!(!parser.is_valid());
    }
}
