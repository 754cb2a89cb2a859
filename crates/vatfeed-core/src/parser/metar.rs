use std::sync::Arc;

use crate::log::Logger;
use crate::log_debug;
use crate::parser::{FeedParser, ParserKind, RawInput};
use crate::record::RecordSet;
use crate::result::ResultContainer;

/// Body returned by the weather endpoint for an airport without a report.
pub const NO_METAR_SENTINEL: &str = "No METAR available";

/// Treats the whole trimmed input as one opaque weather report.
pub struct MetarParser {
    logger: Arc<dyn Logger>,
    input: RawInput,
    result: ResultContainer,
    valid: bool,
}

impl MetarParser {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger,
            input: RawInput::default(),
            result: ResultContainer::new(),
            valid: false,
        }
    }

    /// The report of the last parse; empty when invalid.
    pub fn report(&self) -> &str {
        self.result.get("metar").values().next().unwrap_or_default()
    }
}

impl FeedParser for MetarParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Metar
    }

    fn set_raw_input(&mut self, raw: &[u8]) {
        self.input = RawInput::new(raw);
        self.valid = false;
    }

    fn parse(&mut self) {
        let report = self.input.text.trim();
        let mut result = ResultContainer::new();

        self.valid = !report.is_empty() && !report.contains(NO_METAR_SENTINEL);
        if self.valid {
            result.append("metar", RecordSet::from(vec![report.to_owned()]));
        } else {
            log_debug!(self.logger, "no metar report in input");
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

    fn parsed(input: &str) -> MetarParser {
        let mut parser = MetarParser::new(Arc::new(NoOpLogger));
        parser.set_raw_input(input.as_bytes());
        parser.parse();
        parser
    }

    #[test]
    fn report_is_trimmed_passthrough() {
        let parser = parsed("  KSFO 010056Z 29012KT 10SM FEW008 14/11 A3002\n");
        assert!(parser.is_valid());
        assert_eq!(parser.report(), "KSFO 010056Z 29012KT 10SM FEW008 14/11 A3002");
    }

    #[test]
    fn sentinel_and_empty_input_are_invalid() {
        let sentinel = parsed("No METAR available for XXXX\n");
        assert!(!sentinel.is_valid());
        assert_eq!(sentinel.report(), "");

        assert!(!parsed("   \n").is_valid());
    }
}
