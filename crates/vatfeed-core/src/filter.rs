//! Lazy line filters over sectioned feed text.
//!
//! The legacy feed is a list of lines grouped into `!NAME:` sections, each
//! preceded by a `; !NAME section - a:b:c:` comment naming its columns, with
//! `key=value` variables in the status file. A [`LineFilter`] selects lines by
//! one of three rules; every call to [`LineFilter::iter`] starts a fresh pass,
//! so a filter can be traversed as many times as needed. [`SectionData`]
//! builds on the section rule to turn rows into [`Record`]s.

use crate::record::{Entry, Record, RecordSet};

const FIELD_SEPARATOR: char = ':';

/// Empty lines and lines starting with `;` are comments.
pub fn is_comment(line: &str) -> bool {
    line.starts_with(';') || line.trim().is_empty()
}

/// Splits a row on `:` after dropping trailing separators.
///
/// The feed terminates every row with `:`, and rows whose last columns are
/// empty lose those separators too, so the field count can come up short.
pub fn split_fields(data: &str) -> Vec<&str> {
    data.trim_end_matches(FIELD_SEPARATOR)
        .split(FIELD_SEPARATOR)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Any,
    Prefix(String),
    Section(String),
}

/// Line selection rule bound to a slice of input lines.
#[derive(Debug, Clone)]
pub struct LineFilter<'a> {
    lines: &'a [String],
    rule: Rule,
    skip_comments: bool,
}

impl<'a> LineFilter<'a> {
    /// Accepts every line, comments included.
    pub fn passthrough(lines: &'a [String]) -> Self {
        Self {
            lines,
            rule: Rule::Any,
            skip_comments: false,
        }
    }

    /// Accepts lines starting with `prefix`; comments are skipped.
    pub fn prefix(lines: &'a [String], prefix: impl Into<String>) -> Self {
        Self {
            lines,
            rule: Rule::Prefix(prefix.into()),
            skip_comments: true,
        }
    }

    /// Accepts the rows between `!NAME:` and the next line starting with `!`.
    ///
    /// The name is matched case-insensitively; both marker lines are excluded.
    pub fn section(lines: &'a [String], name: &str) -> Self {
        Self {
            lines,
            rule: Rule::Section(format!("!{}:", name.to_uppercase())),
            skip_comments: true,
        }
    }

    /// Lets comment lines reach the rule instead of dropping them up front.
    pub fn with_comments(mut self) -> Self {
        self.skip_comments = false;
        self
    }

    pub fn iter(&self) -> FilteredLines<'a> {
        FilteredLines {
            inner: self.lines.iter(),
            rule: self.rule.clone(),
            skip_comments: self.skip_comments,
            in_section: false,
        }
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Materializes the accepted lines as bare values.
    pub fn to_record_set(&self) -> RecordSet {
        self.iter().map(Entry::from).collect()
    }
}

impl<'a> IntoIterator for &LineFilter<'a> {
    type Item = &'a str;
    type IntoIter = FilteredLines<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass of a [`LineFilter`]; yields trimmed lines.
#[derive(Debug, Clone)]
pub struct FilteredLines<'a> {
    inner: std::slice::Iter<'a, String>,
    rule: Rule,
    skip_comments: bool,
    in_section: bool,
}

impl FilteredLines<'_> {
    fn accept(&mut self, line: &str) -> bool {
        match &self.rule {
            Rule::Any => true,
            Rule::Prefix(prefix) => line.starts_with(prefix.as_str()),
            Rule::Section(marker) => {
                if self.in_section && line.starts_with('!') {
                    self.in_section = false;
                }
                let opens = line
                    .get(..marker.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(marker));
                if opens {
                    self.in_section = true;
                    return false;
                }
                self.in_section
            }
        }
    }
}

impl<'a> Iterator for FilteredLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.inner.next()?;
            if self.skip_comments && is_comment(line) {
                continue;
            }
            if self.accept(line) {
                return Some(line.trim());
            }
        }
    }
}

/// Values of every `key=value` line for `key`, trimmed.
pub fn variables<'a>(lines: &'a [String], key: &str) -> impl Iterator<Item = &'a str> + 'a {
    let prefix = format!("{key}=");
    let skip = prefix.len();
    LineFilter::prefix(lines, prefix)
        .iter()
        .map(move |line| line.get(skip..).unwrap_or_default().trim())
}

/// Column names declared by the `; !NAME section - a:b:c:` comment, if any.
pub fn section_header(lines: &[String], section: &str) -> Option<Vec<String>> {
    let prefix = format!("; !{} section - ", section.to_uppercase());
    let skip = prefix.len();
    let filter = LineFilter::prefix(lines, prefix).with_comments();
    let line = filter.iter().next()?;
    let remainder = line.get(skip..).unwrap_or_default().trim();
    if remainder.is_empty() {
        return None;
    }
    Some(split_fields(remainder).into_iter().map(str::to_owned).collect())
}

/// Zips row values onto header names.
///
/// Returns `None` when the header is empty or shorter than the row. A row
/// shorter than the header is padded with empty strings on the right; this
/// assumes the missing columns are the trailing ones, which is how the feed
/// truncates rows but is not verified.
pub fn zip_row(header: &[String], values: &[&str]) -> Option<Record> {
    if header.is_empty() || header.len() < values.len() {
        return None;
    }

    let padded = values
        .iter()
        .copied()
        .chain(std::iter::repeat(""))
        .take(header.len());
    Some(header.iter().map(String::as_str).zip(padded).collect())
}

/// Rows of one section zipped against its header.
#[derive(Debug, Clone)]
pub struct SectionData<'a> {
    filter: LineFilter<'a>,
    header: Vec<String>,
}

impl<'a> SectionData<'a> {
    pub fn new(lines: &'a [String], section: &str, header: Vec<String>) -> Self {
        Self {
            filter: LineFilter::section(lines, section),
            header,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lazily yields one record per accepted row; rejected rows are dropped.
    pub fn iter(&self) -> impl Iterator<Item = Record> + '_ {
        self.filter
            .iter()
            .filter_map(|line| zip_row(&self.header, &split_fields(line)))
    }

    pub fn to_record_set(&self) -> RecordSet {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &[&str]) -> Vec<String> {
        input.iter().map(|line| (*line).to_owned()).collect()
    }

    fn base_data() -> Vec<String> {
        lines(&[
            ";comment line",
            ";",
            "!CLIENTS:",
            "SWA3437:1234567:Jelle Vink KSJC:",
            "BWA3892:8901234:Jelle Vink EBBR:",
            ";",
            "!VOICE SERVERS:",
            "rw.liveatc.net:North America, USA, California:Liveatc:1:R:",
            "",
            ";",
        ])
    }

    #[test]
    fn passthrough_keeps_comments_and_blank_lines() {
        let data = base_data();
        let filter = LineFilter::passthrough(&data);
        assert_eq!(filter.count(), data.len());
    }

    #[test]
    fn section_yields_rows_until_next_marker() {
        let data = base_data();
        let clients = LineFilter::section(&data, "clients");
        assert_eq!(
            clients.iter().collect::<Vec<_>>(),
            vec![
                "SWA3437:1234567:Jelle Vink KSJC:",
                "BWA3892:8901234:Jelle Vink EBBR:",
            ]
        );

        let voice = LineFilter::section(&data, "voice servers");
        assert_eq!(
            voice.iter().collect::<Vec<_>>(),
            vec!["rw.liveatc.net:North America, USA, California:Liveatc:1:R:"]
        );
    }

    #[test]
    fn filter_can_be_traversed_twice() {
        let data = base_data();
        let clients = LineFilter::section(&data, "CLIENTS");
        let first = clients.iter().collect::<Vec<_>>();
        let second = clients.iter().collect::<Vec<_>>();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn variables_strip_key_and_whitespace() {
        let data = lines(&["url0=aaa", "url0= bbb ", "url1=ccc", "nurl0=zzz", ";url0=commented"]);
        assert_eq!(variables(&data, "url0").collect::<Vec<_>>(), vec!["aaa", "bbb"]);
    }

    #[test]
    fn header_is_read_from_section_comment() {
        let data = lines(&[
            "; !CLIENTS section -         callsign:cid:realname:",
            "!CLIENTS:",
        ]);
        assert_eq!(
            section_header(&data, "clients"),
            Some(vec![
                String::from("callsign"),
                String::from("cid"),
                String::from("realname"),
            ])
        );
        assert_eq!(section_header(&data, "servers"), None);
    }

    #[test]
    fn short_rows_are_padded_and_long_rows_dropped() {
        let header = vec![
            String::from("callsign"),
            String::from("cid"),
            String::from("realname"),
        ];

        let padded = zip_row(&header, &split_fields("SWA3437:fixnext")).expect("padded row");
        assert_eq!(padded.len(), 3);
        assert_eq!(padded.get("cid"), Some("fixnext"));
        assert_eq!(padded.get("realname"), Some(""));

        assert!(zip_row(&header, &split_fields("SWA3437:1:Jelle:toomuch:")).is_none());
        assert!(zip_row(&[], &split_fields("SWA3437")).is_none());
    }

    #[test]
    fn section_data_zips_rows_against_header() {
        let data = lines(&[";comment", "!CLIENTS:", "SWA3437:123456:Jelle Vink KSJC:"]);
        let header = vec![
            String::from("callsign"),
            String::from("cid"),
            String::from("realname"),
        ];
        let rows = SectionData::new(&data, "clients", header).to_record_set();

        let expected: Record = [
            ("callsign", "SWA3437"),
            ("cid", "123456"),
            ("realname", "Jelle Vink KSJC"),
        ]
        .into_iter()
        .collect();
        assert_eq!(rows.records().collect::<Vec<_>>(), vec![&expected]);
    }
}
