//! Record model shared by the filters, parsers and the result container.

use std::fmt::{Display, Formatter};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One parsed row: field names mapped to values, kept in header order.
///
/// Inserting a name that already exists replaces the value in place, so a
/// header with duplicate names keeps the first position and the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with every name present and set to the empty string.
    pub fn blank<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut record = Self::new();
        for name in names {
            record.insert(name, "");
        }
        record
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Element of a [`RecordSet`]: a tabular row or a bare value (URL lists, raw lines).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Value(String),
    Record(Record),
}

impl Entry {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Value(_) => None,
        }
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.write_str(value),
            Self::Record(record) => {
                let mut first = true;
                for (name, value) in record.iter() {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={value}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

impl From<Record> for Entry {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl From<String> for Entry {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Self::Value(value.to_owned())
    }
}

/// Ordered, immutable collection of entries published under one section name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    entries: Vec<Entry>,
}

impl RecordSet {
    pub const fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&Entry> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(Entry::as_record)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(Entry::as_value)
    }
}

impl<E: Into<Entry>> FromIterator<E> for RecordSet {
    fn from_iter<T: IntoIterator<Item = E>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Record> for RecordSet {
    fn from(record: Record) -> Self {
        Self {
            entries: vec![Entry::Record(record)],
        }
    }
}

impl From<Vec<String>> for RecordSet {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_keeps_position_and_takes_last_value() {
        let mut record = Record::new();
        record.insert("callsign", "SWA1");
        record.insert("cid", "1");
        record.insert("callsign", "SWA2");

        assert_eq!(record.names().collect::<Vec<_>>(), vec!["callsign", "cid"]);
        assert_eq!(record.get("callsign"), Some("SWA2"));
    }

    #[test]
    fn blank_record_has_every_field_empty() {
        let record = Record::blank(["a", "b"]);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("b"), Some(""));
    }

    #[test]
    fn record_serializes_as_ordered_map() {
        let record: Record = [("z", "1"), ("a", "2")].into_iter().collect();
        let json = serde_json::to_string(&record).expect("serializable");
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn record_set_separates_values_and_records() {
        let set: RecordSet = vec![
            Entry::from("http://a"),
            Entry::from(Record::blank(["x"])),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.values().collect::<Vec<_>>(), vec!["http://a"]);
        assert_eq!(set.records().count(), 1);
    }
}
