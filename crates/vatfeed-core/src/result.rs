//! Named record sets produced by one parse.

use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::record::{Record, RecordSet};

static EMPTY: RecordSet = RecordSet::empty();

const HEADER_SUFFIX: &str = "_header";

/// Section names are stored with spaces turned into underscores.
pub fn scrub_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Ordered map of section name to [`RecordSet`].
///
/// Parsers build a new container on every parse and hand it out whole; sets
/// are shared behind `Arc`, so cloning a container is cheap and never copies
/// rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultContainer {
    sections: Vec<(String, Arc<RecordSet>)>,
}

impl ResultContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `name`, replacing any set already stored there.
    pub fn append(&mut self, name: &str, data: impl Into<RecordSet>) {
        let name = scrub_name(name);
        let data = Arc::new(data.into());
        match self.sections.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = data,
            None => self.sections.push((name, data)),
        }
    }

    /// The set stored under `name`, or an empty set.
    pub fn get(&self, name: &str) -> &RecordSet {
        self.find(&scrub_name(name)).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(&scrub_name(name)).is_some()
    }

    /// Registered names in insertion order.
    pub fn get_list(&self) -> Vec<&str> {
        self.sections.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordSet)> {
        self.sections
            .iter()
            .map(|(name, set)| (name.as_str(), set.as_ref()))
    }

    /// Records of `name` where any queried field contains its substring.
    ///
    /// Matching is case-insensitive. A multi-field query is an OR, not an AND,
    /// and a record is repeated once for every queried field that matches it:
    /// `[("a", "x"), ("b", "y")]` returns a record holding `a=x, b=y` twice.
    /// Fields absent from a record are ignored. Sets without a registered
    /// `{name}_header` are not searchable and yield nothing.
    pub fn search<I, K, V>(&self, name: &str, query: I) -> RecordSet
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let name = scrub_name(name);
        if self.find(&format!("{name}{HEADER_SUFFIX}")).is_none() {
            return RecordSet::empty();
        }
        let Some(set) = self.find(&name) else {
            return RecordSet::empty();
        };

        let query = query
            .into_iter()
            .map(|(field, needle)| (field.as_ref().to_owned(), needle.as_ref().to_lowercase()))
            .collect::<Vec<_>>();

        set.records()
            .flat_map(|record| {
                let hits = match_count(record, &query);
                std::iter::repeat_n(record, hits)
            })
            .cloned()
            .collect()
    }

    fn find(&self, name: &str) -> Option<&RecordSet> {
        self.sections
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, set)| set.as_ref())
    }
}

fn match_count(record: &Record, query: &[(String, String)]) -> usize {
    query
        .iter()
        .filter(|(field, needle)| {
            record
                .get(field)
                .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
        })
        .count()
}

impl Serialize for ResultContainer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, set) in &self.sections {
            map.serialize_entry(name, set.as_ref())?;
        }
        map.end()
    }
}
