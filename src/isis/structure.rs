//! Decoded record data structures.
//!
//! A [`RawRecord`] maps each tag to the ordered list of its occurrences, each
//! occurrence being a [`Subfields`] map. Views read records through two
//! primitives only: [`RawRecord::first`] and [`RawRecord::all`].

use crate::isis::parse::parse_field_content;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the unmarked leading content of a field.
pub const LEADING_SUBFIELD: &str = "_";

/// Subfields of one field occurrence, keyed by subfield marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subfields(BTreeMap<CompactString, String>);

impl Subfields {
    /// Create an empty subfield map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subfields holding only unmarked content.
    pub fn from_value(value: impl Into<String>) -> Self {
        let mut subfields = Self::new();
        subfields.insert(LEADING_SUBFIELD, value);
        subfields
    }

    pub fn insert(&mut self, key: impl Into<CompactString>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value of subfield `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The unmarked leading content.
    pub fn value(&self) -> Option<&str> {
        self.get(LEADING_SUBFIELD)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<CompactString>, V: Into<String>> FromIterator<(K, V)> for Subfields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One legacy entry: tag → ordered occurrences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<CompactString, Vec<Subfields>>);

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(tag, content)` pairs in legacy field syntax.
    ///
    /// Contents are parsed as in an export line, so `"^ffirst^llast"` yields
    /// subfields `f` and `l`. Empty contents are skipped.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut record = Self::new();
        for (tag, content) in fields {
            if let Some(subfields) = parse_field_content(content) {
                record.add_field(tag, subfields);
            }
        }
        record
    }

    /// Append an occurrence of `tag`.
    pub(crate) fn add_field(&mut self, tag: impl Into<CompactString>, subfields: Subfields) {
        self.0.entry(tag.into()).or_default().push(subfields);
    }

    /// First occurrence of `tag`.
    pub fn first(&self, tag: &str) -> Option<&Subfields> {
        self.0.get(tag).and_then(|values| values.first())
    }

    /// All occurrences of `tag`, in export order.
    pub fn all(&self, tag: &str) -> &[Subfields] {
        self.0.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Unmarked content of the first occurrence of `tag`.
    pub fn value(&self, tag: &str) -> Option<&str> {
        self.first(tag).and_then(Subfields::value)
    }

    /// Unmarked content of every occurrence of `tag`.
    pub fn values<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.all(tag).iter().filter_map(Subfields::value)
    }

    pub fn has_content(&self) -> bool {
        !self.0.is_empty()
    }

    /// Tags present in this record.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(CompactString::as_str)
    }
}

/// All records sharing one derived identifier, in export order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordGroup {
    pub id: String,
    pub records: Vec<RawRecord>,
}

impl RecordGroup {
    pub fn new(id: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            id: id.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_raw_record_new() {
        let record = RawRecord::new();
        assert!(!record.has_content());
        assert!(record.first("v880").is_none());
        assert!(record.all("v880").is_empty());
    }

    #[test]
    fn test_repeating_field_keeps_order() {
        let record = RawRecord::from_fields([
            ("v012", "^len^_First"),
            ("v012", "^les^_Primero"),
            ("v012", "^lpt^_Primeiro"),
        ]);

        let langs: Vec<_> = record
            .all("v012")
            .iter()
            .filter_map(|s| s.get("l"))
            .collect();
        assert_eq!(langs, vec!["en", "es", "pt"]);
        assert_eq!(record.first("v012").and_then(|s| s.value()), Some("First"));
    }

    #[test]
    fn test_value_and_values() {
        let record = RawRecord::from_fields([("v601", "es"), ("v601", "pt"), ("v040", "en")]);
        assert_eq!(record.value("v040"), Some("en"));
        assert_eq!(record.values("v601").collect::<Vec<_>>(), vec!["es", "pt"]);
        assert_eq!(record.value("v999"), None);
    }

    #[test]
    fn test_empty_content_is_skipped() {
        let record = RawRecord::from_fields([("v880", ""), ("v040", "en")]);
        assert_eq!(record.tags().collect::<Vec<_>>(), vec!["v040"]);
    }

    #[test]
    fn test_serializes_like_legacy_json() {
        let record = RawRecord::from_fields([("v014", "^f1^l10")]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"v014":[{"f":"1","l":"10"}]}"#);

        let back: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
