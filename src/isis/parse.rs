//! Legacy export parsing implementation.
//!
//! This module handles the low-level parsing of `!ID`-delimited exports made
//! of `!TAG!content` lines, with `^x` subfield markers inside the content.

use crate::error::{DecodeError, FieldError};
use crate::isis::structure::{LEADING_SUBFIELD, RawRecord, RecordGroup, Subfields};
use crate::RecordKind;
use compact_str::CompactString;
use either::{Either, Left, Right};
use itertools::Itertools;
use std::collections::HashMap;

/// Line prefix opening a new entry. The rest of the line is the entry number.
pub(crate) const ENTRY_DELIMITER: &str = "!ID ";

/// Stands in for an escaped caret while content is split on `^`.
const CARET_PLACEHOLDER: char = '\u{E000}';

/// Result of decoding one export.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    /// Record groups in order of first appearance.
    pub groups: Vec<RecordGroup>,
    /// Fields and entries that were skipped.
    pub errors: Vec<DecodeError>,
}

impl Decoded {
    /// The group with identifier `id`.
    pub fn get(&self, id: &str) -> Option<&RecordGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Decode an export and group its entries by the key of `kind`.
pub(crate) fn isis_parse(text: &str, kind: RecordKind) -> Decoded {
    let mut decoded = Decoded::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (start_line, lines) in split_entries(text) {
        let (errors, fields): (Vec<_>, Vec<_>) = lines
            .into_iter()
            .filter_map(|(line_number, line)| parse_line(line, line_number, kind))
            .partition_map(|field| field);
        decoded.errors.extend(errors);

        let record = build_record(fields);
        if !record.has_content() {
            continue;
        }

        let Some(id) = kind.group_key(&record) else {
            tracing::warn!(line = start_line, %kind, "skipping entry without identifier");
            decoded.errors.push(DecodeError::at_line(
                start_line,
                kind,
                FieldError::MissingIdentifier {
                    expected: kind.key_tag(),
                },
            ));
            continue;
        };

        match index.get(&id) {
            Some(&position) => decoded.groups[position].records.push(record),
            None => {
                index.insert(id.clone(), decoded.groups.len());
                decoded.groups.push(RecordGroup::new(id, vec![record]));
            }
        }
    }

    tracing::debug!(
        %kind,
        groups = decoded.groups.len(),
        skipped = decoded.errors.len(),
        "decoded legacy export"
    );
    decoded
}

/// Split the export into entries, keeping 1-based line numbers.
///
/// Lines before the first delimiter form an entry of their own, so a single
/// extracted entry without its `!ID` line decodes too.
fn split_entries(text: &str) -> Vec<(usize, Vec<(usize, &str)>)> {
    let mut entries = Vec::new();
    let mut current: (usize, Vec<(usize, &str)>) = (1, Vec::new());

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.starts_with(ENTRY_DELIMITER) || line == ENTRY_DELIMITER.trim_end() {
            let finished = std::mem::replace(&mut current, (line_number, Vec::new()));
            if !finished.1.is_empty() {
                entries.push(finished);
            }
            continue;
        }
        if !line.is_empty() {
            current.1.push((line_number, line));
        }
    }
    if !current.1.is_empty() {
        entries.push(current);
    }
    entries
}

/// Parse one line; `None` means there is nothing to keep and nothing to report.
fn parse_line(
    line: &str,
    line_number: usize,
    kind: RecordKind,
) -> Option<Either<DecodeError, (CompactString, Subfields)>> {
    match parse_field(line) {
        Ok((_, content)) if content.is_empty() => None,
        Ok((tag, content)) => Some(match parse_field_content(content) {
            Some(subfields) => Right((CompactString::from(tag), subfields)),
            None => Left(DecodeError::at_line(
                line_number,
                kind,
                FieldError::EmptyContent(tag.to_string()),
            )),
        }),
        Err(error) => Some(Left(DecodeError::at_line(line_number, kind, error))),
    }
}

/// Split a `!TAG!content` line into its tag and raw content.
pub(crate) fn parse_field(line: &str) -> Result<(&str, &str), FieldError> {
    let rest = line
        .strip_prefix('!')
        .ok_or_else(|| FieldError::MissingTagDelimiter(line.to_string()))?;
    let (tag, content) = rest
        .split_once('!')
        .ok_or_else(|| FieldError::MissingTagDelimiter(line.to_string()))?;
    if tag.trim().is_empty() {
        return Err(FieldError::EmptyTag(line.to_string()));
    }
    Ok((tag, content))
}

/// Parse field content into subfields.
///
/// Content without any `^` becomes `{"_": content}`. Leading content before
/// the first marker is stored under `_`. `\^` is a literal caret. A caret
/// followed by a character that cannot be a subfield key is kept as text of
/// the previous subfield. Subfields with empty values are dropped and a
/// repeated key keeps its last value. Returns `None` when nothing remains.
pub fn parse_field_content(content: &str) -> Option<Subfields> {
    if content.is_empty() {
        return None;
    }
    if !content.contains('^') {
        return Some(Subfields::from_value(content));
    }

    let content = if content.starts_with('^') {
        content.replace("\\^", &CARET_PLACEHOLDER.to_string())
    } else {
        format!("^{}{}", LEADING_SUBFIELD, content).replace("\\^", &CARET_PLACEHOLDER.to_string())
    };

    let mut items: Vec<(char, String)> = Vec::new();
    for piece in content.split('^').filter(|piece| !piece.is_empty()) {
        let mut chars = piece.chars();
        let Some(key) = chars.next() else { continue };
        if is_subfield_key(key) {
            items.push((key, chars.as_str().to_string()));
            continue;
        }
        match items.last_mut() {
            Some((_, value)) => {
                value.push('^');
                value.push_str(piece);
            }
            None => items.push(('_', format!("^{}", piece))),
        }
    }

    let subfields: Subfields = items
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            (
                CompactString::from(key.to_string()),
                value.replace(CARET_PLACEHOLDER, "^"),
            )
        })
        .collect();

    (!subfields.is_empty()).then_some(subfields)
}

fn is_subfield_key(key: char) -> bool {
    key == '_' || key.is_ascii_alphanumeric()
}

/// Group fields by tag, keeping the order of repeated tags.
fn build_record(fields: Vec<(CompactString, Subfields)>) -> RawRecord {
    let mut record = RawRecord::new();
    for (tag, subfields) in fields {
        record.add_field(tag, subfields);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn subfields(pairs: &[(&str, &str)]) -> Subfields {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[rstest]
    #[case("bla^ssurname^nname^oxxx", &[("_", "bla"), ("s", "surname"), ("n", "name"), ("o", "xxx")])]
    #[case("plain text", &[("_", "plain text")])]
    #[case("^aX\\^Y", &[("a", "X^Y")])]
    #[case("X\\^Y", &[("_", "X^Y")])]
    #[case("^len^_Title", &[("l", "en"), ("_", "Title")])]
    #[case("a ^ b^cvalue", &[("_", "a ^ b"), ("c", "value")])]
    #[case("^a^bvalue", &[("b", "value")])]
    #[case("^afirst^asecond", &[("a", "second")])]
    fn test_parse_field_content(#[case] content: &str, #[case] expected: &[(&str, &str)]) {
        assert_eq!(parse_field_content(content), Some(subfields(expected)));
    }

    #[rstest]
    #[case("")]
    #[case("^a")]
    #[case("^a^b")]
    fn test_parse_field_content_without_values(#[case] content: &str) {
        assert_eq!(parse_field_content(content), None);
    }

    #[test]
    fn test_parse_field() {
        let (tag, content) = parse_field("!v9999!bla^ssurname^nname^oxxx").unwrap();
        assert_eq!(tag, "v9999");
        assert_eq!(content, "bla^ssurname^nname^oxxx");
    }

    #[rstest]
    #[case("v880!S0001")]
    #[case("!v880 S0001")]
    fn test_parse_field_missing_delimiter(#[case] line: &str) {
        assert!(matches!(
            parse_field(line),
            Err(FieldError::MissingTagDelimiter(_))
        ));
    }

    #[test]
    fn test_parse_field_empty_tag() {
        assert!(matches!(parse_field("!!content"), Err(FieldError::EmptyTag(_))));
    }

    #[test]
    fn test_repeating_fields_keep_count_and_order() {
        let input = "!ID 000001\n!v010!^sSilva^nAna\n!v010!^sSouza^nBia\n!v010!^sLima^nCaio\n!v035!1234-5678\n!v036!20201\n";
        let decoded = isis_parse(input, RecordKind::Issue);

        assert_eq!(decoded.len(), 1);
        let record = &decoded.groups[0].records[0];
        let surnames: Vec<_> = record
            .all("v010")
            .iter()
            .filter_map(|s| s.get("s"))
            .collect();
        assert_eq!(surnames, vec!["Silva", "Souza", "Lima"]);
    }

    #[test]
    fn test_groups_article_records_in_file_order() {
        let input = concat!(
            "!ID 000001\n",
            "!v880!S0001-00000000000001\n",
            "!v091!20190101\n",
            "!ID 000002\n",
            "!v880!S0001-00000000000001\n",
            "!v031!1\n",
            "!ID 000003\n",
            "!v880!S0001-00000000000002\n",
            "!v091!20190202\n",
            "!ID 000004\n",
            "!v880!S0001-00000000000001\n",
            "!v706!p\n",
        );
        let decoded = isis_parse(input, RecordKind::Article);

        assert_eq!(decoded.len(), 2);
        let first = decoded.get("S0001-00000000000001").unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.records[0].value("v091"), Some("20190101"));
        assert_eq!(first.records[1].value("v031"), Some("1"));
        assert_eq!(first.records[2].value("v706"), Some("p"));
        assert_eq!(decoded.groups[1].id, "S0001-00000000000002");
        assert!(decoded.errors.is_empty());
    }

    #[test]
    fn test_malformed_field_is_reported_and_skipped() {
        let input = "!ID 000001\n!v400!1234-5678\nbroken line\n!v100!Journal\n";
        let decoded = isis_parse(input, RecordKind::Journal);

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.groups[0].records[0].value("v100"), Some("Journal"));
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].line, Some(3));
    }

    #[test]
    fn test_entry_without_identifier_is_skipped() {
        let input = "!ID 000001\n!v100!No ISSN\n!ID 000002\n!v400!1234-5678\n";
        let decoded = isis_parse(input, RecordKind::Journal);

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].line, Some(1));
        assert!(matches!(
            decoded.errors[0].error,
            FieldError::MissingIdentifier { expected: "v400" }
        ));
    }

    #[test]
    fn test_entry_without_delimiter_line() {
        let decoded = isis_parse("!v400!1234-5678\n!v068!ABC\n", RecordKind::Journal);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.groups[0].records[0].value("v068"), Some("ABC"));
    }

    #[test]
    fn test_empty_content_line_is_silently_skipped() {
        let decoded = isis_parse("!ID 1\n!v400!1234-5678\n!v068!\n", RecordKind::Journal);
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.groups[0].records[0].value("v068"), None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let decoded = isis_parse("!ID 1\r\n!v400!1234-5678\r\n", RecordKind::Journal);
        assert_eq!(decoded.groups[0].id, "1234-5678");
    }
}
