//! Legacy tagged-record format decoder.
//!
//! Decodes the `!ID`-delimited export of the legacy bibliographic database
//! into [`RecordGroup`]s keyed by journal, issue or article identifier.
//!
//! # Example
//!
//! ```
//! use isis_migration::{IsisDecoder, RecordKind};
//!
//! let input = "!ID 000001\n!v880!S0001-00000000000001\n!v093!20190101\n\
//!              !ID 000002\n!v880!S0001-00000000000001\n!v031!1\n!v032!1\n";
//!
//! let decoded = IsisDecoder::new(RecordKind::Article).decode(input);
//! let group = &decoded.groups[0];
//! assert_eq!(group.id, "S0001-00000000000001");
//! assert_eq!(group.records[1].value("v031"), Some("1"));
//! ```

mod parse;
mod structure;
pub mod tags;

pub use parse::{Decoded, parse_field_content};
pub use structure::{LEADING_SUBFIELD, RawRecord, RecordGroup, Subfields};

use crate::RecordKind;
use crate::utils::{decode_latin1, zfill};
use parse::isis_parse;
use std::path::Path;

/// Length of a pid v2 (`S` + ISSN + year + issue order + article order).
pub const PID_V2_LENGTH: usize = 23;

/// Decoder for one kind of legacy export.
#[derive(Debug, Clone, Copy)]
pub struct IsisDecoder {
    kind: RecordKind,
}

impl IsisDecoder {
    /// Creates a decoder grouping records by the key of `kind`.
    ///
    /// # Examples
    ///
    /// ```
    /// use isis_migration::{IsisDecoder, RecordKind};
    /// let decoder = IsisDecoder::new(RecordKind::Journal);
    /// ```
    #[must_use]
    pub fn new(kind: RecordKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Decodes export text. Malformed fields are reported in
    /// [`Decoded::errors`] and never abort the decode.
    pub fn decode(&self, input: &str) -> Decoded {
        isis_parse(input, self.kind)
    }

    /// Decodes ISO-8859-1 encoded export bytes.
    pub fn decode_bytes(&self, input: &[u8]) -> Decoded {
        self.decode(&decode_latin1(input))
    }

    /// Reads and decodes an export file.
    pub fn decode_file(&self, path: &Path) -> std::io::Result<Decoded> {
        tracing::debug!(file = %path.display(), kind = %self.kind, "decoding legacy export");
        let bytes = std::fs::read(path)?;
        Ok(self.decode_bytes(&bytes))
    }
}

impl RecordKind {
    /// Derives the identifier of the group owning `record`.
    pub fn group_key(&self, record: &RawRecord) -> Option<String> {
        match self {
            RecordKind::Journal => journal_key(record),
            RecordKind::Issue => issue_key(record),
            RecordKind::Article => article_key(record),
        }
    }

    /// Tag the group key is primarily derived from.
    pub fn key_tag(&self) -> &'static str {
        match self {
            RecordKind::Journal => tags::JOURNAL_ID,
            RecordKind::Issue => tags::ISSUE_ORDER,
            RecordKind::Article => tags::PID_V2,
        }
    }
}

fn journal_key(record: &RawRecord) -> Option<String> {
    record
        .value(tags::JOURNAL_ID)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `{issn}{year}{number:0>4}`, the issue order split after the year.
fn issue_key(record: &RawRecord) -> Option<String> {
    let issn = record.value(tags::ISSN)?;
    let order = record.value(tags::ISSUE_ORDER)?;
    let split = order
        .char_indices()
        .nth(4)
        .map_or(order.len(), |(index, _)| index);
    let (year, number) = order.split_at(split);
    Some(format!("{}{}{}", issn, year, zfill(number, 4)))
}

/// Pid v2 of the article, or the issue key for issue records embedded in an
/// article export.
fn article_key(record: &RawRecord) -> Option<String> {
    match record.value(tags::PID_V2) {
        Some(pid) if !pid.is_empty() => Some(pid.chars().take(PID_V2_LENGTH).collect()),
        _ => issue_key(record),
    }
}
