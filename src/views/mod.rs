//! Typed, read-only views over decoded record groups.
//!
//! Views never mutate the records they wrap. Paragraph replacement produces a
//! new record list through [`replace_paragraphs`].

mod document;
mod issue;
mod journal;
mod paragraphs;

pub use document::{
    Affiliation, Contributor, DocumentView, NormalizedAffiliation, Pages, Xref, XrefType,
};
pub use issue::{IssueType, IssueView, Section};
pub use journal::{Issns, JournalView, StatusEvent};
pub use paragraphs::{ParagraphStats, Paragraphs, replace_paragraphs};

use crate::utils::remove_leading_zeros;

/// Number value of ahead-of-print issues.
pub const AHEAD_OF_PRINT: &str = "ahead";

/// Builds the legacy issue folder name.
///
/// `v{volume}n{number}s{supplement}` with leading zeros stripped and empty
/// components omitted, or `{year}nahead` for ahead-of-print issues.
pub fn issue_folder(
    volume: Option<&str>,
    number: Option<&str>,
    supplement: Option<&str>,
    year: Option<&str>,
) -> String {
    if number == Some(AHEAD_OF_PRINT) {
        return format!("{}nahead", year.unwrap_or_default());
    }
    [("v", volume), ("n", number), ("s", supplement)]
        .into_iter()
        .filter_map(|(prefix, value)| {
            let value = remove_leading_zeros(value?);
            (!value.is_empty()).then(|| format!("{}{}", prefix, value))
        })
        .collect()
}
