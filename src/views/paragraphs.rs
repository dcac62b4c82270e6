//! Paragraph records of HTML documents.
//!
//! Paragraph records (`v706 = p`) carry the HTML body in `v704`. Those with a
//! reference number in `v888` hold the bibliographic references, which split
//! the body into the text before, the references and the text after.

use crate::isis::RawRecord;
use crate::isis::tags::{self, record_types};
use serde::{Deserialize, Serialize};

/// Paragraph records of one document, partitioned around the references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraphs<'a> {
    pub before_refs: Vec<&'a RawRecord>,
    pub refs: Vec<&'a RawRecord>,
    pub after_refs: Vec<&'a RawRecord>,
}

#[derive(Clone, Copy, PartialEq)]
enum Part {
    Before,
    Refs,
    After,
}

impl<'a> Paragraphs<'a> {
    /// Partitions the paragraph records of `records`, scanning in order.
    ///
    /// Records before the first reference go to `before_refs`. Once a record
    /// without a reference follows the references, every later record goes to
    /// `after_refs`, so the three parts always concatenate back to the
    /// original sequence.
    pub fn new(records: &'a [RawRecord]) -> Self {
        let mut paragraphs = Self::default();
        let mut part = Part::Before;

        for record in records.iter().filter(|r| is_paragraph(r)) {
            let is_reference = record
                .value(tags::PARAGRAPH_REFERENCE)
                .is_some_and(|v| !v.is_empty());
            part = match (part, is_reference) {
                (Part::After, _) => Part::After,
                (_, true) => Part::Refs,
                (Part::Refs, false) => Part::After,
                (Part::Before, false) => Part::Before,
            };
            match part {
                Part::Before => paragraphs.before_refs.push(record),
                Part::Refs => paragraphs.refs.push(record),
                Part::After => paragraphs.after_refs.push(record),
            }
        }
        paragraphs
    }

    /// All paragraph records in order.
    pub fn records(&self) -> impl Iterator<Item = &'a RawRecord> + '_ {
        self.before_refs
            .iter()
            .chain(&self.refs)
            .chain(&self.after_refs)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.before_refs.len() + self.refs.len() + self.after_refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full HTML body text.
    pub fn text(&self) -> String {
        join_text(self.records())
    }

    /// HTML of the references section.
    pub fn references(&self) -> String {
        join_text(self.refs.iter().copied())
    }
}

fn join_text<'a>(records: impl Iterator<Item = &'a RawRecord>) -> String {
    records
        .filter_map(|record| record.value(tags::PARAGRAPH_TEXT))
        .collect()
}

fn is_paragraph(record: &RawRecord) -> bool {
    record.value(tags::RECORD_TYPE) == Some(record_types::PARAGRAPH)
}

/// Produces a new record list with every paragraph record of `records`
/// replaced by `paragraphs`, appended after the other records.
pub fn replace_paragraphs(records: &[RawRecord], paragraphs: Vec<RawRecord>) -> Vec<RawRecord> {
    records
        .iter()
        .filter(|record| !is_paragraph(record))
        .cloned()
        .chain(paragraphs)
        .collect()
}

/// Counts of paragraph and citation records of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphStats {
    pub p_records: usize,
    pub c_records: usize,
    pub ref_in_p_records: usize,
}

impl ParagraphStats {
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut stats = Self::default();
        for record in records {
            match record.value(tags::RECORD_TYPE) {
                Some(record_types::PARAGRAPH) => {
                    stats.p_records += 1;
                    if record.value(tags::PARAGRAPH_REFERENCE).is_some() {
                        stats.ref_in_p_records += 1;
                    }
                }
                Some(record_types::CITATION) => stats.c_records += 1,
                _ => {}
            }
        }
        stats
    }

    /// Share of citation records that have a matching reference paragraph.
    /// `0.0` when there are no citation records.
    pub fn quality(&self) -> f64 {
        if self.c_records == 0 {
            return 0.0;
        }
        self.ref_in_p_records as f64 / self.c_records as f64
    }
}
