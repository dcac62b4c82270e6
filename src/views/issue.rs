use crate::isis::RawRecord;
use crate::isis::tags;
use crate::utils::{bundle_id, zfill};
use crate::views::{AHEAD_OF_PRINT, issue_folder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Section titles by language.
pub type Section = BTreeMap<String, String>;

/// Issue classification used by the destination website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Ahead,
    Regular,
    Special,
    Supplement,
    VolumeIssue,
}

/// Read-only view over an issue record.
#[derive(Debug, Clone)]
pub struct IssueView<'a> {
    id: &'a str,
    record: &'a RawRecord,
}

impl<'a> IssueView<'a> {
    pub fn new(id: &'a str, record: &'a RawRecord) -> Self {
        Self { id, record }
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn record(&self) -> &'a RawRecord {
        self.record
    }

    pub fn journal_pid(&self) -> Option<&'a str> {
        self.record.value(tags::ISSN)
    }

    pub fn volume(&self) -> Option<&'a str> {
        self.record.value(tags::VOLUME)
    }

    pub fn number(&self) -> Option<&'a str> {
        self.record.value(tags::NUMBER)
    }

    pub fn supplement(&self) -> Option<&'a str> {
        self.record
            .value(tags::SUPPLEMENT_VOLUME)
            .or_else(|| self.record.value(tags::SUPPLEMENT_NUMBER))
    }

    fn pubdate(&self) -> &'a str {
        self.record.value(tags::COLLECTION_PUBDATE).unwrap_or_default()
    }

    pub fn year(&self) -> Option<&'a str> {
        self.pubdate().get(..4)
    }

    pub fn start_month(&self) -> Option<&'a str> {
        self.pubdate().get(4..6)
    }

    pub fn end_month(&self) -> Option<&'a str> {
        self.start_month()
    }

    /// Legacy issue folder name, e.g. `v49n2`.
    pub fn issue_folder(&self) -> String {
        issue_folder(self.volume(), self.number(), self.supplement(), self.year())
    }

    /// Year followed by the zero-padded issue number (`20200002`).
    pub fn order(&self) -> Option<String> {
        let order = self.record.value(tags::ISSUE_ORDER)?;
        let split = order
            .char_indices()
            .nth(4)
            .map_or(order.len(), |(index, _)| index);
        let (year, number) = order.split_at(split);
        Some(format!("{}{}", year, zfill(number, 4)))
    }

    pub fn is_public(&self) -> bool {
        self.record.value(tags::IS_PUBLIC) == Some("1")
    }

    /// Legacy issue pid, `{issn}{order}`.
    pub fn pid(&self) -> String {
        if !self.id.is_empty() {
            return self.id.to_string();
        }
        format!(
            "{}{}",
            self.journal_pid().unwrap_or_default(),
            self.order().unwrap_or_default()
        )
    }

    pub fn issue_type(&self) -> IssueType {
        if self.supplement().is_some() {
            return IssueType::Supplement;
        }
        match self.number() {
            Some(AHEAD_OF_PRINT) => IssueType::Ahead,
            Some(number) if number.contains("spe") => IssueType::Special,
            Some(_) => IssueType::Regular,
            None => IssueType::VolumeIssue,
        }
    }

    /// Identifier of the issue on the destination website.
    pub fn bundle_id(&self) -> String {
        let (volume, number) = match self.number() {
            Some(AHEAD_OF_PRINT) => (None, None),
            number => (self.volume(), number),
        };
        bundle_id(
            self.journal_pid().unwrap_or_default(),
            self.year().unwrap_or_default(),
            volume,
            number,
            self.supplement(),
        )
    }

    /// Section titles by section code, from `v049 ^c ^l ^t`.
    pub fn sections(&self) -> BTreeMap<String, Section> {
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();
        for item in self.record.all(tags::SECTION) {
            let (Some(code), Some(lang), Some(title)) = (item.get("c"), item.get("l"), item.get("t"))
            else {
                continue;
            };
            sections
                .entry(code.to_string())
                .or_default()
                .insert(lang.to_string(), title.to_string());
        }
        sections
    }

    /// Titles of section `code` in every language.
    pub fn section(&self, code: &str) -> Option<Section> {
        self.sections().remove(code)
    }

    /// Title of section `code` in `lang`.
    pub fn section_title(&self, code: &str, lang: &str) -> Option<String> {
        self.section(code)?.remove(lang)
    }

    pub fn isis_created_date(&self) -> Option<String> {
        self.record
            .value(tags::CREATED_DATE)
            .map(|date| date.chars().take(8).collect())
    }

    pub fn isis_updated_date(&self) -> Option<String> {
        self.record
            .value(tags::UPDATED_DATE)
            .map(|date| date.chars().take(8).collect())
    }
}
