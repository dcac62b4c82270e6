use crate::isis::RawRecord;
use crate::isis::tags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ISSN type labels used in `v435 ^t` and `v035`.
const PRINT: &str = "PRINT";
const ONLINE: &str = "ONLIN";

/// Publication status code of a journal being currently published.
pub const CURRENT: &str = "C";

/// Print and electronic ISSNs of a journal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issns {
    pub print: Option<String>,
    pub electronic: Option<String>,
}

/// One change of a journal's publication status.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatusEvent {
    /// ISO formatted date (`YYYYMMDD`)
    pub date: String,
    /// `C` (current), `D` (ceased) or `S` (suspended)
    pub status: Option<String>,
    pub reason: Option<String>,
}

/// Read-only view over a journal record.
#[derive(Debug, Clone)]
pub struct JournalView<'a> {
    id: &'a str,
    record: &'a RawRecord,
}

impl<'a> JournalView<'a> {
    pub fn new(id: &'a str, record: &'a RawRecord) -> Self {
        Self { id, record }
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn record(&self) -> &'a RawRecord {
        self.record
    }

    fn item(&self, tag: &str) -> Option<String> {
        self.record.value(tag).map(str::to_string)
    }

    fn items(&self, tag: &str) -> Vec<String> {
        self.record.values(tag).map(str::to_string).collect()
    }

    /// Lowercased journal acronym, used in every legacy file path.
    pub fn acronym(&self) -> Option<String> {
        self.record.value(tags::ACRONYM).map(str::to_lowercase)
    }

    pub fn title(&self) -> Option<String> {
        self.item(tags::TITLE_FULL)
    }

    pub fn abbreviated_title(&self) -> Option<String> {
        self.item(tags::ABBREVIATED_TITLE)
    }

    pub fn iso_abbreviated_title(&self) -> Option<String> {
        self.item(tags::ISO_ABBREVIATED_TITLE)
    }

    pub fn new_title(&self) -> Option<String> {
        self.item(tags::NEW_TITLE)
    }

    pub fn old_title(&self) -> Option<String> {
        self.item(tags::OLD_TITLE)
    }

    /// Print and electronic ISSNs.
    ///
    /// Read from `v435` when present. Older records carry the ISSN type in
    /// `v035`, the ISSN of that type in `v935` and the other one in `v400`.
    pub fn issns(&self) -> Issns {
        let mut by_type: BTreeMap<String, String> = BTreeMap::new();
        for item in self.record.all(tags::ISSN_WITH_TYPE) {
            if let (Some(kind), Some(issn)) = (item.get("t"), item.value()) {
                by_type.insert(kind.to_string(), issn.to_string());
            }
        }

        if by_type.is_empty() {
            if let Some(kind) = self.record.value(tags::ISSN) {
                let journal_id = self.record.value(tags::JOURNAL_ID);
                match self.record.value(tags::ISSN_LEGACY) {
                    Some(issn) => {
                        by_type.insert(kind.to_string(), issn.to_string());
                        if let Some(other) = journal_id.filter(|id| *id != issn) {
                            let other_kind = if kind == PRINT { ONLINE } else { PRINT };
                            by_type.insert(other_kind.to_string(), other.to_string());
                        }
                    }
                    None => {
                        if let Some(id) = journal_id {
                            by_type.insert(kind.to_string(), id.to_string());
                        }
                    }
                }
            }
        }

        Issns {
            print: by_type.remove(PRINT),
            electronic: by_type.remove(ONLINE),
        }
    }

    pub fn publisher_names(&self) -> Vec<String> {
        self.items(tags::PUBLISHER_NAME)
    }

    pub fn publisher_city(&self) -> Option<String> {
        self.item(tags::PUBLISHER_CITY)
    }

    pub fn publisher_state(&self) -> Option<String> {
        self.item(tags::PUBLISHER_STATE)
    }

    pub fn publisher_country(&self) -> Option<String> {
        self.item(tags::PUBLISHER_COUNTRY)
    }

    pub fn publisher_address(&self) -> Option<String> {
        self.item(tags::PUBLISHER_ADDRESS)
    }

    /// "city, state" with missing parts left out.
    pub fn publisher_location(&self) -> String {
        [self.publisher_city(), self.publisher_state()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn copyright_holder(&self) -> Option<String> {
        self.item(tags::COPYRIGHT_HOLDER)
    }

    pub fn email(&self) -> Option<String> {
        self.item(tags::EMAIL)
    }

    pub fn online_submission_url(&self) -> Option<String> {
        self.item(tags::SUBMISSION_URL)
    }

    pub fn publication_status(&self) -> Option<String> {
        self.item(tags::PUBLICATION_STATUS)
    }

    pub fn subject_descriptors(&self) -> Vec<String> {
        self.items(tags::SUBJECT_DESCRIPTORS)
    }

    pub fn subject_categories(&self) -> Vec<String> {
        self.items(tags::SUBJECT_CATEGORIES)
    }

    pub fn study_areas(&self) -> Vec<String> {
        self.items(tags::STUDY_AREAS)
    }

    pub fn index_at(&self) -> Vec<String> {
        self.items(tags::INDEX_AT)
    }

    pub fn sponsors(&self) -> Vec<String> {
        self.items(tags::SPONSORS)
    }

    /// Mission statements by language.
    pub fn mission(&self) -> BTreeMap<String, String> {
        self.record
            .all(tags::MISSION)
            .iter()
            .filter_map(|item| Some((item.get("l")?.to_string(), item.value()?.to_string())))
            .collect()
    }

    /// Status changes recorded in `v051`.
    ///
    /// Each occurrence holds the start (`^a` date, `^b` status) and
    /// optionally the end (`^c` date, `^d` status, `^e` reason) of a period.
    pub fn status_history(&self) -> Vec<StatusEvent> {
        let mut history = Vec::new();
        for item in self.record.all(tags::STATUS_HISTORY) {
            if let Some(date) = item.get("a") {
                history.push(StatusEvent {
                    date: date.to_string(),
                    status: item.get("b").map(str::to_string),
                    reason: None,
                });
            }
            if let Some(date) = item.get("c") {
                history.push(StatusEvent {
                    date: date.to_string(),
                    status: item.get("d").map(str::to_string),
                    reason: item.get("e").map(str::to_string),
                });
            }
        }
        history
    }

    fn latest_status(&self) -> Option<StatusEvent> {
        self.status_history().into_iter().max()
    }

    /// Status of the most recent change.
    pub fn current_status(&self) -> Option<String> {
        self.latest_status().and_then(|event| event.status)
    }

    /// Status of the most recent change when the journal is not current.
    pub fn unpublish_reason(&self) -> Option<String> {
        self.current_status().filter(|status| status != CURRENT)
    }

    pub fn is_public(&self) -> bool {
        self.publication_status().as_deref() == Some(CURRENT)
    }

    pub fn isis_created_date(&self) -> Option<String> {
        self.item(tags::JOURNAL_CREATED_DATE)
    }

    pub fn isis_updated_date(&self) -> Option<String> {
        self.item(tags::JOURNAL_UPDATED_DATE)
    }
}
