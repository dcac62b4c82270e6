use crate::FileType;
use crate::error::MigrationError;
use crate::isis::tags::{self, record_types};
use crate::isis::{PID_V2_LENGTH, RawRecord, Subfields};
use crate::utils::{fix_windows_path, split_basename, zfill};
use crate::views::{ParagraphStats, Paragraphs, issue_folder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_ROLE: &str = "author";

/// Maps legacy contributor role codes to role names.
fn contributor_role(code: &str) -> Option<&'static str> {
    match code {
        "ND" | "nd" => Some("author"),
        "coord" => Some("coordinator"),
        "inventor" => Some("inventor"),
        "tr" => Some("translator"),
        "ed" => Some("editor"),
        "org" => Some("organizer"),
        _ => None,
    }
}

/// Kinds of contributor cross-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XrefType {
    Aff,
    Fn,
    AuthorNotes,
}

impl XrefType {
    fn classify(xref: &str) -> Self {
        if xref.starts_with("aff") || xref.starts_with("a0") {
            XrefType::Aff
        } else if xref.starts_with("fn") {
            XrefType::Fn
        } else {
            XrefType::AuthorNotes
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xref {
    pub kind: XrefType,
    pub id: String,
}

/// An affiliation as written in the article (`v070`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub id: Option<String>,
    pub label: Option<String>,
    pub email: Option<String>,
    pub orgname: Option<String>,
    pub orgdiv1: Option<String>,
    pub orgdiv2: Option<String>,
    pub orgdiv3: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// A normalized affiliation (`v240`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAffiliation {
    pub id: Option<String>,
    pub orgname: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub surname: Option<String>,
    pub given_names: Option<String>,
    pub role: String,
    pub orcid: Option<String>,
    pub xrefs: Vec<Xref>,
    pub affiliation: Option<Affiliation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pages {
    pub elocation: Option<String>,
    pub first: Option<String>,
    pub first_sequence: Option<String>,
    pub last: Option<String>,
}

fn owned(subfields: &Subfields, key: &str) -> Option<String> {
    subfields.get(key).map(str::to_string)
}

/// Read-only view over the records of one article.
///
/// The first record is the header (legacy dates), the second holds the article
/// metadata. Keywords and abstracts come from the formatted record (`v706 = f`)
/// when the article has one.
#[derive(Debug, Clone)]
pub struct DocumentView<'a> {
    id: &'a str,
    records: &'a [RawRecord],
    metadata: &'a RawRecord,
    formatted: &'a RawRecord,
    file_name: String,
    file_type: FileType,
}

impl<'a> DocumentView<'a> {
    /// Wraps the records of article `id`.
    ///
    /// # Errors
    ///
    /// Returns `MissingMetadataRecord` when the group has no metadata record.
    pub fn new(id: &'a str, records: &'a [RawRecord]) -> Result<Self, MigrationError> {
        let metadata = records
            .get(1)
            .ok_or_else(|| MigrationError::MissingMetadataRecord(id.to_string()))?;
        let formatted = records
            .iter()
            .find(|r| r.value(tags::RECORD_TYPE) == Some(record_types::FORMATTED))
            .unwrap_or(metadata);

        let (file_name, file_type) = match metadata.value(tags::FILE_PATH) {
            Some(path) => {
                let path = fix_windows_path(path);
                let (stem, extension) = split_basename(&path);
                (stem.to_string(), FileType::from_extension(extension))
            }
            None => (id.to_string(), FileType::Html),
        };

        Ok(Self {
            id,
            records,
            metadata,
            formatted,
            file_name,
            file_type,
        })
    }

    pub fn id(&self) -> &'a str {
        self.id
    }

    pub fn records(&self) -> &'a [RawRecord] {
        self.records
    }

    fn item(&self, tag: &str) -> Option<&'a str> {
        self.metadata.value(tag)
    }

    pub fn raw_file_path(&self) -> Option<&'a str> {
        self.item(tags::FILE_PATH)
    }

    /// Basename of the legacy file path without extension. Falls back to the
    /// article id when the record has no file path.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn volume(&self) -> Option<&'a str> {
        self.item(tags::VOLUME)
    }

    pub fn number(&self) -> Option<&'a str> {
        self.item(tags::NUMBER)
    }

    pub fn supplement(&self) -> Option<&'a str> {
        self.item(tags::SUPPLEMENT_VOLUME)
            .or_else(|| self.item(tags::SUPPLEMENT_NUMBER))
    }

    pub fn document_pubdate(&self) -> Option<&'a str> {
        self.item(tags::DOCUMENT_PUBDATE)
    }

    pub fn collection_pubdate(&self) -> Option<&'a str> {
        self.item(tags::COLLECTION_PUBDATE)
    }

    /// Publication year of the issue the article belongs to.
    pub fn pub_year(&self) -> Option<&'a str> {
        self.collection_pubdate()
            .or_else(|| self.document_pubdate())
            .and_then(|date| date.get(..4))
    }

    /// Legacy issue folder name, e.g. `v49n2`.
    pub fn issue_folder(&self) -> String {
        issue_folder(self.volume(), self.number(), self.supplement(), self.pub_year())
    }

    /// Original language of the article.
    pub fn language(&self) -> Option<&'a str> {
        self.item(tags::LANGUAGE)
    }

    pub fn translated_languages(&self) -> Vec<&'a str> {
        self.metadata.values(tags::TRANSLATED_LANGUAGES).collect()
    }

    /// Original language followed by the translated ones.
    pub fn languages(&self) -> Vec<&'a str> {
        let mut languages: Vec<&str> = self.language().into_iter().collect();
        for lang in self.translated_languages() {
            if !languages.contains(&lang) {
                languages.push(lang);
            }
        }
        languages
    }

    pub fn document_type(&self) -> Option<&'a str> {
        self.item(tags::DOCUMENT_TYPE)
    }

    pub fn section_code(&self) -> Option<&'a str> {
        self.item(tags::SECTION)
    }

    pub fn pid_v1(&self) -> Option<&'a str> {
        self.item(tags::PID_V1)
    }

    pub fn pid_v2(&self) -> Option<&'a str> {
        self.item(tags::PID_V2)
    }

    pub fn pid_v3(&self) -> Option<&'a str> {
        self.item(tags::PID_V3)
    }

    pub fn aop_pid(&self) -> Option<&'a str> {
        self.item(tags::AOP_PID)
    }

    fn pid(&self) -> &'a str {
        self.pid_v2().unwrap_or(self.id)
    }

    /// ISSN part of the pid.
    pub fn journal_pid(&self) -> Option<&'a str> {
        self.item(tags::ISSN).or_else(|| self.pid().get(1..10))
    }

    /// Issue part of the pid (ISSN, year and issue order).
    pub fn issue_pid(&self) -> Option<&'a str> {
        self.pid().get(1..18)
    }

    /// Five digit order of the article in its issue.
    ///
    /// The zero-padded `v121`, or the last five characters of the pid when
    /// `v121` is absent or not numeric.
    pub fn order(&self) -> String {
        match self.item(tags::ORDER) {
            Some(order) if !order.is_empty() && order.chars().all(|c| c.is_ascii_digit()) => {
                zfill(order, 5)
            }
            _ => {
                let pid = self.pid();
                let start = pid.len().min(PID_V2_LENGTH).saturating_sub(5);
                pid.get(start..PID_V2_LENGTH.min(pid.len()))
                    .unwrap_or_default()
                    .to_string()
            }
        }
    }

    /// DOIs by language, from `v337 ^l ^d`.
    pub fn doi_with_lang(&self) -> BTreeMap<String, String> {
        self.metadata
            .all(tags::DOI_WITH_LANG)
            .iter()
            .filter_map(|item| Some((item.get("l")?.to_string(), item.get("d")?.to_string())))
            .collect()
    }

    /// DOI of the original language, falling back to `v237`.
    pub fn doi(&self) -> Option<String> {
        self.language()
            .and_then(|lang| self.doi_with_lang().remove(lang))
            .or_else(|| self.item(tags::DOI).map(str::to_string))
    }

    /// Titles by language.
    pub fn titles(&self) -> BTreeMap<String, String> {
        self.metadata
            .all(tags::TITLE)
            .iter()
            .filter_map(|item| Some((item.get("l")?.to_string(), item.value()?.to_string())))
            .collect()
    }

    pub fn original_title(&self) -> Option<String> {
        self.titles().remove(self.language()?)
    }

    pub fn translated_titles(&self) -> BTreeMap<String, String> {
        let mut titles = self.titles();
        if let Some(lang) = self.language() {
            titles.remove(lang);
        }
        titles
    }

    /// Affiliations keyed by their id (`^i`).
    pub fn affiliations(&self) -> BTreeMap<String, Affiliation> {
        self.metadata
            .all(tags::AFFILIATION)
            .iter()
            .map(|item| {
                let affiliation = Affiliation {
                    id: owned(item, "i"),
                    label: owned(item, "l"),
                    email: owned(item, "e"),
                    orgname: owned(item, "_"),
                    orgdiv1: owned(item, "1"),
                    orgdiv2: owned(item, "2"),
                    orgdiv3: owned(item, "3"),
                    city: owned(item, "c"),
                    state: owned(item, "s"),
                    country: owned(item, "p"),
                };
                (affiliation.id.clone().unwrap_or_default(), affiliation)
            })
            .collect()
    }

    pub fn normalized_affiliations(&self) -> BTreeMap<String, NormalizedAffiliation> {
        self.metadata
            .all(tags::NORMALIZED_AFFILIATION)
            .iter()
            .map(|item| {
                let affiliation = NormalizedAffiliation {
                    id: owned(item, "i"),
                    orgname: owned(item, "_"),
                    city: owned(item, "c"),
                    state: owned(item, "s"),
                    country: owned(item, "p"),
                };
                (affiliation.id.clone().unwrap_or_default(), affiliation)
            })
            .collect()
    }

    /// Contributors in order, with their `aff` cross-reference resolved.
    pub fn contributors(&self) -> Vec<Contributor> {
        let affiliations = self.affiliations();
        self.metadata
            .all(tags::CONTRIBUTOR)
            .iter()
            .map(|item| {
                let xrefs: Vec<Xref> = item
                    .get("1")
                    .unwrap_or_default()
                    .split_whitespace()
                    .map(|id| Xref {
                        kind: XrefType::classify(id),
                        id: id.to_string(),
                    })
                    .collect();
                let affiliation = xrefs
                    .iter()
                    .filter(|xref| xref.kind == XrefType::Aff)
                    .find_map(|xref| affiliations.get(&xref.id).cloned());
                Contributor {
                    surname: owned(item, "s"),
                    given_names: owned(item, "n"),
                    role: item
                        .get("r")
                        .and_then(contributor_role)
                        .unwrap_or(DEFAULT_ROLE)
                        .to_string(),
                    orcid: owned(item, "k"),
                    xrefs,
                    affiliation,
                }
            })
            .collect()
    }

    /// Keywords by language. A keyword with a subkeyword reads "k s".
    pub fn keyword_groups(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for item in self.formatted.all(tags::KEYWORDS) {
            let Some(keyword) = item.get("k") else {
                continue;
            };
            let keyword = format!("{} {}", keyword, item.get("s").unwrap_or_default());
            groups
                .entry(item.get("l").unwrap_or_default().to_string())
                .or_default()
                .push(keyword.trim().to_string());
        }
        groups
    }

    /// Abstracts by language.
    pub fn abstracts(&self) -> BTreeMap<String, String> {
        self.formatted
            .all(tags::ABSTRACT)
            .iter()
            .filter_map(|item| Some((item.get("l")?.to_string(), item.get("a")?.to_string())))
            .collect()
    }

    pub fn abstract_text(&self) -> Option<String> {
        self.abstracts().remove(self.language()?)
    }

    pub fn pages(&self) -> Pages {
        let Some(pages) = self.metadata.first(tags::PAGES) else {
            return Pages::default();
        };
        Pages {
            elocation: owned(pages, "e"),
            first: owned(pages, "f"),
            first_sequence: owned(pages, "s"),
            last: owned(pages, "l"),
        }
    }

    /// Legacy created and updated dates of the header record, as `YYYYMMDD`.
    pub fn isis_dates(&self) -> Vec<String> {
        let Some(header) = self.records.first() else {
            return Vec::new();
        };
        [tags::CREATED_DATE, tags::UPDATED_DATE]
            .into_iter()
            .filter_map(|tag| header.value(tag))
            .map(|date| date.chars().take(8).collect())
            .collect()
    }

    pub fn isis_updated_date(&self) -> Option<String> {
        self.isis_dates().into_iter().max()
    }

    pub fn isis_created_date(&self) -> Option<String> {
        self.isis_dates().into_iter().min()
    }

    pub fn paragraphs(&self) -> Paragraphs<'a> {
        Paragraphs::new(self.records)
    }

    pub fn paragraph_stats(&self) -> ParagraphStats {
        ParagraphStats::from_records(self.records)
    }

    /// HTML body of the original language, rebuilt from paragraph records.
    pub fn html_body(&self) -> String {
        self.paragraphs().text()
    }

    /// Paragraph text of each reference, by citation number (`v118`).
    pub fn mixed_citations(&self) -> BTreeMap<String, String> {
        self.records
            .iter()
            .filter_map(|record| {
                let text = record.value(tags::PARAGRAPH_TEXT)?;
                let number = record.value(tags::CITATION_NUMBER)?;
                Some((number.to_string(), text.to_string()))
            })
            .collect()
    }
}
