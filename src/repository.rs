//! Destination document repository collaborator.
//!
//! The records here are what the destination website receives. Persisting
//! them is left to [`DocumentRepository`] implementations, which stamp
//! `saved_at` on every save.

use crate::error::RepositoryError;
use crate::views::{Contributor, IssueType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// A published PDF rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPdf {
    pub lang: String,
    pub filename: String,
    pub url: Option<String>,
}

/// A published HTML full text. `url` is empty for XML documents, whose
/// languages are listed without a separate HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedHtml {
    pub lang: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedDocument {
    /// pid v3
    pub id: String,
    /// pid v2
    pub pid: Option<String>,
    pub scielo_pids: BTreeMap<String, String>,
    pub aop_pid: Option<String>,
    pub doi: Option<String>,
    pub journal_id: Option<String>,
    pub issue_id: Option<String>,
    pub order: u32,
    pub is_public: bool,
    pub document_type: Option<String>,
    pub original_language: Option<String>,
    pub languages: Vec<String>,
    pub title: Option<String>,
    pub translated_titles: BTreeMap<String, String>,
    pub section: Option<String>,
    pub translated_sections: BTreeMap<String, String>,
    pub abstract_text: Option<String>,
    pub abstracts: BTreeMap<String, String>,
    pub keywords: BTreeMap<String, Vec<String>>,
    pub authors: Vec<Contributor>,
    pub elocation: Option<String>,
    pub fpage: Option<String>,
    pub fpage_sequence: Option<String>,
    pub lpage: Option<String>,
    pub publication_date: Option<String>,
    pub pdfs: Vec<PublishedPdf>,
    pub htmls: Vec<PublishedHtml>,
    pub xml: Option<String>,
    /// Legacy creation date, `YYYYMMDD`
    pub created: Option<String>,
    /// Legacy update date, `YYYYMMDD`
    pub updated: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedIssue {
    /// Bundle id, e.g. `0001-3714-2020-v49-n2`
    pub id: String,
    /// Legacy issue pid
    pub pid: Option<String>,
    pub journal_id: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub supplement: Option<String>,
    pub issue_type: Option<IssueType>,
    pub year: Option<String>,
    pub start_month: Option<String>,
    pub end_month: Option<String>,
    pub label: String,
    pub order: u32,
    pub is_public: bool,
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedJournal {
    pub id: String,
    pub acronym: Option<String>,
    pub title: Option<String>,
    pub iso_title: Option<String>,
    pub short_title: Option<String>,
    pub next_title: Option<String>,
    pub scielo_issn: String,
    pub print_issn: Option<String>,
    pub electronic_issn: Option<String>,
    pub subject_categories: Vec<String>,
    pub subject_descriptors: Vec<String>,
    pub study_areas: Vec<String>,
    pub index_at: Vec<String>,
    pub sponsors: Vec<String>,
    pub mission: BTreeMap<String, String>,
    pub copyright_holder: Option<String>,
    pub online_submission_url: Option<String>,
    pub editor_email: Option<String>,
    pub publisher_name: String,
    pub publisher_address: Option<String>,
    pub publisher_city: Option<String>,
    pub publisher_state: Option<String>,
    pub publisher_country: Option<String>,
    pub current_status: Option<String>,
    pub unpublish_reason: Option<String>,
    pub is_public: bool,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Reads and writes destination website records.
pub trait DocumentRepository: Send + Sync {
    /// Fetches a document by pid v3 or legacy pid v2.
    fn fetch_document(&self, id: &str) -> Result<Option<PublishedDocument>, RepositoryError>;
    fn save_document(&self, document: PublishedDocument)
    -> Result<PublishedDocument, RepositoryError>;

    fn fetch_issue(&self, id: &str) -> Result<Option<PublishedIssue>, RepositoryError>;
    fn save_issue(&self, issue: PublishedIssue) -> Result<PublishedIssue, RepositoryError>;

    fn fetch_journal(&self, id: &str) -> Result<Option<PublishedJournal>, RepositoryError>;
    fn save_journal(&self, journal: PublishedJournal) -> Result<PublishedJournal, RepositoryError>;

    /// Documents of one journal.
    fn find_documents_by_journal(
        &self,
        journal_id: &str,
    ) -> Result<Vec<PublishedDocument>, RepositoryError>;

    fn create_document(&self) -> PublishedDocument {
        PublishedDocument::default()
    }

    fn create_issue(&self) -> PublishedIssue {
        PublishedIssue::default()
    }

    fn create_journal(&self) -> PublishedJournal {
        PublishedJournal::default()
    }
}

/// In-process [`DocumentRepository`].
#[derive(Debug, Default)]
pub struct MemoryRepository {
    documents: RwLock<HashMap<String, PublishedDocument>>,
    issues: RwLock<HashMap<String, PublishedIssue>>,
    journals: RwLock<HashMap<String, PublishedJournal>>,
}

fn poisoned(id: &str) -> RepositoryError {
    RepositoryError::Fetch {
        id: id.to_string(),
        reason: "repository lock is poisoned".to_string(),
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentRepository for MemoryRepository {
    fn fetch_document(&self, id: &str) -> Result<Option<PublishedDocument>, RepositoryError> {
        let documents = self.documents.read().map_err(|_| poisoned(id))?;
        Ok(documents.get(id).cloned().or_else(|| {
            documents
                .values()
                .find(|doc| doc.pid.as_deref() == Some(id))
                .cloned()
        }))
    }

    fn save_document(
        &self,
        mut document: PublishedDocument,
    ) -> Result<PublishedDocument, RepositoryError> {
        if document.id.is_empty() {
            return Err(RepositoryError::Save {
                id: document.pid.clone().unwrap_or_default(),
                reason: "document has no id".to_string(),
            });
        }
        document.saved_at = Some(Utc::now());
        self.documents
            .write()
            .map_err(|_| poisoned(&document.id))?
            .insert(document.id.clone(), document.clone());
        Ok(document)
    }

    fn fetch_issue(&self, id: &str) -> Result<Option<PublishedIssue>, RepositoryError> {
        Ok(self.issues.read().map_err(|_| poisoned(id))?.get(id).cloned())
    }

    fn save_issue(&self, mut issue: PublishedIssue) -> Result<PublishedIssue, RepositoryError> {
        issue.saved_at = Some(Utc::now());
        self.issues
            .write()
            .map_err(|_| poisoned(&issue.id))?
            .insert(issue.id.clone(), issue.clone());
        Ok(issue)
    }

    fn fetch_journal(&self, id: &str) -> Result<Option<PublishedJournal>, RepositoryError> {
        Ok(self.journals.read().map_err(|_| poisoned(id))?.get(id).cloned())
    }

    fn save_journal(
        &self,
        mut journal: PublishedJournal,
    ) -> Result<PublishedJournal, RepositoryError> {
        journal.saved_at = Some(Utc::now());
        self.journals
            .write()
            .map_err(|_| poisoned(&journal.id))?
            .insert(journal.id.clone(), journal.clone());
        Ok(journal)
    }

    fn find_documents_by_journal(
        &self,
        journal_id: &str,
    ) -> Result<Vec<PublishedDocument>, RepositoryError> {
        let documents = self.documents.read().map_err(|_| poisoned(journal_id))?;
        let mut found: Vec<_> = documents
            .values()
            .filter(|doc| doc.journal_id.as_deref() == Some(journal_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
