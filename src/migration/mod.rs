//! Migration orchestrator.
//!
//! [`MigrationManager`] sequences each article through metadata registration,
//! file migration and publication. Every operation returns its result along
//! with a [`Tracker`] holding the per-file problems it met; only
//! identifier-level, store-level and repository-level failures are returned
//! as [`MigrationError`].
//!
//! The migration state store is always written last, after the item has been
//! fully recomputed, so an interrupted operation leaves the previous state.

mod files;
mod publish;

use crate::RecordKind;
use crate::config::MigrationConfig;
use crate::error::{MigrationError, Result};
use crate::isis::{IsisDecoder, RawRecord, tags};
use crate::pid::PidIssuer;
use crate::repository::DocumentRepository;
use crate::storage::ObjectStorage;
use crate::store::{DocumentQuery, MigrationItem, MigrationStatus, MigrationStore, RecordItem};
use crate::tracker::Tracker;
use crate::utils::read_latin1_file;
use crate::views::{DocumentView, IssueView, JournalView, replace_paragraphs};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

fn first_record(records: &[RawRecord]) -> RawRecord {
    records.first().cloned().unwrap_or_default()
}

fn is_embedded_issue(records: &[RawRecord]) -> bool {
    records.len() == 1 && records[0].value(tags::PID_V2).is_none()
}

/// What happened to one article during a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// pid v2
    pub id: String,
    /// Operations that ran to completion, in order
    pub succeeded_steps: Vec<String>,
    /// Per-file problems of the completed steps, then the failure that
    /// stopped the article, if any
    pub errors: Vec<String>,
}

impl DocumentOutcome {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    fn record<T>(&mut self, step: &str, result: Result<(T, Tracker)>) -> Result<T> {
        match result {
            Ok((value, tracker)) => {
                self.succeeded_steps.push(step.to_string());
                self.errors
                    .extend(tracker.errors().map(|error| format!("{}: {}", step, error)));
                Ok(value)
            }
            Err(error) => {
                self.errors.push(format!("{}: {}", step, error));
                Err(error)
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Drives the migration of legacy journals, issues and articles.
///
/// Collaborators are injected and shared; the manager itself holds no
/// mutable state, so batches may run across threads.
pub struct MigrationManager {
    config: MigrationConfig,
    store: Arc<dyn MigrationStore>,
    storage: Arc<dyn ObjectStorage>,
    repository: Arc<dyn DocumentRepository>,
    pid_issuer: Option<Arc<dyn PidIssuer>>,
}

impl std::fmt::Debug for MigrationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationManager")
            .field("config", &self.config)
            .field("pid_issuer", &self.pid_issuer.is_some())
            .finish_non_exhaustive()
    }
}

impl MigrationManager {
    pub fn new(
        config: MigrationConfig,
        store: Arc<dyn MigrationStore>,
        storage: Arc<dyn ObjectStorage>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            repository,
            pid_issuer: None,
        }
    }

    /// Uses `pid_issuer` as the authority for pid v3 values.
    #[must_use]
    pub fn with_pid_issuer(mut self, pid_issuer: Arc<dyn PidIssuer>) -> Self {
        self.pid_issuer = Some(pid_issuer);
        self
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn MigrationStore {
        self.store.as_ref()
    }

    fn load_document(&self, id: &str) -> Result<MigrationItem> {
        self.store
            .fetch_document(id)?
            .ok_or_else(|| MigrationError::NotRegistered(id.to_string()))
    }

    /// Records that article `pid` exists, with its legacy update date.
    ///
    /// An article seen for the first time, or whose legacy record changed
    /// since the last registration, is (re)set to
    /// [`MigrationStatus::PendingMigration`]. Otherwise the stored item is
    /// returned untouched.
    pub fn create_minimum_record(
        &self,
        pid: &str,
        isis_updated_date: &str,
    ) -> Result<(MigrationItem, Tracker)> {
        if pid.is_empty() {
            return Err(MigrationError::MissingIdentifier(isis_updated_date.to_string()));
        }
        let mut tracker = Tracker::new("create_minimum_record");
        let mut item = match self.store.fetch_document(pid)? {
            Some(item) if item.isis_updated_date.as_deref() == Some(isis_updated_date) => {
                return Ok((item, tracker));
            }
            stored => stored.unwrap_or_default(),
        };
        item.id = pid.to_string();
        item.isis_updated_date = Some(isis_updated_date.to_string());
        item.status = MigrationStatus::PendingMigration;
        tracker.info("created minimum record");
        Ok((self.store.save_document(item)?, tracker))
    }

    /// Paragraph records kept outside the article export, if any.
    fn external_paragraphs(&self, id: &str, tracker: &mut Tracker) -> Vec<RawRecord> {
        let Some(path) = self.config.paragraphs_file_path(id) else {
            return Vec::new();
        };
        if !path.is_file() {
            return Vec::new();
        }
        match IsisDecoder::new(RecordKind::Article).decode_file(&path) {
            Ok(decoded) => {
                for error in &decoded.errors {
                    tracker.error(format!("{}: {}", path.display(), error));
                }
                decoded
                    .groups
                    .into_iter()
                    .flat_map(|group| group.records)
                    .collect()
            }
            Err(error) => {
                tracker.error(format!("Unable to read {}: {}", path.display(), error));
                Vec::new()
            }
        }
    }

    /// Registers the legacy records of article `id`.
    ///
    /// Paragraph records found in the external paragraphs folder replace the
    /// ones of the export. The journal must be registered first: its acronym
    /// locates every legacy file of the article.
    ///
    /// # Errors
    ///
    /// `MissingIdentifier` when no ISSN can be derived, `MissingMetadataRecord`
    /// when the group has a single record, `MissingAcronym` when the journal
    /// is unknown.
    pub fn register_document(
        &self,
        id: &str,
        records: Vec<RawRecord>,
    ) -> Result<(MigrationItem, Tracker)> {
        if id.is_empty() {
            return Err(MigrationError::MissingIdentifier("document".to_string()));
        }
        let mut tracker = Tracker::new("register_document");
        let paragraphs = self.external_paragraphs(id, &mut tracker);
        tracker.info(format!("total of external p records: {}", paragraphs.len()));
        let records = if paragraphs.is_empty() {
            records
        } else {
            replace_paragraphs(&records, paragraphs)
        };

        let mut item = self.store.fetch_document(id)?.unwrap_or_default();
        {
            let document = DocumentView::new(id, &records)?;
            let journal_pid = document
                .journal_pid()
                .ok_or_else(|| MigrationError::MissingIdentifier(id.to_string()))?;
            let acron = self
                .store
                .fetch_journal(journal_pid)?
                .and_then(|journal| JournalView::new(&journal.id, &journal.record).acronym())
                .ok_or_else(|| MigrationError::MissingAcronym(id.to_string()))?;

            item.id = id.to_string();
            item.doi = document.doi();
            item.pub_year = document.pub_year().map(str::to_string);
            item.isis_updated_date = document.isis_updated_date();
            item.isis_created_date = document.isis_created_date();
            item.file_name = document.file_name().to_string();
            item.file_type = document.file_type();
            item.issue_folder = document.issue_folder();
            item.language = document.language().map(str::to_string);
            item.acron = Some(acron);
        }
        item.records = records;
        item.advance(MigrationStatus::IsisMetadataMigrated);

        Ok((self.store.save_document(item)?, tracker))
    }

    /// Registers the legacy record of journal `id` (its ISSN).
    pub fn register_journal(&self, id: &str, record: RawRecord) -> Result<(RecordItem, Tracker)> {
        if id.is_empty() {
            return Err(MigrationError::MissingIdentifier("journal".to_string()));
        }
        let mut item = self
            .store
            .fetch_journal(id)?
            .unwrap_or_else(|| RecordItem::new(id, RawRecord::new()));
        {
            let journal = JournalView::new(id, &record);
            item.isis_created_date = journal.isis_created_date();
            item.isis_updated_date = journal.isis_updated_date();
        }
        item.record = record;
        Ok((
            self.store.save_journal(item)?,
            Tracker::new("register_journal"),
        ))
    }

    /// Registers the legacy record of issue `id`, e.g. `0001-371420200002`.
    pub fn register_issue(&self, id: &str, record: RawRecord) -> Result<(RecordItem, Tracker)> {
        if id.is_empty() {
            return Err(MigrationError::MissingIdentifier("issue".to_string()));
        }
        let mut item = self
            .store
            .fetch_issue(id)?
            .unwrap_or_else(|| RecordItem::new(id, RawRecord::new()));
        {
            let issue = IssueView::new(id, &record);
            item.isis_created_date = issue.isis_created_date();
            item.isis_updated_date = issue.isis_updated_date();
        }
        item.record = record;
        Ok((self.store.save_issue(item)?, Tracker::new("register_issue")))
    }

    /// Decodes an export and registers every group in it.
    ///
    /// Single-record groups of an article export without a pid are issue
    /// records embedded in the stream and register as issues. Failures of one group are
    /// recorded and the next group is registered. Returns the registered ids.
    pub fn register_export(&self, kind: RecordKind, text: &str) -> (Vec<String>, Tracker) {
        let mut tracker = Tracker::new("register_export");
        let decoded = IsisDecoder::new(kind).decode(text);
        for error in &decoded.errors {
            tracker.error(error.to_string());
        }
        tracker.info(format!("total of {} groups: {}", kind, decoded.len()));

        let mut registered = Vec::new();
        for group in decoded.groups {
            let id = group.id.clone();
            let result = match kind {
                RecordKind::Journal => self
                    .register_journal(&id, first_record(&group.records))
                    .map(|(_, t)| t),
                RecordKind::Issue => self
                    .register_issue(&id, first_record(&group.records))
                    .map(|(_, t)| t),
                RecordKind::Article if is_embedded_issue(&group.records) => self
                    .register_issue(&id, first_record(&group.records))
                    .map(|(_, t)| t),
                RecordKind::Article => self.register_article_group(&id, group.records),
            };
            match result {
                Ok(group_tracker) => {
                    for error in group_tracker.errors() {
                        tracker.error(format!("{}: {}", id, error));
                    }
                    registered.push(id);
                }
                Err(error) => tracker.error(format!("{}: {}", id, error)),
            }
        }
        (registered, tracker)
    }

    /// Reads an ISO-8859-1 export file and registers it.
    pub fn register_export_file(
        &self,
        kind: RecordKind,
        path: &Path,
    ) -> Result<(Vec<String>, Tracker)> {
        let text = read_latin1_file(path)?;
        Ok(self.register_export(kind, &text))
    }

    fn register_article_group(&self, id: &str, records: Vec<RawRecord>) -> Result<Tracker> {
        let updated = DocumentView::new(id, &records)?
            .isis_updated_date()
            .unwrap_or_default();
        self.create_minimum_record(id, &updated)?;
        self.register_document(id, records).map(|(_, tracker)| tracker)
    }

    /// Migrates the files of article `id`, then publishes its journal and
    /// issue when the repository does not have them yet, its metadata, PDFs
    /// and full text.
    ///
    /// Never fails: the failure that stops the article is part of the outcome.
    pub fn migrate_document(&self, id: &str) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::new(id);
        if let Err(error) = self.run_document_steps(id, &mut outcome) {
            tracing::warn!(pid = %id, %error, "Document migration stopped");
        }
        outcome
    }

    fn run_document_steps(&self, id: &str, outcome: &mut DocumentOutcome) -> Result<()> {
        let item = outcome.record("migrate_document_files", self.migrate_document_files(id))?;

        let journal_pid = item.journal_pid().to_string();
        if self.repository.fetch_journal(&journal_pid)?.is_none() {
            outcome.record("publish_journal", self.publish_journal(&journal_pid))?;
        }
        let issue_id = item.id.get(1..18).unwrap_or_default();
        if let Some(issue) = self.store.fetch_issue(issue_id)? {
            let bundle_id = IssueView::new(&issue.id, &issue.record).bundle_id();
            if self.repository.fetch_issue(&bundle_id)?.is_none() {
                outcome.record("publish_issue", self.publish_issue(issue_id))?;
            }
        }

        outcome.record(
            "publish_document_metadata",
            self.publish_document_metadata(id),
        )?;
        outcome.record("publish_document_pdfs", self.publish_document_pdfs(id))?;
        match item.file_type {
            crate::FileType::Html => {
                outcome.record("publish_document_htmls", self.publish_document_htmls(id))?;
            }
            #[cfg(feature = "xml")]
            crate::FileType::Xml => {
                outcome.record("publish_document_xml", self.publish_document_xml(id))?;
            }
            #[cfg(not(feature = "xml"))]
            crate::FileType::Xml => {
                tracing::debug!(pid = %id, "XML publication is disabled");
            }
        }
        Ok(())
    }

    /// Migrates every document selected by `query`.
    ///
    /// Documents run in parallel when `run_in_parallel` is set and the
    /// `parallel` feature is enabled.
    pub fn migrate_batch(&self, query: &DocumentQuery) -> Result<Vec<DocumentOutcome>> {
        let ids: Vec<String> = self
            .store
            .query_documents(query)?
            .into_iter()
            .map(|item| item.id)
            .collect();
        tracing::info!(total = ids.len(), "Migrating batch");

        #[cfg(feature = "parallel")]
        {
            if self.config.run_in_parallel {
                use rayon::prelude::*;
                return Ok(ids.par_iter().map(|id| self.migrate_document(id)).collect());
            }
        }
        Ok(ids.iter().map(|id| self.migrate_document(id)).collect())
    }
}
