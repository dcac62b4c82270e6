//! Publication of journals, issues and articles to the document repository.

use super::MigrationManager;
use crate::error::{MigrationError, Result};
use crate::locator::{FileLocator, adapt_html_text_to_website};
use crate::pid::{PidRequest, generate_pid_v3};
use crate::repository::{
    PublishedDocument, PublishedHtml, PublishedIssue, PublishedJournal, PublishedPdf,
};
use crate::store::{Annotation, MigrationItem, MigrationStatus, RemoteAndLocalFile};
use crate::tracker::Tracker;
use crate::views::{DocumentView, IssueView, JournalView};
use std::collections::BTreeMap;

fn optional(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl MigrationManager {
    /// Publishes the registered journal `issn`.
    pub fn publish_journal(&self, issn: &str) -> Result<(PublishedJournal, Tracker)> {
        let tracker = Tracker::new("publish_journal");
        let journal = self
            .store
            .fetch_journal(issn)?
            .ok_or_else(|| MigrationError::NotRegistered(issn.to_string()))?;
        let view = JournalView::new(&journal.id, &journal.record);

        let mut published = self
            .repository
            .fetch_journal(issn)?
            .unwrap_or_else(|| self.repository.create_journal());
        let issns = view.issns();
        published.id = issn.to_string();
        published.acronym = view.acronym();
        published.title = view.title();
        published.iso_title = view.iso_abbreviated_title();
        published.short_title = view.abbreviated_title();
        published.next_title = view.new_title();
        published.scielo_issn = issn.to_string();
        published.print_issn = issns.print;
        published.electronic_issn = issns.electronic;
        published.subject_categories = view.subject_categories();
        published.subject_descriptors = view.subject_descriptors();
        published.study_areas = view.study_areas();
        published.index_at = view.index_at();
        published.sponsors = view.sponsors();
        published.mission = view.mission();
        published.copyright_holder = view.copyright_holder();
        published.online_submission_url = view.online_submission_url();
        published.editor_email = view.email();
        published.publisher_name = view.publisher_names().join("; ");
        published.publisher_address = view.publisher_address();
        published.publisher_city = view.publisher_city();
        published.publisher_state = view.publisher_state();
        published.publisher_country = view.publisher_country();
        published.current_status = view.current_status();
        published.unpublish_reason = view.unpublish_reason();
        published.is_public = view.is_public();

        Ok((self.repository.save_journal(published)?, tracker))
    }

    /// Publishes the registered issue `issue_id`, e.g. `0001-371420200002`,
    /// under its bundle id.
    pub fn publish_issue(&self, issue_id: &str) -> Result<(PublishedIssue, Tracker)> {
        let tracker = Tracker::new("publish_issue");
        let issue = self
            .store
            .fetch_issue(issue_id)?
            .ok_or_else(|| MigrationError::NotRegistered(issue_id.to_string()))?;
        let view = IssueView::new(&issue.id, &issue.record);
        let bundle_id = view.bundle_id();

        let mut published = self
            .repository
            .fetch_issue(&bundle_id)?
            .unwrap_or_else(|| self.repository.create_issue());
        published.id = bundle_id;
        published.pid = Some(view.pid());
        published.journal_id = optional(view.journal_pid());
        published.volume = optional(view.volume());
        published.number = optional(view.number());
        published.supplement = optional(view.supplement());
        published.issue_type = Some(view.issue_type());
        published.year = optional(view.year());
        published.start_month = optional(view.start_month());
        published.end_month = optional(view.end_month());
        published.label = view.issue_folder();
        published.order = view
            .order()
            .and_then(|order| order.parse().ok())
            .unwrap_or_default();
        published.is_public = view.is_public();

        Ok((self.repository.save_issue(published)?, tracker))
    }

    /// The pid v3 of a document: the one already published, the one given by
    /// the pid issuer, the one in the legacy record or a new one, in that
    /// order.
    fn pid_v3(
        &self,
        document: &DocumentView<'_>,
        published: Option<&PublishedDocument>,
    ) -> Result<String> {
        if let Some(published) = published.filter(|p| !p.id.is_empty()) {
            return Ok(published.id.clone());
        }
        if let Some(issuer) = &self.pid_issuer {
            let request = PidRequest {
                v2: document.id().to_string(),
                v3: optional(document.pid_v3()),
                aop: optional(document.aop_pid()),
                doi: document.doi(),
                filename: document.file_name().to_string(),
            };
            return Ok(issuer.issue_pid_v3(&request)?);
        }
        Ok(optional(document.pid_v3()).unwrap_or_else(generate_pid_v3))
    }

    fn fetch_published(&self, id: &str) -> Result<PublishedDocument> {
        self.repository
            .fetch_document(id)?
            .ok_or_else(|| MigrationError::DocumentNotPublished(id.to_string()))
    }

    /// Publishes the metadata of article `id` and moves it to
    /// [`MigrationStatus::PublishedIncomplete`] at least.
    pub fn publish_document_metadata(&self, id: &str) -> Result<(PublishedDocument, Tracker)> {
        let tracker = Tracker::new("publish_document_metadata");
        let mut item = self.load_document(id)?;
        let existing = self.repository.fetch_document(id)?;

        let published = {
            let document = DocumentView::new(&item.id, &item.records)?;
            let v3 = self.pid_v3(&document, existing.as_ref())?;
            let issue = match document.issue_pid() {
                Some(issue_pid) => self.store.fetch_issue(issue_pid)?,
                None => None,
            };
            let issue_view = issue
                .as_ref()
                .map(|issue| IssueView::new(&issue.id, &issue.record));
            let section = |lang: &str| -> Option<String> {
                issue_view
                    .as_ref()?
                    .section_title(document.section_code()?, lang)
            };

            let mut published = existing.unwrap_or_else(|| self.repository.create_document());
            published.id = v3.clone();
            published.pid = Some(item.id.clone());
            published.scielo_pids = [
                ("v1", optional(document.pid_v1())),
                ("v2", Some(item.id.clone())),
                ("v3", Some(v3)),
            ]
            .into_iter()
            .filter_map(|(kind, pid)| Some((kind.to_string(), pid?)))
            .collect();
            published.aop_pid = optional(document.aop_pid());
            published.doi = document.doi();
            published.journal_id = optional(document.journal_pid());
            published.issue_id = issue_view.as_ref().map(IssueView::bundle_id);
            published.order = document.order().parse().unwrap_or_default();
            published.is_public = true;
            published.document_type = optional(document.document_type());
            published.original_language = optional(document.language());
            published.languages = document.languages().into_iter().map(str::to_string).collect();
            published.title = document.original_title();
            published.translated_titles = document.translated_titles();
            published.section = document.language().and_then(|lang| section(lang));
            published.translated_sections = document
                .translated_languages()
                .into_iter()
                .filter_map(|lang| Some((lang.to_string(), section(lang)?)))
                .collect();
            published.abstract_text = document.abstract_text();
            published.abstracts = document.abstracts();
            published.keywords = document.keyword_groups();
            published.authors = document.contributors();
            let pages = document.pages();
            published.elocation = pages.elocation;
            published.fpage = pages.first;
            published.fpage_sequence = pages.first_sequence;
            published.lpage = pages.last;
            published.publication_date = optional(document.document_pubdate());
            published.created = document.isis_created_date();
            published.updated = document.isis_updated_date();
            published
        };
        let published = self.repository.save_document(published)?;

        item.advance(MigrationStatus::PublishedIncomplete);
        self.store.save_document(item)?;
        Ok((published, tracker))
    }

    /// Lists the migrated PDFs of article `id` in its published record.
    pub fn publish_document_pdfs(&self, id: &str) -> Result<(PublishedDocument, Tracker)> {
        let mut tracker = Tracker::new("publish_document_pdfs");
        let item = self.load_document(id)?;
        let mut published = self.fetch_published(id)?;

        published.pdfs = item
            .pdfs
            .iter()
            .map(|(lang, filename)| {
                let url = item
                    .pdf_files
                    .iter()
                    .find(|file| &file.name == filename)
                    .and_then(|file| file.uri.clone());
                if url.is_none() {
                    tracker.info(format!("{} is not migrated", filename));
                }
                PublishedPdf {
                    lang: lang.clone(),
                    filename: filename.clone(),
                    url,
                }
            })
            .collect();
        Ok((self.repository.save_document(published)?, tracker))
    }

    /// Writes `content` to a temporary `filename` and uploads it to `folder`.
    fn register_text(&self, content: &str, folder: &str, filename: &str) -> Result<String> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(filename);
        std::fs::write(&path, content)?;
        Ok(self.storage.register(&path, folder, filename)?)
    }

    fn legacy_acron(item: &MigrationItem) -> Result<&str> {
        item.acron
            .as_deref()
            .ok_or_else(|| MigrationError::MissingAcronym(item.id.clone()))
    }

    /// Publishes the HTML text of each language of HTML article `id`, with
    /// its links adapted to the destination website.
    ///
    /// A language whose text is empty or fails to upload is reported and
    /// left unpublished.
    pub fn publish_document_htmls(&self, id: &str) -> Result<(PublishedDocument, Tracker)> {
        let mut tracker = Tracker::new("publish_document_htmls");
        let mut item = self.load_document(id)?;
        let mut published = self.fetch_published(id)?;
        let acron = Self::legacy_acron(&item)?.to_string();
        let folder = self.config.published_htmls_folder_for(
            item.journal_pid(),
            &item.issue_folder,
            &item.file_name,
        );

        let texts = {
            let document = DocumentView::new(&item.id, &item.records)?;
            let translations = FileLocator::new(&self.config).translation_paths(
                &acron,
                &item.issue_folder,
                &item.file_name,
            );
            self.html_texts(&document, &translations, &mut tracker)
        };

        let mut uris: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (lang, text) in &texts {
            if text.trim().is_empty() {
                tracker.error(format!("No HTML text for {}", lang));
                uris.insert(lang.clone(), None);
                continue;
            }
            let assets: Vec<RemoteAndLocalFile> = item
                .asset_files
                .iter()
                .filter(|asset| {
                    matches!(&asset.annotation, Some(Annotation::Asset { lang: l, .. }) if l == lang)
                })
                .cloned()
                .collect();
            let html = adapt_html_text_to_website(text, &assets, &self.config.website_url);
            let filename = format!("{}_{}.html", lang, item.file_name);
            let uri = match self.register_text(&html, &folder, &filename) {
                Ok(uri) => Some(uri),
                Err(error) => {
                    tracker.error(format!("Unable to publish {}: {}", filename, error));
                    None
                }
            };
            uris.insert(lang.clone(), uri);
        }

        for (lang, uri) in uris {
            item.mark_html_published(&lang, uri);
        }
        published.htmls = item
            .published_htmls
            .iter()
            .map(|(lang, uri)| PublishedHtml {
                lang: lang.clone(),
                url: Some(uri.clone()),
            })
            .collect();
        let published = self.repository.save_document(published)?;
        self.store.save_document(item)?;
        Ok((published, tracker))
    }

    /// Publishes the XML of XML article `id` with its pids and migrated
    /// asset links, and lists its languages in the published record.
    #[cfg(feature = "xml")]
    pub fn publish_document_xml(&self, id: &str) -> Result<(PublishedDocument, Tracker)> {
        use crate::xml::{ArticleIds, prepare_for_publication};

        let mut tracker = Tracker::new("publish_document_xml");
        let mut item = self.load_document(id)?;
        let mut published = self.fetch_published(id)?;
        let acron = Self::legacy_acron(&item)?;
        let xml_path = FileLocator::new(&self.config).xml_path(
            acron,
            &item.issue_folder,
            &item.file_name,
        );
        let folder = self.config.published_xmls_folder_for(
            item.journal_pid(),
            &item.issue_folder,
            &item.file_name,
        );
        let aop = {
            let document = DocumentView::new(&item.id, &item.records)?;
            optional(document.aop_pid())
        };

        let prepared = read_xml(&xml_path).and_then(|xml| {
            let ids = ArticleIds {
                v3: published.id.as_str(),
                v2: Some(item.id.as_str()),
                aop: aop.as_deref(),
            };
            prepare_for_publication(&xml, &ids, &item.asset_files)
                .map_err(|error| format!("Invalid XML {}: {}", xml_path.display(), error))
        });
        let uri = match prepared {
            Ok(prepared) => {
                let filename = format!("{}.xml", item.file_name);
                published.htmls = prepared
                    .languages
                    .iter()
                    .map(|lang| PublishedHtml {
                        lang: lang.clone(),
                        url: None,
                    })
                    .collect();
                match self.register_text(&prepared.content, &folder, &filename) {
                    Ok(uri) => Some(uri),
                    Err(error) => {
                        tracker.error(format!("Unable to publish {}: {}", filename, error));
                        None
                    }
                }
            }
            Err(error) => {
                tracker.error(error);
                None
            }
        };

        published.xml = uri.clone();
        item.mark_xml_published(uri);
        let published = self.repository.save_document(published)?;
        self.store.save_document(item)?;
        Ok((published, tracker))
    }
}

#[cfg(feature = "xml")]
fn read_xml(path: &std::path::Path) -> std::result::Result<String, String> {
    if !path.is_file() {
        return Err(crate::error::FileNotFoundError::new(path).to_string());
    }
    crate::utils::read_text_file(path)
        .map_err(|error| format!("Unable to read {}: {}", path.display(), error))
}
