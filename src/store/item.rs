use crate::FileType;
use crate::isis::RawRecord;
use crate::locator::UNDETERMINED_LANGUAGE;
use crate::views::ParagraphStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the published XML in [`MigrationItem::files_to_publish`].
pub const PUBLISHED_XML: &str = "published xml";

/// Key of a published HTML in [`MigrationItem::files_to_publish`].
pub fn published_html_key(lang: &str) -> String {
    format!("published html ({})", lang)
}

/// How far a document went through the migration, in forward order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Only the pid and the legacy update date are known
    #[default]
    PendingMigration,
    /// Legacy metadata registered
    IsisMetadataMigrated,
    /// Published, with files still missing
    PublishedIncomplete,
    /// Every tracked file migrated and every tracked artifact published
    PublishedComplete,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::PendingMigration => "pending_migration",
            MigrationStatus::IsisMetadataMigrated => "isis_metadata_migrated",
            MigrationStatus::PublishedIncomplete => "published_incomplete",
            MigrationStatus::PublishedComplete => "published_complete",
        }
    }
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MigrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_migration" => Ok(MigrationStatus::PendingMigration),
            "isis_metadata_migrated" => Ok(MigrationStatus::IsisMetadataMigrated),
            "published_incomplete" => Ok(MigrationStatus::PublishedIncomplete),
            "published_complete" => Ok(MigrationStatus::PublishedComplete),
            other => Err(format!("Invalid value for migration status: {}", other)),
        }
    }
}

/// Extra data attached to a migrated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// An asset referenced by the HTML of `lang` through `elem[attr] = original`.
    Asset {
        original: String,
        elem: String,
        attr: String,
        lang: String,
    },
    /// Basenames of the files packed in an archive.
    Archive { files: Vec<String> },
}

/// A local file and, once uploaded, its remote URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAndLocalFile {
    pub name: String,
    pub uri: Option<String>,
    pub annotation: Option<Annotation>,
}

impl RemoteAndLocalFile {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: Some(uri.into()),
            annotation: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotation = Some(annotation);
        self
    }

    /// Whether the file reached object storage.
    pub fn is_migrated(&self) -> bool {
        self.uri.as_deref().is_some_and(|uri| !uri.is_empty())
    }
}

/// Front and back HTML files of one translation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationFiles {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl TranslationFiles {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.front.iter().chain(self.back.iter()).map(String::as_str)
    }
}

/// Migration state of one article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationItem {
    /// pid v2
    pub id: String,
    pub doi: Option<String>,
    pub pub_year: Option<String>,
    pub isis_updated_date: Option<String>,
    pub isis_created_date: Option<String>,
    pub records: Vec<RawRecord>,

    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub status: MigrationStatus,

    pub files_to_migrate: BTreeMap<String, u8>,
    pub files_migration_progress: f64,
    pub files_to_publish: BTreeMap<String, u8>,
    pub files_publication_progress: f64,
    pub paragraph_stats: ParagraphStats,
    pub paragraph_quality: f64,

    pub file_name: String,
    pub file_type: FileType,
    pub acron: Option<String>,
    pub issue_folder: String,
    pub language: Option<String>,

    /// Expected asset basenames
    pub assets: Vec<String>,
    /// Translation HTML basenames by language
    pub translations: BTreeMap<String, TranslationFiles>,
    /// PDF basenames by language
    pub pdfs: BTreeMap<String, String>,

    pub asset_files: Vec<RemoteAndLocalFile>,
    pub html_files: Vec<RemoteAndLocalFile>,
    pub pdf_files: Vec<RemoteAndLocalFile>,
    pub xml_files: Vec<RemoteAndLocalFile>,
    pub zipfile: Option<RemoteAndLocalFile>,

    /// Published HTML URIs by language
    pub published_htmls: BTreeMap<String, String>,
    pub published_xml: Option<String>,
}

fn track<'a>(
    expected: impl IntoIterator<Item = &'a str>,
    files: &'a [RemoteAndLocalFile],
) -> BTreeMap<String, u8> {
    let mut tracked: BTreeMap<String, u8> =
        expected.into_iter().map(|name| (name.to_string(), 0)).collect();
    for file in files.iter().filter(|file| file.is_migrated()) {
        tracked.insert(file.name.clone(), 1);
    }
    tracked
}

fn progress(tracked: &BTreeMap<String, u8>) -> f64 {
    if tracked.is_empty() {
        return 1.0;
    }
    tracked.values().map(|v| f64::from(*v)).sum::<f64>() / tracked.len() as f64
}

impl MigrationItem {
    /// A stub with only the pid and the legacy update date.
    pub fn minimum(id: impl Into<String>, isis_updated_date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            isis_updated_date: Some(isis_updated_date.into()),
            ..Self::default()
        }
    }

    /// ISSN part of the pid.
    pub fn journal_pid(&self) -> &str {
        self.id.get(1..10).unwrap_or_default()
    }

    /// Moves the status forward. Never moves it back.
    pub fn advance(&mut self, status: MigrationStatus) {
        self.status = self.status.max(status);
    }

    /// Records a published HTML, or its failure when `uri` is `None`.
    pub fn mark_html_published(&mut self, lang: &str, uri: Option<String>) {
        match uri.filter(|uri| !uri.is_empty()) {
            Some(uri) => {
                self.published_htmls.insert(lang.to_string(), uri);
            }
            None => {
                self.published_htmls.remove(lang);
            }
        }
    }

    pub fn mark_xml_published(&mut self, uri: Option<String>) {
        self.published_xml = uri.filter(|uri| !uri.is_empty());
    }

    fn expected_files_to_migrate(&self) -> BTreeMap<String, u8> {
        let mut tracked = track(self.pdfs.values().map(String::as_str), &self.pdf_files);
        tracked.extend(track(self.assets.iter().map(String::as_str), &self.asset_files));
        match self.file_type {
            FileType::Xml => {
                let name = format!("{}.xml", self.file_name);
                let migrated = self
                    .xml_files
                    .first()
                    .is_some_and(RemoteAndLocalFile::is_migrated);
                tracked.insert(name, u8::from(migrated));
            }
            FileType::Html => {
                tracked.extend(track(
                    self.translations.values().flat_map(TranslationFiles::names),
                    &self.html_files,
                ));
            }
        }
        tracked
    }

    fn expected_files_to_publish(&self) -> BTreeMap<String, u8> {
        match self.file_type {
            FileType::Xml => {
                BTreeMap::from([(PUBLISHED_XML.to_string(), u8::from(self.published_xml.is_some()))])
            }
            FileType::Html => {
                let original = self.language.as_deref().unwrap_or(UNDETERMINED_LANGUAGE);
                std::iter::once(original)
                    .chain(self.translations.keys().map(String::as_str))
                    .map(|lang| {
                        let published = self.published_htmls.contains_key(lang);
                        (published_html_key(lang), u8::from(published))
                    })
                    .collect()
            }
        }
    }

    /// Recomputes the tracked files, the progress ratios, the paragraph
    /// statistics and the status. Idempotent.
    ///
    /// Items that reached [`MigrationStatus::IsisMetadataMigrated`] become
    /// [`MigrationStatus::PublishedComplete`] when both ratios are `1.0`.
    /// The status never moves backward.
    pub fn refresh(&mut self) {
        self.files_to_migrate = self.expected_files_to_migrate();
        self.files_migration_progress = progress(&self.files_to_migrate);
        self.files_to_publish = self.expected_files_to_publish();
        self.files_publication_progress = progress(&self.files_to_publish);

        match self.file_type {
            FileType::Html => {
                self.paragraph_stats = ParagraphStats::from_records(&self.records);
                self.paragraph_quality = self.paragraph_stats.quality();
            }
            FileType::Xml => {
                self.paragraph_stats = ParagraphStats::default();
                self.paragraph_quality = 1.0;
            }
        }

        let complete =
            self.files_migration_progress == 1.0 && self.files_publication_progress == 1.0;
        if complete && self.status >= MigrationStatus::IsisMetadataMigrated {
            self.status = MigrationStatus::PublishedComplete;
        }
    }

    /// Stamps `updated`, and `created` on first save.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated = Some(now);
        self.created.get_or_insert(now);
    }
}

/// Migration state of a journal or issue: the legacy record as registered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordItem {
    pub id: String,
    pub isis_created_date: Option<String>,
    pub isis_updated_date: Option<String>,
    pub record: RawRecord,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl RecordItem {
    pub fn new(id: impl Into<String>, record: RawRecord) -> Self {
        Self {
            id: id.into(),
            record,
            ..Self::default()
        }
    }

    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated = Some(now);
        self.created.get_or_insert(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn html_item() -> MigrationItem {
        let mut item = MigrationItem::minimum("S0001-37142020000200005", "20200101");
        item.status = MigrationStatus::IsisMetadataMigrated;
        item.file_name = "a05".to_string();
        item.file_type = FileType::Html;
        item.language = Some("pt".to_string());
        item.pdfs = BTreeMap::from([
            ("pt".to_string(), "a05.pdf".to_string()),
            ("en".to_string(), "en_a05.pdf".to_string()),
        ]);
        item.translations = BTreeMap::from([(
            "en".to_string(),
            TranslationFiles {
                front: Some("en_a05.htm".to_string()),
                back: Some("en_ba05.htm".to_string()),
            },
        )]);
        item
    }

    #[test]
    fn test_status_order_and_strings() {
        assert!(MigrationStatus::PendingMigration < MigrationStatus::IsisMetadataMigrated);
        assert!(MigrationStatus::PublishedIncomplete < MigrationStatus::PublishedComplete);
        assert_eq!(
            "published_incomplete".parse::<MigrationStatus>(),
            Ok(MigrationStatus::PublishedIncomplete)
        );
        assert!("unknown".parse::<MigrationStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&MigrationStatus::IsisMetadataMigrated).unwrap(),
            r#""isis_metadata_migrated""#
        );
    }

    #[test]
    fn test_advance_never_goes_back() {
        let mut item = MigrationItem::default();
        item.advance(MigrationStatus::PublishedIncomplete);
        item.advance(MigrationStatus::IsisMetadataMigrated);
        assert_eq!(item.status, MigrationStatus::PublishedIncomplete);
    }

    #[test]
    fn test_refresh_tracks_expected_files() {
        let mut item = html_item();
        item.pdf_files.push(RemoteAndLocalFile::new("a05.pdf", "https://x/a05.pdf"));
        item.refresh();

        assert_eq!(
            item.files_to_migrate,
            BTreeMap::from([
                ("a05.pdf".to_string(), 1),
                ("en_a05.htm".to_string(), 0),
                ("en_a05.pdf".to_string(), 0),
                ("en_ba05.htm".to_string(), 0),
            ])
        );
        assert_eq!(item.files_migration_progress, 0.25);
        assert_eq!(
            item.files_to_publish,
            BTreeMap::from([
                ("published html (en)".to_string(), 0),
                ("published html (pt)".to_string(), 0),
            ])
        );
        assert_eq!(item.files_publication_progress, 0.0);
        assert_eq!(item.status, MigrationStatus::IsisMetadataMigrated);
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut item = html_item();
        item.pdf_files.push(RemoteAndLocalFile::new("a05.pdf", "https://x/a05.pdf"));
        item.refresh();
        let first = item.clone();
        item.refresh();
        assert_eq!(item, first);
    }

    #[test]
    fn test_complete_requires_both_ratios() {
        let mut item = html_item();
        for name in ["a05.pdf", "en_a05.pdf", "en_a05.htm", "en_ba05.htm"] {
            let uri = format!("https://x/{}", name);
            if name.ends_with(".pdf") {
                item.pdf_files.push(RemoteAndLocalFile::new(name, uri));
            } else {
                item.html_files.push(RemoteAndLocalFile::new(name, uri));
            }
        }
        item.refresh();
        assert_eq!(item.files_migration_progress, 1.0);
        assert_eq!(item.status, MigrationStatus::IsisMetadataMigrated);

        item.mark_html_published("pt", Some("https://x/a05.html".to_string()));
        item.refresh();
        assert_eq!(item.files_publication_progress, 0.5);
        assert_eq!(item.status, MigrationStatus::IsisMetadataMigrated);

        item.mark_html_published("en", Some("https://x/en_a05.html".to_string()));
        item.refresh();
        assert_eq!(item.status, MigrationStatus::PublishedComplete);

        item.mark_html_published("en", None);
        item.refresh();
        assert_eq!(item.files_publication_progress, 0.5);
        assert_eq!(item.status, MigrationStatus::PublishedComplete);
    }

    #[test]
    fn test_complete_status_stays_when_new_files_are_expected() {
        let mut item = MigrationItem::minimum("S0001-00000000000001", "20190101");
        item.status = MigrationStatus::IsisMetadataMigrated;
        item.file_type = FileType::Xml;
        item.file_name = "a01".to_string();
        item.xml_files.push(RemoteAndLocalFile::new("a01.xml", "https://x/a01.xml"));
        item.mark_xml_published(Some("https://x/published/a01.xml".to_string()));
        item.refresh();
        assert_eq!(item.status, MigrationStatus::PublishedComplete);

        item.assets.push("a01f1.jpg".to_string());
        item.refresh();
        assert!(item.files_migration_progress < 1.0);
        assert_eq!(item.status, MigrationStatus::PublishedComplete);
    }

    #[test]
    fn test_html_without_language_expects_undetermined_text() {
        let mut item = MigrationItem::minimum("S0001-00000000000001", "20190101");
        item.status = MigrationStatus::IsisMetadataMigrated;
        item.file_type = FileType::Html;
        item.file_name = "a01".to_string();
        item.refresh();
        assert_eq!(
            item.files_to_publish,
            BTreeMap::from([(published_html_key("und"), 0)])
        );
        assert_eq!(item.files_publication_progress, 0.0);
        assert_eq!(item.status, MigrationStatus::IsisMetadataMigrated);

        item.mark_html_published("und", Some("https://x/und_a01.html".to_string()));
        item.refresh();
        assert_eq!(item.status, MigrationStatus::PublishedComplete);
    }

    #[test]
    fn test_pending_item_is_never_complete() {
        let mut item = MigrationItem::minimum("S0001-00000000000001", "20190101");
        item.refresh();
        assert_eq!(item.files_migration_progress, 1.0);
        assert_eq!(item.status, MigrationStatus::PendingMigration);
    }

    #[test]
    fn test_xml_item() {
        let mut item = MigrationItem::minimum("S0001-00000000000001", "20190101");
        item.status = MigrationStatus::PublishedIncomplete;
        item.file_type = FileType::Xml;
        item.file_name = "0001-3714-abc-49-2-0005".to_string();
        item.refresh();

        assert_eq!(
            item.files_to_migrate,
            BTreeMap::from([("0001-3714-abc-49-2-0005.xml".to_string(), 0)])
        );
        assert_eq!(item.paragraph_quality, 1.0);

        item.xml_files.push(RemoteAndLocalFile::new(
            "0001-3714-abc-49-2-0005.xml",
            "https://x/0001-3714-abc-49-2-0005.xml",
        ));
        item.mark_xml_published(Some("https://x/published.xml".to_string()));
        item.refresh();
        assert_eq!(item.status, MigrationStatus::PublishedComplete);
    }

    #[test]
    fn test_unmigrated_file_has_no_uri() {
        let file = RemoteAndLocalFile {
            name: "a05.pdf".to_string(),
            uri: Some(String::new()),
            annotation: None,
        };
        assert!(!file.is_migrated());
    }

    #[test]
    fn test_touch_keeps_created() {
        let mut item = MigrationItem::default();
        item.touch();
        let created = item.created;
        item.touch();
        assert_eq!(item.created, created);
        assert!(item.updated >= created);
    }
}
