//! Migration configuration.
//!
//! Paths of the legacy website layout and the destination folders in object
//! storage. Loading the values from the environment is left to the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root directories of the legacy website.
///
/// Every root is organized as `{acronym}/{issue_folder}/...` except
/// `paragraphs_root`, organized as `{issn}/{year}/{issue_order}/{pid}.id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyLayout {
    /// `bases/pdf`
    pub pdf_root: PathBuf,
    /// `bases/xml`
    pub xml_root: PathBuf,
    /// `bases/translation`
    pub translation_root: PathBuf,
    /// `htdocs/img/revistas`
    pub img_root: PathBuf,
    /// `htdocs`, the legacy web root
    pub htdocs_root: PathBuf,
    /// `bases/artigo/p`, external paragraph records
    pub paragraphs_root: PathBuf,
}

impl LegacyLayout {
    /// Standard layout of a legacy website installed at `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let htdocs_root = root.join("htdocs");
        Self {
            pdf_root: root.join("bases").join("pdf"),
            xml_root: root.join("bases").join("xml"),
            translation_root: root.join("bases").join("translation"),
            img_root: htdocs_root.join("img").join("revistas"),
            paragraphs_root: root.join("bases").join("artigo").join("p"),
            htdocs_root,
        }
    }
}

/// Configuration for [`MigrationManager`](crate::MigrationManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub layout: LegacyLayout,
    /// Base URL of the destination website.
    pub website_url: String,
    /// Hosts of the legacy website. Absolute links to them are local files.
    pub legacy_hosts: Vec<String>,
    /// Object storage folder for migrated legacy files.
    pub migration_folder: String,
    /// Object storage folder for published HTML.
    pub published_htmls_folder: String,
    /// Object storage folder for published XML.
    pub published_xmls_folder: String,
    /// Migrate batches across threads (feature `parallel`).
    pub run_in_parallel: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            layout: LegacyLayout::default(),
            website_url: String::new(),
            legacy_hosts: Vec::new(),
            migration_folder: "migration".to_string(),
            published_htmls_folder: "htmls".to_string(),
            published_xmls_folder: "xmls".to_string(),
            run_in_parallel: false,
        }
    }
}

impl MigrationConfig {
    /// Creates a configuration with the default folders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_layout(&mut self, layout: LegacyLayout) -> &mut Self {
        self.layout = layout;
        self
    }

    pub fn set_website_url(&mut self, url: &str) -> &mut Self {
        self.website_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn add_legacy_host(&mut self, host: &str) -> &mut Self {
        self.legacy_hosts.push(host.to_lowercase());
        self
    }

    pub fn set_migration_folder(&mut self, folder: &str) -> &mut Self {
        self.migration_folder = folder.to_string();
        self
    }

    pub fn set_published_htmls_folder(&mut self, folder: &str) -> &mut Self {
        self.published_htmls_folder = folder.to_string();
        self
    }

    pub fn set_published_xmls_folder(&mut self, folder: &str) -> &mut Self {
        self.published_xmls_folder = folder.to_string();
        self
    }

    pub fn set_run_in_parallel(&mut self, run_in_parallel: bool) -> &mut Self {
        self.run_in_parallel = run_in_parallel;
        self
    }

    /// `{prefix}/{issn}/{issue_folder}/{file_name}`
    fn document_folder(prefix: &str, issn: &str, issue_folder: &str, file_name: &str) -> String {
        [prefix, issn, issue_folder, file_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Object storage folder for the migrated files of one document.
    pub fn migration_folder_for(&self, issn: &str, issue_folder: &str, file_name: &str) -> String {
        Self::document_folder(&self.migration_folder, issn, issue_folder, file_name)
    }

    pub fn published_htmls_folder_for(
        &self,
        issn: &str,
        issue_folder: &str,
        file_name: &str,
    ) -> String {
        Self::document_folder(&self.published_htmls_folder, issn, issue_folder, file_name)
    }

    pub fn published_xmls_folder_for(
        &self,
        issn: &str,
        issue_folder: &str,
        file_name: &str,
    ) -> String {
        Self::document_folder(&self.published_xmls_folder, issn, issue_folder, file_name)
    }

    /// Path of the external paragraph records of article `pid`.
    pub fn paragraphs_file_path(&self, pid: &str) -> Option<PathBuf> {
        let issn = pid.get(1..10)?;
        let year = pid.get(10..14)?;
        let issue_order = pid.get(14..18)?;
        Some(
            self.layout
                .paragraphs_root
                .join(issn)
                .join(year)
                .join(issue_order)
                .join(format!("{}.id", pid)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder() {
        let mut config = MigrationConfig::new();
        config
            .set_website_url("https://www.example.org/")
            .add_legacy_host("WWW.Example.org")
            .set_run_in_parallel(true);

        assert_eq!(config.website_url, "https://www.example.org");
        assert_eq!(config.legacy_hosts, vec!["www.example.org"]);
        assert!(config.run_in_parallel);
    }

    #[test]
    fn test_layout_from_root() {
        let layout = LegacyLayout::from_root("/var/www/scielo");
        assert_eq!(layout.pdf_root, PathBuf::from("/var/www/scielo/bases/pdf"));
        assert_eq!(
            layout.img_root,
            PathBuf::from("/var/www/scielo/htdocs/img/revistas")
        );
    }

    #[test]
    fn test_storage_folders() {
        let config = MigrationConfig::default();
        assert_eq!(
            config.migration_folder_for("0001-3714", "v49n2", "a05"),
            "migration/0001-3714/v49n2/a05"
        );
        assert_eq!(
            config.published_xmls_folder_for("0001-3714", "", "a05"),
            "xmls/0001-3714/a05"
        );
    }

    #[test]
    fn test_paragraphs_file_path() {
        let mut config = MigrationConfig::default();
        config.set_layout(LegacyLayout::from_root("/legacy"));
        assert_eq!(
            config.paragraphs_file_path("S0001-37142020000200005"),
            Some(PathBuf::from(
                "/legacy/bases/artigo/p/0001-3714/2020/0002/S0001-37142020000200005.id"
            ))
        );
        assert_eq!(config.paragraphs_file_path("S0001"), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: MigrationConfig =
            serde_json::from_str(r#"{"website_url": "https://x.org"}"#).unwrap();
        assert_eq!(config.migration_folder, "migration");
        assert_eq!(config.website_url, "https://x.org");
    }
}
