//! Legacy file locator.
//!
//! Finds the files of one article across the legacy website roots, each
//! organized as `{acronym}/{issue_folder}/...`:
//!
//! - PDFs: `{name}.pdf` for the original language, `{lang}_{name}.pdf` for
//!   translations
//! - XML: `{name}.xml`
//! - translations: `{lang}_{name}.htm*` (front) and `{lang}_b{name}.htm*` (back)
//! - images: every file whose name contains `{name}`
//!
//! The locator only computes paths. Whether an expected file is present is
//! checked, and reported, by the migration step that uploads it.

mod html;

pub use html::{
    AssetLink, LEGACY_IMAGES_PATH, adapt_html_text_to_website, asset_links,
    build_translation_html_text, change_images_location,
};

use crate::FileType;
use crate::config::{LegacyLayout, MigrationConfig};
use crate::views::DocumentView;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// PDF key of the original language when the article does not declare one.
pub const UNDETERMINED_LANGUAGE: &str = "und";

/// Front and back HTML files of one translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationPaths {
    pub front: Option<PathBuf>,
    pub back: Option<PathBuf>,
}

impl TranslationPaths {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.front.iter().chain(self.back.iter())
    }
}

/// The legacy files of one article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatedFiles {
    /// Expected PDF by language, present on disk or not
    pub pdfs: BTreeMap<String, PathBuf>,
    /// Expected XML of XML articles
    pub xml: Option<PathBuf>,
    /// Translations found for HTML articles, by language
    pub translations: BTreeMap<String, TranslationPaths>,
    /// Images found for XML articles
    pub images: Vec<PathBuf>,
}

/// Maps articles to paths under a [`LegacyLayout`].
#[derive(Debug, Clone)]
pub struct FileLocator<'a> {
    layout: &'a LegacyLayout,
    legacy_hosts: &'a [String],
}

/// Sorted names of the files in `dir`. A missing directory has no files.
fn file_names(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::debug!(dir = %dir.display(), %error, "Unable to list legacy folder");
            return Vec::new();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Language of `{lang}_{rest}` file names, where `lang` is two lowercase letters.
fn language_prefix<'n>(file_name: &'n str, rest: &str) -> Option<&'n str> {
    let (lang, tail) = file_name.split_at_checked(2)?;
    let valid = lang.chars().all(|c| c.is_ascii_lowercase()) && tail.strip_prefix('_')? == rest;
    valid.then_some(lang)
}

/// Same as [`language_prefix`] for `.htm*` files.
fn html_language_prefix<'n>(file_name: &'n str, stem: &str) -> Option<&'n str> {
    let (lang, tail) = file_name.split_at_checked(2)?;
    let extension = tail.strip_prefix('_')?.strip_prefix(stem)?;
    let valid = lang.chars().all(|c| c.is_ascii_lowercase()) && extension.starts_with(".htm");
    valid.then_some(lang)
}

impl<'a> FileLocator<'a> {
    pub fn new(config: &'a MigrationConfig) -> Self {
        Self {
            layout: &config.layout,
            legacy_hosts: &config.legacy_hosts,
        }
    }

    fn folder(root: &Path, acron: &str, issue_folder: &str) -> PathBuf {
        root.join(acron).join(issue_folder)
    }

    /// Expected PDFs: the original language plus every translated language,
    /// and any other `{lang}_{name}.pdf` present on disk.
    pub fn pdf_paths(
        &self,
        acron: &str,
        issue_folder: &str,
        file_name: &str,
        language: Option<&str>,
        translated_languages: &[&str],
    ) -> BTreeMap<String, PathBuf> {
        let folder = Self::folder(&self.layout.pdf_root, acron, issue_folder);
        let original = language.unwrap_or(UNDETERMINED_LANGUAGE);

        let mut pdfs = BTreeMap::new();
        pdfs.insert(original.to_string(), folder.join(format!("{}.pdf", file_name)));
        for lang in translated_languages.iter().filter(|lang| **lang != original) {
            pdfs.insert(
                lang.to_string(),
                folder.join(format!("{}_{}.pdf", lang, file_name)),
            );
        }

        let translated_pdf = format!("{}.pdf", file_name);
        for name in file_names(&folder) {
            if let Some(lang) = language_prefix(&name, &translated_pdf) {
                if lang != original {
                    pdfs.entry(lang.to_string())
                        .or_insert_with(|| folder.join(&name));
                }
            }
        }
        pdfs
    }

    pub fn xml_path(&self, acron: &str, issue_folder: &str, file_name: &str) -> PathBuf {
        Self::folder(&self.layout.xml_root, acron, issue_folder).join(format!("{}.xml", file_name))
    }

    /// Translation front and back files present on disk, by language.
    pub fn translation_paths(
        &self,
        acron: &str,
        issue_folder: &str,
        file_name: &str,
    ) -> BTreeMap<String, TranslationPaths> {
        let folder = Self::folder(&self.layout.translation_root, acron, issue_folder);
        let back_stem = format!("b{}", file_name);

        let mut translations: BTreeMap<String, TranslationPaths> = BTreeMap::new();
        for name in file_names(&folder) {
            if let Some(lang) = html_language_prefix(&name, file_name) {
                translations
                    .entry(lang.to_string())
                    .or_default()
                    .front
                    .get_or_insert_with(|| folder.join(&name));
            } else if let Some(lang) = html_language_prefix(&name, &back_stem) {
                translations
                    .entry(lang.to_string())
                    .or_default()
                    .back
                    .get_or_insert_with(|| folder.join(&name));
            }
        }
        translations
    }

    /// Images whose name contains `file_name`, at any depth of the issue folder.
    pub fn image_paths(&self, acron: &str, issue_folder: &str, file_name: &str) -> Vec<PathBuf> {
        let folder = Self::folder(&self.layout.img_root, acron, issue_folder);
        let mut images: Vec<PathBuf> = WalkDir::new(&folder)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::debug!(dir = %folder.display(), %error, "Unable to walk images folder");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().contains(file_name))
            .map(|entry| entry.into_path())
            .collect();
        images.sort();
        images
    }

    /// Local path of an asset linked from a legacy HTML text.
    ///
    /// Root-relative links and absolute links to a legacy host resolve under
    /// the web root; links into `img/revistas` resolve from there whatever
    /// prefix they carry. Links to other hosts resolve to `None`.
    pub fn asset_path(&self, link: &str) -> Option<PathBuf> {
        let link = link.split(['?', '#']).next().unwrap_or(link).trim();
        let link = link
            .strip_prefix("//")
            .map(|rest| format!("http://{}", rest))
            .unwrap_or_else(|| link.to_string());

        let path = match link.split_once("://") {
            Some((scheme, rest)) => {
                if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
                    return None;
                }
                let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
                if !self
                    .legacy_hosts
                    .iter()
                    .any(|legacy| legacy.eq_ignore_ascii_case(host))
                {
                    return None;
                }
                path.to_string()
            }
            None => link,
        };

        let mut subdir = path.trim_start_matches('/');
        if let Some(pos) = subdir.find("img/revistas") {
            subdir = &subdir[pos..];
        }

        let mut resolved = self.layout.htdocs_root.clone();
        let mut depth = 0usize;
        for part in subdir.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if depth > 0 {
                        resolved.pop();
                        depth -= 1;
                    }
                }
                part => {
                    resolved.push(part);
                    depth += 1;
                }
            }
        }
        (depth > 0).then_some(resolved)
    }

    /// Every legacy file of `document`, a document of journal `acron`.
    pub fn locate(&self, document: &DocumentView<'_>, acron: &str) -> LocatedFiles {
        let issue_folder = document.issue_folder();
        let file_name = document.file_name();
        let translated = document.translated_languages();

        let mut located = LocatedFiles {
            pdfs: self.pdf_paths(
                acron,
                &issue_folder,
                file_name,
                document.language(),
                &translated,
            ),
            ..LocatedFiles::default()
        };
        match document.file_type() {
            FileType::Xml => {
                located.xml = Some(self.xml_path(acron, &issue_folder, file_name));
                located.images = self.image_paths(acron, &issue_folder, file_name);
            }
            FileType::Html => {
                located.translations = self.translation_paths(acron, &issue_folder, file_name);
            }
        }
        tracing::debug!(
            pid = document.id(),
            pdfs = located.pdfs.len(),
            translations = located.translations.len(),
            images = located.images.len(),
            "Located legacy files"
        );
        located
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isis::RawRecord;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"content").unwrap();
    }

    fn config(root: &Path) -> MigrationConfig {
        let mut config = MigrationConfig::new();
        config
            .set_layout(LegacyLayout::from_root(root))
            .add_legacy_host("www.example.org");
        config
    }

    #[test]
    fn test_pdf_paths() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let folder = config.layout.pdf_root.join("abc").join("v1n1");
        touch(&folder.join("a01.pdf"));
        touch(&folder.join("es_a01.pdf"));
        touch(&folder.join("es_a02.pdf"));

        let pdfs = FileLocator::new(&config).pdf_paths("abc", "v1n1", "a01", Some("en"), &["pt"]);
        assert_eq!(
            pdfs,
            BTreeMap::from([
                ("en".to_string(), folder.join("a01.pdf")),
                ("es".to_string(), folder.join("es_a01.pdf")),
                ("pt".to_string(), folder.join("pt_a01.pdf")),
            ])
        );
    }

    #[test]
    fn test_pdf_paths_without_language() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let pdfs = FileLocator::new(&config).pdf_paths("abc", "v1n1", "a01", None, &[]);
        assert_eq!(pdfs.keys().collect::<Vec<_>>(), vec![UNDETERMINED_LANGUAGE]);
    }

    #[test]
    fn test_translation_paths() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let folder = config.layout.translation_root.join("abc").join("v1n1");
        touch(&folder.join("en_a01.htm"));
        touch(&folder.join("en_ba01.htm"));
        touch(&folder.join("es_a01.html"));
        touch(&folder.join("en_a011.htm"));
        touch(&folder.join("a01.htm"));

        let translations = FileLocator::new(&config).translation_paths("abc", "v1n1", "a01");
        assert_eq!(
            translations,
            BTreeMap::from([
                (
                    "en".to_string(),
                    TranslationPaths {
                        front: Some(folder.join("en_a01.htm")),
                        back: Some(folder.join("en_ba01.htm")),
                    }
                ),
                (
                    "es".to_string(),
                    TranslationPaths {
                        front: Some(folder.join("es_a01.html")),
                        back: None,
                    }
                ),
            ])
        );
    }

    #[test]
    fn test_image_paths() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let folder = config.layout.img_root.join("abc").join("v1n1");
        touch(&folder.join("a01f1.gif"));
        touch(&folder.join("nested").join("a01f2.jpg"));
        touch(&folder.join("a02f1.gif"));

        let images = FileLocator::new(&config).image_paths("abc", "v1n1", "a01");
        assert_eq!(
            images,
            vec![folder.join("a01f1.gif"), folder.join("nested").join("a01f2.jpg")]
        );
        assert!(FileLocator::new(&config).image_paths("abc", "v9n9", "a01").is_empty());
    }

    #[rstest]
    #[case("/img/revistas/abc/v1n1/a01f1.gif", Some("img/revistas/abc/v1n1/a01f1.gif"))]
    #[case("http://www.example.org/img/revistas/abc/v1n1/a01f1.gif", Some("img/revistas/abc/v1n1/a01f1.gif"))]
    #[case("//www.example.org/img/revistas/abc/a.gif?x=1", Some("img/revistas/abc/a.gif"))]
    #[case("/scielo/img/revistas/abc/a.gif", Some("img/revistas/abc/a.gif"))]
    #[case("/img/../img/fbpe/a.gif", Some("img/fbpe/a.gif"))]
    #[case("http://other.org/img/revistas/abc/a.gif", None)]
    #[case("ftp://www.example.org/a.gif", None)]
    #[case("/", None)]
    fn test_asset_path(#[case] link: &str, #[case] expected: Option<&str>) {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let expected = expected.map(|subdir| config.layout.htdocs_root.join(subdir));
        assert_eq!(FileLocator::new(&config).asset_path(link), expected);
    }

    #[test]
    fn test_locate_xml_document() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let records = vec![
            RawRecord::from_fields([("v093", "20190101")]),
            RawRecord::from_fields([
                ("v880", "S0001-37142020000200005"),
                ("v031", "49"),
                ("v032", "2"),
                ("v040", "en"),
                ("v702", r"abc\v49n2\a05.xml"),
            ]),
        ];
        let document = DocumentView::new("S0001-37142020000200005", &records).unwrap();
        let image = config.layout.img_root.join("abc/v49n2/a05f1.jpg");
        touch(&image);

        let located = FileLocator::new(&config).locate(&document, "abc");
        assert_eq!(
            located.xml,
            Some(config.layout.xml_root.join("abc/v49n2/a05.xml"))
        );
        assert_eq!(located.images, vec![image]);
        assert!(located.translations.is_empty());
        assert_eq!(
            located.pdfs.get("en"),
            Some(&config.layout.pdf_root.join("abc/v49n2/a05.pdf"))
        );
    }
}
