//! Upload of the legacy files of one article.

use super::MigrationManager;
use crate::FileType;
use crate::error::{FileNotFoundError, MigrationError, Result};
use crate::locator::{
    FileLocator, TranslationPaths, UNDETERMINED_LANGUAGE, asset_links, build_translation_html_text,
};
use crate::store::{Annotation, MigrationItem, RemoteAndLocalFile, TranslationFiles};
use crate::tracker::Tracker;
use crate::utils::{file_name_of, read_text_file};
use crate::views::DocumentView;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Uploads the files of one article to a single storage folder.
///
/// Each local path is uploaded, and each problem reported, at most once.
/// Present files are remembered for the archive.
struct Uploads<'m> {
    manager: &'m MigrationManager,
    folder: String,
    uploaded: HashMap<PathBuf, Option<String>>,
    present: Vec<PathBuf>,
}

impl<'m> Uploads<'m> {
    fn new(manager: &'m MigrationManager, folder: String) -> Self {
        Self {
            manager,
            folder,
            uploaded: HashMap::new(),
            present: Vec::new(),
        }
    }

    /// URI of `path` in object storage, or `None` when it could not be
    /// uploaded.
    fn upload(&mut self, path: &Path, tracker: &mut Tracker) -> Option<String> {
        if let Some(uri) = self.uploaded.get(path) {
            return uri.clone();
        }
        let uri = if path.is_file() {
            self.present.push(path.to_path_buf());
            tracker.info(format!("migrate {}", path.display()));
            match self
                .manager
                .storage
                .register(path, &self.folder, &file_name_of(path))
            {
                Ok(uri) => Some(uri),
                Err(error) => {
                    tracker.error(error.to_string());
                    None
                }
            }
        } else {
            tracker.error(FileNotFoundError::new(path).to_string());
            None
        };
        self.uploaded.insert(path.to_path_buf(), uri.clone());
        uri
    }

    fn upload_file(&mut self, path: &Path, tracker: &mut Tracker) -> Option<RemoteAndLocalFile> {
        let uri = self.upload(path, tracker)?;
        Some(RemoteAndLocalFile::new(file_name_of(path), uri))
    }
}

/// Packs `paths` flat into `target`. Later files with an already packed
/// basename are left out. Returns the packed basenames.
fn write_zip(target: &Path, paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut zip = zip::ZipWriter::new(BufWriter::new(File::create(target)?));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut names: Vec<String> = Vec::new();
    for path in paths {
        let name = file_name_of(path);
        if names.contains(&name) {
            continue;
        }
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&std::fs::read(path)?)?;
        names.push(name);
    }
    zip.finish()?.flush()?;
    Ok(names)
}

impl MigrationManager {
    /// HTML text of each language of an HTML article.
    ///
    /// The original language comes from the paragraph records. Translations
    /// are their front file, the references of the original and their back
    /// file. Unreadable translation files are reported and left out.
    pub(crate) fn html_texts(
        &self,
        document: &DocumentView<'_>,
        translations: &BTreeMap<String, TranslationPaths>,
        tracker: &mut Tracker,
    ) -> BTreeMap<String, String> {
        let mut texts = BTreeMap::new();
        let lang = document.language().unwrap_or(UNDETERMINED_LANGUAGE);
        texts.insert(lang.to_string(), document.html_body());

        let references = document.paragraphs().references();
        for (lang, paths) in translations {
            let mut read = |path: &Option<PathBuf>| -> String {
                let Some(path) = path else {
                    return String::new();
                };
                read_text_file(path).unwrap_or_else(|error| {
                    tracker.error(format!("Unable to read {}: {}", path.display(), error));
                    String::new()
                })
            };
            let front = read(&paths.front);
            let back = read(&paths.back);
            texts.insert(
                lang.clone(),
                build_translation_html_text(&front, &references, &back),
            );
        }
        texts
    }

    /// Uploads the assets linked from the HTML texts of an HTML article.
    fn migrate_html_assets(
        &self,
        item: &mut MigrationItem,
        texts: &BTreeMap<String, String>,
        uploads: &mut Uploads<'_>,
        tracker: &mut Tracker,
    ) {
        let locator = FileLocator::new(&self.config);
        for (lang, text) in texts {
            if text.trim().is_empty() {
                tracker.info(format!("no HTML text for {}", lang));
                continue;
            }
            for link in asset_links(text) {
                let Some(path) = locator.asset_path(&link.link) else {
                    continue;
                };
                let name = file_name_of(&path);
                if !item.assets.contains(&name) {
                    item.assets.push(name.clone());
                }
                let Some(uri) = uploads.upload(&path, tracker) else {
                    continue;
                };
                let asset = RemoteAndLocalFile::new(name, uri).with_annotation(Annotation::Asset {
                    original: link.link,
                    elem: link.elem,
                    attr: link.attr,
                    lang: lang.clone(),
                });
                if !item.asset_files.contains(&asset) {
                    item.asset_files.push(asset);
                }
            }
        }
    }

    /// Packs every present file of the article and uploads the archive.
    fn migrate_zipfile(
        &self,
        item: &mut MigrationItem,
        uploads: &Uploads<'_>,
        tracker: &mut Tracker,
    ) {
        if uploads.present.is_empty() {
            tracker.info("no files to zip");
            return;
        }
        let zip_name = format!("{}.zip", item.file_name);
        let packed = tempfile::tempdir()
            .map_err(MigrationError::from)
            .and_then(|dir| {
                let target = dir.path().join(&zip_name);
                let files = write_zip(&target, &uploads.present)?;
                let uri = self
                    .storage
                    .register(&target, &uploads.folder, &zip_name)?;
                Ok((files, uri))
            });
        match packed {
            Ok((files, uri)) => {
                item.zipfile = Some(
                    RemoteAndLocalFile::new(zip_name, uri)
                        .with_annotation(Annotation::Archive { files }),
                );
            }
            Err(error) => {
                tracker.error(format!("Unable to zip {}: {}", zip_name, error));
                item.zipfile = None;
            }
        }
    }

    /// Uploads the PDFs, XML, translations and assets of article `id`, packs
    /// them into a zip archive and records what reached object storage.
    ///
    /// Missing files and failed uploads are recorded in the tracker and leave
    /// their entry "not migrated".
    ///
    /// # Errors
    ///
    /// `NotRegistered` for unknown articles, `MissingAcronym` when the article
    /// was never fully registered.
    pub fn migrate_document_files(&self, id: &str) -> Result<(MigrationItem, Tracker)> {
        let mut tracker = Tracker::new("migrate_document_files");
        let mut item = self.load_document(id)?;
        let acron = item
            .acron
            .clone()
            .ok_or_else(|| MigrationError::MissingAcronym(id.to_string()))?;
        let records = std::mem::take(&mut item.records);
        let document = DocumentView::new(id, &records)?;

        let located = FileLocator::new(&self.config).locate(&document, &acron);
        let folder = self.config.migration_folder_for(
            item.journal_pid(),
            &item.issue_folder,
            &item.file_name,
        );
        let mut uploads = Uploads::new(self, folder);

        item.pdfs = located
            .pdfs
            .iter()
            .map(|(lang, path)| (lang.clone(), file_name_of(path)))
            .collect();
        item.pdf_files = located
            .pdfs
            .values()
            .filter_map(|path| uploads.upload_file(path, &mut tracker))
            .collect();

        item.assets.clear();
        item.asset_files.clear();
        match item.file_type {
            FileType::Xml => {
                item.xml_files = located
                    .xml
                    .iter()
                    .filter_map(|path| uploads.upload_file(path, &mut tracker))
                    .collect();
                item.assets = located.images.iter().map(|path| file_name_of(path)).collect();
                item.asset_files = located
                    .images
                    .iter()
                    .filter_map(|path| uploads.upload_file(path, &mut tracker))
                    .collect();
            }
            FileType::Html => {
                item.translations = located
                    .translations
                    .iter()
                    .map(|(lang, paths)| {
                        let names = TranslationFiles {
                            front: paths.front.as_deref().map(file_name_of),
                            back: paths.back.as_deref().map(file_name_of),
                        };
                        (lang.clone(), names)
                    })
                    .collect();
                item.html_files = located
                    .translations
                    .values()
                    .flat_map(TranslationPaths::paths)
                    .filter_map(|path| uploads.upload_file(path, &mut tracker))
                    .collect();

                let texts = self.html_texts(&document, &located.translations, &mut tracker);
                self.migrate_html_assets(&mut item, &texts, &mut uploads, &mut tracker);
            }
        }

        self.migrate_zipfile(&mut item, &uploads, &mut tracker);
        item.records = records;
        Ok((self.store.save_document(item)?, tracker))
    }
}
