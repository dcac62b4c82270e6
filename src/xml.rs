//! Article XML preparation for publication.
//!
//! The legacy XML is streamed through unchanged except for:
//!
//! - the `scielo-v3`, `scielo-v2` and `previous-pid` article ids, written as
//!   the first children of `<article-meta>` (replacing any existing ones)
//! - `xlink:href` values naming a migrated asset, which point at its URI
//!
//! The languages of the main article and its translations are collected on
//! the way.

use crate::error::XmlError;
use crate::store::RemoteAndLocalFile;
use crate::utils::{link_basename, split_basename};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashMap;

const ARTICLE_ID: &[u8] = b"article-id";
const SPECIFIC_USE: &[u8] = b"specific-use";
const XLINK_HREF: &[u8] = b"xlink:href";
const XML_LANG: &[u8] = b"xml:lang";

const SCIELO_V3: &str = "scielo-v3";
const SCIELO_V2: &str = "scielo-v2";
const PREVIOUS_PID: &str = "previous-pid";

/// Identifiers written into `<article-meta>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleIds<'a> {
    pub v3: &'a str,
    pub v2: Option<&'a str>,
    /// Ahead of print pid, published as `previous-pid`
    pub aop: Option<&'a str>,
}

impl ArticleIds<'_> {
    fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (SCIELO_V3, Some(self.v3)),
            (SCIELO_V2, self.v2),
            (PREVIOUS_PID, self.aop),
        ]
        .into_iter()
        .filter_map(|(kind, value)| Some((kind, value.filter(|v| !v.is_empty())?)))
    }
}

/// XML ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedXml {
    pub content: String,
    /// Main language first, then translations, without repetitions
    pub languages: Vec<String>,
}

/// Migrated asset URIs by file name and by file name without extension.
struct AssetUris<'a> {
    by_name: HashMap<&'a str, &'a str>,
    by_stem: HashMap<&'a str, &'a str>,
}

impl<'a> AssetUris<'a> {
    fn new(assets: &'a [RemoteAndLocalFile]) -> Self {
        let mut by_name = HashMap::new();
        let mut by_stem = HashMap::new();
        for asset in assets {
            let Some(uri) = asset.uri.as_deref() else {
                continue;
            };
            by_name.insert(asset.name.as_str(), uri);
            by_stem.entry(split_basename(&asset.name).0).or_insert(uri);
        }
        Self { by_name, by_stem }
    }

    fn get(&self, href: &str) -> Option<&'a str> {
        let name = link_basename(href);
        self.by_name.get(name).copied().or_else(|| {
            let (stem, extension) = split_basename(name);
            if extension.is_empty() {
                self.by_stem.get(stem).copied()
            } else {
                None
            }
        })
    }
}

fn attribute_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, XmlError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Copy of `element` with migrated `xlink:href` values, or `None` if nothing changes.
fn rewrite_hrefs(
    element: &BytesStart<'_>,
    uris: &AssetUris<'_>,
) -> Result<Option<BytesStart<'static>>, XmlError> {
    let Some(uri) = attribute_value(element, XLINK_HREF)?.and_then(|href| uris.get(&href)) else {
        return Ok(None);
    };
    let mut rewritten = element.to_owned();
    rewritten.clear_attributes();
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == XLINK_HREF {
            rewritten.push_attribute((XLINK_HREF, escape(uri).as_bytes()));
        } else {
            rewritten.push_attribute((attr.key.as_ref(), attr.value.as_ref()));
        }
    }
    Ok(Some(rewritten))
}

fn is_managed_article_id(element: &BytesStart<'_>) -> Result<bool, XmlError> {
    if element.name().as_ref() != ARTICLE_ID {
        return Ok(false);
    }
    Ok(matches!(
        attribute_value(element, SPECIFIC_USE)?.as_deref(),
        Some(SCIELO_V3 | SCIELO_V2 | PREVIOUS_PID)
    ))
}

fn collect_language(
    element: &BytesStart<'_>,
    languages: &mut Vec<String>,
) -> Result<(), XmlError> {
    let name = element.name();
    let is_translation = name.as_ref() == b"sub-article"
        && attribute_value(element, b"article-type")?.as_deref() == Some("translation");
    if name.as_ref() == b"article" || is_translation {
        if let Some(lang) = attribute_value(element, XML_LANG)? {
            if !languages.contains(&lang) {
                languages.push(lang);
            }
        }
    }
    Ok(())
}

fn write_article_ids<W: std::io::Write>(
    writer: &mut Writer<W>,
    ids: &ArticleIds<'_>,
) -> Result<(), XmlError> {
    for (specific_use, value) in ids.entries() {
        let mut start = BytesStart::new("article-id");
        start.push_attribute(("pub-id-type", "publisher-id"));
        start.push_attribute(("specific-use", specific_use));
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new("article-id")))?;
    }
    Ok(())
}

/// Prepares a legacy article XML for publication.
///
/// # Errors
///
/// Returns `XmlError` when the XML is malformed or has no `<article-meta>`.
pub fn prepare_for_publication(
    xml: &str,
    ids: &ArticleIds<'_>,
    assets: &[RemoteAndLocalFile],
) -> Result<PreparedXml, XmlError> {
    let uris = AssetUris::new(assets);
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut languages = Vec::new();
    let mut has_article_meta = false;
    let mut skipping_article_id = false;

    loop {
        let event = reader.read_event()?;
        if skipping_article_id {
            if let Event::End(ref end) = event {
                skipping_article_id = end.name().as_ref() != ARTICLE_ID;
            }
            continue;
        }
        match event {
            Event::Eof => break,
            Event::Start(ref element) => {
                collect_language(element, &mut languages)?;
                if is_managed_article_id(element)? {
                    skipping_article_id = true;
                    continue;
                }
                match rewrite_hrefs(element, &uris)? {
                    Some(rewritten) => writer.write_event(Event::Start(rewritten))?,
                    None => writer.write_event(event.borrow())?,
                }
                if element.name().as_ref() == b"article-meta" && !has_article_meta {
                    has_article_meta = true;
                    write_article_ids(&mut writer, ids)?;
                }
            }
            Event::Empty(ref element) => {
                collect_language(element, &mut languages)?;
                if is_managed_article_id(element)? {
                    continue;
                }
                match rewrite_hrefs(element, &uris)? {
                    Some(rewritten) => writer.write_event(Event::Empty(rewritten))?,
                    None => writer.write_event(event.borrow())?,
                }
            }
            other => writer.write_event(other)?,
        }
    }

    if !has_article_meta {
        return Err(XmlError::MissingArticleMeta);
    }
    Ok(PreparedXml {
        content: String::from_utf8(writer.into_inner())?,
        languages,
    })
}
