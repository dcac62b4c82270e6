//! Asset discovery and link rewriting in legacy full-text HTML.
//!
//! Assets are discovered on the parsed document. Rewriting works on the
//! source text, touching only `src` and `href` values, so the rest of the
//! legacy markup is published byte for byte.

use crate::regex::{Captures, Regex};
use crate::store::{Annotation, RemoteAndLocalFile};
use crate::utils::link_basename;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Root-relative prefix of legacy journal images.
pub const LEGACY_IMAGES_PATH: &str = "/img/revistas";

static ASSET_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[src], embed[src], source[src], input[src], a[href]").unwrap()
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

static START_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z][A-Za-z0-9]*)(?:\s[^>]*)?>").unwrap());

static LINK_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s)(src|href)(\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// A link to an asset found in an HTML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLink {
    /// Element name, lowercase
    pub elem: String,
    /// `src` or `href`
    pub attr: String,
    /// Link as written in the markup
    pub link: String,
}

fn is_asset_candidate(elem: &str, link: &str) -> bool {
    if link.is_empty() || link.starts_with('#') {
        return false;
    }
    if let Some((scheme, _)) = link.split_once(':') {
        let web = scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https");
        if !web && scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return false;
        }
    }
    elem != "a" || link.contains("img/revistas")
}

/// Embedded images and linked legacy images, in document order, without
/// repetitions.
///
/// Anchors only count when they point under `img/revistas`. Links with a
/// scheme other than http(s) are ignored.
pub fn asset_links(html: &str) -> Vec<AssetLink> {
    let document = Html::parse_document(html);
    let mut links: Vec<AssetLink> = Vec::new();
    for element in document.select(&ASSET_SELECTOR) {
        let elem = element.value().name();
        let attr = if elem == "a" { "href" } else { "src" };
        let Some(link) = element.value().attr(attr).map(str::trim) else {
            continue;
        };
        if !is_asset_candidate(elem, link) {
            continue;
        }
        let asset = AssetLink {
            elem: elem.to_string(),
            attr: attr.to_string(),
            link: link.to_string(),
        };
        if !links.contains(&asset) {
            links.push(asset);
        }
    }
    links
}

/// Rewrites `src`/`href` values for which `replace(elem, attr, link)` returns
/// a new link. Values are rewritten double-quoted.
fn rewrite_links<F>(html: &str, replace: F) -> String
where
    F: Fn(&str, &str, &str) -> Option<String>,
{
    START_TAG
        .replace_all(html, |tag: &Captures| {
            let elem = tag[1].to_lowercase();
            LINK_ATTRIBUTE
                .replace_all(&tag[0], |attr: &Captures| {
                    let name = attr[2].to_lowercase();
                    let link = attr
                        .get(4)
                        .or_else(|| attr.get(5))
                        .or_else(|| attr.get(6))
                        .map_or("", |m| m.as_str());
                    match replace(&elem, &name, link) {
                        Some(new_link) => {
                            format!("{}{}{}\"{}\"", &attr[1], &attr[2], &attr[3], new_link)
                        }
                        None => attr[0].to_string(),
                    }
                })
                .into_owned()
        })
        .into_owned()
}

/// Points every link whose basename is a migrated file at the file's URI.
pub fn change_images_location(html: &str, files: &[RemoteAndLocalFile]) -> String {
    let uris: HashMap<&str, &str> = files
        .iter()
        .filter_map(|file| Some((file.name.as_str(), file.uri.as_deref()?)))
        .collect();
    rewrite_links(html, |_, _, link| {
        uris.get(link_basename(link)).map(|uri| uri.to_string())
    })
}

/// Adapts a legacy HTML text for the destination website.
///
/// Links recorded in the asset annotations (same element, attribute and
/// original link) point at the migrated URIs. Remaining `/img/revistas` links
/// are made absolute against `website_url`.
pub fn adapt_html_text_to_website(
    html: &str,
    assets: &[RemoteAndLocalFile],
    website_url: &str,
) -> String {
    let replacements: Vec<(&str, &str, &str, &str)> = assets
        .iter()
        .filter_map(|asset| match (&asset.annotation, asset.uri.as_deref()) {
            (
                Some(Annotation::Asset {
                    original,
                    elem,
                    attr,
                    ..
                }),
                Some(uri),
            ) => Some((elem.as_str(), attr.as_str(), original.as_str(), uri)),
            _ => None,
        })
        .collect();
    let website_url = website_url.trim_end_matches('/');

    rewrite_links(html, |elem, attr, link| {
        let migrated = replacements
            .iter()
            .find(|(e, a, original, _)| *e == elem && *a == attr && *original == link);
        if let Some((_, _, _, uri)) = migrated {
            return Some(uri.to_string());
        }
        (!website_url.is_empty() && link.starts_with(LEGACY_IMAGES_PATH))
            .then(|| format!("{}{}", website_url, link))
    })
}

fn body_html(text: &str) -> String {
    let document = Html::parse_document(text);
    document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_else(|| text.to_string())
}

/// Full text of a translation: the front body, the references of the
/// original text and the back body.
pub fn build_translation_html_text(front: &str, references: &str, back: &str) -> String {
    [body_html(front), references.to_string(), body_html(back)]
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn migrated(name: &str) -> RemoteAndLocalFile {
        RemoteAndLocalFile::new(name, format!("https://minio.example.org/{}", name))
    }

    #[rstest]
    #[case(r#"<img src="abc.jpg">"#, r#"<img src="https://minio.example.org/abc.jpg">"#)]
    #[case(
        r#"<img src="/img/revistas/abcd/v1n1/abc.jpg">"#,
        r#"<img src="https://minio.example.org/abc.jpg">"#
    )]
    #[case(
        r#"<img src='http://www.example.org/img/revistas/abcd/v1n1/abc.jpg' alt="x">"#,
        r#"<img src="https://minio.example.org/abc.jpg" alt="x">"#
    )]
    #[case(r#"<img src="/img/revistas/abcd/v1n1/other.png">"#, r#"<img src="/img/revistas/abcd/v1n1/other.png">"#)]
    #[case(r#"<img data-src="abc.jpg">"#, r#"<img data-src="abc.jpg">"#)]
    fn test_change_images_location(#[case] html: &str, #[case] expected: &str) {
        let files = vec![migrated("abc.jpg")];
        assert_eq!(change_images_location(html, &files), expected);
    }

    #[test]
    fn test_change_images_location_keeps_text() {
        let html = "<p>See <b>figure</b> 1 &amp; 2</p>\n<img src=\"/img/revistas/a/v1n1/abc_f01.png\">";
        let files = vec![migrated("abc_f01.png")];
        assert_eq!(
            change_images_location(html, &files),
            "<p>See <b>figure</b> 1 &amp; 2</p>\n<img src=\"https://minio.example.org/abc_f01.png\">"
        );
    }

    #[test]
    fn test_asset_links() {
        let html = r##"<html><body>
            <img src="/img/revistas/abc/v1n1/a01f1.gif">
            <a href="/img/revistas/abc/v1n1/a01f1.jpg">larger</a>
            <a href="#top">top</a>
            <a href="/scielo.php?script=sci_arttext">other article</a>
            <a href="mailto:editor@example.org">mail</a>
            <img src="/img/revistas/abc/v1n1/a01f1.gif">
            <img src="data:image/png;base64,AAAA">
        </body></html>"##;

        assert_eq!(
            asset_links(html),
            vec![
                AssetLink {
                    elem: "img".to_string(),
                    attr: "src".to_string(),
                    link: "/img/revistas/abc/v1n1/a01f1.gif".to_string(),
                },
                AssetLink {
                    elem: "a".to_string(),
                    attr: "href".to_string(),
                    link: "/img/revistas/abc/v1n1/a01f1.jpg".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_adapt_html_text_to_website() {
        let html = concat!(
            r#"<img src="/img/revistas/abc/v1n1/a01f1.gif">"#,
            r#"<a href="/img/revistas/abc/v1n1/a01f1.gif">zoom</a>"#,
            r#"<img src="/img/revistas/abc/v1n1/logo.gif">"#,
        );
        let asset = migrated("a01f1.gif").with_annotation(Annotation::Asset {
            original: "/img/revistas/abc/v1n1/a01f1.gif".to_string(),
            elem: "img".to_string(),
            attr: "src".to_string(),
            lang: "en".to_string(),
        });

        assert_eq!(
            adapt_html_text_to_website(html, &[asset], "https://www.example.org/"),
            concat!(
                r#"<img src="https://minio.example.org/a01f1.gif">"#,
                r#"<a href="https://www.example.org/img/revistas/abc/v1n1/a01f1.gif">zoom</a>"#,
                r#"<img src="https://www.example.org/img/revistas/abc/v1n1/logo.gif">"#,
            )
        );
    }

    #[test]
    fn test_build_translation_html_text() {
        let front = "<html><body><p>Introduction</p></body></html>";
        let back = "<html><body><p>Notes</p></body></html>";
        assert_eq!(
            build_translation_html_text(front, "<p>1. Ref</p>", back),
            "<p>Introduction</p>\n<p>1. Ref</p>\n<p>Notes</p>"
        );
        assert_eq!(build_translation_html_text("<p>Only</p>", "", ""), "<p>Only</p>");
    }
}
