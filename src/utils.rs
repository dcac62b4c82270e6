use crate::regex::Regex;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

static REPEATED_SLASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/{2,}").unwrap());

/// Control characters produced when a Windows path was written through an
/// escaping layer, paired with the `/x` sequence they replaced.
const ESCAPED_PATH_SEQUENCES: &[(char, &str)] = &[
    ('\x08', "/b"),
    ('\x07', "/a"),
    ('\x0c', "/f"),
    ('\n', "/n"),
    ('\r', "/r"),
    ('\t', "/t"),
    ('\x0b', "/v"),
];

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Reads a legacy ISO-8859-1 text file.
pub fn read_latin1_file(path: &Path) -> io::Result<String> {
    std::fs::read(path).map(|bytes| decode_latin1(&bytes))
}

/// Reads a text file as UTF-8, falling back to ISO-8859-1 for legacy files.
pub fn read_text_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => decode_latin1(err.as_bytes()),
    })
}

/// Strips leading zeros from a numeric string ("049" → "49").
///
/// Non-numeric input is returned unchanged, so "spe1" or "ahead" survive.
pub fn remove_leading_zeros(value: &str) -> String {
    value
        .trim()
        .parse::<u64>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Left-pads `value` with zeros up to `width` characters.
pub fn zfill(value: &str, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// Normalizes a legacy Windows path to forward slashes.
///
/// Sequences such as `\b` or `\n` that were turned into control characters
/// upstream are restored to `/b`, `/n`. Escapes of `o`, `x`, `N`, `u` and `U`
/// cannot be recovered this way.
pub fn fix_windows_path(windows_path: &str) -> String {
    let mut path = windows_path.replace('\\', "/");
    for (ch, correction) in ESCAPED_PATH_SEQUENCES {
        if path.contains(*ch) {
            path = path.replace(*ch, correction);
        }
    }
    let path = REPEATED_SLASHES.replace_all(&path, "/");
    path.trim_start_matches("./").to_string()
}

/// Splits the basename of a `/`-separated path into stem and extension.
///
/// The extension keeps its leading dot (".xml"), or is empty.
pub fn split_basename(path: &str) -> (&str, &str) {
    let basename = path.rsplit('/').next().unwrap_or(path);
    match basename.rfind('.') {
        Some(0) | None => (basename, ""),
        Some(pos) => (&basename[..pos], &basename[pos..]),
    }
}

/// Returns the last path segment of a link, ignoring query and fragment.
pub fn link_basename(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the basename of a local path as an owned string.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Builds the destination-site identifier of an issue.
///
/// `{issn}-{year}-v{volume}-n{number}-s{suppl}` with empty components
/// omitted, or `{issn}-aop` when there is no volume, number or supplement.
pub fn bundle_id(
    issn: &str,
    year: &str,
    volume: Option<&str>,
    number: Option<&str>,
    supplement: Option<&str>,
) -> String {
    let label = [("v", volume), ("n", number), ("s", supplement)]
        .iter()
        .filter_map(|(prefix, value)| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| format!("{}{}", prefix, v))
        })
        .collect::<Vec<_>>()
        .join("-");
    if label.is_empty() {
        format!("{}-aop", issn)
    } else {
        format!("{}-{}-{}", issn, year, label)
    }
}

/// Converts a legacy `YYYYMMDD` date into a calendar date.
pub fn parse_isis_date(value: &str) -> Option<chrono::NaiveDate> {
    let digits = value.get(..8)?;
    chrono::NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("049", "49")]
    #[case("2", "2")]
    #[case("0", "0")]
    #[case("spe", "spe")]
    #[case("ahead", "ahead")]
    #[case("", "")]
    fn test_remove_leading_zeros(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(remove_leading_zeros(input), expected);
    }

    #[test]
    fn test_zfill() {
        assert_eq!(zfill("1", 5), "00001");
        assert_eq!(zfill("123456", 5), "123456");
        assert_eq!(zfill("", 4), "0000");
    }

    #[rstest]
    #[case(r"abc\v1n1\a01.htm", "abc/v1n1/a01.htm")]
    #[case("abc\\v1n1\\\x08a01.htm", "abc/v1n1/ba01.htm")]
    #[case("abc//v1n1/a01.xml", "abc/v1n1/a01.xml")]
    #[case("abc\\v1n1\tab.htm", "abc/v1n1/tab.htm")]
    fn test_fix_windows_path(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(fix_windows_path(input), expected);
    }

    #[test]
    fn test_split_basename() {
        assert_eq!(split_basename("abc/v1n1/a01.htm"), ("a01", ".htm"));
        assert_eq!(split_basename("a01.tar.xml"), ("a01.tar", ".xml"));
        assert_eq!(split_basename("abc/v1n1/a01"), ("a01", ""));
        assert_eq!(split_basename(".hidden"), (".hidden", ""));
    }

    #[test]
    fn test_link_basename() {
        assert_eq!(link_basename("/img/revistas/abc/v1n1/a01f1.gif"), "a01f1.gif");
        assert_eq!(link_basename("a01f1.gif?x=1#top"), "a01f1.gif");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_latin1(&[0x74, 0xed, 0x74, 0x75, 0x6c, 0x6f]), "título");
    }

    #[rstest]
    #[case(Some("1"), Some("2"), None, "1234-5678-2020-v1-n2")]
    #[case(Some("1"), None, Some("1"), "1234-5678-2020-v1-s1")]
    #[case(None, None, None, "1234-5678-aop")]
    fn test_bundle_id(
        #[case] volume: Option<&str>,
        #[case] number: Option<&str>,
        #[case] supplement: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            bundle_id("1234-5678", "2020", volume, number, supplement),
            expected
        );
    }

    #[test]
    fn test_parse_isis_date() {
        assert_eq!(
            parse_isis_date("20190319"),
            chrono::NaiveDate::from_ymd_opt(2019, 3, 19)
        );
        assert_eq!(parse_isis_date("2019"), None);
        assert_eq!(parse_isis_date("20191399"), None);
    }
}
