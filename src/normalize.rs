//! Text normalization for noisy bibliographic strings.
//!
//! Titles, venues and author lists scraped from Google Scholar and DBLP carry HTML
//! entities, UTF-8 text that was decoded as Windows-1252 somewhere upstream, and
//! assorted punctuation. Everything here is a pure function of its input and
//! idempotent: normalizing an already normalized string returns it unchanged.

use crate::records::{parse_year, CleanRecord, RawRecord};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::{Captures, Regex};
use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,7});")
        .expect("entity regex")
});
static TITLE_PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("punct regex"));
static AUTHOR_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s,\-]").expect("author punct regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Named HTML entities seen in the source exports.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{a0}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("hellip", "\u{2026}"),
    ("aacute", "á"),
    ("eacute", "é"),
    ("iacute", "í"),
    ("oacute", "ó"),
    ("uacute", "ú"),
    ("agrave", "à"),
    ("egrave", "è"),
    ("auml", "ä"),
    ("euml", "ë"),
    ("ouml", "ö"),
    ("uuml", "ü"),
    ("Auml", "Ä"),
    ("Ouml", "Ö"),
    ("Uuml", "Ü"),
    ("ntilde", "ñ"),
    ("ccedil", "ç"),
    ("szlig", "ß"),
    ("oslash", "ø"),
    ("aring", "å"),
];

/// Literal garbled sequences left behind when whole-string repair is not possible.
///
/// Applied in order, so longer sequences come before their prefixes.
const GARBLED_REPLACEMENTS: &[(&str, &str)] = &[
    ("\u{e2}\u{20ac}\u{201d}", " - "),
    ("\u{e2}\u{20ac}\u{201c}", " - "),
    ("\u{e2}\u{20ac}\u{2122}", "'"),
    ("\u{e2}\u{20ac}\u{2dc}", "'"),
    ("\u{e2}\u{20ac}\u{153}", "\""),
    ("\u{e2}\u{20ac}\u{9d}", "\""),
    ("\u{e2}\u{20ac}\u{a6}", "..."),
    ("\u{c3}\u{a9}", "é"),
    ("\u{c3}\u{a8}", "è"),
    ("\u{c3}\u{a1}", "á"),
    ("\u{c3}\u{ad}", "í"),
    ("\u{c3}\u{b3}", "ó"),
    ("\u{c3}\u{ba}", "ú"),
    ("\u{c3}\u{a4}", "ä"),
    ("\u{c3}\u{b6}", "ö"),
    ("\u{c3}\u{bc}", "ü"),
    ("\u{c3}\u{b1}", "ñ"),
    ("\u{c3}\u{a7}", "ç"),
    ("\u{c2}\u{a0}", " "),
    ("\u{fffd}", ""),
];

/// Windows-1252 code points 0x80..=0x9F that differ from Latin-1.
const CP1252_HIGH: &[(char, u8)] = &[
    ('\u{20ac}', 0x80),
    ('\u{201a}', 0x82),
    ('\u{192}', 0x83),
    ('\u{201e}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{2c6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{160}', 0x8a),
    ('\u{2039}', 0x8b),
    ('\u{152}', 0x8c),
    ('\u{17d}', 0x8e),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201c}', 0x93),
    ('\u{201d}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{2dc}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{161}', 0x9a),
    ('\u{203a}', 0x9b),
    ('\u{153}', 0x9c),
    ('\u{17e}', 0x9e),
    ('\u{178}', 0x9f),
];

/// Normalize a title or venue string.
///
/// Missing or blank input yields an empty string.
pub fn normalize_title_or_venue(raw: Option<&str>) -> String {
    let Some(text) = raw else {
        return String::new();
    };
    let text = canonical_lowercase(text);
    let text = TITLE_PUNCT_RE.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Normalize an author list. Commas and hyphens survive punctuation stripping.
pub fn normalize_authors(raw: Option<&str>) -> String {
    let Some(text) = raw else {
        return String::new();
    };
    let text = canonical_lowercase(text);
    let text = AUTHOR_PUNCT_RE.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Shared front half of both pipelines: decode, repair, replace, NFKC, lowercase.
///
/// Lowercasing can leave text outside NFKC (e.g. `"\u{1fbc}\u{301}"` lowercases to an
/// iota subscript that recomposes), so the result is recomposed once more.
fn canonical_lowercase(text: &str) -> String {
    let decoded = decode_html_entities(text);
    let repaired = repair_mojibake(&decoded);
    let replaced = replace_garbled(&repaired);
    replaced.nfkc().collect::<String>().to_lowercase().nfkc().collect()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Decode named and numeric HTML entities. Unknown entities are left as-is.
pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    ENTITY_RE.replace_all(text, |caps: &Captures| {
        let body = &caps[1];
        let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).map(String::from)
        } else if let Some(dec) = body.strip_prefix('#') {
            dec.parse::<u32>().ok().and_then(char::from_u32).map(String::from)
        } else {
            NAMED_ENTITIES
                .iter()
                .find(|(name, _)| *name == body)
                .map(|(_, value)| (*value).to_string())
        };
        decoded.unwrap_or_else(|| caps[0].to_string())
    })
}

/// Undo UTF-8 text that was decoded as Windows-1252 (e.g. `"Ã©"` back to `"é"`).
///
/// Only attempted when a tell-tale lead sequence is present. The whole string is
/// re-encoded to single bytes and decoded as UTF-8; if either step fails the input
/// is returned untouched.
pub fn repair_mojibake(text: &str) -> Cow<'_, str> {
    let suspicious =
        text.contains('\u{c3}') || text.contains('\u{c2}') || text.contains("\u{e2}\u{20ac}");
    if !suspicious {
        return Cow::Borrowed(text);
    }

    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match cp1252_byte(c) {
            Some(b) => bytes.push(b),
            None => return Cow::Borrowed(text),
        }
    }

    match String::from_utf8(bytes) {
        Ok(repaired) => Cow::Owned(repaired),
        Err(_) => Cow::Borrowed(text),
    }
}

fn cp1252_byte(c: char) -> Option<u8> {
    let code = c as u32;
    if code < 0x80 || (0xa0..=0xff).contains(&code) {
        return Some(code as u8);
    }
    CP1252_HIGH
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, b)| *b)
        // C1 controls pass through as their Latin-1 byte
        .or_else(|| (0x80..0xa0).contains(&code).then_some(code as u8))
}

fn replace_garbled(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for (garbled, fixed) in GARBLED_REPLACEMENTS {
        if out.contains(garbled) {
            out = Cow::Owned(out.replace(garbled, fixed));
        }
    }
    out
}

/// Normalize one raw row into a [`CleanRecord`].
pub fn normalize_record(raw: &RawRecord) -> CleanRecord {
    CleanRecord {
        id: raw.id.clone(),
        year: parse_year(raw.year.as_deref()),
        title: normalize_title_or_venue(raw.title.as_deref()),
        venue: normalize_title_or_venue(raw.venue.as_deref()),
        authors: normalize_authors(raw.authors.as_deref()),
    }
}

/// Normalize a whole source table, preserving row order.
pub fn normalize_records(raw: &[RawRecord]) -> Vec<CleanRecord> {
    raw.par_iter().map(normalize_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(s: &str) -> String {
        normalize_title_or_venue(Some(s))
    }

    #[test]
    fn test_missing_and_blank() {
        assert_eq!(normalize_title_or_venue(None), "");
        assert_eq!(normalize_authors(None), "");
        assert_eq!(title("   \t "), "");
    }

    #[test]
    fn test_title_pipeline() {
        assert_eq!(
            title("  Efficient   Query-Processing: A Survey! "),
            "efficient query processing a survey"
        );
        assert_eq!(title("Foo &amp; Bar"), "foo bar");
        assert_eq!(title("R&#233;sum&#xE9; of XML"), "résumé of xml");
        assert_eq!(title("ﬁnding ﬁles"), "finding files");
    }

    #[test]
    fn test_mojibake_repair() {
        assert_eq!(repair_mojibake("CafÃ© Society"), "Café Society");
        assert_eq!(repair_mojibake("plain ascii"), "plain ascii");
        assert_eq!(title("DBLP\u{e2}\u{20ac}\u{2122}s Data"), "dblp s data");
    }

    #[test]
    fn test_garbled_table_when_repair_fails() {
        // The Greek letter cannot be re-encoded, so whole-string repair gives up
        // and the literal table handles the dash.
        let raw = "\u{3b1}-Trees \u{e2}\u{20ac}\u{201d} Revisited";
        assert_eq!(repair_mojibake(raw), raw);
        assert_eq!(replace_garbled(raw), "\u{3b1}-Trees  -  Revisited");
        assert_eq!(title(raw), "α trees revisited");
    }

    #[test]
    fn test_authors_keep_commas_and_hyphens() {
        assert_eq!(
            normalize_authors(Some("J.-P. Sartre; M. O'Neil, K. Smith-Jones")),
            "j -p sartre m o neil, k smith-jones"
        );
    }

    fn assert_idempotent(s: &str) {
        let once = title(s);
        assert_eq!(title(&once), once, "title not idempotent for {:?}", s);
        let once = normalize_authors(Some(s));
        assert_eq!(normalize_authors(Some(&once)), once, "authors not idempotent for {:?}", s);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Efficient Query-Processing: A Survey!",
            "CafÃ© Society &amp;amp; Friends",
            "\u{3b1}-Trees \u{e2}\u{20ac}\u{201d} Revisited",
            "ΣΟΦΙΑ and Ǆemal",
            "İstanbul ½ ﬁle",
            "",
            "__init__ &#169; 2001",
            "\u{2019}\u{fffd}K \u{1fbc}\u{301}",
            "B;\u{130}\u{300}\u{ff9f}\u{df}\u{3a9}\u{20ac}",
        ];
        for s in samples {
            assert_idempotent(s);
        }
    }

    #[test]
    fn test_lowercase_is_recomposed() {
        // Capital alpha with prosgegrammeni lowercases to alpha + iota subscript,
        // which composes with the acute
        assert_eq!(title("\u{1fbc}\u{301}"), "\u{1fb4}");
        assert_eq!(title("\u{130}\u{300}"), title(&title("\u{130}\u{300}")));
    }

    #[test]
    fn test_idempotent_over_generated_inputs() {
        // Every three-character string over a pool of combining marks, case-changing
        // letters, compatibility forms and mojibake fragments
        let pool = [
            "A", "K", "\u{1fbc}", "\u{1f88}", "\u{3a3}", "\u{3c2}", "\u{3a9}", "\u{130}",
            "\u{df}", "\u{1e9e}", "\u{1c4}", "\u{fb01}", "\u{ff76}", "\u{ff9f}",
            "\u{2126}", "\u{212b}", "\u{301}", "\u{300}", "\u{307}", "\u{345}",
            "\u{316}", "\u{309a}", "\u{c3}", "\u{a9}", "\u{e2}\u{20ac}", "\u{fffd}",
            "&amp;", "&#x301;", " ", ";", "-", ",",
        ];
        for a in pool {
            for b in pool {
                for c in pool {
                    assert_idempotent(&format!("{a}{b}{c}"));
                }
            }
        }
    }

    #[test]
    fn test_normalize_record() {
        let raw = RawRecord {
            id: "s1".to_string(),
            title: Some("The Art of SQL".to_string()),
            authors: Some("Smith, J.".to_string()),
            venue: None,
            year: Some("2004".to_string()),
        };
        let clean = normalize_record(&raw);
        assert_eq!(clean.id, "s1");
        assert_eq!(clean.year, Some(2004));
        assert_eq!(clean.title, "the art of sql");
        assert_eq!(clean.venue, "");
        assert_eq!(clean.authors, "smith, j");
    }
}
