//! Token sets derived from normalized titles and author lists.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words too common to say anything about a title.
pub const STOPWORDS: &[&str] = &[
    "and", "or", "in", "on", "at", "of", "for", "the", "a", "an", "to", "with", "by",
];

static AUTHOR_DELIMITER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" and | & |;").expect("author delimiter regex"));
static NAME_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("name regex"));

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// A title token worth keeping: longer than one character and not a stopword.
fn is_content_token(token: &str) -> bool {
    token.chars().count() > 1 && !is_stopword(token)
}

/// Set of content tokens of a normalized title.
pub fn title_tokens(clean_title: &str) -> HashSet<String> {
    clean_title
        .split_whitespace()
        .filter(|t| is_content_token(t))
        .map(str::to_string)
        .collect()
}

/// First content token of a title in reading order, or `""` when there is none.
pub fn first_content_token(clean_title: &str) -> &str {
    clean_title
        .split_whitespace()
        .find(|t| is_content_token(t))
        .unwrap_or("")
}

/// Last names found in an author list.
///
/// The list is split on `,`, `;`, ` and ` and ` & `. For each author the last token
/// longer than one character that is not purely numeric is taken as the last name.
pub fn author_lastnames(authors: &str) -> HashSet<String> {
    let lowered = authors.to_lowercase();
    let unified = AUTHOR_DELIMITER_RE.replace_all(&lowered, ",");

    unified
        .split(',')
        .filter_map(|segment| {
            let cleaned = NAME_CHARS_RE.replace_all(segment.trim(), "");
            cleaned
                .split_whitespace()
                .filter(|t| t.chars().count() > 1)
                .filter(|t| !t.chars().all(|c| c.is_numeric()))
                .last()
                .map(str::to_string)
        })
        .collect()
}

/// Jaccard similarity of two token sets; 0.0 when either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_title_tokens_drop_stopwords_and_short() {
        let tokens = title_tokens("a survey of the x data on data streams");
        assert_eq!(tokens, set(&["survey", "data", "streams"]));
        for t in &tokens {
            assert!(!is_stopword(t));
            assert!(t.chars().count() > 1);
        }
        assert!(title_tokens("").is_empty());
    }

    #[test]
    fn test_first_content_token() {
        assert_eq!(first_content_token("the x query optimizer"), "query");
        assert_eq!(first_content_token("on a"), "");
        assert_eq!(first_content_token(""), "");
    }

    #[test]
    fn test_author_lastnames() {
        assert_eq!(
            author_lastnames("Smith, J. and Doe, A."),
            set(&["smith", "doe"])
        );
        assert!(author_lastnames("").is_empty());
        assert_eq!(
            author_lastnames("Jean-Paul Sartre & Simone de Beauvoir; 2001"),
            set(&["sartre", "beauvoir"])
        );
        assert_eq!(author_lastnames("J Smith, K Smith"), set(&["smith"]));
        assert_eq!(author_lastnames("Anne Smith-Jones"), set(&["smith-jones"]));
    }

    #[test]
    fn test_jaccard() {
        let a = set(&["query", "optimization", "survey"]);
        let b = set(&["query", "optimization"]);
        let sim = jaccard(&a, &b);
        assert!((sim - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard(&a, &b), jaccard(&b, &a));
        assert_eq!(jaccard(&a, &a), 1.0);
        assert_eq!(jaccard(&a, &HashSet::new()), 0.0);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }
}
