//! Cross-source candidate-pair generation.
//!
//! Two independent blocking passes run over the deduplicated Scholar and DBLP records:
//!
//! - **Author blocking**: every last name of a record is a key, so a record with k last
//!   names lands in k blocks.
//! - **Title blocking**: the first content token of the normalized title is the single
//!   key of a record. Records without a content token all share the empty key.
//!
//! Each pass yields the cross product of Scholar and DBLP ids sharing a key. The final
//! candidate set is combined according to a [`CandidateRule`].

use crate::records::{CandidatePair, CleanRecord};
use crate::tokenize::{author_lastnames, first_content_token};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// How the two blocking passes are combined into the candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateRule {
    /// `title ∪ (author ∩ title)`, which always equals the title pairs
    #[default]
    TitleWithAuthorCore,
    /// `author ∪ title`
    AuthorOrTitle,
    /// `author ∩ title`
    AuthorAndTitle,
}

impl CandidateRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateRule::TitleWithAuthorCore => "title-with-author-core",
            CandidateRule::AuthorOrTitle => "author-or-title",
            CandidateRule::AuthorAndTitle => "author-and-title",
        }
    }

    /// Combine the two passes.
    pub fn combine(
        &self,
        author_pairs: &HashSet<CandidatePair>,
        title_pairs: &HashSet<CandidatePair>,
    ) -> HashSet<CandidatePair> {
        match self {
            CandidateRule::TitleWithAuthorCore => {
                let core: HashSet<CandidatePair> =
                    author_pairs.intersection(title_pairs).cloned().collect();
                core.union(title_pairs).cloned().collect()
            }
            CandidateRule::AuthorOrTitle => author_pairs.union(title_pairs).cloned().collect(),
            CandidateRule::AuthorAndTitle => {
                author_pairs.intersection(title_pairs).cloned().collect()
            }
        }
    }
}

impl fmt::Display for CandidateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title-with-author-core" => Ok(CandidateRule::TitleWithAuthorCore),
            "author-or-title" => Ok(CandidateRule::AuthorOrTitle),
            "author-and-title" => Ok(CandidateRule::AuthorAndTitle),
            other => Err(format!("unknown candidate rule '{}'", other)),
        }
    }
}

/// Output of both blocking passes and their combination.
#[derive(Debug, Clone, Default)]
pub struct BlockingOutcome {
    pub author_pairs: HashSet<CandidatePair>,
    pub title_pairs: HashSet<CandidatePair>,
    pub candidates: HashSet<CandidatePair>,
}

/// Cross product of ids sharing a key, for keys present on both sides.
///
/// `left` holds Scholar `(key, id)` rows and `right` DBLP rows; a record may appear
/// in several rows under different keys.
pub fn candidate_pairs_from_block<'a>(
    left: impl IntoIterator<Item = (String, &'a str)>,
    right: impl IntoIterator<Item = (String, &'a str)>,
) -> HashSet<CandidatePair> {
    let left_groups = group_by_key(left);
    let right_groups = group_by_key(right);

    let mut pairs = HashSet::new();
    for (key, left_ids) in &left_groups {
        let Some(right_ids) = right_groups.get(key) else {
            continue;
        };
        for l in left_ids {
            for r in right_ids {
                pairs.insert(CandidatePair::new(*l, *r));
            }
        }
    }
    pairs
}

fn group_by_key<'a>(
    rows: impl IntoIterator<Item = (String, &'a str)>,
) -> HashMap<String, Vec<&'a str>> {
    let mut groups: HashMap<String, Vec<&'a str>> = HashMap::new();
    for (key, id) in rows {
        groups.entry(key).or_default().push(id);
    }
    groups
}

/// One `(last name, id)` row per last name of each record.
fn lastname_rows(records: &[CleanRecord]) -> Vec<(String, &str)> {
    records
        .iter()
        .flat_map(|r| {
            author_lastnames(&r.authors)
                .into_iter()
                .filter(|name| !name.is_empty())
                .map(move |name| (name, r.id.as_str()))
        })
        .collect()
}

/// One `(first content token, id)` row per record.
fn title_rows(records: &[CleanRecord]) -> Vec<(String, &str)> {
    records
        .iter()
        .map(|r| (first_content_token(&r.title).to_string(), r.id.as_str()))
        .collect()
}

pub fn author_pairs(scholar: &[CleanRecord], dblp: &[CleanRecord]) -> HashSet<CandidatePair> {
    candidate_pairs_from_block(lastname_rows(scholar), lastname_rows(dblp))
}

pub fn title_pairs(scholar: &[CleanRecord], dblp: &[CleanRecord]) -> HashSet<CandidatePair> {
    candidate_pairs_from_block(title_rows(scholar), title_rows(dblp))
}

#[derive(Debug, Clone, Default)]
pub struct Blocker {
    rule: CandidateRule,
}

impl Blocker {
    pub fn new(rule: CandidateRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> CandidateRule {
        self.rule
    }

    /// Run both passes over deduplicated sources. The records are only read.
    pub fn run(&self, scholar: &[CleanRecord], dblp: &[CleanRecord]) -> BlockingOutcome {
        let author_pairs = author_pairs(scholar, dblp);
        info!(pairs = author_pairs.len(), "Author-based candidate pairs");

        let title_pairs = title_pairs(scholar, dblp);
        info!(pairs = title_pairs.len(), "Title-based candidate pairs");

        let candidates = self.rule.combine(&author_pairs, &title_pairs);
        info!(rule = %self.rule, pairs = candidates.len(), "Combined candidate pairs");

        BlockingOutcome {
            author_pairs,
            title_pairs,
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, authors: &str) -> CleanRecord {
        CleanRecord {
            id: id.to_string(),
            title: title.to_string(),
            authors: authors.to_string(),
            ..Default::default()
        }
    }

    fn pair(s: &str, d: &str) -> CandidatePair {
        CandidatePair::new(s, d)
    }

    fn scholar() -> Vec<CleanRecord> {
        vec![
            record("s1", "the data cube operator", "j gray, a bosworth"),
            record("s2", "mining association rules", "r agrawal, r srikant"),
            record("s3", "a", "j gray"),
        ]
    }

    fn dblp() -> Vec<CleanRecord> {
        vec![
            record("d1", "data cube a relational aggregation operator", "jim gray"),
            record("d2", "fast algorithms for mining", "rakesh agrawal"),
            record("d3", "of", "someone else"),
        ]
    }

    #[test]
    fn test_author_blocking_explodes_lastnames() {
        let pairs = author_pairs(&scholar(), &dblp());
        let expected: HashSet<CandidatePair> = [
            pair("s1", "d1"),
            pair("s3", "d1"),
            pair("s2", "d2"),
        ]
        .into();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_title_blocking_uses_first_content_token() {
        let pairs = title_pairs(&scholar(), &dblp());
        // "data" links s1/d1; s3 and d3 both have the empty key
        let expected: HashSet<CandidatePair> = [pair("s1", "d1"), pair("s3", "d3")].into();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_default_rule_equals_title_pairs() {
        let outcome = Blocker::default().run(&scholar(), &dblp());
        assert_eq!(outcome.candidates, outcome.title_pairs);
        assert_ne!(outcome.author_pairs, outcome.title_pairs);
    }

    #[test]
    fn test_alternative_rules() {
        let s = scholar();
        let d = dblp();
        let union = Blocker::new(CandidateRule::AuthorOrTitle).run(&s, &d);
        assert_eq!(union.candidates.len(), 4);
        let core = Blocker::new(CandidateRule::AuthorAndTitle).run(&s, &d);
        let expected: HashSet<CandidatePair> = [pair("s1", "d1")].into();
        assert_eq!(core.candidates, expected);
    }

    #[test]
    fn test_cross_product_within_block() {
        let pairs = candidate_pairs_from_block(
            vec![("k".to_string(), "l1"), ("k".to_string(), "l2"), ("x".to_string(), "l3")],
            vec![("k".to_string(), "r1"), ("k".to_string(), "r2"), ("y".to_string(), "r3")],
        );
        assert_eq!(pairs.len(), 4);
        assert!(!pairs.iter().any(|p| p.scholar_id == "l3" || p.dblp_id == "r3"));
    }

    #[test]
    fn test_rule_round_trip_from_str() {
        for rule in [
            CandidateRule::TitleWithAuthorCore,
            CandidateRule::AuthorOrTitle,
            CandidateRule::AuthorAndTitle,
        ] {
            assert_eq!(rule.as_str().parse::<CandidateRule>(), Ok(rule));
        }
    }
}
