//! Within-source near-duplicate collapsing.
//!
//! Sorted-neighborhood with a window of one: records are sorted by normalized title and
//! each record is compared only with its immediate successor. A pair is a duplicate when
//! the title-token Jaccard similarity reaches the threshold and the two author lists
//! share at least one last name. The later record of a duplicate pair is dropped.
//!
//! This is not a transitive clustering. The scan is a single forward pass over the
//! sorted sequence and never revisits a position.

use crate::records::CleanRecord;
use crate::tokenize::{author_lastnames, jaccard, title_tokens};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Default similarity threshold for title tokens.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// A detected duplicate: `kept` survives, `dropped` is removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub kept: String,
    pub dropped: String,
    pub similarity: f64,
}

/// Counts reported after deduplicating one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub input: usize,
    pub groups: usize,
    pub output: usize,
}

/// Result of [`Deduplicator::run`].
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// Surviving records in title order
    pub records: Vec<CleanRecord>,
    pub groups: Vec<DuplicateGroup>,
    pub report: DedupReport,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Scan state over the sorted sequence: the cursor and the positions marked for removal.
#[derive(Debug)]
struct SortedNeighborhood {
    cursor: usize,
    dropped: HashSet<usize>,
}

/// What one transition of the scan did.
#[derive(Debug, PartialEq)]
enum Step {
    /// Successor was already marked; no comparison made
    Skipped,
    /// Compared, not a duplicate
    Distinct,
    /// Compared and marked the successor for removal
    Duplicate { similarity: f64 },
}

impl SortedNeighborhood {
    fn new() -> Self {
        Self {
            cursor: 0,
            dropped: HashSet::new(),
        }
    }

    /// Compare `cursor` with `cursor + 1`, then advance by one regardless of outcome.
    fn step(&mut self, features: &[Features], threshold: f64) -> Step {
        let i = self.cursor;
        let j = i + 1;
        self.cursor += 1;

        if self.dropped.contains(&j) {
            return Step::Skipped;
        }

        let similarity = jaccard(&features[i].tokens, &features[j].tokens);
        let shares_author = !features[i].lastnames.is_disjoint(&features[j].lastnames);
        if similarity >= threshold && shares_author {
            self.dropped.insert(j);
            Step::Duplicate { similarity }
        } else {
            Step::Distinct
        }
    }
}

struct Features {
    tokens: HashSet<String>,
    lastnames: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Collapse near-duplicates in one source's cleaned, filtered records.
    pub fn run(&self, mut records: Vec<CleanRecord>) -> DedupOutcome {
        let input = records.len();
        // Stable, so equal titles keep their input order
        records.sort_by(|a, b| a.title.cmp(&b.title));

        let features: Vec<Features> = records
            .iter()
            .map(|r| Features {
                tokens: title_tokens(&r.title),
                lastnames: author_lastnames(&r.authors),
            })
            .collect();

        let mut scan = SortedNeighborhood::new();
        let mut groups = Vec::new();
        while scan.cursor + 1 < records.len() {
            let i = scan.cursor;
            if let Step::Duplicate { similarity } = scan.step(&features, self.threshold) {
                debug!(
                    kept = %records[i].id,
                    dropped = %records[i + 1].id,
                    similarity,
                    "Duplicate found"
                );
                groups.push(DuplicateGroup {
                    kept: records[i].id.clone(),
                    dropped: records[i + 1].id.clone(),
                    similarity,
                });
            }
        }

        let dropped = scan.dropped;
        let survivors: Vec<CleanRecord> = records
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !dropped.contains(idx))
            .map(|(_, r)| r)
            .collect();

        let report = DedupReport {
            input,
            groups: groups.len(),
            output: survivors.len(),
        };
        info!(
            input = report.input,
            groups = report.groups,
            output = report.output,
            "Deduplication complete"
        );

        DedupOutcome {
            records: survivors,
            groups,
            report,
        }
    }
}
