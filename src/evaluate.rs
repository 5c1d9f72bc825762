//! Recall of the candidate set against the gold mapping.

use crate::records::{CandidatePair, GoldMapping};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Pair completeness figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecallReport {
    pub gold_total: usize,
    pub gold_caught: usize,
    pub gold_retained_pct: f64,
    /// Gold pairs whose two ids survived filtering and dedup
    pub filtered_gold_total: usize,
    /// Gold pairs lost to filtering and dedup
    pub gold_lost: usize,
}

/// Compare candidates and surviving ids against the gold mapping.
pub fn evaluate(
    candidates: &HashSet<CandidatePair>,
    gold: &GoldMapping,
    scholar_ids: &HashSet<&str>,
    dblp_ids: &HashSet<&str>,
) -> RecallReport {
    let gold_total = gold.len();
    let gold_caught = gold.intersection(candidates).count();
    let gold_retained_pct = if gold_total > 0 {
        100.0 * gold_caught as f64 / gold_total as f64
    } else {
        0.0
    };

    let filtered_gold_total = gold
        .iter()
        .filter(|p| {
            scholar_ids.contains(p.scholar_id.as_str()) && dblp_ids.contains(p.dblp_id.as_str())
        })
        .count();

    let report = RecallReport {
        gold_total,
        gold_caught,
        gold_retained_pct,
        filtered_gold_total,
        gold_lost: gold_total - filtered_gold_total,
    };
    info!(
        gold_total = report.gold_total,
        gold_caught = report.gold_caught,
        retained_pct = report.gold_retained_pct,
        "Recall evaluation complete"
    );
    report
}

impl fmt::Display for RecallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gold total: {}", self.gold_total)?;
        writeln!(f, "Gold pairs in candidates: {}", self.gold_caught)?;
        writeln!(f, "Gold retained: {:.2}%", self.gold_retained_pct)?;
        writeln!(
            f,
            "Gold pairs that still exist after cleaning/dedup: {}",
            self.filtered_gold_total
        )?;
        write!(f, "Gold pairs lost due to preprocessing: {}", self.gold_lost)
    }
}
