//! Stage orchestration.
//!
//! Each stage is an explicit function taking values and returning new values:
//! normalize -> noise filter -> dedup (per source), then blocking -> evaluation.

use crate::blocking::{BlockingOutcome, Blocker, CandidateRule};
use crate::config::PipelineConfig;
use crate::dedup::{DedupReport, Deduplicator, DuplicateGroup};
use crate::evaluate::{evaluate, RecallReport};
use crate::noise::NoiseReport;
use crate::normalize::normalize_records;
use crate::records::{CleanRecord, GoldMapping, RawRecord, Source};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Per-source counts through cleaning and dedup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub source: Source,
    pub raw: usize,
    pub noise: NoiseReport,
    pub dedup: DedupReport,
}

/// One source after normalization, noise filtering and dedup.
#[derive(Debug, Clone)]
pub struct CleanedSource {
    pub source: Source,
    /// Normalized and filtered, in input order
    pub cleaned: Vec<CleanRecord>,
    /// Dedup survivors, in title order
    pub deduplicated: Vec<CleanRecord>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub stats: SourceStats,
}

impl CleanedSource {
    pub fn ids(&self) -> HashSet<&str> {
        record_ids(&self.deduplicated)
    }
}

/// The externally observable result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct LinkageReport {
    pub candidate_rule: CandidateRule,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceStats>,
    pub author_pairs: usize,
    pub title_pairs: usize,
    pub candidate_pairs: usize,
    pub recall: RecallReport,
}

/// Blocking and evaluation output for two prepared sources.
#[derive(Debug, Clone)]
pub struct LinkageOutcome {
    pub blocking: BlockingOutcome,
    pub report: LinkageReport,
}

pub fn record_ids(records: &[CleanRecord]) -> HashSet<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

/// Normalize, filter and deduplicate one source.
pub fn clean_source(source: Source, raw: &[RawRecord], config: &PipelineConfig) -> CleanedSource {
    info!(source = %source, count = raw.len(), "Cleaning source");

    let normalized = normalize_records(raw);
    let (cleaned, noise) = config.noise_rules().filter(normalized);

    let dedup = Deduplicator::new()
        .with_threshold(config.dedup_threshold)
        .run(cleaned.clone());

    CleanedSource {
        source,
        cleaned,
        deduplicated: dedup.records,
        duplicate_groups: dedup.groups,
        stats: SourceStats {
            source,
            raw: raw.len(),
            noise,
            dedup: dedup.report,
        },
    }
}

/// Block two prepared sources and evaluate the candidates against the gold mapping.
pub fn link(
    scholar: &[CleanRecord],
    dblp: &[CleanRecord],
    gold: &GoldMapping,
    config: &PipelineConfig,
) -> LinkageOutcome {
    let blocking = Blocker::new(config.candidate_rule).run(scholar, dblp);
    let recall = evaluate(
        &blocking.candidates,
        gold,
        &record_ids(scholar),
        &record_ids(dblp),
    );

    let report = LinkageReport {
        candidate_rule: config.candidate_rule,
        sources: Vec::new(),
        author_pairs: blocking.author_pairs.len(),
        title_pairs: blocking.title_pairs.len(),
        candidate_pairs: blocking.candidates.len(),
        recall,
    };
    LinkageOutcome { blocking, report }
}

/// Full run over raw tables.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub scholar: CleanedSource,
    pub dblp: CleanedSource,
    pub linkage: LinkageOutcome,
}

pub fn run(
    scholar_raw: &[RawRecord],
    dblp_raw: &[RawRecord],
    gold: &GoldMapping,
    config: &PipelineConfig,
) -> PipelineOutput {
    let scholar = clean_source(Source::Scholar, scholar_raw, config);
    let dblp = clean_source(Source::Dblp, dblp_raw, config);

    let mut linkage = link(&scholar.deduplicated, &dblp.deduplicated, gold, config);
    linkage.report.sources = vec![scholar.stats, dblp.stats];

    PipelineOutput {
        scholar,
        dblp,
        linkage,
    }
}

impl fmt::Display for SourceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} raw, {} after noise filter ({} dropped), {} duplicate groups, {} after dedup",
            self.source,
            self.raw,
            self.noise.kept,
            self.noise.dropped,
            self.dedup.groups,
            self.dedup.output
        )
    }
}

impl fmt::Display for LinkageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stats in &self.sources {
            writeln!(f, "{}", stats)?;
        }
        writeln!(f, "Author-based candidate pairs: {}", self.author_pairs)?;
        writeln!(f, "Title-based candidate pairs: {}", self.title_pairs)?;
        writeln!(f, "Candidate pairs ({}): {}", self.candidate_rule, self.candidate_pairs)?;
        write!(f, "{}", self.recall)
    }
}
