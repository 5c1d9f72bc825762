//! Noise filtering: drop records whose title cannot support matching.

use crate::records::CleanRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

/// Letters only (general category L*). Combining marks that Unicode also counts as
/// alphabetic, such as U+0345, do not count.
static LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}").expect("letter regex"));

/// Thresholds for the noisy-title predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseRules {
    /// Minimum number of characters in the trimmed title
    pub min_title_chars: usize,
    /// Minimum number of alphabetic characters
    pub min_alpha_chars: usize,
    /// Titles whose share of non-ASCII characters exceeds this are dropped
    pub max_non_ascii_ratio: f64,
}

impl Default for NoiseRules {
    fn default() -> Self {
        Self {
            min_title_chars: 5,
            min_alpha_chars: 3,
            max_non_ascii_ratio: 0.8,
        }
    }
}

/// Outcome of filtering one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NoiseReport {
    pub input: usize,
    pub dropped: usize,
    pub kept: usize,
}

impl NoiseRules {
    /// True when the title is missing, too short, barely alphabetic, or mostly non-ASCII.
    pub fn is_noisy(&self, title: Option<&str>) -> bool {
        let Some(title) = title else {
            return true;
        };
        let title = title.trim();
        if title.is_empty() {
            return true;
        }

        let total = title.chars().count();
        if total < self.min_title_chars {
            return true;
        }

        let alpha = LETTER_RE.find_iter(title).count();
        if alpha < self.min_alpha_chars {
            return true;
        }

        let non_ascii = title.chars().filter(|c| (*c as u32) > 127).count();
        non_ascii as f64 / total as f64 > self.max_non_ascii_ratio
    }

    /// Drop noisy records, keeping the rest untouched and in order.
    pub fn filter(&self, records: Vec<CleanRecord>) -> (Vec<CleanRecord>, NoiseReport) {
        let input = records.len();
        let kept: Vec<CleanRecord> = records
            .into_iter()
            .filter(|r| {
                let noisy = self.is_noisy(Some(&r.title));
                if noisy {
                    debug!(id = %r.id, title = %r.title, "Dropping noisy record");
                }
                !noisy
            })
            .collect();

        let report = NoiseReport {
            input,
            dropped: input - kept.len(),
            kept: kept.len(),
        };
        info!(input = report.input, dropped = report.dropped, "Noise filter complete");
        (kept, report)
    }
}
