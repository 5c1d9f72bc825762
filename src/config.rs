//! Pipeline configuration.
//!
//! Defaults reproduce the reference thresholds. A JSON file may override any subset of
//! fields, and the CLI may override individual values on top of that.

use crate::blocking::CandidateRule;
use crate::dedup::DEFAULT_THRESHOLD;
use crate::error::{LinkageError, Result};
use crate::noise::NoiseRules;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Title-token Jaccard similarity at which adjacent records are duplicates
    pub dedup_threshold: f64,
    pub min_title_chars: usize,
    pub min_alpha_chars: usize,
    pub max_non_ascii_ratio: f64,
    pub candidate_rule: CandidateRule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let noise = NoiseRules::default();
        Self {
            dedup_threshold: DEFAULT_THRESHOLD,
            min_title_chars: noise.min_title_chars,
            min_alpha_chars: noise.min_alpha_chars,
            max_non_ascii_ratio: noise.max_non_ascii_ratio,
            candidate_rule: CandidateRule::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded pipeline config");
        Ok(config)
    }

    /// Reject values outside their meaningful range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.dedup_threshold) {
            return Err(LinkageError::Config(format!(
                "dedup_threshold must be within [0, 1], got {}",
                self.dedup_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.max_non_ascii_ratio) {
            return Err(LinkageError::Config(format!(
                "max_non_ascii_ratio must be within [0, 1], got {}",
                self.max_non_ascii_ratio
            )));
        }
        Ok(())
    }

    pub fn noise_rules(&self) -> NoiseRules {
        NoiseRules {
            min_title_chars: self.min_title_chars,
            min_alpha_chars: self.min_alpha_chars,
            max_non_ascii_ratio: self.max_non_ascii_ratio,
        }
    }
}
