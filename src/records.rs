//! Record types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which catalog a record comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Google Scholar export (left side of every pair)
    Scholar,
    /// DBLP export (right side of every pair)
    Dblp,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Scholar => "scholar",
            Source::Dblp => "dblp",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scholar" => Ok(Source::Scholar),
            "dblp" => Ok(Source::Dblp),
            other => Err(format!("unknown source '{}', expected scholar or dblp", other)),
        }
    }
}

/// A publication row exactly as loaded from a source table.
///
/// Every text field may be missing; `year` is kept as free text until normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Unique within its source
    pub id: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub venue: Option<String>,
    pub year: Option<String>,
}

/// A normalized publication row.
///
/// Field order matches the CSV layout written by [`crate::dataset::write_records`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub id: String,
    pub year: Option<i32>,
    pub title: String,
    pub venue: String,
    pub authors: String,
}

/// A proposed Scholar/DBLP match. The same shape is used for gold-mapping entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidatePair {
    #[serde(rename = "idScholar")]
    pub scholar_id: String,
    #[serde(rename = "idDBLP")]
    pub dblp_id: String,
}

impl CandidatePair {
    pub fn new(scholar_id: impl Into<String>, dblp_id: impl Into<String>) -> Self {
        Self {
            scholar_id: scholar_id.into(),
            dblp_id: dblp_id.into(),
        }
    }
}

/// Known true matches, used only for evaluation.
pub type GoldMapping = HashSet<CandidatePair>;

/// Coerce a free-text year into an integer.
///
/// Accepts plain integers and integral floats ("1999.0", as pandas writes them back out).
/// Anything else, including blanks, yields `None`.
pub fn parse_year(raw: Option<&str>) -> Option<i32> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }

    let value = text.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(Some("1999")), Some(1999));
        assert_eq!(parse_year(Some(" 2003 ")), Some(2003));
        assert_eq!(parse_year(Some("2001.0")), Some(2001));
        assert_eq!(parse_year(Some("n/a")), None);
        assert_eq!(parse_year(Some("1999.5")), None);
        assert_eq!(parse_year(Some("NaN")), None);
        assert_eq!(parse_year(Some("")), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn test_source_from_str() {
        assert_eq!("Scholar".parse::<Source>(), Ok(Source::Scholar));
        assert_eq!("dblp".parse::<Source>(), Ok(Source::Dblp));
        assert!("acm".parse::<Source>().is_err());
    }
}
