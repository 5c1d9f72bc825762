//! CSV boundary: loading source tables and the gold mapping, writing stage outputs.
//!
//! This is the only module that touches the filesystem. Schema problems (missing
//! columns) and repeated ids are reported here so the matching core can assume
//! well-formed, uniquely keyed input.

use crate::dedup::DuplicateGroup;
use crate::error::{LinkageError, Result};
use crate::records::{CandidatePair, CleanRecord, GoldMapping, RawRecord, Source};
use csv::StringRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every source table must provide.
pub const RECORD_COLUMNS: &[&str] = &["id", "title", "authors", "venue", "year"];

/// Column order of written record tables.
pub const CLEAN_COLUMNS: &[&str] = &["id", "year", "title", "venue", "authors"];

/// Columns of the gold mapping.
pub const GOLD_COLUMNS: &[&str] = &["idScholar", "idDBLP"];

/// Read a file as UTF-8, falling back to Latin-1 for legacy exports.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!(path = %path.display(), "Not valid UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Locate each required column, failing on the first one that is absent.
fn column_indexes(headers: &StringRecord, required: &[&str], path: &Path) -> Result<Vec<usize>> {
    required
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|h| h.trim() == *column)
                .ok_or_else(|| LinkageError::Schema {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        })
        .collect()
}

fn optional_field(row: &StringRecord, idx: usize) -> Option<String> {
    row.get(idx)
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// Load one source table.
///
/// Empty cells become `None`. Rows without an id are skipped; a repeated id is an error.
pub fn load_records(path: &Path, source: Source) -> Result<Vec<RawRecord>> {
    let text = read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let idx = column_indexes(&headers, RECORD_COLUMNS, path)?;
    let (id_idx, title_idx, authors_idx, venue_idx, year_idx) =
        (idx[0], idx[1], idx[2], idx[3], idx[4]);

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let id = row.get(id_idx).unwrap_or("").trim().to_string();
        if id.is_empty() {
            warn!(source = %source, line = ?row.position().map(|p| p.line()), "Skipping row without id");
            continue;
        }
        if !seen.insert(id.clone()) {
            return Err(LinkageError::DuplicateId {
                dataset: source,
                id,
            });
        }

        records.push(RawRecord {
            id,
            title: optional_field(&row, title_idx),
            authors: optional_field(&row, authors_idx),
            venue: optional_field(&row, venue_idx),
            year: optional_field(&row, year_idx),
        });
    }

    info!(source = %source, path = %path.display(), count = records.len(), "Loaded records");
    Ok(records)
}

/// Load the gold mapping. Repeated rows collapse.
pub fn load_gold(path: &Path) -> Result<GoldMapping> {
    let text = read_text(path)?;
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    column_indexes(&headers, GOLD_COLUMNS, path)?;

    let mut gold = GoldMapping::new();
    for row in reader.deserialize::<CandidatePair>() {
        let pair = row?;
        gold.insert(CandidatePair::new(pair.scholar_id.trim(), pair.dblp_id.trim()));
    }

    info!(path = %path.display(), count = gold.len(), "Loaded gold mapping");
    Ok(gold)
}

/// Write cleaned records. The header is written even for an empty table.
pub fn write_records(path: &Path, records: &[CleanRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(CLEAN_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), count = records.len(), "Saved records");
    Ok(())
}

/// Write candidate pairs in sorted order so reruns produce identical files.
pub fn write_pairs(path: &Path, pairs: &HashSet<CandidatePair>) -> Result<()> {
    let mut sorted: Vec<&CandidatePair> = pairs.iter().collect();
    sorted.sort();

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(GOLD_COLUMNS)?;
    for pair in sorted {
        wtr.serialize(pair)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), count = pairs.len(), "Saved candidate pairs");
    Ok(())
}

/// Write the duplicate pairs found by dedup (`kept,dropped,similarity`).
pub fn write_duplicate_groups(path: &Path, groups: &[DuplicateGroup]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    wtr.write_record(["kept", "dropped", "similarity"])?;
    for group in groups {
        wtr.serialize(group)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), count = groups.len(), "Saved duplicate groups");
    Ok(())
}

/// Write any report as pretty JSON.
pub fn write_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(report)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "Saved report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn csv_file(content: &[u8]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(content)?;
        Ok(file)
    }

    #[test]
    fn test_load_records() -> Result<()> {
        let file = csv_file(
            b"id,title,authors,venue,year,extra\n\
              s1,Data Cubes,\"Gray, J.\",SIGMOD,1996,x\n\
              s2,,,,n/a,y\n",
        )?;
        let records = load_records(file.path(), Source::Scholar)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Data Cubes"));
        assert_eq!(records[0].authors.as_deref(), Some("Gray, J."));
        assert_eq!(records[1].title, None);
        assert_eq!(records[1].year.as_deref(), Some("n/a"));
        Ok(())
    }

    #[test]
    fn test_latin1_fallback() -> Result<()> {
        let file = csv_file(b"id,title,authors,venue,year\nd1,Caf\xe9 Systems,M\xfcller,VLDB,2001\n")?;
        let records = load_records(file.path(), Source::Dblp)?;
        assert_eq!(records[0].title.as_deref(), Some("Café Systems"));
        assert_eq!(records[0].authors.as_deref(), Some("Müller"));
        Ok(())
    }

    #[test]
    fn test_missing_column() -> Result<()> {
        let file = csv_file(b"id,title,venue,year\ns1,Data Cubes,SIGMOD,1996\n")?;
        let err = load_records(file.path(), Source::Scholar).expect_err("authors is missing");
        assert!(matches!(err, LinkageError::Schema { ref column, .. } if column == "authors"));
        Ok(())
    }

    #[test]
    fn test_duplicate_id() -> Result<()> {
        let file = csv_file(b"id,title,authors,venue,year\ns1,A,,,\ns1,B,,,\n")?;
        let err = load_records(file.path(), Source::Scholar).expect_err("id repeats");
        assert!(matches!(err, LinkageError::DuplicateId { dataset: Source::Scholar, .. }));
        Ok(())
    }

    #[test]
    fn test_load_gold() -> Result<()> {
        let file = csv_file(b"idDBLP,idScholar\nd1,s1\nd1,s1\nd2,s2\n")?;
        let gold = load_gold(file.path())?;
        assert_eq!(gold.len(), 2);
        assert!(gold.contains(&CandidatePair::new("s1", "d1")));
        Ok(())
    }

    #[test]
    fn test_write_and_reload_records() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("clean.csv");
        let records = vec![CleanRecord {
            id: "s1".to_string(),
            year: None,
            title: "data cubes".to_string(),
            venue: "sigmod".to_string(),
            authors: "gray, j".to_string(),
        }];
        write_records(&path, &records)?;

        let reloaded = load_records(&path, Source::Scholar)?;
        assert_eq!(reloaded[0].authors.as_deref(), Some("gray, j"));
        assert_eq!(reloaded[0].year, None);
        Ok(())
    }

    #[test]
    fn test_write_duplicate_groups() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dups.csv");
        let groups = vec![DuplicateGroup {
            kept: "s1".to_string(),
            dropped: "s2".to_string(),
            similarity: 1.0,
        }];
        write_duplicate_groups(&path, &groups)?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content, "kept,dropped,similarity\ns1,s2,1.0\n");
        Ok(())
    }

    #[test]
    fn test_write_pairs_sorted() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("pairs.csv");
        let pairs: HashSet<CandidatePair> =
            [CandidatePair::new("s2", "d1"), CandidatePair::new("s1", "d2")].into();
        write_pairs(&path, &pairs)?;

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content, "idScholar,idDBLP\ns1,d2\ns2,d1\n");
        Ok(())
    }
}
