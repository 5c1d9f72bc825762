//! # rustlinkage
//!
//! Scholar/DBLP Record Linkage Pipeline - cleaning, dedup, blocking and recall evaluation
//!
//! ## Modules
//!
//! - [`normalize`] - Canonicalization of titles, venues and author lists
//! - [`tokenize`] - Title tokens, author last names, Jaccard similarity
//! - [`noise`] - Dropping records with unusable titles
//! - [`dedup`] - Sorted-neighborhood duplicate collapsing within one source
//! - [`blocking`] - Cross-source candidate pairs from author and title keys
//! - [`evaluate`] - Recall against the gold mapping
//! - [`pipeline`] - Stage orchestration
//! - [`dataset`] - CSV loading and writing
//! - [`config`] - Pipeline thresholds
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustlinkage::{config::PipelineConfig, dataset, pipeline, records::Source};
//! use std::path::Path;
//!
//! fn main() -> rustlinkage::Result<()> {
//!     let scholar = dataset::load_records(Path::new("data/Scholar.csv"), Source::Scholar)?;
//!     let dblp = dataset::load_records(Path::new("data/DBLP1.csv"), Source::Dblp)?;
//!     let gold = dataset::load_gold(Path::new("data/DBLP-Scholar_perfectMapping.csv"))?;
//!
//!     let output = pipeline::run(&scholar, &dblp, &gold, &PipelineConfig::default());
//!     println!("{}", output.linkage.report);
//!     Ok(())
//! }
//! ```

pub mod blocking;
pub mod config;
pub mod dataset;
pub mod dedup;
pub mod error;
pub mod evaluate;
pub mod noise;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod tokenize;

pub use error::{LinkageError, Result};
