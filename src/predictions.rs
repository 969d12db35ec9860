//! Prediction records consumed by downstream evaluation.
//!
//! Keyword extractors emit one CSV of scored candidates (`term,score`) per
//! document. Rows that do not parse are skipped rather than failing the whole
//! document, and documents without any valid candidate are still exported.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::model::PredictionRecord;

/// File-name suffix of per-document candidate score files.
pub const CANDIDATE_FILE_SUFFIX: &str = "_candidate_cross_attn_value.csv";

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Candidate directory not found: {0}")]
    MissingDirectory(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One scored keyword candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub term: String,
    pub score: f64,
}

impl ScoredCandidate {
    /// Builds a candidate from one CSV record. The term is trimmed and
    /// lower-cased.
    ///
    /// Returns `None` for a blank term, a missing score or a score that is
    /// not a finite number.
    pub fn from_record(record: &csv::StringRecord) -> Option<Self> {
        let term = record.get(0)?.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        let score: f64 = record.get(1)?.trim().parse().ok()?;
        score.is_finite().then_some(Self { term, score })
    }

    /// Parses a single CSV row such as `"risk, return",0.8`.
    pub fn parse(row: &str) -> Option<Self> {
        read_candidates(row.as_bytes()).into_iter().next()
    }
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input)
}

/// Reads every parseable candidate from CSV `input`, in file order.
pub fn read_candidates<R: Read>(input: R) -> Vec<ScoredCandidate> {
    csv_reader(input)
        .records()
        .flatten()
        .filter_map(|record| ScoredCandidate::from_record(&record))
        .collect()
}

impl PredictionRecord {
    /// Builds a record from scored candidates, keeping the `top_k` best.
    ///
    /// Candidates are ordered by descending score; ties keep input order.
    pub fn from_candidates(
        doc_id: impl Into<String>,
        mut candidates: Vec<ScoredCandidate>,
        top_k: usize,
    ) -> Self {
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self {
            doc_id: doc_id.into(),
            predicted_keywords: candidates.into_iter().take(top_k).map(|c| c.term).collect(),
        }
    }
}

/// Exports one JSONL prediction line per candidate file in `candidate_dir`.
///
/// Files are visited in name order; the document id is the file-name prefix
/// before the first `_`. Returns the number of documents written.
///
/// # Errors
///
/// Returns [`PredictionError`] if the directory is missing or a file cannot
/// be read or written. Unparseable rows are skipped, not errors.
pub fn export_predictions(
    candidate_dir: &Path,
    output: &Path,
    top_k: usize,
) -> Result<usize, PredictionError> {
    if !candidate_dir.is_dir() {
        return Err(PredictionError::MissingDirectory(
            candidate_dir.display().to_string(),
        ));
    }

    let mut names: Vec<String> = std::fs::read_dir(candidate_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(CANDIDATE_FILE_SUFFIX))
        .collect();
    names.sort();

    let mut writer = BufWriter::new(File::create(output)?);
    for name in &names {
        let doc_id = name.split('_').next().unwrap_or_default();
        let candidates = read_candidates(File::open(candidate_dir.join(name))?);
        let record = PredictionRecord::from_candidates(doc_id, candidates, top_k);
        writeln!(writer, "{}", serde_json::to_string(&record)?)?;
    }
    writer.flush()?;

    info!(documents = names.len(), path = %output.display(), "Exported predictions");
    Ok(names.len())
}
