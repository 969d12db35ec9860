//! Harvest pipeline: record source → extractor → admission chain → JSONL.
//!
//! This module provides the [`HarvestPipeline`] coordinator that drives a
//! [`RecordSource`] to completion (or to the record cap) with:
//! - A short-circuiting admission chain ([`admit`]) whose first failing stage
//!   names the [`RejectionReason`]
//! - Per-reason counters via [`RejectionStats`]
//! - Line-by-line flushed output, so a killed run leaves complete JSON lines
//! - Structured logging via `tracing`

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{list_records, ListRecordsRequest};
use crate::harvest::heuristics::{filter_keywords_present_in_text, filter_valid_keywords};
use crate::harvest::traits::{ExtractedFields, RecordExtractor, RecordSource};
use crate::model::CorpusDocument;
use crate::traits::{OaiError, OaiTransport};

/// Separator between title and abstract in a document's text.
pub const TEXT_SEPARATOR: &str = " — ";

// ============================================================================
// Configuration
// ============================================================================

/// Admission and run parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Stop once this many documents have been written
    pub max_records: usize,

    /// Minimum length of the composed text, in characters
    pub min_text_chars: usize,

    /// Minimum number of keywords surviving every keyword stage
    pub min_kws_present: usize,

    /// Only accept keywords containing whitespace
    pub multiword_only: bool,

    /// Only keep keywords that occur in the text as whole words
    pub require_kw_in_text: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_records: 8000,
            min_text_chars: 150,
            min_kws_present: 1,
            multiword_only: false,
            require_kw_in_text: true,
        }
    }
}

impl HarvestConfig {
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn with_min_text_chars(mut self, min_text_chars: usize) -> Self {
        self.min_text_chars = min_text_chars;
        self
    }

    pub fn with_min_kws_present(mut self, min_kws_present: usize) -> Self {
        self.min_kws_present = min_kws_present;
        self
    }

    pub fn with_multiword_only(mut self, multiword_only: bool) -> Self {
        self.multiword_only = multiword_only;
        self
    }

    pub fn with_require_kw_in_text(mut self, require: bool) -> Self {
        self.require_kw_in_text = require;
        self
    }
}

// ============================================================================
// Rejection Accounting
// ============================================================================

/// Why a record was left out of the corpus, in admission-chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// No usable header, or no title
    NoTitle,

    /// Declared languages exclude English
    LangFiltered,

    /// Composed text shorter than `min_text_chars`
    ShortText,

    /// No keyword passed the validity test
    NoKeywords,

    /// No valid keyword occurs in the text
    NoKwInText,

    /// Fewer surviving keywords than `min_kws_present`
    MinKws,
}

impl RejectionReason {
    /// All reasons in admission-chain order.
    pub const ALL: [RejectionReason; 6] = [
        RejectionReason::NoTitle,
        RejectionReason::LangFiltered,
        RejectionReason::ShortText,
        RejectionReason::NoKeywords,
        RejectionReason::NoKwInText,
        RejectionReason::MinKws,
    ];

    /// Stable tag used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::NoTitle => "no_title",
            RejectionReason::LangFiltered => "lang_filtered",
            RejectionReason::ShortText => "short_text",
            RejectionReason::NoKeywords => "no_keywords",
            RejectionReason::NoKwInText => "no_kw_in_text",
            RejectionReason::MinKws => "min_kws",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running count of rejected records per reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionStats {
    counts: [u64; RejectionReason::ALL.len()],
}

impl RejectionStats {
    pub fn record(&mut self, reason: RejectionReason) {
        self.counts[reason.index()] += 1;
    }

    pub fn get(&self, reason: RejectionReason) -> u64 {
        self.counts[reason.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterates `(reason, count)` in admission-chain order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (RejectionReason, u64)> + '_ {
        RejectionReason::ALL.iter().map(|&r| (r, self.get(r)))
    }
}

impl Serialize for RejectionStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (reason, count) in self.iter() {
            map.serialize_entry(reason.as_str(), &count)?;
        }
        map.end()
    }
}

/// Outcome of a completed harvest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    /// Documents written to the output
    pub kept: usize,

    /// Records pulled from the source (kept + rejected)
    pub records_seen: usize,

    /// Rejections per reason
    pub rejected: RejectionStats,

    /// Wall-clock duration of the run (milliseconds)
    pub duration_ms: u64,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

/// Fatal errors that abort a harvest.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Pagination failed (transport, protocol or malformed response)
    #[error("Harvest aborted: {0}")]
    Oai(#[from] OaiError),

    /// Output could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document serialization failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Admission Chain
// ============================================================================

/// Composes a document's text: the title, or title + separator + abstract.
pub fn compose_text(title: &str, abstract_text: Option<&str>) -> String {
    match abstract_text {
        Some(abs) if !abs.is_empty() => format!("{title}{TEXT_SEPARATOR}{abs}"),
        _ => title.to_string(),
    }
}

/// Runs the admission chain over one record's fields.
///
/// Stages short-circuit: the first failing stage is the rejection reason.
/// Accepted keywords are sorted case-insensitively.
pub fn admit(
    fields: &ExtractedFields,
    config: &HarvestConfig,
) -> Result<CorpusDocument, RejectionReason> {
    let title = fields
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(RejectionReason::NoTitle)?;

    if !fields.lang_ok {
        return Err(RejectionReason::LangFiltered);
    }

    let text = compose_text(title, fields.abstract_text.as_deref());
    if text.chars().count() < config.min_text_chars {
        return Err(RejectionReason::ShortText);
    }

    let mut keywords = filter_valid_keywords(&fields.keywords, config.multiword_only);
    if keywords.is_empty() {
        return Err(RejectionReason::NoKeywords);
    }

    if config.require_kw_in_text {
        keywords = filter_keywords_present_in_text(&keywords, &text);
        if keywords.is_empty() {
            return Err(RejectionReason::NoKwInText);
        }
    }

    if keywords.len() < config.min_kws_present {
        return Err(RejectionReason::MinKws);
    }

    keywords.sort_by_key(|k| k.to_lowercase());
    Ok(CorpusDocument {
        doc_id: fields.id.clone(),
        text,
        keywords,
    })
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Sequential harvest pipeline.
///
/// Pulls records one at a time, extracts fields, runs the admission chain
/// and writes each accepted document as one flushed JSON line. The run stops
/// as soon as `max_records` documents have been written; later records are
/// never pulled from the source.
///
/// # Example
///
/// ```ignore
/// use oai_corpus_harvester::harvest::{DublinCoreExtractor, HarvestConfig, HarvestPipeline};
///
/// let pipeline = HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default());
/// let report = pipeline.run(&mut stream, Path::new("corpus.jsonl")).await?;
/// println!("kept {}", report.kept);
/// ```
pub struct HarvestPipeline<E>
where
    E: RecordExtractor,
{
    /// Extraction stage implementation
    extractor: E,

    /// Admission and run parameters
    config: HarvestConfig,
}

impl<E> HarvestPipeline<E>
where
    E: RecordExtractor,
{
    pub fn new(extractor: E, config: HarvestConfig) -> Self {
        Self { extractor, config }
    }

    /// Runs the pipeline, truncating or creating `output` first.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if pagination fails or the output cannot be
    /// written. Documents written before the failure remain valid lines.
    pub async fn run<S: RecordSource>(
        &self,
        source: &mut S,
        output: &Path,
    ) -> Result<HarvestReport, PipelineError> {
        let file = File::create(output)?;
        info!(path = %output.display(), "Writing corpus");
        self.run_to_writer(source, BufWriter::new(file)).await
    }

    /// Runs the pipeline against an arbitrary writer.
    pub async fn run_to_writer<S: RecordSource, W: Write>(
        &self,
        source: &mut S,
        mut writer: W,
    ) -> Result<HarvestReport, PipelineError> {
        let start = Instant::now();
        let mut report = HarvestReport::default();

        while report.kept < self.config.max_records {
            let Some(record) = source.next_record().await? else {
                break;
            };
            report.records_seen += 1;

            let outcome = match self.extractor.extract(&record) {
                Some(fields) => admit(&fields, &self.config).map_err(|reason| (fields.id, reason)),
                None => {
                    warn!(
                        stage = self.extractor.stage_name(),
                        "Record without usable header"
                    );
                    Err((String::new(), RejectionReason::NoTitle))
                }
            };

            match outcome {
                Ok(doc) => {
                    writeln!(writer, "{}", doc.to_json_line()?)?;
                    writer.flush()?;
                    report.kept += 1;
                }
                Err((id, reason)) => {
                    debug!(id = %id, reason = %reason, "Record rejected");
                    report.rejected.record(reason);
                }
            }
        }

        if report.kept >= self.config.max_records {
            info!(max_records = self.config.max_records, "Record cap reached");
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            kept = report.kept,
            seen = report.records_seen,
            rejected = report.rejected.total(),
            duration_ms = report.duration_ms,
            "Harvest completed"
        );
        Ok(report)
    }
}

/// Harvests `transport` into `output` with the Dublin Core extractor.
pub async fn harvest<T: OaiTransport>(
    transport: T,
    request: ListRecordsRequest,
    output: &Path,
    config: HarvestConfig,
) -> Result<HarvestReport, PipelineError> {
    let mut stream = list_records(transport, request);
    HarvestPipeline::new(crate::harvest::DublinCoreExtractor, config)
        .run(&mut stream, output)
        .await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{page_xml, MockRepository};
    use crate::harvest::heuristics::keyword_in_text;
    use crate::harvest::traits::{MetadataElement, RawRecord, RecordHeader, Vocabulary};
    use crate::harvest::DublinCoreExtractor;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // In-memory source that counts pulls
    struct VecSource {
        items: VecDeque<Result<RawRecord, OaiError>>,
        pulled: usize,
    }

    impl VecSource {
        fn new(records: Vec<RawRecord>) -> Self {
            Self {
                items: records.into_iter().map(Ok).collect(),
                pulled: 0,
            }
        }
    }

    #[async_trait]
    impl RecordSource for VecSource {
        async fn next_record(&mut self) -> Result<Option<RawRecord>, OaiError> {
            self.pulled += 1;
            self.items.pop_front().transpose()
        }
    }

    // Extractor wrapper that counts calls
    struct CountingExtractor {
        calls: AtomicUsize,
    }

    impl RecordExtractor for CountingExtractor {
        fn extract(&self, record: &RawRecord) -> Option<ExtractedFields> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DublinCoreExtractor.extract(record)
        }

        fn stage_name(&self) -> &'static str {
            "counting_extractor"
        }
    }

    fn dc(name: &str, text: &str, lang: Option<&str>) -> MetadataElement {
        MetadataElement {
            vocabulary: Vocabulary::DublinCore,
            name: name.to_string(),
            lang: lang.map(str::to_string),
            text: text.to_string(),
        }
    }

    fn record(id: &str, metadata: Vec<MetadataElement>) -> RawRecord {
        RawRecord {
            header: Some(RecordHeader {
                identifier: Some(id.to_string()),
                ..RecordHeader::default()
            }),
            metadata,
        }
    }

    const TITLE: &str = "Monetary Policy Transmission in the Euro Area"; // 45 chars
    const ABSTRACT: &str = "We estimate how monetary policy shocks propagate to bank lending \
                            rates and credit volumes across member states after 2008.";

    fn acceptable(id: &str) -> RawRecord {
        record(
            id,
            vec![
                dc("title", TITLE, Some("en")),
                dc("description", ABSTRACT, Some("en")),
                dc("subject", "Monetary Policy", None),
                dc("subject", "bank lending", None),
                dc("language", "en", None),
            ],
        )
    }

    fn fields(title: Option<&str>, abs: Option<&str>, keywords: &[&str]) -> ExtractedFields {
        ExtractedFields {
            id: "oai:x:1".to_string(),
            title: title.map(str::to_string),
            abstract_text: abs.map(str::to_string),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            lang_ok: true,
        }
    }

    #[test]
    fn test_compose_text() {
        assert_eq!(compose_text("Title", None), "Title");
        assert_eq!(compose_text("Title", Some("Body")), "Title — Body");
    }

    #[test]
    fn test_admit_accepts_and_sorts_keywords() {
        let config = HarvestConfig::default().with_min_text_chars(10);
        let f = fields(
            Some(TITLE),
            Some(ABSTRACT),
            &["monetary policy", "Euro Area", "bank lending", "Bank Lending"],
        );

        let doc = admit(&f, &config).unwrap();
        assert_eq!(doc.doc_id, "oai:x:1");
        assert_eq!(doc.text, format!("{TITLE} — {ABSTRACT}"));
        assert_eq!(
            doc.keywords,
            vec!["bank lending", "Euro Area", "monetary policy"]
        );
    }

    #[test]
    fn test_admit_rejection_order() {
        let config = HarvestConfig::default().with_min_text_chars(10);

        assert_eq!(
            admit(&fields(None, Some(ABSTRACT), &["bank lending"]), &config),
            Err(RejectionReason::NoTitle)
        );

        let mut foreign = fields(Some("short"), None, &[]);
        foreign.lang_ok = false;
        assert_eq!(admit(&foreign, &config), Err(RejectionReason::LangFiltered));

        assert_eq!(
            admit(&fields(Some("short"), None, &["bank lending"]), &config),
            Err(RejectionReason::ShortText)
        );
        assert_eq!(
            admit(&fields(Some(TITLE), None, &["Geldpolitik öffentlich", "ab"]), &config),
            Err(RejectionReason::NoKeywords)
        );
        assert_eq!(
            admit(&fields(Some(TITLE), None, &["inflation targeting"]), &config),
            Err(RejectionReason::NoKwInText)
        );
        assert_eq!(
            admit(
                &fields(Some(TITLE), None, &["monetary policy"]),
                &config.clone().with_min_kws_present(2)
            ),
            Err(RejectionReason::MinKws)
        );
    }

    #[test]
    fn test_admit_without_presence_requirement() {
        let config = HarvestConfig::default()
            .with_min_text_chars(10)
            .with_require_kw_in_text(false);
        let doc = admit(&fields(Some(TITLE), None, &["inflation targeting"]), &config).unwrap();
        assert_eq!(doc.keywords, vec!["inflation targeting"]);
    }

    #[test]
    fn test_admit_multiword_only() {
        let config = HarvestConfig::default()
            .with_min_text_chars(10)
            .with_multiword_only(true);
        let doc = admit(&fields(Some(TITLE), None, &["Euro", "monetary policy"]), &config).unwrap();
        assert_eq!(doc.keywords, vec!["monetary policy"]);
    }

    #[test]
    fn test_min_kws_checked_after_presence_filter() {
        let config = HarvestConfig::default()
            .with_min_text_chars(10)
            .with_min_kws_present(2);
        let f = fields(Some(TITLE), None, &["monetary policy", "inflation targeting"]);
        assert_eq!(admit(&f, &config), Err(RejectionReason::MinKws));
        assert!(admit(&f, &config.clone().with_require_kw_in_text(false)).is_ok());
    }

    #[test]
    fn test_stats_serialize_in_chain_order() {
        let mut stats = RejectionStats::default();
        stats.record(RejectionReason::ShortText);
        stats.record(RejectionReason::ShortText);
        stats.record(RejectionReason::NoTitle);

        assert_eq!(stats.total(), 3);
        assert_eq!(
            serde_json::to_string(&stats).unwrap(),
            r#"{"no_title":1,"lang_filtered":0,"short_text":2,"no_keywords":0,"no_kw_in_text":0,"min_kws":0}"#
        );
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        // (3) title + abstract totalling exactly 200 characters
        let title3 = "Monetary Policy and Bank Lending in Europe";
        let abstract3 = "a".repeat(200 - title3.chars().count() - TEXT_SEPARATOR.chars().count());
        let records = vec![
            // (1) no title
            record("oai:x:1", vec![dc("subject", "Monetary Policy", None)]),
            // (2) English title, German-only keyword
            record(
                "oai:x:2",
                vec![
                    dc("title", TITLE, Some("en")),
                    dc("description", ABSTRACT, Some("en")),
                    dc("subject", "Geldpolitik in Europa für Anfänger", None),
                ],
            ),
            record(
                "oai:x:3",
                vec![
                    dc("title", title3, Some("en")),
                    dc("description", &abstract3, Some("en")),
                    dc("subject", "Monetary Policy", None),
                ],
            ),
            // (4) 50-character title, no abstract
            record(
                "oai:x:4",
                vec![dc("title", &"t".repeat(50), Some("en")), dc("subject", "Monetary Policy", None)],
            ),
        ];
        let text3 = compose_text(title3, Some(&abstract3));
        assert_eq!(text3.chars().count(), 200);

        let pipeline = HarvestPipeline::new(
            DublinCoreExtractor,
            HarvestConfig::default().with_min_text_chars(150),
        );
        let mut out = Vec::new();
        let report = pipeline
            .run_to_writer(&mut VecSource::new(records), &mut out)
            .await
            .unwrap();

        assert_eq!(report.kept, 1);
        assert_eq!(report.records_seen, 4);
        assert_eq!(report.rejected.get(RejectionReason::NoTitle), 1);
        assert_eq!(report.rejected.get(RejectionReason::NoKeywords), 1);
        assert_eq!(report.rejected.get(RejectionReason::ShortText), 1);
        assert_eq!(report.rejected.get(RejectionReason::LangFiltered), 0);
        assert_eq!(report.rejected.get(RejectionReason::NoKwInText), 0);
        assert_eq!(report.rejected.get(RejectionReason::MinKws), 0);

        let output = String::from_utf8(out).unwrap();
        let doc: CorpusDocument = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(doc.doc_id, "oai:x:3");
        assert_eq!(doc.text, text3);
        assert_eq!(doc.keywords, vec!["Monetary Policy"]);
    }

    #[tokio::test]
    async fn test_early_stop_skips_remaining_records() {
        let extractor = CountingExtractor {
            calls: AtomicUsize::new(0),
        };
        let pipeline = HarvestPipeline::new(
            extractor,
            HarvestConfig::default().with_max_records(1),
        );
        let mut source = VecSource::new(vec![acceptable("a"), acceptable("b"), acceptable("c")]);
        let mut out = Vec::new();

        let report = pipeline.run_to_writer(&mut source, &mut out).await.unwrap();

        assert_eq!(report.kept, 1);
        assert_eq!(pipeline.extractor.calls.load(Ordering::SeqCst), 1);
        assert_eq!(source.pulled, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[tokio::test]
    async fn test_zero_cap_pulls_nothing() {
        let pipeline =
            HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default().with_max_records(0));
        let mut source = VecSource::new(vec![acceptable("a")]);
        let report = pipeline
            .run_to_writer(&mut source, Vec::new())
            .await
            .unwrap();
        assert_eq!(report.kept, 0);
        assert_eq!(source.pulled, 0);
    }

    #[tokio::test]
    async fn test_headerless_record_counts_as_no_title() {
        let pipeline = HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default());
        let mut source = VecSource::new(vec![RawRecord::default()]);
        let report = pipeline
            .run_to_writer(&mut source, Vec::new())
            .await
            .unwrap();
        assert_eq!(report.rejected.get(RejectionReason::NoTitle), 1);
        assert_eq!(report.rejected.total(), 1);
    }

    #[tokio::test]
    async fn test_accepted_documents_satisfy_invariants() {
        let mut noisy = acceptable("n");
        noisy.metadata.push(dc("subject", "BANK LENDING", None));
        noisy.metadata.push(dc("subject", "credit volumes", None));
        noisy.metadata.push(dc("subject", "rate", None));
        let pipeline = HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default());
        let mut out = Vec::new();
        pipeline
            .run_to_writer(&mut VecSource::new(vec![acceptable("a"), noisy]), &mut out)
            .await
            .unwrap();

        let output = String::from_utf8(out).unwrap();
        let docs: Vec<CorpusDocument> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
        for doc in &docs {
            for kw in &doc.keywords {
                assert!(keyword_in_text(kw, &doc.text), "{kw} not in text");
            }
            let lowered: Vec<String> = doc.keywords.iter().map(|k| k.to_lowercase()).collect();
            let mut sorted = lowered.clone();
            sorted.sort();
            sorted.dedup();
            assert_eq!(lowered, sorted);
        }
        assert_eq!(
            docs[1].keywords,
            vec!["bank lending", "credit volumes", "Monetary Policy"]
        );
    }

    #[tokio::test]
    async fn test_fatal_error_keeps_written_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut source = VecSource::new(vec![acceptable("a")]);
        source
            .items
            .push_back(Err(OaiError::Transport("connection reset".to_string())));

        let pipeline = HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default());
        let result = pipeline.run(&mut source, &path).await;

        assert!(matches!(result, Err(PipelineError::Oai(_))));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.ends_with('\n'));
        let doc: CorpusDocument = serde_json::from_str(written.trim_end()).unwrap();
        assert_eq!(doc.doc_id, "a");
    }

    #[tokio::test]
    async fn test_run_truncates_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(&path, "stale line\nanother stale line\n").unwrap();

        let pipeline = HarvestPipeline::new(DublinCoreExtractor, HarvestConfig::default());
        let report = pipeline
            .run(&mut VecSource::new(vec![acceptable("a")]), &path)
            .await
            .unwrap();

        assert_eq!(report.kept, 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale"));
        assert_eq!(written.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_harvest_over_paginated_repository() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let repo = MockRepository::new(vec![
            page_xml(&["a", "b"], Some("T1")),
            page_xml(&["c"], None),
        ]);

        // Mock titles are short and carry no subjects.
        let report = harvest(
            repo,
            ListRecordsRequest::default().with_delay(Duration::ZERO),
            &path,
            HarvestConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.kept, 0);
        assert_eq!(report.records_seen, 3);
        assert_eq!(report.rejected.get(RejectionReason::ShortText), 3);
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }
}
