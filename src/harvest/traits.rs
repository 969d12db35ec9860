//! Core traits and types for the record harvest system.
//!
//! This module defines the data that flows between harvest stages:
//! - Protocol-layer records via [`RawRecord`]
//! - Normalized per-record fields via [`ExtractedFields`]
//! - Stage abstractions via [`RecordSource`] and [`RecordExtractor`]

use async_trait::async_trait;

use crate::traits::OaiError;

// ============================================================================
// Raw Records
// ============================================================================

/// Metadata vocabulary an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vocabulary {
    /// Dublin Core elements (`http://purl.org/dc/elements/1.1/`)
    DublinCore,

    /// DCMI terms (`http://purl.org/dc/terms/`)
    DcTerms,
}

/// One repeated element inside a record's `<metadata>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataElement {
    /// Vocabulary the element was declared in
    pub vocabulary: Vocabulary,

    /// Local element name (e.g. `"title"`, `"subject"`)
    pub name: String,

    /// Value of the `xml:lang` attribute, if any
    pub lang: Option<String>,

    /// Element text, unescaped but not trimmed
    pub text: String,
}

/// OAI record header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordHeader {
    /// Unique OAI identifier. `None` when the header carries no `<identifier>`.
    pub identifier: Option<String>,

    /// Last-modified datestamp as sent by the repository
    pub datestamp: Option<String>,

    /// Sets this record belongs to
    pub set_specs: Vec<String>,

    /// `true` when the header carries `status="deleted"`
    pub deleted: bool,
}

/// Opaque protocol-layer unit returned by the repository.
///
/// Owned by the record source for one iteration step and handed to the
/// extractor by reference; it is not retained after extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Record header. `None` when the record has no `<header>` element.
    pub header: Option<RecordHeader>,

    /// Metadata elements in document order. Empty for deleted records.
    pub metadata: Vec<MetadataElement>,
}

impl RawRecord {
    /// Returns the elements named `name` from `vocabulary`, in document order.
    pub fn elements<'a>(
        &'a self,
        vocabulary: Vocabulary,
        name: &'a str,
    ) -> impl Iterator<Item = &'a MetadataElement> + 'a {
        self.metadata
            .iter()
            .filter(move |e| e.vocabulary == vocabulary && e.name == name)
    }

    /// Returns all `dc:` elements named `name` followed by all `dcterms:` ones.
    pub fn dc_elements<'a>(&'a self, name: &'a str) -> Vec<&'a MetadataElement> {
        self.elements(Vocabulary::DublinCore, name)
            .chain(self.elements(Vocabulary::DcTerms, name))
            .collect()
    }
}

// ============================================================================
// Extracted Fields
// ============================================================================

/// Normalized field set produced from one [`RawRecord`].
///
/// Created once per record, never mutated, discarded after filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    /// Header identifier, taken verbatim
    pub id: String,

    /// Best title among all language variants
    pub title: Option<String>,

    /// Best abstract among all description/abstract variants
    pub abstract_text: Option<String>,

    /// Subject terms, trimmed and deduplicated case-insensitively
    pub keywords: Vec<String>,

    /// Whether the declared languages admit the record
    pub lang_ok: bool,
}

// ============================================================================
// Stage Traits
// ============================================================================

/// Lazy, finite sequence of raw records.
///
/// Implementations are not restartable mid-stream: once `next_record`
/// returns `Ok(None)` the sequence is exhausted.
#[async_trait]
pub trait RecordSource: Send {
    /// Returns the next record, fetching more from the repository if needed.
    ///
    /// # Errors
    ///
    /// Any transport or protocol failure is fatal for the whole harvest.
    async fn next_record(&mut self) -> Result<Option<RawRecord>, OaiError>;
}

/// Maps a raw record into normalized fields.
pub trait RecordExtractor: Send + Sync {
    /// Extracts fields from `record`.
    ///
    /// Returns `None` when the record has no usable header.
    fn extract(&self, record: &RawRecord) -> Option<ExtractedFields>;

    /// Returns the name of this extractor stage.
    fn stage_name(&self) -> &'static str;
}

// ============================================================================
// Tests
// ============================================================================
