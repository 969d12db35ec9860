//! Harvest module - record extraction and admission pipeline.
//!
//! This module provides the core abstractions for the corpus harvester:
//! - **Traits**: [`RecordSource`], [`RecordExtractor`] for building the pipeline
//! - **Heuristics**: keyword validity, deduplication and whole-word matching
//! - **Formats**: OAI-PMH envelope parsing and Dublin Core extraction
//! - **Pipeline**: admission chain and executor via [`pipeline::HarvestPipeline`]

pub mod formats;
pub mod heuristics;
pub mod pipeline;
pub mod traits;

// Re-export commonly used types
pub use traits::{
    ExtractedFields, MetadataElement, RawRecord, RecordExtractor, RecordHeader, RecordSource,
    Vocabulary,
};

pub use formats::{parse_list_records, DublinCoreExtractor, ListRecordsPage};

pub use pipeline::{
    admit, compose_text, harvest, HarvestConfig, HarvestPipeline, HarvestReport, PipelineError,
    RejectionReason, RejectionStats,
};
