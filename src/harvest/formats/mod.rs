//! Metadata format implementations.
//!
//! - `oai_dc` - OAI-PMH `ListRecords` envelopes carrying Dublin Core metadata

pub mod oai_dc;

pub use oai_dc::{parse_list_records, DublinCoreExtractor, ListRecordsPage};
