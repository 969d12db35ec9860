//! OAI-PMH envelope parsing and Dublin Core field extraction.
//!
//! [`parse_list_records`] turns one `ListRecords` response body into a
//! [`ListRecordsPage`]; [`DublinCoreExtractor`] maps each [`RawRecord`] to
//! [`ExtractedFields`] using the ordered selection policies from
//! [`heuristics`](crate::harvest::heuristics).

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::harvest::heuristics::{
    dedup_case_insensitive, is_english_tag, select_text, TextCandidate, ABSTRACT_POLICY,
    TITLE_POLICY,
};
use crate::harvest::traits::{
    ExtractedFields, MetadataElement, RawRecord, RecordExtractor, RecordHeader, Vocabulary,
};
use crate::traits::OaiError;

pub const OAI_NS: &[u8] = b"http://www.openarchives.org/OAI/2.0/";
pub const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";
pub const DCTERMS_NS: &[u8] = b"http://purl.org/dc/terms/";

/// OAI error code that signals an empty result rather than a failure.
const NO_RECORDS_MATCH: &str = "noRecordsMatch";

// ============================================================================
// Envelope Parsing
// ============================================================================

/// One page of a `ListRecords` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRecordsPage {
    /// Records in the order the repository sent them
    pub records: Vec<RawRecord>,

    /// Continuation token. `None` (or an empty token element) ends the listing.
    pub resumption_token: Option<String>,

    /// `completeListSize` attribute of the token element, if reported
    pub complete_list_size: Option<u64>,

    /// `cursor` attribute of the token element, if reported
    pub cursor: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Oai,
    Vocab(Vocabulary),
    Other,
}

impl Ns {
    fn of(resolved: &ResolveResult<'_>) -> Self {
        match resolved {
            ResolveResult::Bound(Namespace(uri)) if *uri == OAI_NS => Ns::Oai,
            ResolveResult::Bound(Namespace(uri)) if *uri == DC_NS => {
                Ns::Vocab(Vocabulary::DublinCore)
            }
            ResolveResult::Bound(Namespace(uri)) if *uri == DCTERMS_NS => {
                Ns::Vocab(Vocabulary::DcTerms)
            }
            _ => Ns::Other,
        }
    }
}

#[derive(Debug)]
enum Target {
    Identifier,
    Datestamp,
    SetSpec,
    Element(MetadataElement),
    Token,
    Error { code: String },
}

#[derive(Debug)]
struct Capture {
    target: Target,
    text: String,
    depth: usize,
}

#[derive(Debug, Default)]
struct PageBuilder {
    page: ListRecordsPage,
    saw_envelope: bool,
    closed_envelope: bool,
    record: Option<RawRecord>,
    in_header: bool,
    in_metadata: bool,
    capture: Option<Capture>,
    error: Option<(String, String)>,
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

impl PageBuilder {
    fn start(&mut self, ns: Ns, e: &BytesStart<'_>) {
        if let Some(capture) = self.capture.as_mut() {
            capture.depth += 1;
            return;
        }

        let local = e.local_name();
        let target = match (ns, local.as_ref()) {
            (Ns::Oai, b"OAI-PMH") => {
                self.saw_envelope = true;
                None
            }
            (Ns::Oai, b"record") => {
                self.record = Some(RawRecord::default());
                None
            }
            (Ns::Oai, b"header") => {
                if let Some(record) = self.record.as_mut() {
                    record.header = Some(RecordHeader {
                        deleted: attribute(e, b"status").as_deref() == Some("deleted"),
                        ..RecordHeader::default()
                    });
                    self.in_header = true;
                }
                None
            }
            (Ns::Oai, b"identifier") if self.in_header => Some(Target::Identifier),
            (Ns::Oai, b"datestamp") if self.in_header => Some(Target::Datestamp),
            (Ns::Oai, b"setSpec") if self.in_header => Some(Target::SetSpec),
            (Ns::Oai, b"metadata") => {
                self.in_metadata = self.record.is_some();
                None
            }
            (Ns::Vocab(vocabulary), name) if self.in_metadata => {
                Some(Target::Element(MetadataElement {
                    vocabulary,
                    name: String::from_utf8_lossy(name).into_owned(),
                    lang: attribute(e, b"xml:lang"),
                    text: String::new(),
                }))
            }
            (Ns::Oai, b"resumptionToken") => {
                self.page.complete_list_size =
                    attribute(e, b"completeListSize").and_then(|v| v.parse().ok());
                self.page.cursor = attribute(e, b"cursor").and_then(|v| v.parse().ok());
                Some(Target::Token)
            }
            (Ns::Oai, b"error") => Some(Target::Error {
                code: attribute(e, b"code").unwrap_or_default(),
            }),
            _ => None,
        };

        self.capture = target.map(|target| Capture {
            target,
            text: String::new(),
            depth: 0,
        });
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.push_str(text);
        }
    }

    fn end(&mut self, ns: Ns, local: &[u8]) {
        if let Some(mut capture) = self.capture.take() {
            if capture.depth > 0 {
                capture.depth -= 1;
                self.capture = Some(capture);
            } else {
                self.finish(capture);
            }
            return;
        }

        match (ns, local) {
            (Ns::Oai, b"OAI-PMH") => self.closed_envelope = true,
            (Ns::Oai, b"header") => self.in_header = false,
            (Ns::Oai, b"metadata") => self.in_metadata = false,
            (Ns::Oai, b"record") => {
                if let Some(record) = self.record.take() {
                    self.page.records.push(record);
                }
                self.in_header = false;
                self.in_metadata = false;
            }
            _ => {}
        }
    }

    fn finish(&mut self, capture: Capture) {
        let trimmed = capture.text.trim();
        let header = self
            .record
            .as_mut()
            .and_then(|record| record.header.as_mut());

        match capture.target {
            Target::Identifier => {
                if let Some(header) = header {
                    header.identifier = (!trimmed.is_empty()).then(|| trimmed.to_string());
                }
            }
            Target::Datestamp => {
                if let Some(header) = header {
                    header.datestamp = (!trimmed.is_empty()).then(|| trimmed.to_string());
                }
            }
            Target::SetSpec => {
                if let (Some(header), false) = (header, trimmed.is_empty()) {
                    header.set_specs.push(trimmed.to_string());
                }
            }
            Target::Element(mut element) => {
                if let Some(record) = self.record.as_mut() {
                    element.text = capture.text;
                    record.metadata.push(element);
                }
            }
            Target::Token => {
                self.page.resumption_token = (!trimmed.is_empty()).then(|| trimmed.to_string());
            }
            Target::Error { code } => {
                if code != NO_RECORDS_MATCH && self.error.is_none() {
                    self.error = Some((code, trimmed.to_string()));
                }
            }
        }
    }

    fn build(self) -> Result<ListRecordsPage, OaiError> {
        if let Some((code, message)) = self.error {
            return Err(OaiError::Protocol { code, message });
        }
        if !self.saw_envelope {
            return Err(OaiError::MalformedXml(
                "missing OAI-PMH root element".to_string(),
            ));
        }
        if !self.closed_envelope || self.record.is_some() || self.capture.is_some() {
            return Err(OaiError::MalformedXml(
                "document ended before the OAI-PMH root was closed".to_string(),
            ));
        }
        Ok(self.page)
    }
}

/// Parses one `ListRecords` response body.
///
/// # Errors
///
/// Returns [`OaiError::MalformedXml`] if the body is not well-formed XML or
/// is not an OAI-PMH envelope, and [`OaiError::Protocol`] for any OAI error
/// other than `noRecordsMatch` (which yields an empty final page).
pub fn parse_list_records(xml: &str) -> Result<ListRecordsPage, OaiError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut builder = PageBuilder::default();

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| OaiError::MalformedXml(e.to_string()))?;
        let ns = Ns::of(&resolved);

        match event {
            Event::Start(e) => builder.start(ns, &e),
            Event::Empty(e) => {
                builder.start(ns, &e);
                builder.end(ns, e.local_name().as_ref());
            }
            Event::End(e) => builder.end(ns, e.local_name().as_ref()),
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| OaiError::MalformedXml(e.to_string()))?;
                builder.text(&text);
            }
            Event::CData(c) => builder.text(&String::from_utf8_lossy(&c)),
            Event::Eof => break,
            _ => {}
        }
    }

    builder.build()
}

// ============================================================================
// Dublin Core Extractor
// ============================================================================

/// Extracts corpus fields from `oai_dc` records.
///
/// - Identifier: header identifier, verbatim
/// - Title: [`TITLE_POLICY`] over `title` elements
/// - Abstract: [`ABSTRACT_POLICY`] over `description` then `abstract` elements
/// - Keywords: all `subject` elements, trimmed and deduplicated
/// - `lang_ok`: no `language` declared, or at least one English tag declared
#[derive(Debug, Clone, Copy, Default)]
pub struct DublinCoreExtractor;

fn candidates<'a>(elements: &[&'a MetadataElement]) -> Vec<TextCandidate<'a>> {
    elements
        .iter()
        .map(|e| TextCandidate {
            text: e.text.as_str(),
            lang: e.lang.as_deref(),
        })
        .collect()
}

impl RecordExtractor for DublinCoreExtractor {
    fn extract(&self, record: &RawRecord) -> Option<ExtractedFields> {
        let id = record.header.as_ref()?.identifier.clone()?;

        let titles = record.dc_elements("title");
        let mut descriptions = record.dc_elements("description");
        descriptions.extend(record.dc_elements("abstract"));

        let languages: Vec<&str> = record
            .dc_elements("language")
            .into_iter()
            .map(|e| e.text.trim())
            .filter(|l| !l.is_empty())
            .collect();
        let lang_ok = languages.is_empty() || languages.iter().any(|l| is_english_tag(l));

        let keywords = dedup_case_insensitive(
            record
                .dc_elements("subject")
                .into_iter()
                .map(|e| e.text.trim())
                .filter(|s| !s.is_empty()),
        );

        Some(ExtractedFields {
            id,
            title: select_text(&candidates(&titles), TITLE_POLICY),
            abstract_text: select_text(&candidates(&descriptions), ABSTRACT_POLICY),
            keywords,
            lang_ok,
        })
    }

    fn stage_name(&self) -> &'static str {
        "oai_dc_extractor"
    }
}

// ============================================================================
// Tests
// ============================================================================
