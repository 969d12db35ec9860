use crate::harvest::formats::parse_list_records;
use crate::harvest::traits::{RawRecord, RecordSource};
use crate::traits::{OaiError, OaiTransport};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_BASE_URL: &str = "https://www.econstor.eu/oai/request";
pub const DEFAULT_METADATA_PREFIX: &str = "oai_dc";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(40);
pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(400);

/// Parameters of a `ListRecords` harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRecordsRequest {
    pub metadata_prefix: String,
    pub from: Option<String>,
    pub until: Option<String>,
    pub set_spec: Option<String>,
    pub inter_request_delay: Duration,
}

impl Default for ListRecordsRequest {
    fn default() -> Self {
        Self {
            metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
            from: None,
            until: None,
            set_spec: None,
            inter_request_delay: DEFAULT_INTER_REQUEST_DELAY,
        }
    }
}

impl ListRecordsRequest {
    pub fn with_metadata_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_prefix = prefix.into();
        self
    }

    pub fn with_from(mut self, from: Option<String>) -> Self {
        self.from = from;
        self
    }

    pub fn with_until(mut self, until: Option<String>) -> Self {
        self.until = until;
        self
    }

    pub fn with_set(mut self, set_spec: Option<String>) -> Self {
        self.set_spec = set_spec;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Query parameters of the initial request.
    pub fn initial_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("verb", "ListRecords".to_string()),
            ("metadataPrefix", self.metadata_prefix.clone()),
        ];
        if let Some(from) = &self.from {
            params.push(("from", from.clone()));
        }
        if let Some(until) = &self.until {
            params.push(("until", until.clone()));
        }
        if let Some(set) = &self.set_spec {
            params.push(("set", set.clone()));
        }
        params
    }

    /// Query parameters of a continuation request. The token is exclusive:
    /// every other filter is dropped once it is supplied.
    pub fn continuation_params(token: &str) -> Vec<(&'static str, String)> {
        vec![
            ("verb", "ListRecords".to_string()),
            ("resumptionToken", token.to_string()),
        ]
    }
}

/// OAI-PMH transport over HTTP.
pub struct HttpTransport {
    base_url: reqwest::Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport for `base_url`, which must be an absolute URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OaiError> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| OaiError::Transport(format!("invalid base URL '{base_url}': {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            client,
        })
    }
}

#[async_trait]
impl OaiTransport for HttpTransport {
    fn endpoint(&self) -> &str {
        self.base_url.as_str()
    }

    async fn fetch(&self, params: &[(&'static str, String)]) -> Result<String, OaiError> {
        let body = self
            .client
            .get(self.base_url.clone())
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

/// Lazy record sequence over a paginated `ListRecords` listing.
///
/// Every record of a page is yielded before the next page is requested.
/// Continuation requests carry only the resumption token and are preceded
/// by the configured delay. The listing ends when a page has no token.
pub struct RecordStream<T: OaiTransport> {
    transport: T,
    request: ListRecordsRequest,
    token: Option<String>,
    page: VecDeque<RawRecord>,
    started: bool,
    exhausted: bool,
    requests_issued: usize,
}

impl<T: OaiTransport> RecordStream<T> {
    pub fn new(transport: T, request: ListRecordsRequest) -> Self {
        Self {
            transport,
            request,
            token: None,
            page: VecDeque::new(),
            started: false,
            exhausted: false,
            requests_issued: 0,
        }
    }

    /// Number of requests sent so far, including the initial one.
    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    /// Number of requests sent with a resumption token.
    pub fn continuation_requests(&self) -> usize {
        self.requests_issued.saturating_sub(1)
    }

    #[instrument(skip(self))]
    async fn fetch_next_page(&mut self) -> Result<(), OaiError> {
        let params = match (&self.token, self.started) {
            (Some(token), true) => {
                if !self.request.inter_request_delay.is_zero() {
                    tokio::time::sleep(self.request.inter_request_delay).await;
                }
                ListRecordsRequest::continuation_params(token)
            }
            _ => self.request.initial_params(),
        };

        debug!(
            endpoint = self.transport.endpoint(),
            request = self.requests_issued + 1,
            "Requesting ListRecords page"
        );
        self.requests_issued += 1;
        self.started = true;
        let body = self.transport.fetch(&params).await?;
        let page = parse_list_records(&body)?;

        info!(
            records = page.records.len(),
            has_token = page.resumption_token.is_some(),
            cursor = page.cursor,
            complete_list_size = page.complete_list_size,
            "Fetched ListRecords page"
        );

        self.page.extend(page.records);
        self.exhausted = page.resumption_token.is_none();
        self.token = page.resumption_token;
        Ok(())
    }
}

#[async_trait]
impl<T: OaiTransport> RecordSource for RecordStream<T> {
    async fn next_record(&mut self) -> Result<Option<RawRecord>, OaiError> {
        loop {
            if let Some(record) = self.page.pop_front() {
                return Ok(Some(record));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_next_page().await?;
        }
    }
}

/// Starts a lazy `ListRecords` harvest over `transport`.
pub fn list_records<T: OaiTransport>(transport: T, request: ListRecordsRequest) -> RecordStream<T> {
    RecordStream::new(transport, request)
}
