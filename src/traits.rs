use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OaiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed OAI-PMH response: {0}")]
    MalformedXml(String),
    #[error("OAI-PMH error '{code}': {message}")]
    Protocol { code: String, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait OaiTransport: Send + Sync {
    /// Returns the endpoint this transport talks to (used in logs).
    fn endpoint(&self) -> &str;

    /// Issues one request with the given query parameters and returns the raw XML body.
    async fn fetch(&self, params: &[(&'static str, String)]) -> Result<String, OaiError>;
}

#[async_trait]
impl<T: OaiTransport + ?Sized> OaiTransport for std::sync::Arc<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    async fn fetch(&self, params: &[(&'static str, String)]) -> Result<String, OaiError> {
        (**self).fetch(params).await
    }
}
