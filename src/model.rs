use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub doc_id: String,
    pub text: String,
    pub keywords: Vec<String>, // sorted case-insensitively
}

impl CorpusDocument {
    /// Serializes the document as one JSONL line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub doc_id: String, // stringified index into the gold split
    pub predicted_keywords: Vec<String>,
}
