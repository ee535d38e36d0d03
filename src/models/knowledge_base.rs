use serde::{Deserialize, Deserializer, Serialize};

/// A knowledge base (dataset) on the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub created_at: String,
}

/// Parse state of an uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentStatus {
    #[default]
    Pending,
    Parsing,
    Completed,
    Failed,
    /// Any status string this client does not know
    Other(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Parsing => "parsing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Other(s) => s,
        }
    }

    /// Parsing has finished, successfully or not
    pub fn is_settled(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Failed)
    }
}

impl From<&str> for DocumentStatus {
    fn from(s: &str) -> Self {
        match s {
            "pending" => DocumentStatus::Pending,
            "parsing" | "processing" => DocumentStatus::Parsing,
            "completed" => DocumentStatus::Completed,
            "failed" => DocumentStatus::Failed,
            other => DocumentStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for DocumentStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DocumentStatus::from(s.as_str()))
    }
}

/// A document stored in a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub chunk_count: u64,
    #[serde(default)]
    pub created_at: String,
}

/// `data` of a successful upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedDocument {
    pub id: i64,
}

/// Response envelope shared by every REST endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    /// Missing or `null` both read as `None`
    pub data: Option<T>,
}

/// Envelope code for success
pub const API_SUCCESS_CODE: i64 = 200;

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.code == API_SUCCESS_CODE
    }
}
