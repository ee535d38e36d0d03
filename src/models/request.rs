use serde::{Deserialize, Serialize};

/// Default number of chunks retrieved per query
pub const DEFAULT_TOP_K: u32 = 5;

/// Request body for `/rag/chat`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    pub knowledge_base_id: i64,
    pub query: String,
    /// Number of retrieved chunks
    #[serde(rename = "k")]
    pub top_k: u32,
}

impl ChatRequest {
    pub fn new(knowledge_base_id: i64, query: impl Into<String>) -> Self {
        Self {
            knowledge_base_id,
            query: query.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }
}

/// Request body for `/dataset/create`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    pub description: String,
    pub user_id: i64,
}

/// Request body for endpoints that act on a single record
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct IdRequest {
    pub id: i64,
}

/// Request body for `/document/read`
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ListDocumentsRequest {
    pub knowledge_base_id: i64,
}
