//! SSE payload deserialization structs
//!
//! Contains internal structs used to deserialize the JSON documents carried
//! on `data: ` lines of the chat stream. Fields are lenient: a missing or
//! null field falls back to the value the event means when it is absent.

use serde::Deserialize;

use crate::sse::events::SourceDocument;

/// `{"type":"token","content":"..."}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenPayload {
    #[serde(default)]
    pub content: Option<String>,
}

/// `{"type":"search_complete","doc_count":N}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchCompletePayload {
    #[serde(default)]
    pub doc_count: Option<u64>,
}

/// `{"type":"sources","documents":[{"id":1,"name":"a.pdf"}]}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SourcesPayload {
    #[serde(default)]
    pub documents: Option<Vec<SourceDocument>>,
}

/// `{"type":"error","error":"..."}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_payload_null_documents() {
        let payload: SourcesPayload =
            serde_json::from_str(r#"{"type":"sources","documents":null}"#).unwrap();
        assert!(payload.documents.is_none());
    }

    #[test]
    fn test_source_document_without_name() {
        let payload: SourcesPayload =
            serde_json::from_str(r#"{"documents":[{"id":4}]}"#).unwrap();
        let docs = payload.documents.unwrap();
        assert_eq!(docs[0].id, 4);
        assert_eq!(docs[0].name, "");
    }

    #[test]
    fn test_token_payload_ignores_extra_fields() {
        let payload: TokenPayload =
            serde_json::from_str(r#"{"type":"token","content":"Hi","seq":3}"#).unwrap();
        assert_eq!(payload.content.as_deref(), Some("Hi"));
    }
}
