//! Knowledge-base and document endpoints.

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tokio::time::Instant;

use super::{ensure_success, unwrap_envelope, ClientError, IbotClient};
use crate::error::{classify_reqwest_error, NetworkError};
use crate::models::{
    CreateKnowledgeBaseRequest, Document, IdRequest, KnowledgeBase, ListDocumentsRequest,
    UploadedDocument,
};

impl IbotClient {
    /// List all knowledge bases.
    pub async fn list_knowledge_bases(&self) -> Result<Vec<KnowledgeBase>, ClientError> {
        let data = self
            .post_json::<_, Vec<KnowledgeBase>>("/dataset/read", &serde_json::json!({}))
            .await?;
        Ok(data.unwrap_or_default())
    }

    /// Create a knowledge base owned by this client's user.
    pub async fn create_knowledge_base(
        &self,
        name: &str,
        description: &str,
    ) -> Result<(), ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidInput(
                "knowledge base name must not be empty".to_string(),
            ));
        }

        let request = CreateKnowledgeBaseRequest {
            name: name.to_string(),
            description: description.to_string(),
            user_id: self.user_id,
        };
        self.post_json::<_, serde_json::Value>("/dataset/create", &request)
            .await?;
        tracing::info!(name = %name, "knowledge base created");
        Ok(())
    }

    /// Delete a knowledge base and every document in it.
    pub async fn delete_knowledge_base(&self, id: i64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>("/dataset/delete", &IdRequest { id })
            .await?;
        tracing::info!(id, "knowledge base deleted");
        Ok(())
    }

    /// List the documents of one knowledge base.
    pub async fn list_documents(&self, knowledge_base_id: i64) -> Result<Vec<Document>, ClientError> {
        let data = self
            .post_json::<_, Vec<Document>>(
                "/document/read",
                &ListDocumentsRequest { knowledge_base_id },
            )
            .await?;
        Ok(data.unwrap_or_default())
    }

    /// Upload a file into a knowledge base. Parsing is not started.
    pub async fn upload_document(
        &self,
        knowledge_base_id: i64,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadedDocument, ClientError> {
        let url = self.url("/document/upload");
        let form = Form::new()
            .part("file", Part::bytes(contents).file_name(file_name.to_string()))
            .text("knowledge_base_id", knowledge_base_id.to_string());

        tracing::info!(knowledge_base_id, file_name = %file_name, "uploading document");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, false))?;

        let response = ensure_success(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, true))?;

        unwrap_envelope::<UploadedDocument>(&bytes)?.ok_or_else(|| {
            ClientError::Network(NetworkError::InvalidResponse {
                message: "upload response carried no document id".to_string(),
            })
        })
    }

    /// Start parsing an uploaded document.
    pub async fn start_parse(&self, document_id: i64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>("/document/parse/start", &IdRequest { id: document_id })
            .await?;
        Ok(())
    }

    /// Drop a document's parsed data and parse it again.
    pub async fn reparse(&self, document_id: i64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>(
            "/document/parse/reparse",
            &IdRequest { id: document_id },
        )
        .await?;
        Ok(())
    }

    pub async fn delete_document(&self, document_id: i64) -> Result<(), ClientError> {
        self.post_json::<_, serde_json::Value>("/document/delete", &IdRequest { id: document_id })
            .await?;
        Ok(())
    }

    /// Download a document's original file.
    ///
    /// This endpoint returns raw bytes, not the JSON envelope.
    pub async fn download_document(&self, document_id: i64) -> Result<Bytes, ClientError> {
        let url = self.url("/document/download");
        let response = self
            .client
            .post(&url)
            .json(&IdRequest { id: document_id })
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, false))?;

        let response = ensure_success(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, true))?;

        if bytes.is_empty() {
            return Err(ClientError::EmptyDownload { id: document_id });
        }
        Ok(bytes)
    }

    /// Poll a knowledge base until a document has finished parsing.
    ///
    /// Returns the document once its status is `completed` or `failed`.
    /// A document missing from the listing fails with
    /// `ClientError::DocumentNotFound`. With a `timeout`, gives up with
    /// `NetworkError::Timeout`.
    pub async fn wait_for_parse(
        &self,
        knowledge_base_id: i64,
        document_id: i64,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let started = Instant::now();
        loop {
            let documents = self.list_documents(knowledge_base_id).await?;
            match documents.into_iter().find(|d| d.id == document_id) {
                Some(doc) if doc.status.is_settled() => return Ok(doc),
                Some(doc) => {
                    tracing::debug!(document_id, status = doc.status.as_str(), "document still parsing")
                }
                None => {
                    return Err(ClientError::DocumentNotFound {
                        knowledge_base_id,
                        document_id,
                    })
                }
            }

            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(NetworkError::Timeout {
                        operation: "Document parsing".to_string(),
                        duration: limit,
                    }
                    .into());
                }
            }
            tokio::time::sleep(interval).await;
        }
    }
}
