//! HTTP client for the ibot knowledge-base backend.
//!
//! Provides the streaming chat endpoint (Server-Sent Events) and the REST
//! endpoints for knowledge bases and their documents.

mod chat;
mod knowledge;

pub use chat::{ByteStream, CancelHandle, ChatStream, DriveOutcome};

use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{classify_reqwest_error, ErrorCategory, NetworkError};
use crate::models::{ApiResponse, ChatRequest};

pub const DEFAULT_BASE_URL: &str = "http://localhost:18080/b/ibot";

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, HTTP status, broken body)
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Backend answered with an envelope `code` other than 200
    #[error("API error (code {code}): {message}")]
    Api { code: i64, message: String },
    /// Arguments rejected before any request was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Download succeeded but returned no bytes
    #[error("Downloaded document {id} is empty")]
    EmptyDownload { id: i64 },
    /// A document is not listed in the knowledge base it was looked up in
    #[error("Document {document_id} not found in knowledge base {knowledge_base_id}")]
    DocumentNotFound {
        knowledge_base_id: i64,
        document_id: i64,
    },
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::Network(err) => err.category(),
            ClientError::Api { .. } | ClientError::EmptyDownload { .. } => ErrorCategory::Backend,
            ClientError::InvalidInput(_) | ClientError::DocumentNotFound { .. } => {
                ErrorCategory::User
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(err) => err.user_message(),
            ClientError::Api { message, .. } => message.clone(),
            ClientError::InvalidInput(message) => message.clone(),
            ClientError::EmptyDownload { .. } => "The downloaded file is empty.".to_string(),
            ClientError::DocumentNotFound { .. } => self.to_string(),
        }
    }
}

/// Client for the ibot backend API.
#[derive(Debug, Clone)]
pub struct IbotClient {
    /// Base URL, e.g. `http://localhost:18080/b/ibot`
    pub base_url: String,
    /// Owner recorded on knowledge bases this client creates
    pub user_id: i64,
    /// Reusable HTTP client
    client: Client,
}

impl IbotClient {
    /// Create a new client with the default base URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: 1,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_base_url(config.base_url.clone()).with_user_id(config.user_id)
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Stream an answer from `/rag/chat`.
    ///
    /// A connect failure or non-2xx status is returned as
    /// `ClientError::Network`; once this returns `Ok`, failures surface
    /// through the returned [`ChatStream`].
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatStream, ClientError> {
        let url = self.url("/rag/chat");
        tracing::info!(
            knowledge_base_id = request.knowledge_base_id,
            top_k = request.top_k,
            "starting chat stream"
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, false))?;

        let response = ensure_success(response).await?;

        let body_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| classify_reqwest_error(&e, &body_url, true)));

        Ok(ChatStream::from_body(body))
    }

    /// POST a JSON body and unwrap the `{code, msg, data}` envelope.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<Option<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, false))?;

        let response = ensure_success(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e, &url, true))?;
        unwrap_envelope(&bytes)
    }
}

impl Default for IbotClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a non-2xx response into `NetworkError::HttpStatus` carrying the body text.
async fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = if text.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text
    };
    Err(NetworkError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

fn unwrap_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>, ClientError> {
    let envelope: ApiResponse<T> =
        serde_json::from_slice(bytes).map_err(|e| NetworkError::InvalidResponse {
            message: e.to_string(),
        })?;

    if envelope.is_success() {
        Ok(envelope.data)
    } else {
        let message = envelope
            .msg
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Request failed".to_string());
        tracing::warn!(code = envelope.code, message = %message, "backend rejected request");
        Err(ClientError::Api {
            code: envelope.code,
            message,
        })
    }
}
