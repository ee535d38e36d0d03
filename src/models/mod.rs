mod conversation;
mod knowledge_base;
mod request;
mod turn;

pub use conversation::{Conversation, Exchange, TurnId};
pub use knowledge_base::{
    ApiResponse, Document, DocumentStatus, KnowledgeBase, UploadedDocument, API_SUCCESS_CODE,
};
pub use request::{
    ChatRequest, CreateKnowledgeBaseRequest, IdRequest, ListDocumentsRequest, DEFAULT_TOP_K,
};
pub use turn::{ConversationTurn, TurnStatus};
