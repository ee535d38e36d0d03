//! Plain line-based output for CLI commands.

use color_eyre::Report;

use crate::client::ClientError;
use crate::config::ConfigError;
use crate::error::{ErrorCategory, StreamError};
use crate::models::{Document, KnowledgeBase};
use crate::sse::SourceDocument;

/// Line width for separators.
const LINE_WIDTH: usize = 60;

/// Status icons
pub mod icons {
    pub const SUCCESS: &str = "✓";
    pub const FAILURE: &str = "✗";
    pub const WARNING: &str = "⚠";
}

/// Format a byte count the way file pickers do (`1.5 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn separator() -> String {
    "─".repeat(LINE_WIDTH)
}

pub fn knowledge_base_lines(bases: &[KnowledgeBase]) -> Vec<String> {
    if bases.is_empty() {
        return vec!["No knowledge bases.".to_string()];
    }
    let mut lines = vec![format!("{:>6}  {:<24} {:>6}  {}", "ID", "NAME", "DOCS", "DESCRIPTION")];
    lines.extend(bases.iter().map(|kb| {
        format!(
            "{:>6}  {:<24} {:>6}  {}",
            kb.id, kb.name, kb.doc_count, kb.description
        )
    }));
    lines
}

pub fn document_lines(documents: &[Document]) -> Vec<String> {
    if documents.is_empty() {
        return vec!["No documents.".to_string()];
    }
    let mut lines = vec![format!(
        "{:>6}  {:<32} {:>10}  {:<10} {:>6}",
        "ID", "NAME", "SIZE", "STATUS", "CHUNKS"
    )];
    lines.extend(documents.iter().map(|doc| {
        format!(
            "{:>6}  {:<32} {:>10}  {:<10} {:>6}",
            doc.id,
            doc.name,
            format_size(doc.file_size),
            doc.status.as_str(),
            doc.chunk_count
        )
    }));
    lines
}

/// Lines listing where an answer came from, best match first.
pub fn source_lines(sources: &[SourceDocument]) -> Vec<String> {
    let mut lines = vec![separator(), "Sources:".to_string()];
    lines.extend(
        sources
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("  [{}] {} (id {})", i + 1, doc.download_name(), doc.id)),
    );
    lines
}

/// Report for a failed answer, followed by a recovery hint.
///
/// Backend errors are shown as the backend worded them; transport errors
/// get the connection-level message.
pub fn stream_error_line(error: &StreamError) -> String {
    let line = match error {
        StreamError::Application { message } => {
            format!("{} The assistant reported an error: {}", icons::FAILURE, message)
        }
        StreamError::Transport(err) => {
            format!("{} Connection problem: {}", icons::WARNING, err.user_message())
        }
    };
    format!("{}\n{}", line, hint_line(error.category()))
}

/// Text printed for a command that failed.
///
/// Client and config errors anywhere in the chain add their category's
/// recovery hint.
pub fn error_report(report: &Report) -> String {
    let category = report.chain().find_map(|err| {
        if let Some(client) = err.downcast_ref::<ClientError>() {
            Some(client.category())
        } else {
            err.downcast_ref::<ConfigError>()
                .map(|_| ErrorCategory::Configuration)
        }
    });
    match category {
        Some(category) => format!("{:#}\n{}", report, hint_line(category)),
        None => format!("{:#}", report),
    }
}

fn hint_line(category: ErrorCategory) -> String {
    format!("  {}.", category.recovery_hint())
}
