//! CLI module for ibot.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version display
//! - Running knowledge-base, document and chat commands
//!
//! # Usage
//!
//! ```ignore
//! use ibot::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! run_cli_command(command, &config).await?;
//! ```

pub mod args;
pub mod output;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, USAGE};
pub use version::{version_string, VERSION};

use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;

use crate::client::{CancelHandle, DriveOutcome, IbotClient};
use crate::config::ClientConfig;
use crate::models::{Document, DocumentStatus, TurnStatus};
use crate::session::ChatSession;
use crate::sse::{SourceDocument, StreamEvent};
use output::icons;

/// Run one parsed command against the backend described by `config`.
pub async fn run_cli_command(command: CliCommand, config: &ClientConfig) -> Result<()> {
    let client = IbotClient::from_config(config);

    match command {
        CliCommand::Version => println!("{}", version_string()),
        CliCommand::Help => println!("{}", USAGE),
        CliCommand::Chat {
            knowledge_base_id,
            query,
            top_k,
        } => {
            let mut session = ChatSession::from_config(config, knowledge_base_id);
            if let Some(top_k) = top_k {
                session = session.with_top_k(top_k);
            }
            run_chat(&mut session, &query).await?;
        }
        CliCommand::KbList => {
            let bases = client.list_knowledge_bases().await?;
            print_lines(&output::knowledge_base_lines(&bases));
        }
        CliCommand::KbCreate { name, description } => {
            client.create_knowledge_base(&name, &description).await?;
            println!("{} Created knowledge base '{}'", icons::SUCCESS, name.trim());
        }
        CliCommand::KbDelete { id } => {
            client.delete_knowledge_base(id).await?;
            println!("{} Deleted knowledge base {}", icons::SUCCESS, id);
        }
        CliCommand::DocList { knowledge_base_id } => {
            let documents = client.list_documents(knowledge_base_id).await?;
            print_lines(&output::document_lines(&documents));
        }
        CliCommand::DocUpload {
            knowledge_base_id,
            path,
        } => {
            let file_name = upload_name(&path)?;
            let contents = tokio::fs::read(&path)
                .await
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            let uploaded = client
                .upload_document(knowledge_base_id, &file_name, contents)
                .await?;
            println!(
                "{} Uploaded '{}' as document {}. Run `ibot doc parse {} {}` to index it.",
                icons::SUCCESS,
                file_name,
                uploaded.id,
                knowledge_base_id,
                uploaded.id
            );
        }
        CliCommand::DocParse {
            knowledge_base_id,
            document_id,
        } => {
            client.start_parse(document_id).await?;
            println!("Parsing document {}...", document_id);
            let document = client
                .wait_for_parse(
                    knowledge_base_id,
                    document_id,
                    config.parse_poll_interval,
                    config.parse_timeout,
                )
                .await?;
            report_parse(&document)?;
        }
        CliCommand::DocReparse {
            knowledge_base_id,
            document_id,
        } => {
            client.reparse(document_id).await?;
            println!("Re-parsing document {}...", document_id);
            let document = client
                .wait_for_parse(
                    knowledge_base_id,
                    document_id,
                    config.parse_poll_interval,
                    config.parse_timeout,
                )
                .await?;
            report_parse(&document)?;
        }
        CliCommand::DocDelete { document_id } => {
            client.delete_document(document_id).await?;
            println!("{} Deleted document {}", icons::SUCCESS, document_id);
        }
        CliCommand::DocDownload {
            document_id,
            output: destination,
        } => {
            let bytes = client.download_document(document_id).await?;
            let target = destination.unwrap_or_else(|| {
                PathBuf::from(SourceDocument::new(document_id, "").download_name())
            });
            tokio::fs::write(&target, &bytes)
                .await
                .wrap_err_with(|| format!("Failed to write {}", target.display()))?;
            println!(
                "{} Saved {} to {}",
                icons::SUCCESS,
                output::format_size(bytes.len() as u64),
                target.display()
            );
        }
    }
    Ok(())
}

/// Stream one answer to stdout; Ctrl-C stops reading and keeps what arrived.
async fn run_chat(session: &mut ChatSession, query: &str) -> Result<()> {
    let cancel = CancelHandle::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut stdout = std::io::stdout();
    let result = session
        .send_cancellable(query, cancel, |event, _turn| {
            if let StreamEvent::Token { content } = event {
                let _ = write!(stdout, "{}", content);
                let _ = stdout.flush();
            }
        })
        .await;
    ctrl_c.abort();

    let (id, outcome) = result?;
    println!();

    let turn = session
        .turn(id)
        .ok_or_else(|| eyre!("chat turn {} missing", id.index()))?;

    if outcome == DriveOutcome::Cancelled {
        println!("{} Stopped.", icons::WARNING);
        return Ok(());
    }

    match &turn.status {
        TurnStatus::Failed(err) => Err(eyre!(output::stream_error_line(err))),
        TurnStatus::Closed if turn.text.is_empty() => {
            Err(eyre!("{} The backend closed the stream without an answer.", icons::WARNING))
        }
        _ => {
            if let Some(sources) = &turn.sources {
                print_lines(&output::source_lines(sources));
            }
            Ok(())
        }
    }
}

fn report_parse(document: &Document) -> Result<()> {
    match document.status {
        DocumentStatus::Failed => Err(eyre!(
            "{} Parsing of '{}' failed",
            icons::FAILURE,
            document.name
        )),
        _ => {
            println!(
                "{} '{}' parsed into {} chunks",
                icons::SUCCESS,
                document.name,
                document.chunk_count
            );
            Ok(())
        }
    }
}

fn upload_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| eyre!("{} is not a file path", path.display()))
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
