//! Command-line argument parsing for the ibot CLI.
//!
//! Arguments are parsed by hand: the command set is small and fixed.

use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: ibot <command>
       ibot chat <kb_id> [--top-k N] [--] <query..>

Commands:
  chat <kb_id> <query..>               Ask a question and stream the answer
  kb list                              List knowledge bases
  kb create <name> [description]       Create a knowledge base
  kb delete <id>                       Delete a knowledge base
  doc list <kb_id>                     List documents of a knowledge base
  doc upload <kb_id> <path>            Upload a document
  doc parse <kb_id> <doc_id>           Parse a document and wait for it
  doc reparse <kb_id> <doc_id>         Parse a document again and wait for it
  doc delete <doc_id>                  Delete a document
  doc download <doc_id> [output]       Download a document's original file

Options:
  -h, --help       Show this help
  -V, --version    Show version

Environment:
  IBOT_BASE_URL, IBOT_TOP_K, IBOT_IDLE_TIMEOUT_SECS,
  IBOT_PARSE_TIMEOUT_SECS, IBOT_LOG";

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Version,
    Help,
    Chat {
        knowledge_base_id: i64,
        query: String,
        top_k: Option<u32>,
    },
    KbList,
    KbCreate {
        name: String,
        description: String,
    },
    KbDelete {
        id: i64,
    },
    DocList {
        knowledge_base_id: i64,
    },
    DocUpload {
        knowledge_base_id: i64,
        path: PathBuf,
    },
    DocParse {
        knowledge_base_id: i64,
        document_id: i64,
    },
    DocReparse {
        knowledge_base_id: i64,
        document_id: i64,
    },
    DocDelete {
        document_id: i64,
    },
    DocDownload {
        document_id: i64,
        output: Option<PathBuf>,
    },
}

/// Why the arguments could not be turned into a command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgsError {
    #[error("missing command")]
    MissingCommand,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// Parse command-line arguments, program name included.
///
/// # Examples
///
/// ```
/// use ibot::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["ibot".to_string(), "kb".to_string(), "list".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::KbList));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut rest = args.skip(1);
    let command = rest.next().ok_or(ArgsError::MissingCommand)?;

    // Global flags count only in command position
    match command.as_str() {
        "--help" | "-h" | "help" => Ok(CliCommand::Help),
        "--version" | "-V" => Ok(CliCommand::Version),
        "chat" => parse_chat(rest),
        "kb" => parse_kb(rest),
        "doc" => parse_doc(rest),
        other => Err(ArgsError::UnknownCommand(other.to_string())),
    }
}

/// `chat <kb_id> [--top-k N] [--] <query..>`
///
/// Options are read only up to the first query word or a `--`; everything
/// after that is query text, dashes included.
fn parse_chat(mut args: impl Iterator<Item = String>) -> Result<CliCommand, ArgsError> {
    let knowledge_base_id = parse_id(args.next(), "kb_id")?;

    let mut top_k = None;
    let mut words = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        } else if arg == "--top-k" || arg == "-k" {
            let value = args.next().ok_or(ArgsError::MissingArgument("N"))?;
            top_k = Some(parse_top_k(&value)?);
        } else if let Some(value) = arg.strip_prefix("--top-k=") {
            top_k = Some(parse_top_k(value)?);
        } else {
            words.push(arg);
            break;
        }
    }
    words.extend(args);

    let query = words.join(" ");
    if query.trim().is_empty() {
        return Err(ArgsError::MissingArgument("query"));
    }

    Ok(CliCommand::Chat {
        knowledge_base_id,
        query,
        top_k,
    })
}

fn parse_kb(mut args: impl Iterator<Item = String>) -> Result<CliCommand, ArgsError> {
    let sub = args.next().ok_or(ArgsError::MissingArgument("kb command"))?;
    let command = match sub.as_str() {
        "list" => CliCommand::KbList,
        "create" => {
            let name = args.next().ok_or(ArgsError::MissingArgument("name"))?;
            let description = args.collect::<Vec<_>>().join(" ");
            return Ok(CliCommand::KbCreate { name, description });
        }
        "delete" => CliCommand::KbDelete {
            id: parse_id(args.next(), "id")?,
        },
        other => return Err(ArgsError::UnknownCommand(format!("kb {}", other))),
    };
    no_more(args)?;
    Ok(command)
}

fn parse_doc(mut args: impl Iterator<Item = String>) -> Result<CliCommand, ArgsError> {
    let sub = args.next().ok_or(ArgsError::MissingArgument("doc command"))?;
    let command = match sub.as_str() {
        "list" => CliCommand::DocList {
            knowledge_base_id: parse_id(args.next(), "kb_id")?,
        },
        "upload" => CliCommand::DocUpload {
            knowledge_base_id: parse_id(args.next(), "kb_id")?,
            path: args
                .next()
                .map(PathBuf::from)
                .ok_or(ArgsError::MissingArgument("path"))?,
        },
        "parse" => CliCommand::DocParse {
            knowledge_base_id: parse_id(args.next(), "kb_id")?,
            document_id: parse_id(args.next(), "doc_id")?,
        },
        "reparse" => CliCommand::DocReparse {
            knowledge_base_id: parse_id(args.next(), "kb_id")?,
            document_id: parse_id(args.next(), "doc_id")?,
        },
        "delete" => CliCommand::DocDelete {
            document_id: parse_id(args.next(), "doc_id")?,
        },
        "download" => CliCommand::DocDownload {
            document_id: parse_id(args.next(), "doc_id")?,
            output: args.next().map(PathBuf::from),
        },
        other => return Err(ArgsError::UnknownCommand(format!("doc {}", other))),
    };
    no_more(args)?;
    Ok(command)
}

fn parse_id(arg: Option<String>, name: &'static str) -> Result<i64, ArgsError> {
    let value = arg.ok_or(ArgsError::MissingArgument(name))?;
    value
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { name, value })
}

fn parse_top_k(value: &str) -> Result<u32, ArgsError> {
    match value.parse::<u32>() {
        Ok(k) if k > 0 => Ok(k),
        _ => Err(ArgsError::InvalidNumber {
            name: "top-k",
            value: value.to_string(),
        }),
    }
}

fn no_more(mut args: impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(extra) => Err(ArgsError::UnexpectedArgument(extra)),
        None => Ok(()),
    }
}
