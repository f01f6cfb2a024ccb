pub mod annotations;
pub mod commands;
pub mod core;
pub mod outline;
pub mod providers;
pub mod relevance;
pub mod security;
pub mod session;
pub mod stream;
pub mod telemetry;
pub mod viewer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

pub use commands::AppState;
use crate::core::{config::AppConfig, errors::AppResult};

#[derive(Parser)]
#[command(name = "docsight", version, about = "Outlines, relevance highlights and AI insights for PDF documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a document's heading outline.
    Outline {
        document_id: String,
        /// Navigate to this heading after loading.
        #[arg(long)]
        heading: Option<String>,
    },
    /// Highlight a stored relevance result in a document.
    Annotate {
        document_id: String,
        /// JSON file holding the relevance result.
        #[arg(long)]
        file: PathBuf,
    },
    /// Search the document's folder for passages related to a selection.
    Search { document_id: String, query: String },
    /// Stream insights for a selection.
    Insight { document_id: String, selection: String },
    /// Stream a study guide for a folder.
    Guide {
        folder_id: String,
        /// Documents currently in the folder.
        #[arg(long = "document", value_name = "ID")]
        documents: Vec<String>,
    },
    /// Generate the folder's audio overview.
    Podcast {
        folder_id: String,
        #[arg(long = "document", value_name = "ID")]
        documents: Vec<String>,
        #[arg(long, short, default_value = "podcast.mp3")]
        output: PathBuf,
    },
    /// Print a document's summary.
    Summary { document_id: String },
    /// Print a document's generated FAQ.
    Faq { document_id: String },
    /// Save the document file locally.
    Download {
        document_id: String,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Store the collaborator session token in the OS keyring.
    Login { token: String },
    /// Remove the stored session token.
    Logout,
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn dispatch(command: Command) -> AppResult<()> {
    match &command {
        Command::Login { token } => return print_json(&commands::settings::login(token)?),
        Command::Logout => return print_json(&commands::settings::logout()?),
        _ => {}
    }

    let state = AppState::from_config(AppConfig::from_env()?)?;
    let mut stdout = std::io::stdout();
    match command {
        Command::Outline { document_id, heading } => {
            let outline = commands::documents::open_outline(&state, &document_id, heading.as_deref()).await?;
            if let Some(document) = &outline.document {
                println!("{} ({})", document.name, document.id);
            }
            for entry in &outline.entries {
                println!(
                    "{}{} [{}] p.{}",
                    "  ".repeat(entry.depth),
                    entry.text,
                    entry.level,
                    entry.page + 1
                );
            }
            if let Some(page) = outline.current_page {
                println!("-> page {page}");
            }
        }
        Command::Annotate { document_id, file } => {
            print_json(&commands::documents::annotate_from_file(&state, &document_id, &file).await?)?;
        }
        Command::Search { document_id, query } => {
            print_json(&commands::documents::search(&state, &document_id, &query).await?)?;
        }
        Command::Insight { document_id, selection } => {
            let report = commands::insights::insight(&state, &document_id, &selection, &mut stdout).await?;
            tracing::info!(outcome = ?report.outcome, "insight finished");
        }
        Command::Guide { folder_id, documents } => {
            let report = commands::insights::guide(&state, &folder_id, documents, &mut stdout).await?;
            tracing::info!(outcome = ?report.outcome, "guide finished");
        }
        Command::Podcast {
            folder_id,
            documents,
            output,
        } => {
            print_json(&commands::insights::podcast(&state, &folder_id, documents, &output).await?)?;
        }
        Command::Summary { document_id } => {
            println!("{}", commands::documents::summary(&state, &document_id).await?);
        }
        Command::Faq { document_id } => {
            for entry in commands::documents::faq(&state, &document_id).await? {
                println!("Q: {}\nA: {}\n", entry.question, entry.answer);
            }
        }
        Command::Download { document_id, output } => {
            print_json(&commands::documents::download(&state, &document_id, &output).await?)?;
        }
        Command::Login { .. } | Command::Logout => {}
    }
    state.controller.close().await;
    Ok(())
}

pub fn run() -> ExitCode {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli.command)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.code(), "{err}");
            match serde_json::to_string(&err) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}
