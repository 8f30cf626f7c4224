//! # doc-chat CLI
//!
//! ## Usage
//!
//! ```bash
//! doc-chat --config ./config/doc-chat.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `doc-chat serve` | Start the HTTP server and chat UI |
//! | `doc-chat ask "<message>"` | Route one message and print the reply |
//! | `doc-chat score <pdf> "<query>"` | Print the relevance of a PDF to a query |
//!
//! ## Examples
//!
//! ```bash
//! # Serve the chat UI on the configured address
//! doc-chat serve
//!
//! # Ask about a PDF without starting the server
//! doc-chat ask "what does the warranty cover" --pdf ./manual.pdf
//!
//! # Check whether a question would be answered from the PDF
//! doc-chat score ./manual.pdf "warranty coverage"
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `doc_chat=info,tower_http=info`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use doc_chat::{config, extract, relevance, router::ChatRouter, server};

/// doc-chat: answers questions from an uploaded PDF, Wikipedia, or a
/// local language model.
#[derive(Parser)]
#[command(name = "doc-chat", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when the
    /// file does not exist.
    #[arg(long, global = true, default_value = "./config/doc-chat.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Binds to `[server].bind` and serves the chat UI together with the
    /// `/chat`, `/upload` and `/clear` endpoints.
    Serve,

    /// Route a single message and print the resulting turns.
    Ask {
        /// The message to send.
        message: String,

        /// Load this PDF as the current document first.
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Score a PDF against a query with the relevance scorer.
    Score {
        /// Path to the PDF.
        pdf: PathBuf,
        /// The query to score against the document text.
        query: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("doc_chat=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Ask { message, pdf } => {
            let router = ChatRouter::from_config(&cfg)?;

            if let Some(path) = pdf {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if let Err(e) = router.load_pdf(&filename, bytes).await {
                    eprintln!("upload: {}", e);
                }
            }

            let reply = router.handle(&message).await;
            for turn in reply.turns {
                println!("[{}] {}: {}", turn.timestamp, turn.sender, turn.message);
            }
        }
        Commands::Score { pdf, query } => {
            let bytes =
                std::fs::read(&pdf).with_context(|| format!("Failed to read {}", pdf.display()))?;
            let text = extract::extract_pdf_text(&bytes)?;
            let score = relevance::score(&text, &query);
            let threshold = cfg.routing.relevance_threshold;
            let verdict = if relevance::is_relevant(score, threshold) {
                "relevant"
            } else {
                "not relevant"
            };
            println!("score: {:.4} ({}, threshold {})", score, verdict, threshold);
        }
    }

    Ok(())
}
