//! Message routing across the answer sources.
//!
//! # Routing order
//!
//! ```text
//! message ──▶ canned table ──hit──▶ canned reply (stop)
//!                 │ miss
//!                 ▼
//!         document source (if a document is loaded)   ─▶ maybe 📄
//!                 ▼
//!         encyclopedia source ──answered──▶ 📘 (stop)
//!                 │ no answer
//!                 ▼
//!         language-model source ─▶ 🧠 (always answers)
//! ```
//!
//! A document answer does not stop the chain, so one message can produce a
//! document answer followed by an encyclopedia or language-model answer.
//!
//! # State
//!
//! [`ChatRouter::handle`], [`ChatRouter::upload`], [`ChatRouter::load_text`]
//! and [`ChatRouter::clear`] take one async mutex for their whole duration,
//! so requests are serialized and a document cannot change while a message
//! is being answered. The conversation log and the document slot sit in a
//! separate `RwLock` that is only held for reads and short writes, so
//! [`ChatRouter::history`] and [`ChatRouter::document`] return at once even
//! while a slow model call is in flight. Turns produced by one message are
//! appended together at the end; if the future is dropped half-way, the log
//! is left as it was.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::canned::CannedResponses;
use crate::config::Config;
use crate::document::DocumentSource;
use crate::encyclopedia::{Encyclopedia, EncyclopediaSource, WikipediaClient};
use crate::extract;
use crate::llm::{LanguageModel, LanguageModelSource, OllamaChat};
use crate::models::{turn_time_now, AnswerSource, ChatTurn, DocumentContext};
use crate::upload::{save_upload, UploadError};

/// The single document slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSlot {
    Empty,
    Loaded(DocumentContext),
    /// The last upload could not be turned into text. Never answered from.
    Unreadable { filename: String, reason: String },
}

impl DocumentSlot {
    pub fn document(&self) -> Option<&DocumentContext> {
        match self {
            DocumentSlot::Loaded(doc) => Some(doc),
            _ => None,
        }
    }

    /// Short status string used by the history endpoint.
    pub fn status(&self) -> &'static str {
        match self {
            DocumentSlot::Empty => "empty",
            DocumentSlot::Loaded(_) => "loaded",
            DocumentSlot::Unreadable { .. } => "unreadable",
        }
    }
}

#[derive(Debug)]
struct ChatState {
    log: Vec<ChatTurn>,
    document: DocumentSlot,
}

/// Result of routing one message.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Turns to return to the caller. For a canned hit this is the user turn
    /// and the canned reply; otherwise only the new bot turns.
    pub turns: Vec<ChatTurn>,
    /// Sources that contributed, in order. Empty for a canned hit.
    pub sources: Vec<AnswerSource>,
    pub canned: bool,
}

pub struct ChatRouter {
    canned: CannedResponses,
    document_source: DocumentSource,
    encyclopedia_source: EncyclopediaSource,
    llm_source: LanguageModelSource,
    upload_dir: PathBuf,
    /// Held by every operation that routes or changes the session.
    serial: Mutex<()>,
    state: RwLock<ChatState>,
}

impl ChatRouter {
    /// Builds a router around the given collaborators.
    pub fn new(
        config: &Config,
        canned: CannedResponses,
        model: Arc<dyn LanguageModel>,
        encyclopedia: Arc<dyn Encyclopedia>,
    ) -> Self {
        let llm_source = LanguageModelSource::new(model);
        Self {
            canned,
            document_source: DocumentSource::new(
                llm_source.clone(),
                config.routing.relevance_threshold,
                config.routing.context_chars,
            ),
            encyclopedia_source: EncyclopediaSource::new(encyclopedia, config.encyclopedia.sentences),
            llm_source,
            upload_dir: config.server.upload_dir.clone(),
            serial: Mutex::new(()),
            state: RwLock::new(ChatState {
                log: Vec::new(),
                document: DocumentSlot::Empty,
            }),
        }
    }

    /// Builds a router with the Ollama and Wikipedia clients and the
    /// canned table named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let canned = CannedResponses::load(&config.responses.path)?;
        let model = Arc::new(OllamaChat::new(&config.llm)?);
        let encyclopedia = Arc::new(WikipediaClient::new(&config.encyclopedia)?);
        Ok(Self::new(config, canned, model, encyclopedia))
    }

    /// Routes one user message and records it in the conversation log.
    pub async fn handle(&self, message: &str) -> ChatReply {
        let _serial = self.serial.lock().await;
        let now = turn_time_now();
        let user_turn = ChatTurn::user(message, &now);

        if let Some(reply) = self.canned.lookup(message) {
            tracing::info!("canned response");
            let turns = vec![user_turn, ChatTurn::bot(reply, &now)];
            self.state.write().await.log.extend(turns.iter().cloned());
            return ChatReply {
                turns,
                sources: Vec::new(),
                canned: true,
            };
        }

        let document = self.state.read().await.document.document().cloned();
        let mut answers = Vec::new();

        if let Some(answer) = self
            .document_source
            .attempt(message, document.as_ref())
            .await
        {
            answers.push(answer);
        }

        match self.encyclopedia_source.attempt(message).await {
            Some(answer) => answers.push(answer),
            None => answers.push(self.llm_source.attempt(message, None).await),
        }

        let sources: Vec<AnswerSource> = answers.iter().map(|a| a.source).collect();
        tracing::info!(?sources, "answered message");

        let turns: Vec<ChatTurn> = answers.into_iter().map(|a| a.into_turn(&now)).collect();
        let mut state = self.state.write().await;
        state.log.push(user_turn);
        state.log.extend(turns.iter().cloned());

        ChatReply {
            turns,
            sources,
            canned: false,
        }
    }

    /// Saves an uploaded PDF, extracts its text, and makes it the current document.
    ///
    /// A wrong file type leaves everything untouched. Once the file is
    /// saved, the upload replaces the current document even if extraction
    /// fails; the slot then records the failure instead of a document.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<(), UploadError> {
        check_type(filename)?;
        let _serial = self.serial.lock().await;
        let path = save_upload(&self.upload_dir, filename, &bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved upload");
        self.extract_and_install(filename, bytes).await
    }

    /// Same as [`ChatRouter::upload`] without keeping a copy in the upload
    /// directory.
    pub async fn load_pdf(&self, filename: &str, bytes: Vec<u8>) -> Result<(), UploadError> {
        check_type(filename)?;
        let _serial = self.serial.lock().await;
        self.extract_and_install(filename, bytes).await
    }

    /// Caller holds `serial`.
    async fn extract_and_install(&self, filename: &str, bytes: Vec<u8>) -> Result<(), UploadError> {
        let extracted = tokio::task::spawn_blocking(move || extract::extract_pdf_text(&bytes))
            .await
            .map_err(|e| UploadError::Io(e.to_string()))?;

        let mut state = self.state.write().await;
        match extracted {
            Ok(text) => install(&mut state, filename, text),
            Err(e) => {
                tracing::warn!(filename, error = %e, "could not extract PDF text");
                state.document = DocumentSlot::Unreadable {
                    filename: filename.to_string(),
                    reason: e.to_string(),
                };
                Err(UploadError::Unreadable(e.to_string()))
            }
        }
    }

    /// Makes already-extracted text the current document.
    pub async fn load_text(&self, name: &str, text: impl Into<String>) -> Result<(), UploadError> {
        let _serial = self.serial.lock().await;
        install(&mut *self.state.write().await, name, text.into())
    }

    /// Empties the conversation log and drops the document.
    pub async fn clear(&self) {
        let _serial = self.serial.lock().await;
        let mut state = self.state.write().await;
        state.log.clear();
        state.document = DocumentSlot::Empty;
        tracing::info!("cleared conversation and document");
    }

    /// Snapshot of the conversation log in display order.
    pub async fn history(&self) -> Vec<ChatTurn> {
        self.state.read().await.log.clone()
    }

    pub async fn document(&self) -> DocumentSlot {
        self.state.read().await.document.clone()
    }
}

fn check_type(filename: &str) -> Result<(), UploadError> {
    if extract::is_supported_filename(filename) {
        Ok(())
    } else {
        tracing::warn!(filename, "rejected upload with unsupported type");
        Err(UploadError::InvalidType)
    }
}

fn install(state: &mut ChatState, name: &str, text: String) -> Result<(), UploadError> {
    let chars = text.chars().count();
    match DocumentContext::new(text) {
        Some(doc) => {
            tracing::info!(name, chars, "document loaded");
            state.document = DocumentSlot::Loaded(doc);
            Ok(())
        }
        None => {
            tracing::warn!(name, "document has no readable text");
            state.document = DocumentSlot::Unreadable {
                filename: name.to_string(),
                reason: "no readable content".to_string(),
            };
            Err(UploadError::EmptyContent)
        }
    }
}
