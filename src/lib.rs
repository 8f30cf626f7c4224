//! # doc-chat
//!
//! A single-process chat backend that answers each message from the first
//! source able to: a canned reply, the uploaded PDF (through a language
//! model), a Wikipedia summary, or the language model on its own.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   HTTP / CLI ──▶│  ChatRouter  │── conversation log + document slot
//!                 └──────┬───────┘
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │  Document  │ │Encyclopedia│ │  Language  │
//!   │ (TF-IDF +  │ │ (Wikipedia)│ │   model    │
//!   │    LLM)    │ │            │ │  (Ollama)  │
//!   └────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Chat turns, answers, document context |
//! | [`relevance`] | Pairwise TF-IDF cosine relevance |
//! | [`canned`] | Fixed replies keyed by normalized message |
//! | [`extract`] | PDF text extraction |
//! | [`upload`] | Upload errors and filename sanitizing |
//! | [`llm`] | Language-model client and fallback source |
//! | [`encyclopedia`] | Wikipedia client and source |
//! | [`document`] | Document answer source |
//! | [`router`] | Routing policy and session state |
//! | [`server`] | HTTP server |

pub mod canned;
pub mod config;
pub mod document;
pub mod encyclopedia;
pub mod extract;
pub mod llm;
pub mod models;
pub mod relevance;
pub mod router;
pub mod server;
pub mod upload;
