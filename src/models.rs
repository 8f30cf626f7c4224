//! Core data types shared by the router, the answer sources and the server.
//!
//! A [`ChatTurn`] is what the conversation log stores and what the HTTP API
//! returns. An [`Answer`] is what an answer source produces before the
//! router stamps it with a time and turns it into a bot turn.

use serde::{Deserialize, Serialize};

/// Timestamp format used for every turn (`19-10 14:05`).
pub const TURN_TIME_FORMAT: &str = "%d-%m %H:%M";

/// Returns the current local time formatted for a chat turn.
pub fn turn_time_now() -> String {
    chrono::Local::now().format(TURN_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Same spelling as the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation log. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub sender: Sender,
    pub message: String,
    #[serde(rename = "time")]
    pub timestamp: String,
}

impl ChatTurn {
    pub fn user(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn bot(message: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            message: message.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Which source produced an [`Answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    Document,
    Encyclopedia,
    LanguageModel,
}

impl AnswerSource {
    /// Label prefixed to the rendered bot message; the chat UI keys its
    /// styling off these strings.
    pub fn label(self) -> &'static str {
        match self {
            AnswerSource::Document => "📄 From PDF:",
            AnswerSource::Encyclopedia => "📘 From Wikipedia:",
            AnswerSource::LanguageModel => "🧠 From LLaMA:",
        }
    }
}

/// Outcome of a language-model call.
///
/// Both variants are shown to the user; `Degraded` carries the error detail
/// of a failed completion so callers can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Ok(String),
    Degraded(String),
}

impl Completion {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Completion::Degraded(_))
    }

    /// User-visible text of the completion.
    pub fn text(&self) -> String {
        match self {
            Completion::Ok(content) => content.clone(),
            Completion::Degraded(detail) => format!("⚠️ LLaMA Error: {}", detail),
        }
    }
}

/// A single bot-authored reply tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub source: AnswerSource,
    pub completion: Completion,
}

impl Answer {
    pub fn new(source: AnswerSource, completion: Completion) -> Self {
        Self { source, completion }
    }

    pub fn render(&self) -> String {
        format!("{} {}", self.source.label(), self.completion.text())
    }

    pub fn into_turn(self, timestamp: &str) -> ChatTurn {
        ChatTurn::bot(self.render(), timestamp)
    }
}

/// Text of the currently loaded document.
///
/// Construction rejects whitespace-only text, so a live `DocumentContext`
/// always has something to score against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    raw_text: String,
}

impl DocumentContext {
    pub fn new(raw_text: impl Into<String>) -> Option<Self> {
        let raw_text = raw_text.into();
        if raw_text.trim().is_empty() {
            None
        } else {
            Some(Self { raw_text })
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// At most `max_chars` characters from the start of the document.
    pub fn prefix(&self, max_chars: usize) -> &str {
        match self.raw_text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.raw_text[..idx],
            None => &self.raw_text,
        }
    }
}
