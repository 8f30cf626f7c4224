//! Encyclopedia lookups and the encyclopedia answer source.
//!
//! [`WikipediaClient`] talks to the MediaWiki action API in two steps:
//!
//! 1. `list=search` resolves the free-text query to the best-matching title.
//! 2. `prop=extracts|pageprops` fetches the plain-text intro of that title,
//!    cut to the configured number of sentences, with redirects followed.
//!
//! [`EncyclopediaSource`] folds every [`LookupError`] into "no answer"; the
//! router cannot tell a disambiguation page from a network failure and falls
//! back to the language model either way.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EncyclopediaConfig;
use crate::models::{Answer, AnswerSource, Completion};

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("no article matches the query")]
    NotFound,
    #[error("'{0}' is ambiguous")]
    Ambiguous(String),
    #[error("lookup request failed: {0}")]
    Transport(String),
    #[error("invalid lookup response: {0}")]
    Decode(String),
}

/// A source of short article summaries.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Returns the first `sentences` sentences of the article best matching `term`.
    async fn summary(&self, term: &str, sentences: u32) -> Result<String, LookupError>;
}

// ============ Wikipedia ============

pub struct WikipediaClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(config: &EncyclopediaConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("doc-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: config.url.clone(),
        })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, LookupError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Transport(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn summary(&self, term: &str, sentences: u32) -> Result<String, LookupError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(LookupError::NotFound);
        }

        let search = self
            .get_json(&[("list", "search"), ("srsearch", term), ("srlimit", "1"), ("srprop", "")])
            .await?;
        let title = parse_search_title(&search)?;

        let sentences = sentences.to_string();
        let page = self
            .get_json(&[
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title.as_str()),
            ])
            .await?;
        parse_extract(&page)
    }
}

/// Title of the first search hit.
fn parse_search_title(json: &Value) -> Result<String, LookupError> {
    let hits = json
        .pointer("/query/search")
        .and_then(|s| s.as_array())
        .ok_or_else(|| LookupError::Decode("missing query.search".to_string()))?;

    hits.first()
        .and_then(|hit| hit.get("title"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or(LookupError::NotFound)
}

/// Intro extract of the single requested page.
fn parse_extract(json: &Value) -> Result<String, LookupError> {
    let page = json
        .pointer("/query/pages/0")
        .ok_or_else(|| LookupError::Decode("missing query.pages".to_string()))?;

    if page.get("missing").and_then(|m| m.as_bool()).unwrap_or(false) {
        return Err(LookupError::NotFound);
    }

    if page.pointer("/pageprops/disambiguation").is_some() {
        let title = page
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(LookupError::Ambiguous(title));
    }

    let extract = page
        .get("extract")
        .and_then(|e| e.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if extract.is_empty() {
        return Err(LookupError::NotFound);
    }
    Ok(extract.to_string())
}

// ============ Answer source ============

#[derive(Clone)]
pub struct EncyclopediaSource {
    encyclopedia: Arc<dyn Encyclopedia>,
    sentences: u32,
}

impl EncyclopediaSource {
    pub fn new(encyclopedia: Arc<dyn Encyclopedia>, sentences: u32) -> Self {
        Self {
            encyclopedia,
            sentences,
        }
    }

    /// A summary of `query` tagged as encyclopedia-derived, or `None` on any failure.
    pub async fn attempt(&self, query: &str) -> Option<Answer> {
        match self.encyclopedia.summary(query, self.sentences).await {
            Ok(summary) => Some(Answer::new(AnswerSource::Encyclopedia, Completion::Ok(summary))),
            Err(e) => {
                tracing::debug!(error = %e, "encyclopedia did not answer");
                None
            }
        }
    }
}
