//! Document answer source.
//!
//! Scores the loaded document against the query. Below or at the threshold
//! the source stays silent; above it, the query plus a bounded prefix of the
//! document is sent to the language model and the reply comes back tagged
//! as document-derived. A failed completion is still returned, as error text.

use crate::llm::LanguageModelSource;
use crate::models::{Answer, AnswerSource, DocumentContext};
use crate::relevance;

#[derive(Clone)]
pub struct DocumentSource {
    llm: LanguageModelSource,
    threshold: f64,
    context_chars: usize,
}

impl DocumentSource {
    pub fn new(llm: LanguageModelSource, threshold: f64, context_chars: usize) -> Self {
        Self {
            llm,
            threshold,
            context_chars,
        }
    }

    pub async fn attempt(&self, query: &str, document: Option<&DocumentContext>) -> Option<Answer> {
        let document = document?;

        let score = relevance::score(document.raw_text(), query);
        let relevant = relevance::is_relevant(score, self.threshold);
        tracing::debug!(score, threshold = self.threshold, relevant, "document relevance");
        if !relevant {
            return None;
        }

        let context = document.prefix(self.context_chars);
        let completion = self.llm.complete(query, Some(context)).await;
        Some(Answer::new(AnswerSource::Document, completion))
    }
}
