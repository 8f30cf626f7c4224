//! Query-to-document relevance scoring.
//!
//! The score is the cosine similarity between TF-IDF vectors of the document
//! and the query, where IDF is computed over the two-document corpus
//! `{document, query}` only. Terms shared by both texts therefore get the
//! minimum weight, and the score says nothing about any wider collection.
//!
//! Weighting follows the common smoothed form:
//!
//! ```text
//! idf(t) = ln((1 + n) / (1 + df(t))) + 1      n = 2
//! w(t, d) = tf(t, d) * idf(t)                 then L2-normalized
//! ```
//!
//! Tokens are lower-cased runs of two or more word characters
//! (alphanumerics and `_`); single characters are ignored.

use std::collections::{BTreeMap, HashMap};

/// Splits text into lower-cased word tokens of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|tok| tok.chars().count() >= 2)
        .map(|tok| tok.to_lowercase())
        .collect()
}

fn term_counts(tokens: &[String]) -> HashMap<&str, f64> {
    let mut counts = HashMap::new();
    for tok in tokens {
        *counts.entry(tok.as_str()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Relevance of `document` to `query`, in `[0, 1]`.
///
/// Empty or token-less input on either side scores `0.0`.
pub fn score(document: &str, query: &str) -> f64 {
    let doc_tokens = tokenize(document);
    let query_tokens = tokenize(query);
    if doc_tokens.is_empty() || query_tokens.is_empty() {
        return 0.0;
    }

    let doc_tf = term_counts(&doc_tokens);
    let query_tf = term_counts(&query_tokens);

    // BTreeMap keeps the vocabulary order stable, which keeps float sums
    // reproducible between runs.
    let mut vocabulary: BTreeMap<&str, f64> = BTreeMap::new();
    for term in doc_tf.keys().chain(query_tf.keys()) {
        let df = doc_tf.contains_key(term) as u8 + query_tf.contains_key(term) as u8;
        let idf = (3.0 / (1.0 + df as f64)).ln() + 1.0;
        vocabulary.insert(*term, idf);
    }

    let weigh = |tf: &HashMap<&str, f64>| -> Vec<f64> {
        vocabulary
            .iter()
            .map(|(term, idf)| tf.get(term).copied().unwrap_or(0.0) * idf)
            .collect()
    };
    let doc_vec = weigh(&doc_tf);
    let query_vec = weigh(&query_tf);

    cosine_similarity(&query_vec, &doc_vec)
}

/// Cosine similarity, treating a zero vector as similarity `0.0`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag_a < f64::EPSILON || mag_b < f64::EPSILON {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
}

/// A document is relevant only when its score is strictly above `threshold`.
pub fn is_relevant(score: f64, threshold: f64) -> bool {
    score > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_score_zero() {
        assert_eq!(score("", ""), 0.0);
        assert_eq!(score("some document text", ""), 0.0);
        assert_eq!(score("", "query"), 0.0);
    }

    #[test]
    fn single_character_tokens_are_ignored() {
        assert_eq!(tokenize("a b c"), Vec::<String>::new());
        assert_eq!(score("a b c", "a b c"), 0.0);
    }

    #[test]
    fn tokenizer_lowercases_and_splits_on_punctuation() {
        assert_eq!(
            tokenize("Rust's borrow-checker, snake_case!"),
            vec!["rust", "borrow", "checker", "snake_case"]
        );
    }

    #[test]
    fn identical_texts_score_one() {
        let s = score("the borrow checker", "the borrow checker");
        assert!((s - 1.0).abs() < 1e-9, "got {}", s);
    }

    #[test]
    fn disjoint_texts_score_zero() {
        assert_eq!(score("rust programming language", "banana bread"), 0.0);
    }

    #[test]
    fn shared_term_scores_by_pairwise_idf() {
        // rust: df=2 -> idf 1.0; programming, language: df=1 -> idf 1 + ln(1.5)
        let w = 1.0 + 1.5f64.ln();
        let expected = 1.0 / (1.0 + 2.0 * w * w).sqrt();
        let s = score("Rust programming language", "rust");
        assert!((s - expected).abs() < 1e-9, "got {}, expected {}", s, expected);
        assert!(is_relevant(s, 0.2));
    }

    #[test]
    fn long_unrelated_document_falls_below_threshold() {
        let doc = "The treaty was signed in the spring after months of negotiation \
                   between the coastal provinces and the northern federation, ending \
                   a dispute over fishing rights and harbour tariffs.";
        let s = score(doc, "how do I bake sourdough bread at home");
        assert!(!is_relevant(s, 0.2), "got {}", s);
    }

    #[test]
    fn score_stays_in_unit_interval() {
        let pairs = [
            ("alpha beta gamma", "alpha"),
            ("alpha alpha alpha", "alpha beta"),
            ("ünïcödé wörds here", "wörds"),
            ("x", "y"),
        ];
        for (doc, query) in pairs {
            let s = score(doc, query);
            assert!((0.0..=1.0).contains(&s), "{} / {} -> {}", doc, query, s);
        }
    }

    #[test]
    fn threshold_is_strict() {
        assert!(!is_relevant(0.2, 0.2));
        assert!(is_relevant(0.2000001, 0.2));
    }
}
