//! Canned-response table.
//!
//! A JSON object mapping messages to fixed replies, read once at startup.
//! Keys are normalized (trimmed, lower-cased) on load so lookups only need
//! to normalize the incoming message. Matching is exact on the whole
//! normalized message: `"Hello"` hits a `"hello"` key, `"Hello there"` does not.
//!
//! When several keys normalize to the same string, a key that was already in
//! normalized form wins; otherwise the first key in iteration order does.
//! [`CannedResponses::from_json`] iterates keys in sorted order.

use anyhow::{Context, Result};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Lower-cases and trims a message the same way table keys are stored.
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct CannedResponses {
    replies: HashMap<String, String>,
}

impl CannedResponses {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut replies: HashMap<String, (bool, String)> = HashMap::new();
        for (key, reply) in entries {
            let normalized = normalize(key.as_ref());
            let exact = normalized == key.as_ref();
            match replies.entry(normalized) {
                Entry::Vacant(slot) => {
                    slot.insert((exact, reply.into()));
                }
                Entry::Occupied(mut slot) => {
                    tracing::warn!(key = key.as_ref(), "duplicate canned response key after normalizing");
                    if exact && !slot.get().0 {
                        slot.insert((exact, reply.into()));
                    }
                }
            }
        }
        Self {
            replies: replies.into_iter().map(|(k, (_, v))| (k, v)).collect(),
        }
    }

    /// Parses a JSON object of `message -> reply` pairs.
    pub fn from_json(content: &str) -> Result<Self> {
        let map: BTreeMap<String, String> = serde_json::from_str(content)
            .with_context(|| "canned responses must be a JSON object of strings")?;
        Ok(Self::new(map))
    }

    /// Loads the table from `path`. A missing file yields an empty table.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "canned responses file not found, table is empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read canned responses: {}", path.display()))?;
        let table = Self::from_json(&content)
            .with_context(|| format!("Failed to parse canned responses: {}", path.display()))?;
        tracing::info!(entries = table.len(), "loaded canned responses");
        Ok(table)
    }

    pub fn lookup(&self, message: &str) -> Option<&str> {
        self.replies.get(&normalize(message)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_surrounding_whitespace() {
        let table = CannedResponses::new([("hello", "Hi there!")]);
        assert_eq!(table.lookup("Hello"), Some("Hi there!"));
        assert_eq!(table.lookup("  HELLO \n"), Some("Hi there!"));
    }

    #[test]
    fn lookup_is_exact_match_only() {
        let table = CannedResponses::new([("hello", "Hi there!")]);
        assert_eq!(table.lookup("Hello there"), None);
        assert_eq!(table.lookup("hell"), None);
    }

    #[test]
    fn keys_are_normalized_on_load() {
        let table = CannedResponses::from_json(r#"{" Thanks ": "You're welcome."}"#).unwrap();
        assert_eq!(table.lookup("thanks"), Some("You're welcome."));
    }

    #[test]
    fn normalized_key_wins_over_colliding_key() {
        let json = r#"{"Hi": "from Hi key", "hi": "from hi key"}"#;
        for _ in 0..50 {
            let table = CannedResponses::from_json(json).unwrap();
            assert_eq!(table.lookup("hi"), Some("from hi key"));
            assert_eq!(table.len(), 1);
        }

        let table = CannedResponses::new([("hi", "lower"), ("HI ", "upper")]);
        assert_eq!(table.lookup("Hi"), Some("lower"));
        let table = CannedResponses::new([("HI ", "upper"), ("hi", "lower")]);
        assert_eq!(table.lookup("Hi"), Some("lower"));
    }

    #[test]
    fn colliding_unnormalized_keys_resolve_in_sorted_order() {
        let json = r#"{"HI": "upper", " Hi": "padded"}"#;
        for _ in 0..50 {
            let table = CannedResponses::from_json(json).unwrap();
            assert_eq!(table.lookup("hi"), Some("padded"));
        }
    }

    #[test]
    fn non_object_json_is_an_error() {
        assert!(CannedResponses::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn missing_file_gives_empty_table() {
        let table = CannedResponses::load(Path::new("/nonexistent/responses.json")).unwrap();
        assert!(table.is_empty());
    }
}
