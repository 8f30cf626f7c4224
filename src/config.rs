//! TOML configuration parsing.
//!
//! Every section is optional; omitted keys fall back to the defaults the
//! chat backend has always shipped with (threshold `0.2`, `1500` characters
//! of document context, two-sentence encyclopedia summaries, `llama3` on a
//! local Ollama). A missing config file is not an error: [`load_config`]
//! returns [`Config::default`] so `doc-chat serve` works out of the box.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub responses: ResponsesConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub encyclopedia: EncyclopediaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory uploaded PDFs are written to before extraction.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Optional directory holding `index.html` / `script.js` overrides.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            static_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}
fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponsesConfig {
    /// JSON object mapping normalized messages to fixed replies.
    #[serde(default = "default_responses_path")]
    pub path: PathBuf,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            path: default_responses_path(),
        }
    }
}

fn default_responses_path() -> PathBuf {
    PathBuf::from("static/responses.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    /// A document answers only when its score is strictly above this value.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
    /// Maximum characters of document text placed in the model prompt.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_relevance_threshold() -> f64 {
    0.2
}
fn default_context_chars() -> usize {
    1500
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_llm_model() -> String {
    "llama3".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct EncyclopediaConfig {
    #[serde(default = "default_encyclopedia_url")]
    pub url: String,
    #[serde(default = "default_sentences")]
    pub sentences: u32,
    #[serde(default = "default_encyclopedia_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            url: default_encyclopedia_url(),
            sentences: default_sentences(),
            timeout_secs: default_encyclopedia_timeout_secs(),
        }
    }
}

fn default_encyclopedia_url() -> String {
    "https://en.wikipedia.org/w/api.php".to_string()
}
fn default_sentences() -> u32 {
    2
}
fn default_encyclopedia_timeout_secs() -> u64 {
    15
}

/// Parses a config document and validates it.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Reads the config at `path`, or returns defaults when the file is absent.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

fn validate(config: &Config) -> Result<()> {
    if !(0.0..=1.0).contains(&config.routing.relevance_threshold) {
        bail!("routing.relevance_threshold must be in [0.0, 1.0]");
    }

    if config.routing.context_chars == 0 {
        bail!("routing.context_chars must be > 0");
    }

    if config.server.max_upload_bytes == 0 {
        bail!("server.max_upload_bytes must be > 0");
    }

    if config.encyclopedia.sentences == 0 {
        bail!("encyclopedia.sentences must be >= 1");
    }

    if config.llm.model.trim().is_empty() {
        bail!("llm.model must not be empty");
    }

    if config.llm.url.trim().is_empty() {
        bail!("llm.url must not be empty");
    }

    if config.encyclopedia.url.trim().is_empty() {
        bail!("encyclopedia.url must not be empty");
    }

    Ok(())
}
