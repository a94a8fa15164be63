
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::chunking::ChunkingConfig;
use crate::http::DEFAULT_TIMEOUT_SECONDS;

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
pub const DEFAULT_MATCH_COUNT: usize = 5;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant helping people learn about the portfolio owner's professional background, projects, and experience. Provide helpful, specific, and friendly answers. Keep responses concise and relevant.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub query_log: QueryLogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

const fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// Hosted embedding model shared by ingestion and query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cohere.com".to_string(),
            model: "embed-english-light-v3.0".to_string(),
            dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Supabase,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Overridden by `SUPABASE_URL` when set.
    pub supabase_url: Option<String>,
    pub table: String,
    pub match_function: String,
    pub match_count: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Supabase,
            supabase_url: None,
            table: "documents".to_string(),
            match_function: "match_documents".to_string(),
            match_count: DEFAULT_MATCH_COUNT,
        }
    }
}

/// OpenAI-compatible chat endpoint used by the RAG chatbot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Gemini model behind the decision advisor and journal affirmations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// `owner/name` of the GitHub repository holding the source documents.
    pub repository: String,
    pub branch: String,
    pub path_prefix: String,
    pub extensions: Vec<String>,
    /// Fixed pause between embedding calls.
    pub throttle_ms: u64,
    pub github_api_url: String,
    pub raw_content_url: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            repository: "Shirly8/ShirleyHuang-Data".to_string(),
            branch: "main".to_string(),
            path_prefix: "RAG/".to_string(),
            extensions: vec!["md".to_string(), "txt".to_string()],
            throttle_ms: 4000,
            github_api_url: "https://api.github.com".to_string(),
            raw_content_url: "https://raw.githubusercontent.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogBackend {
    #[default]
    Sqlite,
    Supabase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryLogConfig {
    pub enabled: bool,
    pub backend: QueryLogBackend,
    pub table: String,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: QueryLogBackend::Sqlite,
            table: "query_logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    /// Overridden by `PORT` when set.
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "https://wisest.vercel.app".to_string(),
                "https://wisests.shirleyproject.com".to_string(),
                "https://shirleyproject.com".to_string(),
                "https://www.shirleyproject.com".to_string(),
                "https://shirleyproject.vercel.app".to_string(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 1 and 8192)")]
    InvalidEmbeddingDimension(usize),
    #[error("Invalid chunk size: {0} (must be greater than zero)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid match count: {0} (must be between 1 and 100)")]
    InvalidMatchCount(usize),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid repository: {0} (expected owner/name)")]
    InvalidRepository(String),
    #[error("Missing required environment variable: {0}")]
    MissingSecret(&'static str),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            chat: ChatConfig::default(),
            advisor: AdvisorConfig::default(),
            chunking: ChunkingConfig::default(),
            ingest: IngestConfig::default(),
            query_log: QueryLogConfig::default(),
            server: ServerConfig::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            base_dir: PathBuf::new(),
        }
    }
}

impl Config {
    /// Default location of the configuration directory (`~/.wisest`)
    #[inline]
    pub fn default_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".wisest"))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;

            toml::from_str::<Config>(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            Self::default()
        };
        config.base_dir = config_dir.as_ref().to_path_buf();
        config.apply_env_overrides();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Apply the non-secret environment overrides (`PORT`, `SUPABASE_URL`)
    #[inline]
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = std::env::var("SUPABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
        {
            self.store.supabase_url = Some(url);
        }
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Path of the SQLite file holding decisions, query logs and local vectors
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("wisest.db")
    }

    #[inline]
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.embedding.base_url)?;
        validate_url(&self.chat.base_url)?;
        validate_url(&self.advisor.base_url)?;
        validate_url(&self.ingest.github_api_url)?;
        validate_url(&self.ingest.raw_content_url)?;
        if let Some(url) = &self.store.supabase_url {
            validate_url(url)?;
        }

        for model in [
            &self.embedding.model,
            &self.chat.model,
            &self.advisor.model,
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidModel(model.clone()));
            }
        }

        if !(1..=8192).contains(&self.embedding.dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding.dimension,
            ));
        }

        if !(1..=100).contains(&self.store.match_count) {
            return Err(ConfigError::InvalidMatchCount(self.store.match_count));
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.chunk_overlap,
                self.chunking.chunk_size,
            ));
        }

        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort(self.server.port));
        }

        let repo_parts: Vec<&str> = self.ingest.repository.split('/').collect();
        if repo_parts.len() != 2 || repo_parts.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidRepository(
                self.ingest.repository.clone(),
            ));
        }

        Ok(())
    }
}

fn validate_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|_| ConfigError::InvalidUrl(value.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(value.to_string()));
    }
    Ok(url)
}

/// API keys, read from the environment only and never written to disk.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secrets {
    pub cohere_api_key: Option<String>,
    pub supabase_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub github_token: Option<String>,
}

impl std::fmt::Debug for Secrets {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Secrets")
            .field("cohere_api_key", &mask(&self.cohere_api_key))
            .field("supabase_key", &mask(&self.supabase_key))
            .field("groq_api_key", &mask(&self.groq_api_key))
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("github_token", &mask(&self.github_token))
            .finish()
    }
}

impl Secrets {
    #[inline]
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        };

        Self {
            cohere_api_key: read("COHERE_API_KEY"),
            supabase_key: read("SUPABASE_SERVICE_KEY").or_else(|| read("SUPABASE_ANON_KEY")),
            groq_api_key: read("GROQ_API_KEY"),
            gemini_api_key: read("GEMINI_API_KEY"),
            github_token: read("GITHUB_TOKEN"),
        }
    }

    #[inline]
    pub fn cohere(&self) -> Result<&str, ConfigError> {
        require(self.cohere_api_key.as_deref(), "COHERE_API_KEY")
    }

    #[inline]
    pub fn supabase(&self) -> Result<&str, ConfigError> {
        require(self.supabase_key.as_deref(), "SUPABASE_SERVICE_KEY")
    }

    #[inline]
    pub fn groq(&self) -> Result<&str, ConfigError> {
        require(self.groq_api_key.as_deref(), "GROQ_API_KEY")
    }

    #[inline]
    pub fn gemini(&self) -> Result<&str, ConfigError> {
        require(self.gemini_api_key.as_deref(), "GEMINI_API_KEY")
    }
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value.ok_or(ConfigError::MissingSecret(name))
}
