// Configuration management module
// TOML settings in the config directory, secrets from the environment

pub mod display;
pub mod settings;

pub use display::show_config;
pub use settings::{
    AdvisorConfig, ChatConfig, Config, ConfigError, DEFAULT_MATCH_COUNT, DEFAULT_SYSTEM_PROMPT,
    EmbeddingConfig, IngestConfig, QueryLogBackend, QueryLogConfig, Secrets, ServerConfig,
    StoreBackend, StoreConfig,
};
